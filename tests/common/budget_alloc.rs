use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Allocation totals over one measured window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocSample {
    pub peak_bytes: usize,
    pub allocs: usize,
}

/// Global allocator that tracks live bytes, the high-water mark and the
/// number of allocation calls since the last reset.
pub struct BudgetAlloc {
    live: AtomicUsize,
    peak: AtomicUsize,
    allocs: AtomicUsize,
}

impl BudgetAlloc {
    pub const fn new() -> Self {
        Self {
            live: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            allocs: AtomicUsize::new(0),
        }
    }

    /// Run `f` and report what it allocated. The peak is relative to the
    /// bytes already live when `f` starts.
    pub fn measure<T>(&self, f: impl FnOnce() -> T) -> (T, AllocSample) {
        let baseline = self.live.load(Ordering::SeqCst);
        self.peak.store(baseline, Ordering::SeqCst);
        self.allocs.store(0, Ordering::SeqCst);
        let out = f();
        let sample = AllocSample {
            peak_bytes: self.peak.load(Ordering::SeqCst).saturating_sub(baseline),
            allocs: self.allocs.load(Ordering::SeqCst),
        };
        (out, sample)
    }

    fn grow(&self, bytes: usize) {
        let live = self.live.fetch_add(bytes, Ordering::SeqCst) + bytes;
        self.peak.fetch_max(live, Ordering::SeqCst);
    }

    fn shrink(&self, bytes: usize) {
        let _ = self
            .live
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                Some(live.saturating_sub(bytes))
            });
    }
}

unsafe impl GlobalAlloc for BudgetAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
            self.allocs.fetch_add(1, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        self.shrink(layout.size());
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            self.grow(layout.size());
            self.allocs.fetch_add(1, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            if new_size >= layout.size() {
                self.grow(new_size - layout.size());
            } else {
                self.shrink(layout.size() - new_size);
            }
            self.allocs.fetch_add(1, Ordering::SeqCst);
        }
        new_ptr
    }
}
