//! Free-hand signature capture.
//!
//! Pointer events arrive in viewport coordinates. [`map_pointer`] moves them
//! into the fixed-resolution capture surface, compensating for CSS scaling of
//! the surface and for the scroll offset of its container. [`SignaturePad`]
//! drives a [`CaptureSurface`] through the stroke state machine.

use crate::error::{ErrorPhase, OverlayError};

/// Default capture surface width in pixels.
pub const DEFAULT_SURFACE_WIDTH: u32 = 800;
/// Default capture surface height in pixels.
pub const DEFAULT_SURFACE_HEIGHT: u32 = 1131;

/// Point in viewport (client) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportPoint {
    pub x: f32,
    pub y: f32,
}

impl ViewportPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Point in capture-surface bitmap coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SurfacePoint {
    pub x: f32,
    pub y: f32,
}

impl SurfacePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where the capture surface currently sits on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceGeometry {
    /// Bitmap width in pixels.
    pub intrinsic_width: u32,
    /// Bitmap height in pixels.
    pub intrinsic_height: u32,
    /// Displayed left edge in viewport coordinates.
    pub displayed_left: f32,
    /// Displayed top edge in viewport coordinates.
    pub displayed_top: f32,
    /// Displayed (CSS) width.
    pub displayed_width: f32,
    /// Displayed (CSS) height.
    pub displayed_height: f32,
}

impl Default for SurfaceGeometry {
    fn default() -> Self {
        Self {
            intrinsic_width: DEFAULT_SURFACE_WIDTH,
            intrinsic_height: DEFAULT_SURFACE_HEIGHT,
            displayed_left: 0.0,
            displayed_top: 0.0,
            displayed_width: DEFAULT_SURFACE_WIDTH as f32,
            displayed_height: DEFAULT_SURFACE_HEIGHT as f32,
        }
    }
}

impl SurfaceGeometry {
    /// Display-to-bitmap scale per axis. A non-positive displayed size maps 1:1.
    pub fn scale(&self) -> (f32, f32) {
        let axis = |intrinsic: u32, displayed: f32| {
            if displayed > 0.0 {
                intrinsic as f32 / displayed
            } else {
                1.0
            }
        };
        (
            axis(self.intrinsic_width, self.displayed_width),
            axis(self.intrinsic_height, self.displayed_height),
        )
    }
}

/// Map a viewport point into surface coordinates.
///
/// `scroll_top` is the vertical scroll offset of the scrollable container
/// enclosing the surface. It is added before scaling.
pub fn map_pointer(
    point: ViewportPoint,
    geometry: &SurfaceGeometry,
    scroll_top: f32,
) -> SurfacePoint {
    let (scale_x, scale_y) = geometry.scale();
    SurfacePoint {
        x: (point.x - geometry.displayed_left) * scale_x,
        y: (point.y - geometry.displayed_top + scroll_top) * scale_y,
    }
}

/// Drawing backend for the signature pad.
pub trait CaptureSurface {
    /// Bitmap copy taken when a stroke completes.
    type Snapshot: Clone;

    /// Bitmap size in pixels.
    fn size(&self) -> (u32, u32);
    /// Start a new path at `at`.
    fn begin_path(&mut self, at: SurfacePoint);
    /// Extend the current path to `to`.
    fn line_to(&mut self, to: SurfacePoint);
    /// Finish the current path.
    fn close_path(&mut self);
    /// Copy the full bitmap.
    fn snapshot(&self) -> Self::Snapshot;
    /// Reset to a blank bitmap.
    fn clear(&mut self);
}

/// Ordered points of one pointer-drag gesture.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CapturedStroke {
    pub points: Vec<SurfacePoint>,
}

impl CapturedStroke {
    pub fn is_dot(&self) -> bool {
        self.points.len() <= 1
    }
}

/// Pad state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PadState {
    #[default]
    Idle,
    Drawing,
}

/// Pointer event kinds forwarded by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(ViewportPoint),
    Move(ViewportPoint),
    Up,
    Leave,
}

/// Signature pad state machine over a capture surface.
pub struct SignaturePad<S: CaptureSurface> {
    surface: S,
    geometry: SurfaceGeometry,
    scroll_top: f32,
    state: PadState,
    current: CapturedStroke,
    strokes: Vec<CapturedStroke>,
    snapshots: Vec<S::Snapshot>,
}

impl<S: CaptureSurface> core::fmt::Debug for SignaturePad<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SignaturePad")
            .field("geometry", &self.geometry)
            .field("scroll_top", &self.scroll_top)
            .field("state", &self.state)
            .field("strokes", &self.strokes.len())
            .field("snapshots", &self.snapshots.len())
            .finish()
    }
}

impl<S: CaptureSurface> SignaturePad<S> {
    /// Wrap `surface`; its size becomes the intrinsic geometry.
    pub fn new(surface: S) -> Result<Self, OverlayError> {
        let (width, height) = surface.size();
        if width == 0 || height == 0 {
            return Err(OverlayError::new(
                ErrorPhase::Capture,
                OverlayError::INVALID_SURFACE,
                format!("capture surface must be non-empty, got {width}x{height}"),
            ));
        }
        Ok(Self {
            surface,
            geometry: SurfaceGeometry {
                intrinsic_width: width,
                intrinsic_height: height,
                displayed_width: width as f32,
                displayed_height: height as f32,
                ..SurfaceGeometry::default()
            },
            scroll_top: 0.0,
            state: PadState::Idle,
            current: CapturedStroke::default(),
            strokes: Vec::new(),
            snapshots: Vec::new(),
        })
    }

    /// Update where the surface is displayed. The intrinsic size is fixed.
    pub fn set_layout(&mut self, left: f32, top: f32, width: f32, height: f32) {
        self.geometry.displayed_left = left;
        self.geometry.displayed_top = top;
        self.geometry.displayed_width = width;
        self.geometry.displayed_height = height;
    }

    /// Update the enclosing container's scroll offset.
    pub fn set_scroll_top(&mut self, scroll_top: f32) {
        self.scroll_top = scroll_top;
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    pub fn state(&self) -> PadState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn strokes(&self) -> &[CapturedStroke] {
        &self.strokes
    }

    pub fn snapshots(&self) -> &[S::Snapshot] {
        &self.snapshots
    }

    pub fn latest_snapshot(&self) -> Option<&S::Snapshot> {
        self.snapshots.last()
    }

    /// At least one completed stroke snapshot exists.
    pub fn is_signed(&self) -> bool {
        !self.snapshots.is_empty()
    }

    /// Dispatch a host pointer event.
    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(p) => self.pointer_down(p),
            PointerEvent::Move(p) => self.pointer_move(p),
            PointerEvent::Up | PointerEvent::Leave => self.pointer_up(),
        }
    }

    /// Begin a stroke. A down while already drawing finishes the open stroke first.
    pub fn pointer_down(&mut self, at: ViewportPoint) {
        if self.state == PadState::Drawing {
            self.finish_stroke();
        }
        let point = map_pointer(at, &self.geometry, self.scroll_top);
        self.surface.begin_path(point);
        self.current.points.clear();
        self.current.points.push(point);
        self.state = PadState::Drawing;
        log::debug!("signature stroke begin at ({:.1}, {:.1})", point.x, point.y);
    }

    /// Extend the open stroke; ignored while idle.
    pub fn pointer_move(&mut self, to: ViewportPoint) {
        if self.state != PadState::Drawing {
            return;
        }
        let point = map_pointer(to, &self.geometry, self.scroll_top);
        self.surface.line_to(point);
        self.current.points.push(point);
    }

    /// Close the open stroke and snapshot; ignored while idle.
    pub fn pointer_up(&mut self) {
        if self.state != PadState::Drawing {
            return;
        }
        self.finish_stroke();
    }

    /// Discard all strokes and snapshots and blank the surface.
    pub fn clear(&mut self) {
        self.surface.clear();
        self.current.points.clear();
        self.strokes.clear();
        self.snapshots.clear();
        self.state = PadState::Idle;
        log::debug!("signature pad cleared");
    }

    fn finish_stroke(&mut self) {
        self.surface.close_path();
        self.strokes.push(core::mem::take(&mut self.current));
        self.snapshots.push(self.surface.snapshot());
        self.state = PadState::Idle;
        log::debug!(
            "signature stroke complete (strokes={}, snapshots={})",
            self.strokes.len(),
            self.snapshots.len()
        );
    }
}

/// Surface that only records path operations. Snapshots are the recorded
/// strokes so far.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    paths: Vec<Vec<SurfacePoint>>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            paths: Vec::new(),
        }
    }

    pub fn paths(&self) -> &[Vec<SurfacePoint>] {
        &self.paths
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT)
    }
}

impl CaptureSurface for RecordingSurface {
    type Snapshot = Vec<Vec<SurfacePoint>>;

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_path(&mut self, at: SurfacePoint) {
        self.paths.push(vec![at]);
    }

    fn line_to(&mut self, to: SurfacePoint) {
        if let Some(path) = self.paths.last_mut() {
            path.push(to);
        }
    }

    fn close_path(&mut self) {}

    fn snapshot(&self) -> Self::Snapshot {
        self.paths.clone()
    }

    fn clear(&mut self) {
        self.paths.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_size_geometry() -> SurfaceGeometry {
        SurfaceGeometry {
            displayed_left: 100.0,
            displayed_top: 50.0,
            displayed_width: 400.0,
            displayed_height: 565.5,
            ..SurfaceGeometry::default()
        }
    }

    #[test]
    fn mapping_accounts_for_css_scale_and_scroll() {
        let geom = half_size_geometry();
        let p = map_pointer(ViewportPoint::new(300.0, 150.0), &geom, 20.0);
        assert!((p.x - 400.0).abs() < 1e-4);
        assert!((p.y - 240.0).abs() < 1e-3, "y={}", p.y);
    }

    #[test]
    fn mapping_is_deterministic() {
        let geom = half_size_geometry();
        let point = ViewportPoint::new(123.25, 456.5);
        let first = map_pointer(point, &geom, 33.0);
        for _ in 0..16 {
            assert_eq!(map_pointer(point, &geom, 33.0), first);
        }
    }

    #[test]
    fn zero_display_size_maps_one_to_one() {
        let geom = SurfaceGeometry {
            displayed_width: 0.0,
            displayed_height: 0.0,
            ..SurfaceGeometry::default()
        };
        let p = map_pointer(ViewportPoint::new(10.0, 20.0), &geom, 0.0);
        assert_eq!(p, SurfacePoint::new(10.0, 20.0));
    }

    #[test]
    fn stroke_lifecycle_snapshots_on_release() {
        let mut pad = SignaturePad::new(RecordingSurface::default()).expect("pad");
        assert!(!pad.is_signed());
        pad.handle(PointerEvent::Down(ViewportPoint::new(10.0, 10.0)));
        assert_eq!(pad.state(), PadState::Drawing);
        pad.handle(PointerEvent::Move(ViewportPoint::new(20.0, 15.0)));
        pad.handle(PointerEvent::Move(ViewportPoint::new(30.0, 25.0)));
        assert!(!pad.is_signed());
        pad.handle(PointerEvent::Up);
        assert_eq!(pad.state(), PadState::Idle);
        assert!(pad.is_signed());
        assert_eq!(pad.strokes().len(), 1);
        assert_eq!(pad.strokes()[0].points.len(), 3);
        assert_eq!(pad.latest_snapshot().map(Vec::len), Some(1));
    }

    #[test]
    fn leave_finishes_stroke_like_up() {
        let mut pad = SignaturePad::new(RecordingSurface::default()).expect("pad");
        pad.handle(PointerEvent::Down(ViewportPoint::new(1.0, 1.0)));
        pad.handle(PointerEvent::Leave);
        assert!(pad.is_signed());
        assert!(pad.strokes()[0].is_dot());
    }

    #[test]
    fn idle_moves_and_releases_are_ignored() {
        let mut pad = SignaturePad::new(RecordingSurface::default()).expect("pad");
        pad.handle(PointerEvent::Move(ViewportPoint::new(5.0, 5.0)));
        pad.handle(PointerEvent::Up);
        pad.handle(PointerEvent::Leave);
        assert!(!pad.is_signed());
        assert!(pad.surface().paths().is_empty());
    }

    #[test]
    fn each_stroke_appends_a_snapshot() {
        let mut pad = SignaturePad::new(RecordingSurface::default()).expect("pad");
        for i in 0..3 {
            let x = i as f32 * 10.0;
            pad.pointer_down(ViewportPoint::new(x, 0.0));
            pad.pointer_move(ViewportPoint::new(x + 5.0, 5.0));
            pad.pointer_up();
        }
        assert_eq!(pad.snapshots().len(), 3);
        assert_eq!(pad.latest_snapshot().map(Vec::len), Some(3));
    }

    #[test]
    fn clear_returns_to_blank() {
        let mut pad = SignaturePad::new(RecordingSurface::default()).expect("pad");
        pad.pointer_down(ViewportPoint::new(0.0, 0.0));
        pad.pointer_up();
        pad.clear();
        assert!(!pad.is_signed());
        assert!(pad.strokes().is_empty());
        assert!(pad.surface().paths().is_empty());
        assert_eq!(pad.state(), PadState::Idle);
    }

    #[test]
    fn pad_uses_layout_and_scroll() {
        let mut pad = SignaturePad::new(RecordingSurface::default()).expect("pad");
        pad.set_layout(100.0, 50.0, 400.0, 565.5);
        pad.set_scroll_top(20.0);
        pad.pointer_down(ViewportPoint::new(300.0, 150.0));
        let first = pad.surface().paths()[0][0];
        assert!((first.x - 400.0).abs() < 1e-4);
        assert!((first.y - 240.0).abs() < 1e-3);
    }

    #[test]
    fn empty_surface_is_rejected() {
        let err = SignaturePad::new(RecordingSurface::new(0, 10)).unwrap_err();
        assert_eq!(err.code, OverlayError::INVALID_SURFACE);
    }
}
