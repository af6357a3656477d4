//! Field overlay geometry for fixed-layout documents.
//!
//! Positions form-field overlays on a page that some other renderer draws,
//! fits field text into its box, and maps free-hand pointer input onto a
//! fixed-resolution capture surface. Page rasterization, transport and UI
//! widgets stay with the host; they are reached through the traits in
//! [`fit`], [`viewport`], [`capture`] and [`backend`].

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod backend;
pub mod capture;
pub mod correction;
pub mod error;
pub mod fit;
pub mod geometry;
pub mod listing;
pub mod model;
pub mod scale;
pub mod viewport;

pub use backend::{
    submit_corrections, submit_signature, CorrectionSink, FieldSource, RequestContext,
    SignaturePayload, SignatureSink, SubmitTracker,
};
pub use capture::{
    map_pointer, CaptureSurface, CapturedStroke, PadState, PointerEvent, RecordingSurface,
    SignaturePad, SurfaceGeometry, SurfacePoint, ViewportPoint, DEFAULT_SURFACE_HEIGHT,
    DEFAULT_SURFACE_WIDTH,
};
pub use correction::{CorrectionItem, CorrectionRequest, FieldSelection, ToggleOutcome};
pub use error::{ErrorPhase, OverlayError};
pub use fit::{FitConfig, FitOutcome, FontFitter, FontFitterBuilder, FontSpec, TextMeasurer};
pub use geometry::{PageSize, PixelPoint, PixelRect, RelativeRect};
pub use listing::{ListPage, ListQuery, Listable, SortDirection, SortSpec, SortValue};
pub use model::{fields_from_json, fields_on_page, Field, FieldId, FieldKind, FieldValue};
pub use scale::{available_width, compute_scale, RenderScale, ScaleBounds, ScaleConfig};
pub use viewport::{LayoutEffect, LayoutObserver, RenderContext, ViewportState};
