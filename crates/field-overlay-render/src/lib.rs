//! Draw-command IR and the field overlay renderer for `field-overlay`.

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

mod measure;
mod overlay;
mod render_ir;

pub use field_overlay::{FieldSelection, FontSpec, RenderScale, TextMeasurer};
pub use measure::HeuristicTextMeasurer;
pub use overlay::{OverlayConfig, OverlayRenderer, OverlayRendererBuilder};
pub use render_ir::{
    BoxState, DrawCommand, FieldBoxCommand, HitRegion, ImageCommand, ImageFit, MarkCommand,
    RenderPage, TextCommand,
};
