//! Viewport observation without DOM or timer coupling.
//!
//! Hosts forward resize and zoom events here and drain the queued
//! [`LayoutEffect`]s after each event turn. Geometry stays pure; the host
//! decides how to realise scrolling.

use smallvec::SmallVec;

use crate::error::OverlayError;
use crate::model::FieldId;
use crate::scale::{available_width, compute_scale, RenderScale, ScaleConfig};

/// Host-side hooks for layout observation.
pub trait LayoutObserver {
    /// The observed container's content-box width changed.
    fn on_resize(&mut self, content_width: f32);

    /// Ask the host to bring the comment input for `field_id` into view.
    fn request_scroll_into_view(&mut self, field_id: FieldId);
}

/// Side effect the host should perform after an event turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutEffect {
    /// Scroll the comment input anchored to this field into view.
    ScrollIntoView(FieldId),
}

/// Ephemeral per-layout-pass render context. Never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderContext {
    pub scale: RenderScale,
}

/// Current viewport state for one document view.
#[derive(Clone, Debug)]
pub struct ViewportState {
    cfg: ScaleConfig,
    horizontal_padding: f32,
    content_width: f32,
    zoom_steps: i32,
    context: RenderContext,
    effects: SmallVec<[LayoutEffect; 2]>,
}

impl ViewportState {
    /// Create a viewport for a call site's scale configuration.
    pub fn new(cfg: ScaleConfig, horizontal_padding: f32) -> Result<Self, OverlayError> {
        cfg.validate()?;
        let mut state = Self {
            cfg,
            horizontal_padding,
            content_width: 0.0,
            zoom_steps: 0,
            context: RenderContext::default(),
            effects: SmallVec::new(),
        };
        state.recompute();
        Ok(state)
    }

    pub fn config(&self) -> &ScaleConfig {
        &self.cfg
    }

    pub fn context(&self) -> RenderContext {
        self.context
    }

    pub fn scale(&self) -> RenderScale {
        self.context.scale
    }

    /// Step zoom in; the step count is kept across resizes.
    pub fn zoom_in(&mut self) -> RenderScale {
        self.step_zoom(1)
    }

    /// Step zoom out; the step count is kept across resizes.
    pub fn zoom_out(&mut self) -> RenderScale {
        self.step_zoom(-1)
    }

    /// Steps that no longer move the clamped scale are not recorded.
    fn step_zoom(&mut self, delta: i32) -> RenderScale {
        let steps = self.zoom_steps.saturating_add(delta);
        if self.scale_for(steps) != self.context.scale {
            self.zoom_steps = steps;
            self.recompute();
        }
        self.context.scale
    }

    /// Drop any zoom offset and return to the fitted scale.
    pub fn reset_zoom(&mut self) -> RenderScale {
        self.zoom_steps = 0;
        self.recompute();
        self.context.scale
    }

    /// Take all pending effects in queue order.
    pub fn drain_effects(&mut self) -> impl Iterator<Item = LayoutEffect> + '_ {
        self.effects.drain(..)
    }

    pub fn has_pending_effects(&self) -> bool {
        !self.effects.is_empty()
    }

    fn scale_for(&self, zoom_steps: i32) -> RenderScale {
        let width = available_width(self.content_width, self.horizontal_padding);
        let fitted = compute_scale(width, &self.cfg).get();
        RenderScale::clamped(fitted + zoom_steps as f32 * self.cfg.zoom_step, self.cfg.bounds)
    }

    fn recompute(&mut self) {
        let scale = self.scale_for(self.zoom_steps);
        if scale != self.context.scale {
            log::debug!(
                "viewport scale {:.3} -> {:.3} (content_width={:.1} zoom_steps={})",
                self.context.scale.get(),
                scale.get(),
                self.content_width,
                self.zoom_steps
            );
        }
        self.context = RenderContext { scale };
    }
}

impl LayoutObserver for ViewportState {
    fn on_resize(&mut self, content_width: f32) {
        self.content_width = content_width;
        self.recompute();
    }

    fn request_scroll_into_view(&mut self, field_id: FieldId) {
        if !self
            .effects
            .iter()
            .any(|LayoutEffect::ScrollIntoView(id)| *id == field_id)
        {
            self.effects.push(LayoutEffect::ScrollIntoView(field_id));
        }
    }
}
