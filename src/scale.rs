//! Render scale calculation from available viewport width.

use crate::error::OverlayError;
use crate::geometry::PageSize;

/// Inclusive clamp range for the render scale.
///
/// Each call site picks its own range; there is no global default that all
/// views agree on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleBounds {
    pub min: f32,
    pub max: f32,
}

impl ScaleBounds {
    /// Full document viewer.
    pub const VIEWER: ScaleBounds = ScaleBounds { min: 0.6, max: 2.5 };
    /// Signing dialog.
    pub const SIGNING: ScaleBounds = ScaleBounds { min: 0.8, max: 1.2 };
    /// Correction-request field picker.
    pub const CORRECTION: ScaleBounds = ScaleBounds { min: 0.8, max: 1.4 };

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the range.
    pub fn clamp(self, value: f32) -> f32 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        if value.is_nan() {
            return lo;
        }
        value.max(lo).min(hi)
    }
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self::VIEWER
    }
}

/// Scale calculator configuration for one call site.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleConfig {
    /// Clamp range.
    pub bounds: ScaleBounds,
    /// Share of the available width the page may occupy.
    pub margin_factor: f32,
    /// Additive zoom step.
    pub zoom_step: f32,
    /// Logical page the scale is computed against.
    pub page: PageSize,
}

impl ScaleConfig {
    pub const DEFAULT_MARGIN_FACTOR: f32 = 0.9;
    pub const DEFAULT_ZOOM_STEP: f32 = 0.2;

    /// Defaults with explicit bounds.
    pub fn with_bounds(bounds: ScaleBounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    /// Reject configurations that cannot produce a positive bounded scale.
    pub fn validate(&self) -> Result<(), OverlayError> {
        let ScaleBounds { min, max } = self.bounds;
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || min > max {
            return Err(OverlayError::config(
                OverlayError::INVALID_SCALE_BOUNDS,
                format!("scale bounds must satisfy 0 < min <= max, got {min}..{max}"),
            ));
        }
        if !(self.margin_factor > 0.0) || !self.margin_factor.is_finite() {
            return Err(OverlayError::config(
                OverlayError::INVALID_SCALE_BOUNDS,
                format!("margin factor must be positive, got {}", self.margin_factor),
            ));
        }
        if !(self.zoom_step > 0.0) || !self.zoom_step.is_finite() {
            return Err(OverlayError::config(
                OverlayError::INVALID_SCALE_BOUNDS,
                format!("zoom step must be positive, got {}", self.zoom_step),
            ));
        }
        if !(self.page.width > 0.0) || !(self.page.height > 0.0) {
            return Err(OverlayError::config(
                OverlayError::INVALID_SCALE_BOUNDS,
                "logical page size must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            bounds: ScaleBounds::VIEWER,
            margin_factor: Self::DEFAULT_MARGIN_FACTOR,
            zoom_step: Self::DEFAULT_ZOOM_STEP,
            page: PageSize::A4,
        }
    }
}

/// Ratio of displayed page pixel width to logical page width.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct RenderScale(f32);

impl RenderScale {
    /// Build a scale clamped to `bounds`.
    pub fn clamped(value: f32, bounds: ScaleBounds) -> Self {
        Self(bounds.clamp(value))
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Step the scale up by the configured zoom step.
    pub fn zoom_in(self, cfg: &ScaleConfig) -> Self {
        Self::clamped(self.0 + cfg.zoom_step, cfg.bounds)
    }

    /// Step the scale down by the configured zoom step.
    pub fn zoom_out(self, cfg: &ScaleConfig) -> Self {
        Self::clamped(self.0 - cfg.zoom_step, cfg.bounds)
    }
}

impl Default for RenderScale {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Width left for the page once horizontal padding on both sides is removed.
pub fn available_width(container_width: f32, horizontal_padding: f32) -> f32 {
    let width = container_width - horizontal_padding.max(0.0) * 2.0;
    if width.is_nan() {
        0.0
    } else {
        width.max(0.0)
    }
}

/// Compute the display scale for `available_width`.
///
/// Negative and NaN widths are treated as zero, so the result is always
/// inside `cfg.bounds`.
pub fn compute_scale(available_width: f32, cfg: &ScaleConfig) -> RenderScale {
    let width = if available_width.is_nan() {
        0.0
    } else {
        available_width.max(0.0)
    };
    let raw = if cfg.page.width > 0.0 {
        width * cfg.margin_factor / cfg.page.width
    } else {
        cfg.bounds.min
    };
    RenderScale::clamped(raw, cfg.bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_width_clamps_to_floor() {
        let cfg = ScaleConfig::with_bounds(ScaleBounds::SIGNING);
        assert_eq!(compute_scale(0.0, &cfg).get(), 0.8);
    }

    #[test]
    fn scale_stays_in_bounds_for_any_width() {
        for bounds in [ScaleBounds::VIEWER, ScaleBounds::SIGNING, ScaleBounds::CORRECTION] {
            let cfg = ScaleConfig::with_bounds(bounds);
            for width in [
                -500.0,
                0.0,
                1.0,
                320.0,
                661.42,
                1024.0,
                1e9,
                f32::INFINITY,
                f32::NAN,
            ] {
                let scale = compute_scale(width, &cfg).get();
                assert!(
                    scale >= bounds.min && scale <= bounds.max,
                    "{width} -> {scale} outside {bounds:?}"
                );
            }
        }
    }

    #[test]
    fn unclamped_scale_follows_margin_factor() {
        let cfg = ScaleConfig::default();
        let width = 595.28 / 0.9;
        let scale = compute_scale(width, &cfg).get();
        assert!((scale - 1.0).abs() < 1e-5, "scale={scale}");
    }

    #[test]
    fn zoom_steps_respect_bounds() {
        let cfg = ScaleConfig::with_bounds(ScaleBounds::CORRECTION);
        let scale = RenderScale::clamped(1.0, cfg.bounds);
        let up = scale.zoom_in(&cfg);
        assert!((up.get() - 1.2).abs() < 1e-6);
        assert!((up.zoom_in(&cfg).get() - 1.4).abs() < 1e-6);
        assert!((up.zoom_in(&cfg).zoom_in(&cfg).get() - 1.4).abs() < 1e-6);
        let down = scale.zoom_out(&cfg).zoom_out(&cfg);
        assert!((down.get() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn padding_is_removed_from_both_sides() {
        assert_eq!(available_width(800.0, 16.0), 768.0);
        assert_eq!(available_width(20.0, 16.0), 0.0);
    }

    #[test]
    fn validate_rejects_inverted_bounds() {
        let cfg = ScaleConfig::with_bounds(ScaleBounds::new(1.4, 0.8));
        assert_eq!(
            cfg.validate().unwrap_err().code,
            OverlayError::INVALID_SCALE_BOUNDS
        );
        assert!(ScaleConfig::default().validate().is_ok());
    }
}
