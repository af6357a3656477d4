//! Relative coordinate model and pixel mapping.
//!
//! Field geometry is stored as fractions of a fixed logical page size and
//! only ever scaled on the way out to pixels. The display scale changes with
//! the viewport; persisted geometry never does.

use serde::{Deserialize, Serialize};

/// Logical page size in points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// ISO A4 in PDF points.
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    /// Page size scaled to display pixels.
    pub fn scaled(self, scale: f32) -> (f32, f32) {
        (self.width * scale, self.height * scale)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

/// Field box expressed as fractions of the logical page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeRect {
    #[serde(rename = "relativeX")]
    pub x: f32,
    #[serde(rename = "relativeY")]
    pub y: f32,
    #[serde(rename = "relativeWidth")]
    pub width: f32,
    #[serde(rename = "relativeHeight")]
    pub height: f32,
}

impl RelativeRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Map to display pixels at `scale`.
    ///
    /// Out-of-range fractions are mapped as-is, so a field placed past the
    /// page edge lands off-canvas instead of being rejected.
    pub fn to_pixels(&self, page: PageSize, scale: f32) -> PixelRect {
        PixelRect {
            x: self.x * page.width * scale,
            y: self.y * page.height * scale,
            width: self.width * page.width * scale,
            height: self.height * page.height * scale,
        }
    }

    /// Whether every component lies within `[0.0, 1.0]` and the box stays on the page.
    pub fn is_on_page(&self) -> bool {
        let unit = 0.0..=1.0;
        unit.contains(&self.x)
            && unit.contains(&self.y)
            && unit.contains(&self.width)
            && unit.contains(&self.height)
            && self.x + self.width <= 1.0
            && self.y + self.height <= 1.0
    }
}

/// Point in display pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Box in display pixel space. Sub-pixel values are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Inverse of [`RelativeRect::to_pixels`].
    ///
    /// A zero scale or zero page dimension yields a zero component instead of
    /// dividing by zero.
    pub fn to_relative(&self, page: PageSize, scale: f32) -> RelativeRect {
        let denom_x = page.width * scale;
        let denom_y = page.height * scale;
        let div = |value: f32, denom: f32| if denom == 0.0 { 0.0 } else { value / denom };
        RelativeRect {
            x: div(self.x, denom_x),
            y: div(self.y, denom_y),
            width: div(self.width, denom_x),
            height: div(self.height, denom_y),
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Half-open containment test (`right`/`bottom` edges excluded).
    pub fn contains(&self, point: PixelPoint) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Largest box with the `src_width:src_height` aspect ratio that fits
    /// inside `self`, centred on both axes.
    pub fn fit_inside(&self, src_width: f32, src_height: f32) -> PixelRect {
        if src_width <= 0.0 || src_height <= 0.0 || self.width <= 0.0 || self.height <= 0.0 {
            return PixelRect::new(self.center().x, self.center().y, 0.0, 0.0);
        }
        let ratio = (self.width / src_width).min(self.height / src_height);
        let width = src_width * ratio;
        let height = src_height * ratio;
        PixelRect {
            x: self.x + (self.width - width) / 2.0,
            y: self.y + (self.height - height) / 2.0,
            width,
            height,
        }
    }

    /// Shrink by `inset` on every side, never below zero size.
    pub fn inset(&self, inset: f32) -> PixelRect {
        let width = (self.width - inset * 2.0).max(0.0);
        let height = (self.height - inset * 2.0).max(0.0);
        PixelRect {
            x: self.x + inset,
            y: self.y + inset,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32, tol: f32) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn a4_box_maps_to_expected_pixels_at_unit_scale() {
        let rel = RelativeRect::new(0.1, 0.2, 0.3, 0.05);
        let px = rel.to_pixels(PageSize::A4, 1.0);
        assert!(close(px.x, 59.528, 1e-3), "x={}", px.x);
        assert!(close(px.y, 168.378, 1e-3), "y={}", px.y);
        assert!(close(px.width, 178.584, 1e-3), "w={}", px.width);
        assert!(close(px.height, 42.0945, 1e-3), "h={}", px.height);
    }

    #[test]
    fn pixel_round_trip_recovers_relative_box() {
        let cases = [
            RelativeRect::new(0.1, 0.2, 0.3, 0.05),
            RelativeRect::new(0.0, 0.0, 1.0, 1.0),
            RelativeRect::new(0.73, 0.91, 0.12, 0.02),
            RelativeRect::new(1.2, -0.1, 0.4, 0.0),
        ];
        for scale in [0.6f32, 0.8, 1.0, 1.37, 2.5] {
            for rel in cases {
                let back = rel.to_pixels(PageSize::A4, scale).to_relative(PageSize::A4, scale);
                assert!(close(back.x, rel.x, 1e-5), "{rel:?} @ {scale}");
                assert!(close(back.y, rel.y, 1e-5), "{rel:?} @ {scale}");
                assert!(close(back.width, rel.width, 1e-5), "{rel:?} @ {scale}");
                assert!(close(back.height, rel.height, 1e-5), "{rel:?} @ {scale}");
            }
        }
    }

    #[test]
    fn zero_size_maps_to_zero_box() {
        let px = RelativeRect::new(0.5, 0.5, 0.0, 0.0).to_pixels(PageSize::A4, 1.3);
        assert_eq!(px.width, 0.0);
        assert_eq!(px.height, 0.0);
        assert_eq!(
            px.to_relative(PageSize::A4, 0.0),
            RelativeRect::default(),
            "zero scale must not divide"
        );
    }

    #[test]
    fn out_of_range_fields_map_off_canvas() {
        let rel = RelativeRect::new(1.5, 0.1, 0.2, 0.1);
        assert!(!rel.is_on_page());
        let px = rel.to_pixels(PageSize::A4, 1.0);
        assert!(px.x > PageSize::A4.width);
    }

    #[test]
    fn fit_inside_preserves_aspect_and_centers() {
        let target = PixelRect::new(10.0, 20.0, 200.0, 50.0);
        let fitted = target.fit_inside(800.0, 400.0);
        assert!(close(fitted.width, 100.0, 1e-4));
        assert!(close(fitted.height, 50.0, 1e-4));
        assert!(close(fitted.x, 60.0, 1e-4));
        assert!(close(fitted.y, 20.0, 1e-4));
    }

    #[test]
    fn contains_excludes_far_edges() {
        let rect = PixelRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(PixelPoint::new(0.0, 0.0)));
        assert!(rect.contains(PixelPoint::new(9.9, 9.9)));
        assert!(!rect.contains(PixelPoint::new(10.0, 5.0)));
    }
}
