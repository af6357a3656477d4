use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle},
};
use field_overlay::{
    CaptureSurface, ErrorPhase, OverlayError, SignaturePayload, SurfacePoint,
    DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH,
};

use crate::MonochromeBitmap;

/// Raster signature surface.
///
/// Strokes are rasterized into a [`MonochromeBitmap`] as they arrive, so each
/// snapshot is the exact image that gets encoded on submit.
#[derive(Clone, Debug)]
pub struct CaptureCanvas {
    bitmap: MonochromeBitmap,
    stroke_width: u32,
    pen: Option<Point>,
}

impl CaptureCanvas {
    pub const DEFAULT_STROKE_WIDTH: u32 = 2;

    pub fn new(width: u32, height: u32, stroke_width: u32) -> Result<Self, OverlayError> {
        let bitmap = MonochromeBitmap::blank(width, height).map_err(|err| {
            OverlayError::new(
                ErrorPhase::Capture,
                OverlayError::INVALID_SURFACE,
                format!("capture canvas {width}x{height}: {err}"),
            )
        })?;
        Ok(Self {
            bitmap,
            stroke_width: stroke_width.max(1),
            pen: None,
        })
    }

    /// 800x1131 canvas with the default pen.
    pub fn with_default_size() -> Result<Self, OverlayError> {
        Self::new(
            DEFAULT_SURFACE_WIDTH,
            DEFAULT_SURFACE_HEIGHT,
            Self::DEFAULT_STROKE_WIDTH,
        )
    }

    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    pub fn bitmap(&self) -> &MonochromeBitmap {
        &self.bitmap
    }

    fn pen_style(&self) -> PrimitiveStyle<BinaryColor> {
        PrimitiveStyle::with_stroke(BinaryColor::On, self.stroke_width)
    }
}

fn surface_point(p: SurfacePoint) -> Point {
    Point::new(p.x.round() as i32, p.y.round() as i32)
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

impl OriginDimensions for CaptureCanvas {
    fn size(&self) -> Size {
        Size::new(self.bitmap.width(), self.bitmap.height())
    }
}

impl DrawTarget for CaptureCanvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            self.bitmap
                .set_pixel(point.x as u32, point.y as u32, color == BinaryColor::On);
        }
        Ok(())
    }
}

impl CaptureSurface for CaptureCanvas {
    type Snapshot = MonochromeBitmap;

    fn size(&self) -> (u32, u32) {
        (self.bitmap.width(), self.bitmap.height())
    }

    fn begin_path(&mut self, at: SurfacePoint) {
        let at = surface_point(at);
        let dot = Circle::with_center(at, self.stroke_width)
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On));
        infallible(dot.draw(self));
        self.pen = Some(at);
    }

    fn line_to(&mut self, to: SurfacePoint) {
        let to = surface_point(to);
        if let Some(from) = self.pen {
            let style = self.pen_style();
            infallible(Line::new(from, to).into_styled(style).draw(self));
        }
        self.pen = Some(to);
    }

    fn close_path(&mut self) {
        self.pen = None;
    }

    fn snapshot(&self) -> Self::Snapshot {
        self.bitmap.clone()
    }

    fn clear(&mut self) {
        self.bitmap.fill(false);
        self.pen = None;
    }
}

/// Encode a canvas snapshot as the submit payload.
pub fn encode_signature(snapshot: &MonochromeBitmap) -> Result<SignaturePayload, OverlayError> {
    let data_url = snapshot.to_png_data_url().map_err(|err| {
        OverlayError::new(
            ErrorPhase::Capture,
            OverlayError::SNAPSHOT_ENCODE_FAILED,
            format!("signature PNG encode failed: {err}"),
        )
    })?;
    Ok(SignaturePayload {
        data_url,
        width: snapshot.width(),
        height: snapshot.height(),
    })
}
