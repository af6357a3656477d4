//! embedded-graphics backend for `field-overlay-render` pages and the raster
//! signature capture canvas.

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

mod canvas;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use core::fmt;
use embedded_graphics::{
    mono_font::{
        ascii::{
            FONT_6X13, FONT_6X13_BOLD, FONT_6X9, FONT_7X14, FONT_7X14_BOLD, FONT_9X18,
            FONT_9X18_BOLD,
        },
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use field_overlay::{FontSpec, PixelPoint, PixelRect, TextMeasurer};
use field_overlay_render::{
    DrawCommand, FieldBoxCommand, ImageCommand, MarkCommand, RenderPage, TextCommand,
};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use canvas::{encode_signature, CaptureCanvas};

/// Backend-local font identifier used for metrics and rasterization dispatch.
pub type FontId = u8;

/// Why a font request had to fall back to another face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontFallbackReason {
    UnknownFamily,
    UnsupportedWeight,
}

/// Resolved font selection for a font request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontSelection {
    pub font_id: FontId,
    pub fallback_reason: Option<FontFallbackReason>,
}

/// Backend-provided metrics for a specific font id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontMetrics {
    /// Horizontal advance per glyph, spacing included.
    pub char_width: i32,
    pub line_height: i32,
}

/// Font abstraction used by the renderer's text path.
pub trait FontBackend {
    fn resolve_font(&self, font: &FontSpec) -> FontSelection;
    fn metrics(&self, font_id: FontId) -> FontMetrics;
    fn draw_text_run<D>(
        &self,
        display: &mut D,
        font_id: FontId,
        text: &str,
        origin: Point,
    ) -> Result<i32, D::Error>
    where
        D: DrawTarget<Color = BinaryColor>;
}

/// Mono-font backend built on embedded-graphics' ASCII fonts.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonoFontBackend;

impl MonoFontBackend {
    const SIZE_SMALL: FontId = 0;
    const SIZE_MEDIUM: FontId = 1;
    const SIZE_LARGE: FontId = 2;
    const SIZE_XL: FontId = 3;

    fn encode_font_id(size_bucket: FontId, bold: bool) -> FontId {
        (size_bucket << 1) | u8::from(bold)
    }

    fn decode_font_id(font_id: FontId) -> (FontId, bool) {
        ((font_id >> 1) & 0x03, font_id & 0x01 == 1)
    }

    fn size_bucket_for(size_px: f32) -> FontId {
        if size_px >= 16.0 {
            Self::SIZE_XL
        } else if size_px >= 13.0 {
            Self::SIZE_LARGE
        } else if size_px >= 10.0 {
            Self::SIZE_MEDIUM
        } else {
            Self::SIZE_SMALL
        }
    }

    fn font_for(font_id: FontId) -> &'static MonoFont<'static> {
        match Self::decode_font_id(font_id) {
            (Self::SIZE_SMALL, false) => &FONT_6X9,
            (Self::SIZE_SMALL, true) | (Self::SIZE_MEDIUM, true) => &FONT_6X13_BOLD,
            (Self::SIZE_MEDIUM, false) => &FONT_6X13,
            (Self::SIZE_LARGE, false) => &FONT_7X14,
            (Self::SIZE_LARGE, true) => &FONT_7X14_BOLD,
            (Self::SIZE_XL, false) => &FONT_9X18,
            (Self::SIZE_XL, true) => &FONT_9X18_BOLD,
            _ => &FONT_6X13,
        }
    }

    fn style_for(font_id: FontId) -> MonoTextStyle<'static, BinaryColor> {
        MonoTextStyle::new(Self::font_for(font_id), BinaryColor::On)
    }

    fn family_supported(family: &str) -> bool {
        let family = family.trim().to_ascii_lowercase();
        ["monospace", "mono", "fixed", "serif", "sans-serif", "sans"]
            .iter()
            .any(|known| family.split(',').any(|part| part.trim() == *known))
    }
}

impl FontBackend for MonoFontBackend {
    fn resolve_font(&self, font: &FontSpec) -> FontSelection {
        let bucket = Self::size_bucket_for(font.size_px);
        let bold = font.weight >= 700;
        let fallback_reason = if !Self::family_supported(&font.family) {
            Some(FontFallbackReason::UnknownFamily)
        } else if bold && bucket == Self::SIZE_SMALL {
            Some(FontFallbackReason::UnsupportedWeight)
        } else {
            None
        };
        FontSelection {
            font_id: Self::encode_font_id(bucket, bold),
            fallback_reason,
        }
    }

    fn metrics(&self, font_id: FontId) -> FontMetrics {
        let font = Self::font_for(font_id);
        FontMetrics {
            char_width: (font.character_size.width + font.character_spacing) as i32,
            line_height: font.character_size.height as i32,
        }
    }

    fn draw_text_run<D>(
        &self,
        display: &mut D,
        font_id: FontId,
        text: &str,
        origin: Point,
    ) -> Result<i32, D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let style = Self::style_for(font_id);
        let normalized = normalize_text_for_mono(text);
        Text::with_baseline(normalized.as_ref(), origin, style, Baseline::Top).draw(display)?;
        Ok(normalized.chars().count() as i32 * self.metrics(font_id).char_width)
    }
}

fn normalize_text_for_mono(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|ch| {
        matches!(
            ch,
            '\u{00A0}' | '\u{2013}' | '\u{2014}' | '\u{2018}' | '\u{2019}' | '\u{201C}'
                | '\u{201D}' | '\u{2026}'
        )
    }) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{00A0}' => out.push(' '),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// `TextMeasurer` backed by this crate's font metrics, so field text fitted
/// with it wraps exactly where this backend draws it.
#[derive(Clone, Debug, Default)]
pub struct EgTextMeasurer<B = MonoFontBackend> {
    backend: B,
}

impl EgTextMeasurer<MonoFontBackend> {
    pub fn new() -> Self {
        Self {
            backend: MonoFontBackend,
        }
    }

    /// Shared trait object for renderer builders.
    pub fn shared() -> Arc<dyn TextMeasurer> {
        Arc::new(Self::new())
    }
}

impl<B> EgTextMeasurer<B>
where
    B: FontBackend,
{
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }
}

impl<B> TextMeasurer for EgTextMeasurer<B>
where
    B: FontBackend + Send + Sync,
{
    fn measure_text_px(&self, text: &str, font: &FontSpec) -> f32 {
        let selection = self.backend.resolve_font(font);
        let metrics = self.backend.metrics(selection.font_id);
        let glyphs = normalize_text_for_mono(text).chars().count() as i32;
        (glyphs * metrics.char_width).max(0) as f32
    }
}

/// Limits for the in-memory signature image registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageRegistryLimits {
    /// Maximum number of registered images.
    pub max_images: usize,
    /// Maximum aggregate pixel count across all registered images.
    pub max_total_pixels: usize,
}

impl Default for ImageRegistryLimits {
    fn default() -> Self {
        Self {
            max_images: 16,
            max_total_pixels: 8 * 800 * 1131,
        }
    }
}

/// Error returned when image registration fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageRegistryError {
    RegistryDisabled,
    EmptySource,
    InvalidDataUrl,
    DecodeFailed,
    InvalidDimensions,
    InvalidPixelData,
    MaxImagesExceeded,
    MaxTotalPixelsExceeded,
}

impl ImageRegistryError {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RegistryDisabled => "registry disabled",
            Self::EmptySource => "empty image source",
            Self::InvalidDataUrl => "not a base64 data URL",
            Self::DecodeFailed => "image decode failed",
            Self::InvalidDimensions => "invalid image dimensions",
            Self::InvalidPixelData => "pixel buffer does not match dimensions",
            Self::MaxImagesExceeded => "image count limit exceeded",
            Self::MaxTotalPixelsExceeded => "image pixel budget exceeded",
        }
    }
}

impl fmt::Display for ImageRegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for ImageRegistryError {}

/// Monochrome bitmap stored in packed row-major bits, MSB first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonochromeBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl MonochromeBitmap {
    /// Construct a bitmap from packed row-major bits.
    pub fn from_packed_bits(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, ImageRegistryError> {
        if width == 0 || height == 0 {
            return Err(ImageRegistryError::InvalidDimensions);
        }
        let Some(required_bytes) = Self::required_bytes(width, height) else {
            return Err(ImageRegistryError::InvalidDimensions);
        };
        if pixels.len() != required_bytes {
            return Err(ImageRegistryError::InvalidPixelData);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// All-off bitmap.
    pub fn blank(width: u32, height: u32) -> Result<Self, ImageRegistryError> {
        let bytes = Self::required_bytes(width, height)
            .ok_or(ImageRegistryError::InvalidDimensions)?;
        Self::from_packed_bits(width, height, vec![0; bytes])
    }

    /// Decode a `data:image/...;base64,` URL. Dark opaque pixels are on.
    pub fn from_data_url(src: &str) -> Result<Self, ImageRegistryError> {
        let src = src.trim();
        if src.is_empty() {
            return Err(ImageRegistryError::EmptySource);
        }
        let payload = src
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(_, data)| data)
            .ok_or(ImageRegistryError::InvalidDataUrl)?;
        let bytes = BASE64
            .decode(payload)
            .map_err(|_| ImageRegistryError::InvalidDataUrl)?;
        let decoded =
            image::load_from_memory(&bytes).map_err(|_| ImageRegistryError::DecodeFailed)?;
        let gray = decoded.to_luma_alpha8();
        let mut bitmap = Self::blank(gray.width(), gray.height())?;
        for (x, y, pixel) in gray.enumerate_pixels() {
            let [luma, alpha] = pixel.0;
            if alpha >= 128 && luma < 128 {
                bitmap.set_pixel(x, y, true);
            }
        }
        Ok(bitmap)
    }

    /// Encode as a PNG data URL: ink is opaque black, the rest transparent.
    pub fn to_png_data_url(&self) -> Result<String, image::ImageError> {
        let img = image::GrayAlphaImage::from_fn(self.width, self.height, |x, y| {
            if self.pixel_is_on(x, y) {
                image::LumaA([0, 255])
            } else {
                image::LumaA([0, 0])
            }
        });
        let mut png = std::io::Cursor::new(Vec::new());
        img.write_to(&mut png, image::ImageFormat::Png)?;
        Ok(format!("data:image/png;base64,{}", BASE64.encode(png.into_inner())))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of on pixels.
    pub fn ink_count(&self) -> usize {
        self.pixels.iter().map(|b| b.count_ones() as usize).sum()
    }

    fn required_bytes(width: u32, height: u32) -> Option<usize> {
        let pixels = width.checked_mul(height)?;
        Some(pixels.div_ceil(8) as usize)
    }

    fn bit_position(&self, x: u32, y: u32) -> Option<(usize, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bit_index = y as usize * self.width as usize + x as usize;
        Some((bit_index / 8, 7 - (bit_index % 8) as u8))
    }

    pub fn pixel_is_on(&self, x: u32, y: u32) -> bool {
        self.bit_position(x, y)
            .and_then(|(byte, bit)| self.pixels.get(byte).map(|b| (b >> bit) & 0x01 == 1))
            .unwrap_or(false)
    }

    fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        let Some((byte, bit)) = self.bit_position(x, y) else {
            return;
        };
        if let Some(b) = self.pixels.get_mut(byte) {
            if on {
                *b |= 1 << bit;
            } else {
                *b &= !(1 << bit);
            }
        }
    }

    fn fill(&mut self, on: bool) {
        let value = if on { 0xFF } else { 0x00 };
        self.pixels.iter_mut().for_each(|b| *b = value);
    }
}

/// Decoded signature bitmaps keyed by their source string.
#[derive(Clone, Debug)]
struct ImageRegistry {
    limits: ImageRegistryLimits,
    total_pixels: usize,
    bitmaps: BTreeMap<String, MonochromeBitmap>,
}

impl ImageRegistry {
    fn with_limits(limits: ImageRegistryLimits) -> Self {
        Self {
            limits,
            total_pixels: 0,
            bitmaps: BTreeMap::new(),
        }
    }

    /// Insert or replace `src`. Replacing frees the old bitmap's pixels
    /// before the budget is checked.
    fn register(
        &mut self,
        src: String,
        bitmap: MonochromeBitmap,
    ) -> Result<(), ImageRegistryError> {
        if src.trim().is_empty() {
            return Err(ImageRegistryError::EmptySource);
        }
        if self.limits.max_images == 0 || self.limits.max_total_pixels == 0 {
            return Err(ImageRegistryError::RegistryDisabled);
        }

        let replaced_pixels = match self.bitmaps.get(&src) {
            Some(old) => old.pixel_count(),
            None if self.bitmaps.len() >= self.limits.max_images => {
                return Err(ImageRegistryError::MaxImagesExceeded);
            }
            None => 0,
        };
        let total = self
            .total_pixels
            .saturating_sub(replaced_pixels)
            .saturating_add(bitmap.pixel_count());
        if total > self.limits.max_total_pixels {
            return Err(ImageRegistryError::MaxTotalPixelsExceeded);
        }
        self.total_pixels = total;
        self.bitmaps.insert(src, bitmap);
        Ok(())
    }

    fn bitmap_for(&self, src: &str) -> Option<&MonochromeBitmap> {
        self.bitmaps.get(src)
    }

    fn contains(&self, src: &str) -> bool {
        self.bitmaps.contains_key(src)
    }

    fn len(&self) -> usize {
        self.bitmaps.len()
    }
}

/// Fallback behavior for signature images that are not available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageFallbackPolicy {
    /// Leave the field box empty.
    Skip,
    /// Draw an inset outline where the image would be.
    #[default]
    Outline,
}

/// Executor configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EgRenderConfig {
    /// Clear the target before drawing. Off when painting over a page image.
    pub clear_first: bool,
    /// Policy used when image payloads are unavailable.
    pub image_fallback: ImageFallbackPolicy,
    /// Extra border thickness for selected boxes.
    pub selected_border_boost: u32,
}

impl Default for EgRenderConfig {
    fn default() -> Self {
        Self {
            clear_first: false,
            image_fallback: ImageFallbackPolicy::Outline,
            selected_border_boost: 1,
        }
    }
}

/// Counters collected while executing one page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EgRenderDiagnostics {
    /// Image commands drawn with the fallback outline.
    pub image_fallbacks: u32,
    /// Image commands skipped entirely.
    pub images_skipped: u32,
    /// Text runs drawn with a substitute face.
    pub font_fallbacks: u32,
}

/// Draw-command executor for embedded-graphics targets.
#[derive(Clone, Debug)]
pub struct EgOverlayRenderer<B = MonoFontBackend> {
    cfg: EgRenderConfig,
    backend: B,
    images: ImageRegistry,
}

impl Default for EgOverlayRenderer<MonoFontBackend> {
    fn default() -> Self {
        Self::with_backend(EgRenderConfig::default(), MonoFontBackend)
    }
}

impl<B> EgOverlayRenderer<B>
where
    B: FontBackend,
{
    pub fn with_backend(cfg: EgRenderConfig, backend: B) -> Self {
        Self::with_backend_and_image_limits(cfg, backend, ImageRegistryLimits::default())
    }

    pub fn with_backend_and_image_limits(
        cfg: EgRenderConfig,
        backend: B,
        image_limits: ImageRegistryLimits,
    ) -> Self {
        Self {
            cfg,
            backend,
            images: ImageRegistry::with_limits(image_limits),
        }
    }

    pub fn config(&self) -> &EgRenderConfig {
        &self.cfg
    }

    /// Register or replace a decoded bitmap for an image `src`.
    pub fn register_image_bitmap(
        &mut self,
        src: impl Into<String>,
        bitmap: MonochromeBitmap,
    ) -> Result<(), ImageRegistryError> {
        self.images.register(src.into(), bitmap)
    }

    /// Decode `src` as a data URL and register it under the same key.
    pub fn register_image_data_url(&mut self, src: &str) -> Result<(), ImageRegistryError> {
        let bitmap = MonochromeBitmap::from_data_url(src)?;
        self.images.register(src.to_string(), bitmap)
    }

    /// Decode and register every image the page references that is not yet
    /// known. Failures are logged and left to the draw-time fallback.
    pub fn register_page_images(&mut self, page: &RenderPage) -> usize {
        let mut registered = 0usize;
        for cmd in &page.overlay_commands {
            let DrawCommand::Image(image) = cmd else {
                continue;
            };
            if self.images.contains(&image.src) {
                continue;
            }
            match self.register_image_data_url(&image.src) {
                Ok(()) => registered += 1,
                Err(err) => log::warn!(
                    "signature image for field {} unavailable: {}",
                    image.field_id,
                    err
                ),
            }
        }
        registered
    }

    pub fn registered_image_count(&self) -> usize {
        self.images.len()
    }

    /// Render a page overlay to a draw target.
    pub fn render_page<D>(&self, page: &RenderPage, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        self.render_page_with_diagnostics(page, display).map(|_| ())
    }

    /// Render a page overlay and return fallback counters.
    pub fn render_page_with_diagnostics<D>(
        &self,
        page: &RenderPage,
        display: &mut D,
    ) -> Result<EgRenderDiagnostics, D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let mut diagnostics = EgRenderDiagnostics::default();
        if self.cfg.clear_first {
            display.clear(BinaryColor::Off)?;
        }
        for cmd in &page.overlay_commands {
            self.draw_command(display, cmd, &mut diagnostics)?;
        }
        Ok(diagnostics)
    }

    fn draw_command<D>(
        &self,
        display: &mut D,
        cmd: &DrawCommand,
        diagnostics: &mut EgRenderDiagnostics,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        match cmd {
            DrawCommand::FieldBox(field_box) => self.draw_field_box(display, field_box),
            DrawCommand::Text(text) => self.draw_text(display, text, diagnostics),
            DrawCommand::Image(image) => self.draw_image(display, image, diagnostics),
            DrawCommand::Mark(mark) => self.draw_mark(display, mark),
        }
    }

    fn draw_field_box<D>(&self, display: &mut D, cmd: &FieldBoxCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let mut stroke = cmd.border_width.round().max(1.0) as u32;
        if cmd.state.is_emphasized() {
            stroke += self.cfg.selected_border_boost;
        }
        DrawWindow::around(&*display, stroke)
            .rectangle(cmd.rect)
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, stroke))
            .draw(display)
    }

    fn draw_text<D>(
        &self,
        display: &mut D,
        cmd: &TextCommand,
        diagnostics: &mut EgRenderDiagnostics,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let selection = self.backend.resolve_font(&cmd.font);
        if selection.fallback_reason.is_some() {
            diagnostics.font_fallbacks = diagnostics.font_fallbacks.saturating_add(1);
        }
        let metrics = self.backend.metrics(selection.font_id);
        let glyphs = cmd.text.chars().count() as i64;
        let width = glyphs.saturating_mul(i64::from(metrics.char_width));
        let height = i64::from(metrics.line_height);
        let window = DrawWindow::around(&*display, 0);
        let Some(origin) = window.text_origin(cmd.x, cmd.y, width, height) else {
            return Ok(());
        };
        self.backend
            .draw_text_run(display, selection.font_id, &cmd.text, origin)?;
        Ok(())
    }

    fn draw_image<D>(
        &self,
        display: &mut D,
        image: &ImageCommand,
        diagnostics: &mut EgRenderDiagnostics,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let Some(bitmap) = self.images.bitmap_for(&image.src) else {
            log::debug!("no bitmap registered for field {}", image.field_id);
            return match self.cfg.image_fallback {
                ImageFallbackPolicy::Skip => {
                    diagnostics.images_skipped = diagnostics.images_skipped.saturating_add(1);
                    Ok(())
                }
                ImageFallbackPolicy::Outline => {
                    diagnostics.image_fallbacks = diagnostics.image_fallbacks.saturating_add(1);
                    DrawWindow::around(&*display, 1)
                        .rectangle(image.rect.inset(2.0))
                        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
                        .draw(display)
                }
            };
        };
        let placed = image.placement(bitmap.width() as f32, bitmap.height() as f32);
        draw_bitmap_scaled(display, bitmap, placed)
    }

    fn draw_mark<D>(&self, display: &mut D, mark: &MarkCommand) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let stroke = mark.stroke_width.round().max(1.0) as u32;
        let style = PrimitiveStyle::with_stroke(BinaryColor::On, stroke);
        let window = DrawWindow::around(&*display, stroke);
        let [a, b, c] = mark.polyline();
        for (from, to) in [(a, b), (b, c)] {
            if let Some((from, to)) = window.segment(from, to) {
                Line::new(from, to).into_styled(style).draw(display)?;
            }
        }
        Ok(())
    }
}

/// Display bounds grown by a stroke margin, in i64 so page-space
/// coordinates far outside the display never overflow.
#[derive(Clone, Copy, Debug)]
struct DrawWindow {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
}

impl DrawWindow {
    fn around<D: Dimensions>(display: &D, margin: u32) -> Self {
        let bounds = display.bounding_box();
        let margin = i64::from(margin) + 1;
        let left = i64::from(bounds.top_left.x) - margin;
        let top = i64::from(bounds.top_left.y) - margin;
        let limit = |v: i64| v.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
        Self {
            left: limit(left),
            top: limit(top),
            right: limit(left + i64::from(bounds.size.width) + 2 * margin),
            bottom: limit(top + i64::from(bounds.size.height) + 2 * margin),
        }
    }

    fn clamp_x(&self, x: f32) -> i32 {
        (x.round() as i64).clamp(self.left, self.right) as i32
    }

    fn clamp_y(&self, y: f32) -> i32 {
        (y.round() as i64).clamp(self.top, self.bottom) as i32
    }

    /// Edges past the window are pulled onto it, so they stay off screen.
    fn rectangle(&self, rect: PixelRect) -> Rectangle {
        let (left, right) = (self.clamp_x(rect.x), self.clamp_x(rect.right()));
        let (top, bottom) = (self.clamp_y(rect.y), self.clamp_y(rect.bottom()));
        Rectangle::new(
            Point::new(left, top),
            Size::new(
                (i64::from(right) - i64::from(left)).max(1) as u32,
                (i64::from(bottom) - i64::from(top)).max(1) as u32,
            ),
        )
    }

    /// Origin of a text run, or `None` when the run cannot touch the window.
    fn text_origin(&self, x: f32, y: f32, width: i64, height: i64) -> Option<Point> {
        let (x, y) = (x.round() as i64, y.round() as i64);
        if x > self.right
            || y > self.bottom
            || x.saturating_add(width) < self.left
            || y.saturating_add(height) < self.top
        {
            return None;
        }
        Some(Point::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))
    }

    /// Liang-Barsky clip of `a`-`b` against the window.
    fn segment(&self, a: PixelPoint, b: PixelPoint) -> Option<(Point, Point)> {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let (mut t0, mut t1) = (0.0f32, 1.0f32);
        let edges = [
            (-dx, a.x - self.left as f32),
            (dx, self.right as f32 - a.x),
            (-dy, a.y - self.top as f32),
            (dy, self.bottom as f32 - a.y),
        ];
        for (p, q) in edges {
            if !p.is_finite() || !q.is_finite() {
                return None;
            }
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }
        let at = |t: f32| Point::new(self.clamp_x(a.x + t * dx), self.clamp_y(a.y + t * dy));
        Some((at(t0), at(t1)))
    }
}

/// Nearest-neighbour scale of `bitmap` into `dest`, visiting only the pixels
/// that land on the display.
fn draw_bitmap_scaled<D>(
    display: &mut D,
    bitmap: &MonochromeBitmap,
    dest: PixelRect,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let left = dest.x.round() as i64;
    let top = dest.y.round() as i64;
    let width = (dest.right().round() as i64).saturating_sub(left).max(1);
    let height = (dest.bottom().round() as i64).saturating_sub(top).max(1);

    let bounds = display.bounding_box();
    let clip_left = i64::from(bounds.top_left.x);
    let clip_top = i64::from(bounds.top_left.y);
    let x0 = left.max(clip_left);
    let x1 = left
        .saturating_add(width)
        .min(clip_left + i64::from(bounds.size.width));
    let y0 = top.max(clip_top);
    let y1 = top
        .saturating_add(height)
        .min(clip_top + i64::from(bounds.size.height));
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    let sample = |offset: i64, origin: i64, extent: i64, src: u32| -> u32 {
        ((i128::from(offset) - i128::from(origin)) * i128::from(src) / i128::from(extent)) as u32
    };
    for y in y0..y1 {
        let src_y = sample(y, top, height, bitmap.height());
        display.draw_iter((x0..x1).filter_map(|x| {
            let src_x = sample(x, left, width, bitmap.width());
            bitmap
                .pixel_is_on(src_x, src_y)
                .then_some(Pixel(Point::new(x as i32, y as i32), BinaryColor::On))
        }))?;
    }
    Ok(())
}
