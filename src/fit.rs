//! Dynamic font-size fitting for text painted into field boxes.
//!
//! The search walks font sizes downward from `max_font_size` in fixed steps
//! and returns the first size whose greedy word wrap fits the box. The
//! result must match what existing documents were rendered with, so the
//! wrap rules are kept deliberately simple: words are split on single
//! spaces, newlines are ordinary characters, and an over-long word is left
//! whole on its own line.

use std::sync::Arc;

use crate::error::OverlayError;

/// Font description handed to the measurer.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    /// Family name or stack, as the host understands it.
    pub family: Arc<str>,
    /// Size in pixels.
    pub size_px: f32,
    /// Numeric weight.
    pub weight: u16,
}

impl FontSpec {
    pub fn new(family: impl Into<Arc<str>>, size_px: f32) -> Self {
        Self {
            family: family.into(),
            size_px,
            weight: 400,
        }
    }

    /// Same family and weight at another size.
    pub fn at_size(&self, size_px: f32) -> Self {
        Self {
            family: Arc::clone(&self.family),
            size_px,
            weight: self.weight,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new("sans-serif", 14.0)
    }
}

/// Host-supplied text width measurement.
pub trait TextMeasurer: Send + Sync {
    /// Width in pixels of `text` rendered with `font`.
    fn measure_text_px(&self, text: &str, font: &FontSpec) -> f32;
}

impl<F> TextMeasurer for F
where
    F: Fn(&str, &FontSpec) -> f32 + Send + Sync,
{
    fn measure_text_px(&self, text: &str, font: &FontSpec) -> f32 {
        self(text, font)
    }
}

/// Fitting constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitConfig {
    /// First (largest) size tried.
    pub max_font_size: f32,
    /// Floor size, also the degenerate-input answer.
    pub min_font_size: f32,
    /// Decrement between tries.
    pub step: f32,
    /// Subtracted from the box width and height.
    pub padding_px: f32,
    /// Line advance as a multiple of font size.
    pub line_height_factor: f32,
    /// Extra vertical slack subtracted from the height budget.
    pub safety_margin_px: f32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_font_size: 14.0,
            min_font_size: 8.0,
            step: 0.5,
            padding_px: 4.0,
            line_height_factor: 1.2,
            safety_margin_px: 2.0,
        }
    }
}

impl FitConfig {
    /// Upper bound on fitting iterations.
    pub const MAX_STEPS: usize = 1024;

    pub fn validate(&self) -> Result<(), OverlayError> {
        let finite = [
            self.max_font_size,
            self.min_font_size,
            self.step,
            self.padding_px,
            self.line_height_factor,
            self.safety_margin_px,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(OverlayError::config(
                OverlayError::INVALID_FIT_CONFIG,
                "fit constants must be finite",
            ));
        }
        if self.min_font_size <= 0.0 || self.min_font_size > self.max_font_size {
            return Err(OverlayError::config(
                OverlayError::INVALID_FIT_CONFIG,
                format!(
                    "font bounds must satisfy 0 < min <= max, got {}..{}",
                    self.min_font_size, self.max_font_size
                ),
            ));
        }
        if self.step <= 0.0 {
            return Err(OverlayError::config(
                OverlayError::INVALID_FIT_CONFIG,
                format!("font step must be positive, got {}", self.step),
            ));
        }
        if self.step_count() > Self::MAX_STEPS {
            return Err(OverlayError::config(
                OverlayError::INVALID_FIT_CONFIG,
                format!(
                    "font search would take {} steps (limit {})",
                    self.step_count(),
                    Self::MAX_STEPS
                ),
            ));
        }
        if self.line_height_factor <= 0.0 {
            return Err(OverlayError::config(
                OverlayError::INVALID_FIT_CONFIG,
                "line height factor must be positive",
            ));
        }
        Ok(())
    }

    /// Number of sizes tried, counting both ends.
    pub fn step_count(&self) -> usize {
        if self.step <= 0.0 || self.max_font_size < self.min_font_size {
            return 1;
        }
        // Small epsilon so 14..8 by 0.5 yields 13 sizes despite float error.
        ((self.max_font_size - self.min_font_size) / self.step + 1e-4).floor() as usize + 1
    }

    /// Size tried at iteration `index`.
    fn size_at(&self, index: usize) -> f32 {
        self.max_font_size - index as f32 * self.step
    }

    /// Height left for text lines inside a box of `box_height`.
    pub fn available_height(&self, box_height: f32) -> f32 {
        box_height - self.padding_px - self.safety_margin_px
    }

    /// Width left for one line inside a box of `box_width`.
    pub fn available_width(&self, box_width: f32) -> f32 {
        box_width - self.padding_px
    }
}

/// Result of a fit including the wrap computed at the chosen size.
#[derive(Clone, Debug, PartialEq)]
pub struct FitOutcome {
    /// Chosen font size.
    pub font_size: f32,
    /// Greedy wrap at `font_size`.
    pub lines: Vec<String>,
    /// Whether the wrap fits vertically. False means the floor size overflows.
    pub fits: bool,
}

/// Font-size fitter bound to a measurer.
#[derive(Clone)]
pub struct FontFitter {
    cfg: FitConfig,
    font: FontSpec,
    measurer: Arc<dyn TextMeasurer>,
}

impl core::fmt::Debug for FontFitter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FontFitter")
            .field("cfg", &self.cfg)
            .field("font", &self.font)
            .finish_non_exhaustive()
    }
}

/// Builder that refuses to produce a fitter without a measurer.
#[derive(Clone, Default)]
pub struct FontFitterBuilder {
    cfg: FitConfig,
    font: FontSpec,
    measurer: Option<Arc<dyn TextMeasurer>>,
}

impl FontFitterBuilder {
    pub fn config(mut self, cfg: FitConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn font(mut self, font: FontSpec) -> Self {
        self.font = font;
        self
    }

    pub fn text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = Some(measurer);
        self
    }

    pub fn maybe_text_measurer(mut self, measurer: Option<Arc<dyn TextMeasurer>>) -> Self {
        self.measurer = measurer;
        self
    }

    pub fn build(self) -> Result<FontFitter, OverlayError> {
        let Some(measurer) = self.measurer else {
            return Err(OverlayError::config(
                OverlayError::MISSING_TEXT_MEASURER,
                "font fitting requires a text measurer",
            ));
        };
        self.cfg.validate()?;
        Ok(FontFitter {
            cfg: self.cfg,
            font: self.font,
            measurer,
        })
    }
}

impl FontFitter {
    /// Fitter with validated constants.
    pub fn new(cfg: FitConfig, measurer: Arc<dyn TextMeasurer>) -> Result<Self, OverlayError> {
        Self::builder().config(cfg).text_measurer(measurer).build()
    }

    pub fn builder() -> FontFitterBuilder {
        FontFitterBuilder::default()
    }

    pub fn config(&self) -> &FitConfig {
        &self.cfg
    }

    pub fn font(&self) -> &FontSpec {
        &self.font
    }

    pub fn measurer(&self) -> &Arc<dyn TextMeasurer> {
        &self.measurer
    }

    /// Largest size in the stepped range whose wrap fits `box_width × box_height`.
    ///
    /// Never fails: degenerate input and text that overflows even at the
    /// floor both return `min_font_size`.
    pub fn fit(&self, text: &str, box_width: f32, box_height: f32) -> f32 {
        let cfg = &self.cfg;
        if text.is_empty() || !(box_width > 0.0) || !(box_height > 0.0) {
            return cfg.min_font_size;
        }
        let max_line_width = cfg.available_width(box_width);
        let available_height = cfg.available_height(box_height);
        let mut scratch = String::with_capacity(text.len());
        for index in 0..cfg.step_count() {
            let font_size = cfg.size_at(index);
            let font = self.font.at_size(font_size);
            let line_count = self.count_lines(text, &font, max_line_width, &mut scratch);
            let total_height = line_count as f32 * font_size * cfg.line_height_factor;
            log::trace!(
                "fit size={font_size} lines={line_count} text_h={total_height:.2} avail_h={available_height:.2}"
            );
            if total_height <= available_height && available_height > 0.0 {
                return font_size;
            }
        }
        cfg.min_font_size
    }

    /// [`fit`](Self::fit) plus the wrap at the chosen size.
    pub fn fit_with_lines(&self, text: &str, box_width: f32, box_height: f32) -> FitOutcome {
        let font_size = self.fit(text, box_width, box_height);
        let lines = self.wrap_lines(text, font_size, box_width);
        let total_height = lines.len() as f32 * font_size * self.cfg.line_height_factor;
        let available_height = self.cfg.available_height(box_height);
        FitOutcome {
            font_size,
            fits: !lines.is_empty() && total_height <= available_height && available_height > 0.0,
            lines,
        }
    }

    /// Greedy wrap of `text` at `font_size` into lines no wider than
    /// `box_width - padding`, except for words that are wider on their own.
    pub fn wrap_lines(&self, text: &str, font_size: f32, box_width: f32) -> Vec<String> {
        let font = self.font.at_size(font_size);
        let max_line_width = self.cfg.available_width(box_width);
        let mut lines = Vec::new();
        let mut current = String::new();
        for word in text.split(' ') {
            if self.extend_fits(&mut current, word, &font, max_line_width) {
                continue;
            }
            lines.push(core::mem::take(&mut current));
            current.push_str(word);
        }
        if !current.is_empty() || lines.is_empty() {
            lines.push(current);
        }
        lines
    }

    fn count_lines(
        &self,
        text: &str,
        font: &FontSpec,
        max_line_width: f32,
        current: &mut String,
    ) -> usize {
        current.clear();
        let mut pushed = 0usize;
        for word in text.split(' ') {
            if self.extend_fits(current, word, font, max_line_width) {
                continue;
            }
            pushed += 1;
            current.clear();
            current.push_str(word);
        }
        if !current.is_empty() || pushed == 0 {
            pushed += 1;
        }
        pushed
    }

    /// Append `word` to `line` if the result fits, or if `line` is empty.
    /// Returns false, leaving `line` untouched, when the word must start a
    /// new line.
    fn extend_fits(&self, line: &mut String, word: &str, font: &FontSpec, max_width: f32) -> bool {
        if line.is_empty() {
            line.push_str(word);
            return true;
        }
        let restore = line.len();
        line.push(' ');
        line.push_str(word);
        if self.measurer.measure_text_px(line, font) <= max_width {
            return true;
        }
        line.truncate(restore);
        false
    }
}
