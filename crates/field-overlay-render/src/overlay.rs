use std::sync::Arc;

use field_overlay::{
    fields_on_page, Field, FieldKind, FieldSelection, FieldValue, FitConfig, FontFitter, FontSpec,
    OverlayError, PageSize, PixelPoint, PixelRect, RenderScale, TextMeasurer,
};

use crate::render_ir::{
    BoxState, DrawCommand, FieldBoxCommand, HitRegion, ImageCommand, ImageFit, MarkCommand,
    RenderPage, TextCommand,
};

/// Overlay renderer configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayConfig {
    /// Selection mode: boxes show selected/unselected and become click targets.
    pub interactive: bool,
    /// Font fitting constants.
    pub fit: FitConfig,
    /// Base font; its size is replaced by the fitted size.
    pub font: FontSpec,
    /// Logical page the field geometry is relative to.
    pub page: PageSize,
    /// Field box border thickness in pixels.
    pub border_width: f32,
    /// Hint shown in empty confirm-text fields.
    pub confirm_placeholder: String,
    /// Checkbox mark size as a share of the shorter box edge.
    pub mark_ratio: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            interactive: false,
            fit: FitConfig::default(),
            font: FontSpec::default(),
            page: PageSize::A4,
            border_width: 1.0,
            confirm_placeholder: String::from("Type the text to confirm"),
            mark_ratio: 0.6,
        }
    }
}

impl OverlayConfig {
    /// Configuration for the correction-request field picker.
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), OverlayError> {
        if !self.border_width.is_finite() || self.border_width < 0.0 {
            return Err(OverlayError::config(
                OverlayError::INVALID_FIT_CONFIG,
                format!("border width must be >= 0, got {}", self.border_width),
            ));
        }
        if !(self.mark_ratio > 0.0 && self.mark_ratio <= 1.0) {
            return Err(OverlayError::config(
                OverlayError::INVALID_FIT_CONFIG,
                format!("mark ratio must be in (0, 1], got {}", self.mark_ratio),
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

/// Builder for [`OverlayRenderer`].
#[derive(Clone)]
pub struct OverlayRendererBuilder {
    cfg: OverlayConfig,
    measurer: Option<Arc<dyn TextMeasurer>>,
}

impl OverlayRendererBuilder {
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.measurer = Some(measurer);
        self
    }

    /// Fails with `MISSING_TEXT_MEASURER` when no measurer was supplied.
    pub fn build(self) -> Result<OverlayRenderer, OverlayError> {
        self.cfg.validate()?;
        let fitter = FontFitter::builder()
            .config(self.cfg.fit)
            .font(self.cfg.font.clone())
            .maybe_text_measurer(self.measurer)
            .build()?;
        Ok(OverlayRenderer {
            cfg: self.cfg,
            fitter,
        })
    }
}

/// Paints field overlays for one page at a time.
///
/// One renderer serves both the read-only views and the correction picker;
/// [`OverlayConfig::interactive`] switches between them.
#[derive(Clone, Debug)]
pub struct OverlayRenderer {
    cfg: OverlayConfig,
    fitter: FontFitter,
}

impl OverlayRenderer {
    pub fn builder(cfg: OverlayConfig) -> OverlayRendererBuilder {
        OverlayRendererBuilder {
            cfg,
            measurer: None,
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.cfg
    }

    pub fn fitter(&self) -> &FontFitter {
        &self.fitter
    }

    /// Lay out the overlay for `page_number`.
    ///
    /// `selection` is consulted only in interactive mode; `None` there means
    /// nothing is selected.
    pub fn render_page(
        &self,
        fields: &[Field],
        page_number: u32,
        scale: RenderScale,
        selection: Option<&FieldSelection>,
    ) -> RenderPage {
        let mut page = RenderPage::default();
        self.render_page_into(fields, page_number, scale, selection, &mut page);
        page
    }

    /// [`render_page`](Self::render_page) into a reused page buffer.
    pub fn render_page_into(
        &self,
        fields: &[Field],
        page_number: u32,
        scale: RenderScale,
        selection: Option<&FieldSelection>,
        out: &mut RenderPage,
    ) {
        let scale = scale.get();
        let (width_px, height_px) = self.cfg.page.scaled(scale);
        out.clear_for_reuse(page_number, scale, width_px, height_px);
        let mut count = 0usize;
        for field in fields_on_page(fields, page_number) {
            self.render_field(field, scale, selection, out);
            count += 1;
        }
        log::debug!(
            "overlay page={} scale={:.3} fields={} commands={} interactive={}",
            page_number,
            scale,
            count,
            out.overlay_commands.len(),
            self.cfg.interactive
        );
    }

    fn render_field(
        &self,
        field: &Field,
        scale: f32,
        selection: Option<&FieldSelection>,
        out: &mut RenderPage,
    ) {
        let rect = field.pixel_rect(self.cfg.page, scale);
        let value = field.value();
        let state = if self.cfg.interactive {
            if selection.is_some_and(|sel| sel.is_selected(&field.id)) {
                BoxState::Selected
            } else {
                BoxState::Unselected
            }
        } else if !field.is_filled() {
            BoxState::Empty
        } else {
            BoxState::Filled
        };
        out.push_overlay_command(DrawCommand::FieldBox(FieldBoxCommand {
            field_id: field.id.clone(),
            kind: field.kind,
            rect,
            state,
            border_width: self.cfg.border_width,
        }));

        match value {
            FieldValue::Image(src) => {
                out.push_overlay_command(DrawCommand::Image(ImageCommand {
                    field_id: field.id.clone(),
                    src: src.to_string(),
                    rect,
                    fit: ImageFit::Contain,
                }));
            }
            FieldValue::Text(text) => self.push_text(field, text, rect, false, out),
            FieldValue::Checked(true) => {
                let size = rect.width.min(rect.height).max(0.0) * self.cfg.mark_ratio;
                out.push_overlay_command(DrawCommand::Mark(MarkCommand {
                    field_id: field.id.clone(),
                    center: rect.center(),
                    size,
                    stroke_width: (size / 8.0).max(1.0),
                }));
            }
            FieldValue::Checked(false) => {}
            FieldValue::Unfilled => {
                let placeholder = self.cfg.confirm_placeholder.as_str();
                if field.kind == FieldKind::ConfirmText && !placeholder.is_empty() {
                    self.push_text(field, placeholder, rect, true, out);
                }
            }
        }

        if self.cfg.interactive {
            out.push_hit_region(HitRegion {
                field_id: field.id.clone(),
                rect,
            });
        }
    }

    /// Fit once over the whole value, then break on explicit newlines and
    /// wrap each paragraph at the fitted size. Every word is emitted.
    fn push_text(
        &self,
        field: &Field,
        text: &str,
        rect: PixelRect,
        placeholder: bool,
        out: &mut RenderPage,
    ) {
        let font_size = self.fitter.fit(text, rect.width, rect.height);
        let fit = self.fitter.config();
        let line_height = font_size * fit.line_height_factor;
        let font = self.fitter.font().at_size(font_size);
        let inset = fit.padding_px / 2.0;
        let origin = PixelPoint::new(rect.x + inset, rect.y + inset);
        let mut line_index = 0usize;
        for paragraph in text.split('\n') {
            let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
            for line in self.fitter.wrap_lines(paragraph, font_size, rect.width) {
                out.push_overlay_command(DrawCommand::Text(TextCommand {
                    field_id: field.id.clone(),
                    x: origin.x,
                    y: origin.y + line_index as f32 * line_height,
                    text: line,
                    font: font.clone(),
                    line_height,
                    placeholder,
                    clip: false,
                }));
                line_index += 1;
            }
        }
        log::trace!(
            "field {} text lines={} size={}",
            field.id,
            line_index,
            font_size
        );
    }
}
