mod common;

use core::convert::Infallible;

use common::fixtures::{field_fixtures, load_fields, page_count};
use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    pixelcolor::BinaryColor,
    Pixel,
};
use field_overlay::{
    compute_scale, FieldId, FieldSelection, ScaleBounds, ScaleConfig, SignaturePad, ViewportPoint,
};
use field_overlay_embedded_graphics::{
    encode_signature, CaptureCanvas, EgOverlayRenderer, EgTextMeasurer,
};
use field_overlay_render::{BoxState, DrawCommand, OverlayConfig, OverlayRenderer, RenderPage};

const DISPLAY_WIDTH: u32 = 480;
const DISPLAY_HEIGHT: u32 = 800;

#[derive(Default)]
struct PixelCaptureDisplay {
    size: Size,
    on_pixels: usize,
    max_point: Point,
}

impl PixelCaptureDisplay {
    fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            ..Self::default()
        }
    }
}

impl OriginDimensions for PixelCaptureDisplay {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for PixelCaptureDisplay {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if color == BinaryColor::On {
                self.on_pixels += 1;
                self.max_point = self.max_point.component_max(point);
            }
        }
        Ok(())
    }
}

fn device_renderer(interactive: bool) -> OverlayRenderer {
    OverlayRenderer::builder(OverlayConfig {
        interactive,
        ..OverlayConfig::default()
    })
    .with_text_measurer(EgTextMeasurer::shared())
    .build()
    .unwrap_or_else(|e| panic!("overlay renderer: {}", e))
}

fn render_to_display(eg: &EgOverlayRenderer, page: &RenderPage, fixture: &str) -> usize {
    let mut display = PixelCaptureDisplay::new(DISPLAY_WIDTH, DISPLAY_HEIGHT);
    eg.render_page(page, &mut display)
        .unwrap_or_else(|e| match e {});
    assert!(
        display.on_pixels > 0,
        "render produced no pixels for fixture {} page {}",
        fixture,
        page.page_number
    );
    assert!(
        display.max_point.x <= page.width_px.ceil() as i32 + 2,
        "fixture {} page {} drew past the page edge",
        fixture,
        page.page_number
    );
    display.on_pixels
}

#[test]
fn device_fit_layout_draw_loop_is_stable() {
    let fixtures = field_fixtures();
    assert!(
        !fixtures.is_empty(),
        "No fixtures found under tests/fixtures. Cannot run device-path test."
    );

    let overlay = device_renderer(false);
    let scale = compute_scale(
        DISPLAY_WIDTH as f32,
        &ScaleConfig::with_bounds(ScaleBounds::VIEWER),
    );
    for fixture in fixtures {
        let fields = load_fields(fixture);
        let mut eg = EgOverlayRenderer::default();
        for page_number in 1..=page_count(&fields) {
            let page = overlay.render_page(&fields, page_number, scale, None);
            eg.register_page_images(&page);
            render_to_display(&eg, &page, fixture);
        }
    }
}

#[test]
fn fitted_text_never_exceeds_box_width_on_device_fonts() {
    let overlay = device_renderer(false);
    let measurer = EgTextMeasurer::new();
    let fields = load_fields(common::fixtures::CONSENT_FORM);
    let scale = compute_scale(
        DISPLAY_WIDTH as f32,
        &ScaleConfig::with_bounds(ScaleBounds::VIEWER),
    );
    let page = overlay.render_page(&fields, 1, scale, None);
    for cmd in &page.overlay_commands {
        let DrawCommand::Text(text) = cmd else {
            continue;
        };
        let field = fields
            .iter()
            .find(|f| f.id == text.field_id)
            .unwrap_or_else(|| panic!("text for unknown field {}", text.field_id));
        let rect = field.pixel_rect(overlay.config().page, page.scale);
        let width = field_overlay::TextMeasurer::measure_text_px(&measurer, &text.text, &text.font);
        assert!(
            width <= rect.width - overlay.config().fit.padding_px || !text.text.contains(' '),
            "{:?} is {}px in a {}px box",
            text.text,
            width,
            rect.width
        );
    }
}

#[test]
fn picker_selection_draws_heavier_border() {
    let overlay = device_renderer(true);
    let fields = load_fields(common::fixtures::LEASE_CONTRACT);
    let scale = compute_scale(
        DISPLAY_WIDTH as f32,
        &ScaleConfig::with_bounds(ScaleBounds::CORRECTION),
    );
    let eg = EgOverlayRenderer::default();

    let none = overlay.render_page(&fields, 1, scale, Some(&FieldSelection::new()));
    let mut selection = FieldSelection::new();
    selection.toggle(&FieldId::from("deposit"));
    let some = overlay.render_page(&fields, 1, scale, Some(&selection));

    let selected: Vec<_> = some
        .overlay_commands
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCommand::FieldBox(b) if b.state == BoxState::Selected => Some(b.field_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(selected, ["deposit"]);
    assert!(
        render_to_display(&eg, &some, common::fixtures::LEASE_CONTRACT)
            > render_to_display(&eg, &none, common::fixtures::LEASE_CONTRACT)
    );
}

#[test]
fn captured_signature_fills_the_signature_field() {
    let fixture = common::fixtures::LEASE_CONTRACT;
    let mut fields = load_fields(fixture);

    let canvas = CaptureCanvas::new(800, 1131, 24).unwrap_or_else(|e| panic!("canvas: {}", e));
    let mut pad = SignaturePad::new(canvas).unwrap_or_else(|e| panic!("pad: {}", e));
    pad.set_layout(0.0, 100.0, 400.0, 565.5);
    pad.pointer_down(ViewportPoint::new(40.0, 300.0));
    pad.pointer_move(ViewportPoint::new(360.0, 380.0));
    pad.pointer_up();
    let snapshot = pad.latest_snapshot().unwrap_or_else(|| panic!("no snapshot"));
    let payload = encode_signature(snapshot).unwrap_or_else(|e| panic!("encode: {}", e));

    let signature = fields
        .iter_mut()
        .find(|f| f.id.as_str() == "tenant-signature")
        .unwrap_or_else(|| panic!("fixture {} lacks a signature field", fixture));
    signature.value = Some(payload.data_url);

    let overlay = device_renderer(false);
    let scale = compute_scale(
        DISPLAY_WIDTH as f32,
        &ScaleConfig::with_bounds(ScaleBounds::SIGNING),
    );
    let page = overlay.render_page(&fields, 2, scale, None);
    let mut eg = EgOverlayRenderer::default();
    assert_eq!(eg.register_page_images(&page), 1);

    let mut display = PixelCaptureDisplay::new(DISPLAY_WIDTH, DISPLAY_HEIGHT);
    let diagnostics = eg
        .render_page_with_diagnostics(&page, &mut display)
        .unwrap_or_else(|e| match e {});
    assert_eq!(diagnostics.image_fallbacks, 0);
    assert_eq!(diagnostics.images_skipped, 0);
}
