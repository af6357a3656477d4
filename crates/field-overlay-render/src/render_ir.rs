use field_overlay::{FieldId, FieldKind, FontSpec, PixelPoint, PixelRect};
use serde::Serialize;

/// Overlay for one document page as backend-agnostic draw commands.
///
/// Coordinates are display pixels relative to the page's top-left corner at
/// `scale`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPage {
    /// 1-based page number.
    pub page_number: u32,
    /// Render scale the commands were laid out at.
    pub scale: f32,
    /// Displayed page width in pixels.
    pub width_px: f32,
    /// Displayed page height in pixels.
    pub height_px: f32,
    /// Draw commands in paint order.
    pub overlay_commands: Vec<DrawCommand>,
    /// Click targets, present only in interactive mode.
    pub hit_regions: Vec<HitRegion>,
}

impl RenderPage {
    const INITIAL_OVERLAY_COMMAND_CAPACITY: usize = 4;

    /// Create an empty page.
    pub fn new(page_number: u32, scale: f32, width_px: f32, height_px: f32) -> Self {
        Self {
            page_number,
            scale,
            width_px,
            height_px,
            // Empty pages stay allocation-free.
            overlay_commands: Vec::with_capacity(0),
            hit_regions: Vec::with_capacity(0),
        }
    }

    /// Clear all commands and reset for reuse, preserving allocated capacity.
    pub fn clear_for_reuse(
        &mut self,
        page_number: u32,
        scale: f32,
        width_px: f32,
        height_px: f32,
    ) {
        self.page_number = page_number;
        self.scale = scale;
        self.width_px = width_px;
        self.height_px = height_px;
        self.overlay_commands.clear();
        self.hit_regions.clear();
    }

    /// Push an overlay command.
    pub fn push_overlay_command(&mut self, cmd: DrawCommand) {
        if self.overlay_commands.capacity() == 0 {
            self.overlay_commands
                .reserve(Self::INITIAL_OVERLAY_COMMAND_CAPACITY);
        }
        self.overlay_commands.push(cmd);
    }

    pub fn push_hit_region(&mut self, region: HitRegion) {
        self.hit_regions.push(region);
    }

    /// Field under `point`. Later regions are painted on top and win.
    pub fn hit_test(&self, point: PixelPoint) -> Option<&FieldId> {
        self.hit_regions
            .iter()
            .rev()
            .find(|region| region.rect.contains(point))
            .map(|region| &region.field_id)
    }

    /// Commands emitted for one field, in paint order.
    pub fn commands_for<'a>(
        &'a self,
        field_id: &'a FieldId,
    ) -> impl Iterator<Item = &'a DrawCommand> {
        self.overlay_commands
            .iter()
            .filter(move |cmd| cmd.field_id() == field_id)
    }
}

/// Backend-agnostic draw command.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Bordered field box. Always emitted, filled or not.
    FieldBox(FieldBoxCommand),
    /// One line of field text.
    Text(TextCommand),
    /// Signature image.
    Image(ImageCommand),
    /// Checkbox mark.
    Mark(MarkCommand),
}

impl DrawCommand {
    pub fn field_id(&self) -> &FieldId {
        match self {
            Self::FieldBox(cmd) => &cmd.field_id,
            Self::Text(cmd) => &cmd.field_id,
            Self::Image(cmd) => &cmd.field_id,
            Self::Mark(cmd) => &cmd.field_id,
        }
    }
}

/// Visual state of a field box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BoxState {
    /// Read-only, no value.
    Empty,
    /// Read-only, has a value.
    Filled,
    /// Interactive, in the selection.
    Selected,
    /// Interactive, not in the selection.
    Unselected,
}

impl BoxState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Filled => "filled",
            Self::Selected => "selected",
            Self::Unselected => "unselected",
        }
    }

    /// True for states drawn with the emphasis border.
    pub fn is_emphasized(self) -> bool {
        matches!(self, Self::Selected)
    }
}

/// Field box command.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldBoxCommand {
    pub field_id: FieldId,
    pub kind: FieldKind,
    pub rect: PixelRect,
    pub state: BoxState,
    /// Border thickness in pixels.
    pub border_width: f32,
}

/// Text line command.
#[derive(Clone, Debug, PartialEq)]
pub struct TextCommand {
    pub field_id: FieldId,
    /// Left x of the line.
    pub x: f32,
    /// Top y of the line box.
    pub y: f32,
    pub text: String,
    pub font: FontSpec,
    /// Line advance in pixels.
    pub line_height: f32,
    /// Drawn as a placeholder hint rather than a value.
    pub placeholder: bool,
    /// Whether backends may clip to the field box. Field text is never clipped.
    pub clip: bool,
}

/// How an image is placed inside its box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageFit {
    /// Scale to fit, keep aspect ratio, centre.
    #[default]
    Contain,
}

/// Image command.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageCommand {
    pub field_id: FieldId,
    /// Image reference, usually a `data:` URL.
    pub src: String,
    /// Field box the image is placed in.
    pub rect: PixelRect,
    pub fit: ImageFit,
}

impl ImageCommand {
    /// Destination rectangle for an image of the given intrinsic size.
    pub fn placement(&self, intrinsic_width: f32, intrinsic_height: f32) -> PixelRect {
        match self.fit {
            ImageFit::Contain => self.rect.fit_inside(intrinsic_width, intrinsic_height),
        }
    }
}

/// Checkbox mark command.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkCommand {
    pub field_id: FieldId,
    pub center: PixelPoint,
    /// Edge length of the mark's square bounding box.
    pub size: f32,
    /// Stroke thickness in pixels.
    pub stroke_width: f32,
}

impl MarkCommand {
    /// Polyline of the check mark, three points.
    pub fn polyline(&self) -> [PixelPoint; 3] {
        let half = self.size / 2.0;
        let PixelPoint { x, y } = self.center;
        [
            PixelPoint::new(x - half, y),
            PixelPoint::new(x - half / 3.0, y + half * 2.0 / 3.0),
            PixelPoint::new(x + half, y - half * 2.0 / 3.0),
        ]
    }
}

/// Click target for one field.
#[derive(Clone, Debug, PartialEq)]
pub struct HitRegion {
    pub field_id: FieldId,
    pub rect: PixelRect,
}
