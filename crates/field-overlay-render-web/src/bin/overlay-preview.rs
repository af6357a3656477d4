use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use field_overlay::{
    available_width, compute_scale, fields_from_json, Field, FieldId, FieldSelection, FitConfig,
    FontSpec, PageSize, ScaleBounds, ScaleConfig,
};
use field_overlay_render::{
    DrawCommand, HeuristicTextMeasurer, OverlayConfig, OverlayRenderer, RenderPage,
};
use field_overlay_render_web::preview::{build_html, data_url, mime_from_path};
use serde::{Deserialize, Serialize};

const DEFAULT_OUT_PATH: &str = "target/overlay-preview/index";

#[derive(Clone, Debug)]
struct Args {
    fields_path: String,
    out_path: String,
    config_path: Option<String>,
    page: Option<u32>,
    container_width: Option<f32>,
    padding: Option<f32>,
    bounds: Option<String>,
    interactive: bool,
    selected: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
struct PreviewUiConfig {
    page: u32,
    container_width: f32,
    horizontal_padding: f32,
    bounds: String,
    interactive: bool,

    page_width: f32,
    page_height: f32,
    margin_factor: f32,

    font_family: String,
    font_weight: u16,
    max_font_size: f32,
    min_font_size: f32,
    font_step: f32,
    fit_padding_px: f32,
    line_height_factor: f32,
    safety_margin_px: f32,

    border_width: f32,
    confirm_placeholder: String,
}

impl Default for PreviewUiConfig {
    fn default() -> Self {
        let fit = FitConfig::default();
        let overlay = OverlayConfig::default();
        Self {
            page: 1,
            container_width: 1000.0,
            horizontal_padding: 32.0,
            bounds: "viewer".to_string(),
            interactive: false,
            page_width: PageSize::A4.width,
            page_height: PageSize::A4.height,
            margin_factor: ScaleConfig::DEFAULT_MARGIN_FACTOR,
            font_family: overlay.font.family.to_string(),
            font_weight: overlay.font.weight,
            max_font_size: fit.max_font_size,
            min_font_size: fit.min_font_size,
            font_step: fit.step,
            fit_padding_px: fit.padding_px,
            line_height_factor: fit.line_height_factor,
            safety_margin_px: fit.safety_margin_px,
            border_width: overlay.border_width,
            confirm_placeholder: overlay.confirm_placeholder,
        }
    }
}

impl PreviewUiConfig {
    fn from_args(args: &Args, base: PreviewUiConfig) -> Self {
        Self {
            page: args.page.unwrap_or(base.page),
            container_width: args.container_width.unwrap_or(base.container_width),
            horizontal_padding: args.padding.unwrap_or(base.horizontal_padding),
            bounds: args.bounds.clone().unwrap_or_else(|| base.bounds.clone()),
            interactive: args.interactive || base.interactive,
            ..base
        }
    }

    fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.container_width = self.container_width.max(0.0);
        self.horizontal_padding = self.horizontal_padding.max(0.0);
        self.bounds = self.bounds.trim().to_ascii_lowercase();
        if self.font_family.trim().is_empty() {
            self.font_family = FontSpec::default().family.to_string();
        }
        self
    }

    fn scale_bounds(&self) -> Result<ScaleBounds, String> {
        parse_bounds(&self.bounds)
    }

    fn scale_config(&self) -> Result<ScaleConfig, String> {
        let cfg = ScaleConfig {
            margin_factor: self.margin_factor,
            page: self.page_size(),
            ..ScaleConfig::with_bounds(self.scale_bounds()?)
        };
        cfg.validate().map_err(|e| e.to_string())?;
        Ok(cfg)
    }

    fn page_size(&self) -> PageSize {
        PageSize {
            width: self.page_width,
            height: self.page_height,
        }
    }

    fn overlay_config(&self) -> OverlayConfig {
        let mut font = FontSpec::new(self.font_family.as_str(), self.max_font_size);
        font.weight = self.font_weight;
        OverlayConfig {
            interactive: self.interactive,
            fit: FitConfig {
                max_font_size: self.max_font_size,
                min_font_size: self.min_font_size,
                step: self.font_step,
                padding_px: self.fit_padding_px,
                line_height_factor: self.line_height_factor,
                safety_margin_px: self.safety_margin_px,
            },
            font,
            page: self.page_size(),
            border_width: self.border_width,
            confirm_placeholder: self.confirm_placeholder.clone(),
            ..OverlayConfig::default()
        }
    }
}

#[derive(Serialize)]
struct PreviewPayload {
    meta: PreviewMeta,
    commands: Vec<CommandPayload>,
    hit_regions: Vec<HitRegionPayload>,
    images: BTreeMap<String, String>,
    selected: Vec<String>,
    warnings: Vec<String>,
    config: PreviewUiConfig,
}

#[derive(Serialize)]
struct PreviewMeta {
    page_number: u32,
    scale: f32,
    width_px: f32,
    height_px: f32,
    field_count: usize,
    fields_on_page: usize,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum CommandPayload {
    FieldBox {
        field_id: String,
        field_kind: &'static str,
        state: &'static str,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        border_width: f32,
    },
    Text {
        field_id: String,
        x: f32,
        y: f32,
        text: String,
        family: String,
        size_px: f32,
        weight: u16,
        line_height: f32,
        placeholder: bool,
    },
    Image {
        field_id: String,
        image_key: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Mark {
        field_id: String,
        points: [[f32; 2]; 3],
        stroke_width: f32,
    },
}

#[derive(Serialize)]
struct HitRegionPayload {
    field_id: String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;
    let base = match cli.config_path.as_deref() {
        Some(path) => load_config(path)?,
        None => PreviewUiConfig::default(),
    };
    let cfg = PreviewUiConfig::from_args(&cli, base).normalized();

    if cli.out_path.is_empty() {
        return Err("--out must not be empty".to_string());
    }
    if let Some(parent) = Path::new(&cli.out_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }

    let bytes = std::fs::read(&cli.fields_path)
        .map_err(|e| format!("cannot read {}: {}", cli.fields_path, e))?;
    let fields = fields_from_json(&bytes).map_err(|e| e.to_string())?;
    let asset_dir = Path::new(&cli.fields_path)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let payload = render_preview_payload(&fields, &cfg, &cli.selected, &asset_dir)?;
    let data_json = serde_json::to_string(&payload).map_err(|e| e.to_string())?;
    let json_path = format!("{}.json", cli.out_path);
    let html_path = format!("{}.html", cli.out_path);
    std::fs::write(&json_path, &data_json).map_err(|e| e.to_string())?;
    std::fs::write(&html_path, build_html(&data_json)).map_err(|e| e.to_string())?;

    println!(
        "wrote overlay preview to {} and {} (page={}, scale={:.3}, commands={}, warnings={})",
        html_path,
        json_path,
        payload.meta.page_number,
        payload.meta.scale,
        payload.commands.len(),
        payload.warnings.len(),
    );
    Ok(())
}

fn load_config(path: &str) -> Result<PreviewUiConfig, String> {
    let raw = std::fs::read(path).map_err(|e| format!("cannot read {}: {}", path, e))?;
    serde_json::from_slice(&raw).map_err(|e| format!("invalid config {}: {}", path, e))
}

fn render_preview_payload(
    fields: &[Field],
    cfg: &PreviewUiConfig,
    selected: &[String],
    asset_dir: &Path,
) -> Result<PreviewPayload, String> {
    let scale_cfg = cfg.scale_config()?;
    let scale = compute_scale(
        available_width(cfg.container_width, cfg.horizontal_padding),
        &scale_cfg,
    );
    let renderer = OverlayRenderer::builder(cfg.overlay_config())
        .with_text_measurer(Arc::new(HeuristicTextMeasurer))
        .build()
        .map_err(|e| e.to_string())?;

    let mut selection = FieldSelection::new();
    let mut warnings = Vec::new();
    for id in selected {
        let id = FieldId::from(id.as_str());
        if !fields.iter().any(|f| f.id == id) {
            warnings.push(format!("--select {} matches no field", id.as_str()));
            continue;
        }
        if !selection.is_selected(&id) {
            selection.toggle(&id);
        }
    }
    let page = renderer.render_page(
        fields,
        cfg.page,
        scale,
        cfg.interactive.then_some(&selection),
    );

    let mut images = BTreeMap::new();
    let commands = convert_page(&page, asset_dir, &mut images, &mut warnings);
    Ok(PreviewPayload {
        meta: PreviewMeta {
            page_number: page.page_number,
            scale: page.scale,
            width_px: page.width_px,
            height_px: page.height_px,
            field_count: fields.len(),
            fields_on_page: fields.iter().filter(|f| f.page == cfg.page).count(),
        },
        commands,
        hit_regions: page
            .hit_regions
            .iter()
            .map(|region| HitRegionPayload {
                field_id: region.field_id.as_str().to_string(),
                x: region.rect.x,
                y: region.rect.y,
                width: region.rect.width,
                height: region.rect.height,
            })
            .collect(),
        images,
        selected: selection.iter().map(|id| id.as_str().to_string()).collect(),
        warnings,
        config: cfg.clone(),
    })
}

fn convert_page(
    page: &RenderPage,
    asset_dir: &Path,
    images: &mut BTreeMap<String, String>,
    warnings: &mut Vec<String>,
) -> Vec<CommandPayload> {
    let mut converted = Vec::with_capacity(page.overlay_commands.len());
    for cmd in &page.overlay_commands {
        if let Some(payload) = convert_command(cmd, asset_dir, images, warnings) {
            converted.push(payload);
        }
    }
    converted
}

fn convert_command(
    cmd: &DrawCommand,
    asset_dir: &Path,
    images: &mut BTreeMap<String, String>,
    warnings: &mut Vec<String>,
) -> Option<CommandPayload> {
    Some(match cmd {
        DrawCommand::FieldBox(field_box) => CommandPayload::FieldBox {
            field_id: field_box.field_id.as_str().to_string(),
            field_kind: field_box.kind.as_str(),
            state: field_box.state.as_str(),
            x: field_box.rect.x,
            y: field_box.rect.y,
            width: field_box.rect.width,
            height: field_box.rect.height,
            border_width: field_box.border_width,
        },
        DrawCommand::Text(text) => CommandPayload::Text {
            field_id: text.field_id.as_str().to_string(),
            x: text.x,
            y: text.y,
            text: text.text.clone(),
            family: text.font.family.to_string(),
            size_px: text.font.size_px,
            weight: text.font.weight,
            line_height: text.line_height,
            placeholder: text.placeholder,
        },
        DrawCommand::Image(image) => {
            let image_key = image.field_id.as_str().to_string();
            match resolve_image_src(&image.src, asset_dir) {
                Ok(uri) => {
                    images.insert(image_key.clone(), uri);
                }
                Err(err) => {
                    warnings.push(format!("image for {}: {}", image_key, err));
                    return None;
                }
            }
            CommandPayload::Image {
                field_id: image.field_id.as_str().to_string(),
                image_key,
                x: image.rect.x,
                y: image.rect.y,
                width: image.rect.width,
                height: image.rect.height,
            }
        }
        DrawCommand::Mark(mark) => CommandPayload::Mark {
            field_id: mark.field_id.as_str().to_string(),
            points: mark.polyline().map(|p| [p.x, p.y]),
            stroke_width: mark.stroke_width,
        },
    })
}

/// Data URLs pass through; anything else is read relative to the fields file.
fn resolve_image_src(src: &str, asset_dir: &Path) -> Result<String, String> {
    let src = src.trim();
    if src.starts_with("data:") {
        return Ok(src.to_string());
    }
    let path: PathBuf = asset_dir.join(src);
    let mime = mime_from_path(src).ok_or_else(|| format!("unsupported image type '{}'", src))?;
    let bytes = std::fs::read(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(data_url(mime, &bytes))
}


fn parse_bounds(value: &str) -> Result<ScaleBounds, String> {
    match value {
        "viewer" => Ok(ScaleBounds::VIEWER),
        "signing" => Ok(ScaleBounds::SIGNING),
        "correction" => Ok(ScaleBounds::CORRECTION),
        other => Err(format!(
            "invalid --bounds value '{}' (expected viewer|signing|correction)",
            other
        )),
    }
}


fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }

    let mut cfg = Args {
        fields_path: String::new(),
        out_path: DEFAULT_OUT_PATH.to_string(),
        config_path: None,
        page: None,
        container_width: None,
        padding: None,
        bounds: None,
        interactive: false,
        selected: Vec::new(),
    };

    let mut i = 1usize;
    while i < args.len() {
        let value = |name: &str| {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| format!("{} requires a value", name))
        };
        match args[i].as_str() {
            "--fields" => {
                cfg.fields_path = value("--fields")?;
                i += 2;
            }
            "--out" => {
                cfg.out_path = value("--out")?;
                i += 2;
            }
            "--config" => {
                cfg.config_path = Some(value("--config")?);
                i += 2;
            }
            "--page" => {
                let v = value("--page")?;
                let page = v
                    .parse::<u32>()
                    .ok()
                    .filter(|page| *page >= 1)
                    .ok_or_else(|| format!("invalid --page value '{}'", v))?;
                cfg.page = Some(page);
                i += 2;
            }
            "--width" => {
                let v = value("--width")?;
                cfg.container_width = Some(
                    v.parse::<f32>()
                        .map_err(|_| format!("invalid --width value '{}'", v))?,
                );
                i += 2;
            }
            "--padding" => {
                let v = value("--padding")?;
                cfg.padding = Some(
                    v.parse::<f32>()
                        .map_err(|_| format!("invalid --padding value '{}'", v))?,
                );
                i += 2;
            }
            "--bounds" => {
                let v = value("--bounds")?;
                parse_bounds(&v)?;
                cfg.bounds = Some(v);
                i += 2;
            }
            "--interactive" => {
                cfg.interactive = true;
                i += 1;
            }
            "--select" => {
                cfg.selected.push(value("--select")?);
                cfg.interactive = true;
                i += 2;
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    if cfg.fields_path.is_empty() {
        return Err("--fields is required".to_string());
    }
    Ok(cfg)
}

fn help_text() -> &'static str {
    r#"overlay-preview - static HTML preview of one field-overlay page

USAGE:
  cargo run -p field-overlay-render-web --bin overlay-preview -- --fields <json> [options]

OPTIONS:
  --fields <file>             field metadata JSON array (required)
  --out <prefix>              output prefix; writes <prefix>.json and <prefix>.html
                              (default: target/overlay-preview/index)
  --config <file>             JSON preview config; CLI flags override it
  --page <n>                  1-based page to render (default: 1)
  --width <px>                container width the page is fitted to (default: 1000)
  --padding <px>              horizontal container padding (default: 32)
  --bounds <preset>           viewer|signing|correction (default: viewer)
  --interactive               render picker state and click targets
  --select <id>               pre-select a field; repeatable, implies --interactive
"#
}
