use std::path::Path;
use std::sync::Arc;

use field_overlay::{fields_from_json, Field};
use field_overlay_render::{HeuristicTextMeasurer, OverlayConfig, OverlayRenderer};

pub const LEASE_CONTRACT: &str = "tests/fixtures/lease_contract.json";
pub const CONSENT_FORM: &str = "tests/fixtures/consent_form.json";

pub const FIELD_FIXTURES: &[&str] = &[LEASE_CONTRACT, CONSENT_FORM];

pub fn field_fixtures() -> Vec<&'static str> {
    FIELD_FIXTURES
        .iter()
        .copied()
        .filter(|path| Path::new(path).exists())
        .collect()
}

pub fn load_fields(path: &str) -> Vec<Field> {
    let bytes = std::fs::read(path).unwrap_or_else(|e| panic!("read {}: {}", path, e));
    fields_from_json(&bytes).unwrap_or_else(|e| panic!("parse {}: {}", path, e))
}

/// Highest page number referenced by `fields`.
pub fn page_count(fields: &[Field]) -> u32 {
    fields.iter().map(|f| f.page).max().unwrap_or(0)
}

pub fn heuristic_renderer(cfg: OverlayConfig) -> OverlayRenderer {
    OverlayRenderer::builder(cfg)
        .with_text_measurer(Arc::new(HeuristicTextMeasurer))
        .build()
        .unwrap_or_else(|e| panic!("overlay renderer: {}", e))
}
