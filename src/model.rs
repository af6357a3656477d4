//! Field metadata as delivered by the document service.

use core::fmt;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorPhase, OverlayError};
use crate::geometry::{PageSize, PixelRect, RelativeRect};

/// Opaque field identifier, unique within a document.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FieldId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for FieldId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a field holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    #[serde(alias = "TEXT")]
    Text,
    #[serde(alias = "CHECKBOX")]
    Checkbox,
    #[serde(alias = "SIGNATURE")]
    Signature,
    #[serde(alias = "CONFIRM_TEXT", alias = "confirm_text")]
    ConfirmText,
}

impl FieldKind {
    /// Canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Checkbox => "checkbox",
            Self::Signature => "signature",
            Self::ConfirmText => "confirmText",
        }
    }

    /// Kinds whose value is painted as wrapped text.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::ConfirmText)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positioned placeholder on one page of a fixed-layout document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    /// 1-based page number.
    pub page: u32,
    #[serde(rename = "type", alias = "kind")]
    pub kind: FieldKind,
    #[serde(flatten)]
    pub relative: RelativeRect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Interpreted field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Text or confirm-text content.
    Text(&'a str),
    /// Checkbox state.
    Checked(bool),
    /// Signature image reference (URL or data URL).
    Image(&'a str),
    /// No value yet.
    Unfilled,
}

impl Field {
    pub fn new(id: impl Into<FieldId>, page: u32, kind: FieldKind, relative: RelativeRect) -> Self {
        Self {
            id: id.into(),
            page,
            kind,
            relative,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Interpret `value` according to `kind`. Empty strings count as unfilled.
    pub fn value(&self) -> FieldValue<'_> {
        let Some(raw) = self.value.as_deref().filter(|v| !v.is_empty()) else {
            return FieldValue::Unfilled;
        };
        match self.kind {
            kind if kind.is_textual() => FieldValue::Text(raw),
            FieldKind::Checkbox => FieldValue::Checked(raw == "true"),
            _ => FieldValue::Image(raw),
        }
    }

    pub fn is_filled(&self) -> bool {
        self.value() != FieldValue::Unfilled
    }

    /// Pixel box of this field at `scale`.
    pub fn pixel_rect(&self, page: PageSize, scale: f32) -> PixelRect {
        self.relative.to_pixels(page, scale)
    }
}

/// Fields belonging to `page`, in source order.
pub fn fields_on_page(fields: &[Field], page: u32) -> impl Iterator<Item = &Field> {
    fields.iter().filter(move |field| field.page == page)
}

/// Decode the document service's JSON array of fields.
///
/// Geometry is accepted as-is; only structurally unusable entries (empty id,
/// page 0) are rejected.
pub fn fields_from_json(bytes: &[u8]) -> Result<Vec<Field>, OverlayError> {
    let fields: Vec<Field> = serde_json::from_slice(bytes)?;
    for field in &fields {
        if field.id.as_str().trim().is_empty() {
            return Err(OverlayError::new(
                ErrorPhase::Metadata,
                OverlayError::FIELD_ID_EMPTY,
                "field id must not be empty",
            ));
        }
        if field.page == 0 {
            return Err(OverlayError::new(
                ErrorPhase::Metadata,
                OverlayError::FIELD_PAGE_INVALID,
                "page numbers are 1-based",
            )
            .with_field(field.id.as_str()));
        }
        if !field.relative.is_on_page() {
            log::debug!(
                "field {} has off-page geometry {:?}; rendering as-is",
                field.id,
                field.relative
            );
        }
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"id":"sig-1","page":1,"type":"signature","relativeX":0.1,"relativeY":0.8,"relativeWidth":0.3,"relativeHeight":0.05,"value":"data:image/png;base64,AAAA"},
        {"id":"agree","page":1,"type":"CHECKBOX","relativeX":0.1,"relativeY":0.7,"relativeWidth":0.02,"relativeHeight":0.02,"value":"true"},
        {"id":"name","page":2,"type":"text","relativeX":0.5,"relativeY":0.1,"relativeWidth":0.3,"relativeHeight":0.04},
        {"id":"confirm","page":2,"type":"confirmText","relativeX":0.5,"relativeY":0.2,"relativeWidth":0.3,"relativeHeight":0.04,"value":""}
    ]"#;

    #[test]
    fn decodes_service_payload() {
        let fields = fields_from_json(SAMPLE.as_bytes()).expect("decode");
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].kind, FieldKind::Signature);
        assert_eq!(fields[1].kind, FieldKind::Checkbox);
        assert_eq!(fields[1].value(), FieldValue::Checked(true));
        assert_eq!(fields[2].value(), FieldValue::Unfilled);
        assert_eq!(fields[3].kind, FieldKind::ConfirmText);
        assert_eq!(fields[3].value(), FieldValue::Unfilled);
        assert!((fields[0].relative.y - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn page_filter_keeps_source_order() {
        let fields = fields_from_json(SAMPLE.as_bytes()).expect("decode");
        let ids: Vec<&str> = fields_on_page(&fields, 2).map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["name", "confirm"]);
    }

    #[test]
    fn rejects_zero_page() {
        let err = fields_from_json(
            br#"[{"id":"x","page":0,"type":"text","relativeX":0,"relativeY":0,"relativeWidth":0,"relativeHeight":0}]"#,
        )
        .unwrap_err();
        assert_eq!(err.code, OverlayError::FIELD_PAGE_INVALID);
        assert_eq!(err.field_id.as_deref(), Some("x"));
    }

    #[test]
    fn malformed_json_is_a_metadata_error() {
        let err = fields_from_json(b"{not json").unwrap_err();
        assert_eq!(err.phase, ErrorPhase::Metadata);
        assert_eq!(err.code, OverlayError::FIELD_JSON_INVALID);
    }

    #[test]
    fn unchecked_checkbox_values() {
        let field = Field::new("c", 1, FieldKind::Checkbox, RelativeRect::default());
        assert_eq!(field.clone().with_value("false").value(), FieldValue::Checked(false));
        assert_eq!(field.clone().with_value("yes").value(), FieldValue::Checked(false));
        assert!(field.clone().with_value("false").is_filled());
        assert!(!field.with_value("").is_filled());
    }

    #[test]
    fn confirm_text_reads_as_text() {
        assert!(FieldKind::ConfirmText.is_textual());
        assert!(!FieldKind::Signature.is_textual());
        let field = Field::new("c", 1, FieldKind::ConfirmText, RelativeRect::default())
            .with_value("I agree");
        assert_eq!(field.value(), FieldValue::Text("I agree"));
    }
}
