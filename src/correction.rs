//! Field selection for correction requests.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ErrorPhase, OverlayError};
use crate::model::FieldId;
use crate::viewport::LayoutObserver;

/// Result of toggling a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Field entered the selection. `first_time` is true the first time this
    /// id has ever been selected in this session.
    Selected { first_time: bool },
    /// Field left the selection. Its comment is kept for re-selection.
    Deselected,
}

/// Selected fields and the comment attached to each.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSelection {
    selected: BTreeSet<FieldId>,
    comments: BTreeMap<FieldId, String>,
    seen: BTreeSet<FieldId>,
}

impl FieldSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle membership of `id`.
    pub fn toggle(&mut self, id: &FieldId) -> ToggleOutcome {
        if self.selected.remove(id) {
            return ToggleOutcome::Deselected;
        }
        self.selected.insert(id.clone());
        let first_time = self.seen.insert(id.clone());
        ToggleOutcome::Selected { first_time }
    }

    /// Toggle and, on first selection, ask `observer` to reveal the comment input.
    pub fn toggle_with_observer<O>(&mut self, id: &FieldId, observer: &mut O) -> ToggleOutcome
    where
        O: LayoutObserver + ?Sized,
    {
        let outcome = self.toggle(id);
        if outcome == (ToggleOutcome::Selected { first_time: true }) {
            observer.request_scroll_into_view(id.clone());
        }
        outcome
    }

    pub fn is_selected(&self, id: &FieldId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldId> {
        self.selected.iter()
    }

    pub fn set_comment(&mut self, id: &FieldId, comment: impl Into<String>) {
        self.comments.insert(id.clone(), comment.into());
    }

    pub fn comment(&self, id: &FieldId) -> Option<&str> {
        self.comments.get(id).map(String::as_str)
    }

    /// Drop all selections and comments.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.comments.clear();
        self.seen.clear();
    }
}

/// One field flagged for correction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionItem {
    pub field_id: FieldId,
    #[serde(default)]
    pub comment: String,
}

/// Correction request body sent to the document service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRequest {
    pub document_id: String,
    pub items: Vec<CorrectionItem>,
}

impl CorrectionRequest {
    /// Build a request from the current selection. Comments are trimmed.
    pub fn from_selection(
        document_id: impl Into<String>,
        selection: &FieldSelection,
    ) -> Result<Self, OverlayError> {
        let document_id = document_id.into();
        if selection.is_empty() {
            return Err(OverlayError::new(
                ErrorPhase::Submit,
                OverlayError::EMPTY_SELECTION,
                "select at least one field to request a correction",
            )
            .with_document(document_id));
        }
        let items = selection
            .iter()
            .map(|id| CorrectionItem {
                field_id: id.clone(),
                comment: selection.comment(id).unwrap_or_default().trim().to_string(),
            })
            .collect();
        Ok(Self { document_id, items })
    }

    pub fn to_json(&self) -> Result<Vec<u8>, OverlayError> {
        serde_json::to_vec(self).map_err(|e| {
            OverlayError::new(ErrorPhase::Submit, OverlayError::SUBMIT_FAILED, e.to_string())
                .with_document(self.document_id.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::ScaleConfig;
    use crate::viewport::{LayoutEffect, ViewportState};

    #[test]
    fn toggle_flips_membership() {
        let mut sel = FieldSelection::new();
        let id = FieldId::from("f1");
        assert_eq!(sel.toggle(&id), ToggleOutcome::Selected { first_time: true });
        assert!(sel.is_selected(&id));
        assert_eq!(sel.toggle(&id), ToggleOutcome::Deselected);
        assert!(!sel.is_selected(&id));
        assert_eq!(sel.toggle(&id), ToggleOutcome::Selected { first_time: false });
    }

    #[test]
    fn first_selection_requests_scroll_once() {
        let mut sel = FieldSelection::new();
        let mut viewport = ViewportState::new(ScaleConfig::default(), 0.0).expect("viewport");
        let id = FieldId::from("sig");
        sel.toggle_with_observer(&id, &mut viewport);
        sel.toggle_with_observer(&id, &mut viewport);
        sel.toggle_with_observer(&id, &mut viewport);
        let effects: Vec<_> = viewport.drain_effects().collect();
        assert_eq!(effects, vec![LayoutEffect::ScrollIntoView(id)]);
    }

    #[test]
    fn request_carries_trimmed_comments_in_id_order() {
        let mut sel = FieldSelection::new();
        let b = FieldId::from("b");
        let a = FieldId::from("a");
        sel.toggle(&b);
        sel.toggle(&a);
        sel.set_comment(&b, "  wrong date  ");
        let req = CorrectionRequest::from_selection("contract-7", &sel).expect("request");
        assert_eq!(req.items.len(), 2);
        assert_eq!(req.items[0].field_id, a);
        assert_eq!(req.items[0].comment, "");
        assert_eq!(req.items[1].comment, "wrong date");
        let json = String::from_utf8(req.to_json().expect("json")).expect("utf8");
        assert!(json.contains("\"documentId\":\"contract-7\""));
        assert!(json.contains("\"fieldId\":\"b\""));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let err = CorrectionRequest::from_selection("c", &FieldSelection::new()).unwrap_err();
        assert_eq!(err.code, OverlayError::EMPTY_SELECTION);
    }
}
