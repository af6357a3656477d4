//! Seams to the document service.
//!
//! Transport, authentication and persistence live in the host. Every call
//! receives an explicit [`RequestContext`] instead of reading ambient session
//! state.

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureSurface, SignaturePad};
use crate::correction::CorrectionRequest;
use crate::error::{ErrorPhase, OverlayError};
use crate::model::Field;

/// Caller identity forwarded with each backend call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub bearer_token: Option<String>,
    pub role: Option<String>,
}

impl RequestContext {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(bearer_token.into()),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// `Authorization` header value, if a token is present.
    pub fn authorization(&self) -> Option<String> {
        self.bearer_token
            .as_deref()
            .map(|token| format!("Bearer {token}"))
    }
}

/// Encoded signature image sent on submit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePayload {
    /// `data:image/png;base64,...`
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// Loads field metadata for a document.
pub trait FieldSource {
    fn fetch_fields(
        &self,
        ctx: &RequestContext,
        document_id: &str,
    ) -> Result<Vec<Field>, OverlayError>;
}

/// Accepts a captured signature for a document.
pub trait SignatureSink {
    fn submit_signature(
        &self,
        ctx: &RequestContext,
        document_id: &str,
        payload: &SignaturePayload,
    ) -> Result<(), OverlayError>;
}

/// Accepts a correction request.
pub trait CorrectionSink {
    fn submit_corrections(
        &self,
        ctx: &RequestContext,
        request: &CorrectionRequest,
    ) -> Result<(), OverlayError>;
}

/// Progress of one submit action as shown to the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SubmitTracker {
    #[default]
    Idle,
    InFlight,
    Failed {
        message: String,
        attempts: u32,
    },
    Submitted,
}

impl SubmitTracker {
    /// True when a new attempt may start.
    pub fn retry_allowed(&self) -> bool {
        matches!(self, Self::Idle | Self::Failed { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Failed { attempts, .. } => *attempts,
            _ => 0,
        }
    }

    fn begin(&mut self) -> Result<u32, OverlayError> {
        if !self.retry_allowed() {
            return Err(OverlayError::new(
                ErrorPhase::Submit,
                OverlayError::SUBMIT_REJECTED,
                "a submission is already in flight or complete",
            ));
        }
        let prior = self.attempts();
        *self = Self::InFlight;
        Ok(prior)
    }

    fn finish(&mut self, prior_attempts: u32, result: &Result<(), OverlayError>) {
        *self = match result {
            Ok(()) => Self::Submitted,
            Err(err) => Self::Failed {
                message: err.message.to_string(),
                attempts: prior_attempts.saturating_add(1),
            },
        };
    }

    /// Run `submit` under the tracker, recording success or failure.
    pub fn track<F>(&mut self, submit: F) -> Result<(), OverlayError>
    where
        F: FnOnce() -> Result<(), OverlayError>,
    {
        let prior = self.begin()?;
        let result = submit();
        self.finish(prior, &result);
        result
    }
}

/// Encode the pad's latest snapshot and hand it to `sink`.
///
/// The pad is only read; a failed submit leaves every stroke in place so the
/// user can retry without redrawing.
pub fn submit_signature<S, K, E>(
    pad: &SignaturePad<S>,
    sink: &K,
    ctx: &RequestContext,
    document_id: &str,
    tracker: &mut SubmitTracker,
    encode: E,
) -> Result<(), OverlayError>
where
    S: CaptureSurface,
    K: SignatureSink + ?Sized,
    E: FnOnce(&S::Snapshot) -> Result<SignaturePayload, OverlayError>,
{
    let snapshot = pad.latest_snapshot().ok_or_else(|| {
        OverlayError::new(
            ErrorPhase::Capture,
            OverlayError::NOT_SIGNED,
            "draw a signature before submitting",
        )
        .with_document(document_id)
    })?;
    let payload = encode(snapshot).map_err(|err| err.with_document(document_id))?;
    tracker.track(|| {
        sink.submit_signature(ctx, document_id, &payload)
            .map_err(|err| err.with_document(document_id))
    })?;
    log::debug!(
        "signature submitted for {} ({}x{})",
        document_id,
        payload.width,
        payload.height
    );
    Ok(())
}

/// Submit a correction request under `tracker`.
pub fn submit_corrections<K>(
    sink: &K,
    ctx: &RequestContext,
    request: &CorrectionRequest,
    tracker: &mut SubmitTracker,
) -> Result<(), OverlayError>
where
    K: CorrectionSink + ?Sized,
{
    tracker.track(|| sink.submit_corrections(ctx, request))
}
