//! Structured errors shared across the overlay pipeline.

use core::fmt;

/// Processing phase where an error originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorPhase {
    /// Construction-time configuration checks.
    Config,
    /// Field metadata decoding.
    Metadata,
    /// Free-hand signature capture.
    Capture,
    /// Submission to an external backend.
    Submit,
}

impl ErrorPhase {
    /// Stable lowercase name for logs and payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Metadata => "metadata",
            Self::Capture => "capture",
            Self::Submit => "submit",
        }
    }
}

impl fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error with a stable machine-readable code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayError {
    /// Processing phase where this error originated.
    pub phase: ErrorPhase,
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: Box<str>,
    /// Optional field id context.
    pub field_id: Option<Box<str>>,
    /// Optional document id context.
    pub document_id: Option<Box<str>>,
}

impl OverlayError {
    pub const MISSING_TEXT_MEASURER: &'static str = "MISSING_TEXT_MEASURER";
    pub const INVALID_SCALE_BOUNDS: &'static str = "INVALID_SCALE_BOUNDS";
    pub const INVALID_FIT_CONFIG: &'static str = "INVALID_FIT_CONFIG";
    pub const INVALID_SURFACE: &'static str = "INVALID_SURFACE";
    pub const FIELD_JSON_INVALID: &'static str = "FIELD_JSON_INVALID";
    pub const FIELD_ID_EMPTY: &'static str = "FIELD_ID_EMPTY";
    pub const FIELD_PAGE_INVALID: &'static str = "FIELD_PAGE_INVALID";
    pub const NOT_SIGNED: &'static str = "NOT_SIGNED";
    pub const SNAPSHOT_ENCODE_FAILED: &'static str = "SNAPSHOT_ENCODE_FAILED";
    pub const EMPTY_SELECTION: &'static str = "EMPTY_SELECTION";
    pub const SUBMIT_FAILED: &'static str = "SUBMIT_FAILED";
    pub const SUBMIT_REJECTED: &'static str = "SUBMIT_REJECTED";
    pub const FETCH_FAILED: &'static str = "FETCH_FAILED";

    /// Create an error for `phase` with a stable `code`.
    pub fn new(phase: ErrorPhase, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            phase,
            code,
            message: message.into().into_boxed_str(),
            field_id: None,
            document_id: None,
        }
    }

    /// Shorthand for configuration errors raised at setup time.
    pub fn config(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorPhase::Config, code, message)
    }

    /// Attach field id context.
    pub fn with_field(mut self, field_id: impl Into<String>) -> Self {
        self.field_id = Some(field_id.into().into_boxed_str());
        self
    }

    /// Attach document id context.
    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into().into_boxed_str());
        self
    }

    /// Whether this error came from an external backend call and may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            (self.phase, self.code),
            (ErrorPhase::Submit, Self::SUBMIT_FAILED) | (ErrorPhase::Metadata, Self::FETCH_FAILED)
        )
    }
}

impl fmt::Display for OverlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.phase, self.code, self.message)?;
        if let Some(field_id) = self.field_id.as_deref() {
            write!(f, " [field_id={}]", field_id)?;
        }
        if let Some(document_id) = self.document_id.as_deref() {
            write!(f, " [document_id={}]", document_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for OverlayError {}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        OverlayError::new(
            ErrorPhase::Metadata,
            OverlayError::FIELD_JSON_INVALID,
            err.to_string(),
        )
    }
}
