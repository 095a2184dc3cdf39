//! Structured rejection errors and the decode fault type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a single rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Required field absent, or a referenced entity is not in the store.
    Missing,
    /// Type or enum mismatch, out-of-range numeric, blank string.
    Invalid,
    /// Id already recorded.
    Duplicate,
    /// Cross-entity semantic disagreement (e.g. fact kind vs promotion kind).
    Mismatch,
    /// Unrecognized fields on a payload.
    Unknown,
}

impl ErrorKind {
    /// The kebab-case tag used in serialized audit entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Missing => "missing",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::Mismatch => "mismatch",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural or semantic objection to a submitted event.
///
/// Validation gathers every objection before returning, so a single rejected
/// write can carry several of these. Boundary checks return the first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldError {
    /// The offending field, e.g. `"score"`, `"proposal-id"`, `"step/gate"`.
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,
    /// Optional machine-readable context (offending value, key list, index).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn missing(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, ErrorKind::Missing, message)
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, ErrorKind::Invalid, message)
    }

    pub fn duplicate(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, ErrorKind::Duplicate, message)
    }

    pub fn mismatch(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, ErrorKind::Mismatch, message)
    }

    pub fn unknown(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, ErrorKind::Unknown, message)
    }

    /// Attach machine-readable context.
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.field, self.kind, self.message)
    }
}

/// Failure to decode a validated payload into its typed entity.
///
/// Validation runs before decoding, so hitting this means the validator and
/// the typed model disagree; it is surfaced rather than papered over.
#[derive(Debug, Error)]
#[error("payload decode error: {0}")]
pub struct DecodeError(#[from] serde_json::Error);
