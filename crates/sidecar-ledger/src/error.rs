//! Error types for ledger operations.

use thiserror::Error;

use sidecar_ledger_core::{DecodeError, FieldError};

/// Errors surfaced by record operations.
///
/// Expected failures (rejections) carry the same structured errors that were
/// written to the audit trail. Resource faults from the audit sink are the
/// only other failure mode; they leave the in-memory state untouched.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The write was rejected; a matching audit record was produced.
    #[error("event rejected with {} error(s)", .0.len())]
    Rejected(Vec<FieldError>),

    /// The audit sink failed. Nothing was committed.
    #[error("audit i/o error: {0}")]
    Audit(#[from] std::io::Error),

    /// A validated payload failed to decode into its typed entity. This
    /// means the validator and the typed model disagree.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl LedgerError {
    /// The structured rejection errors, when this is a rejection.
    pub fn rejection(&self) -> Option<&[FieldError]> {
        match self {
            LedgerError::Rejected(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
