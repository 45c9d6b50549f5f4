//! Error taxonomy for the decision core.
//!
//! Every fallible core operation surfaces one of these variants.
//! `Validation` and `NotFound` are rejected before any mutation,
//! `Conflict` refuses an action without touching the ledger,
//! `StaleWrite` asks the caller to re-score against a fresh snapshot,
//! and `Unavailable` makes the router fail closed to silence.

use thiserror::Error;

/// Errors from ledger and decision operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("canon conflict: {0}")]
    Conflict(String),

    #[error("stale write on story {story}: expected version {expected}, found {found}")]
    StaleWrite {
        story: String,
        expected: u64,
        found: u64,
    },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// Build a `NotFound` for an identifier.
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        LedgerError::NotFound(what.to_string())
    }

    /// Check whether this error means the store could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_))
    }

    /// Check whether the caller should retry with a fresh snapshot.
    pub fn is_stale(&self) -> bool {
        matches!(self, LedgerError::StaleWrite { .. })
    }
}
