//! Cursor errors
//!
//! Every cursor error is recoverable by restarting pagination from the first
//! page. None of them is ever reported as an empty page.
//!
//! Error codes:
//! - CURSOR_FIELD_MISMATCH
//! - CURSOR_DECODE_FAILURE
//! - CURSOR_MISSING_SORT_KEY
//! - CURSOR_NULL_SORT_KEY

use thiserror::Error;

/// Result type for cursor operations
pub type CursorResult<T> = Result<T, CursorError>;

/// Cursor encode/decode failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// Cursor was minted under a different (field, direction) list
    #[error("Cursor was minted for a different ordering (expected fingerprint {expected}, got {found})")]
    CursorFieldMismatch { expected: String, found: String },

    /// Cursor is not a well-formed token
    #[error("Cursor could not be decoded: {0}")]
    CursorDecodeFailure(String),

    /// Row lacks a sort-key field, so no cursor can be minted for it
    #[error("Row has no value for sort key '{0}'")]
    MissingSortKey(String),

    /// Sort key is null; keyset seeks need a comparable value
    #[error("Sort key '{0}' is null")]
    NullSortKey(String),
}

impl CursorError {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        CursorError::CursorDecodeFailure(reason.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CursorError::CursorFieldMismatch { .. } => "CURSOR_FIELD_MISMATCH",
            CursorError::CursorDecodeFailure(_) => "CURSOR_DECODE_FAILURE",
            CursorError::MissingSortKey(_) => "CURSOR_MISSING_SORT_KEY",
            CursorError::NullSortKey(_) => "CURSOR_NULL_SORT_KEY",
        }
    }

    /// The caller should drop the cursor and start again from page one
    pub fn restart_pagination(&self) -> bool {
        true
    }
}
