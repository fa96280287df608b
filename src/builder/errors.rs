//! Builder error types
//!
//! Raised by `compile` before any executor call. A build error is never
//! downgraded into a degraded query.
//!
//! Error codes:
//! - QUERY_INVALID_SOURCE
//! - QUERY_UNKNOWN_BINDING
//! - QUERY_DUPLICATE_BINDING
//! - QUERY_CURSOR_ORDER_MISMATCH
//! - QUERY_DIVISION_BY_ZERO
//! - QUERY_INVALID_LIMIT
//! - QUERY_UNKNOWN_PLACEHOLDER
//! - QUERY_UNUSED_PARAMETER
//! - QUERY_PRELOAD_PAGINATION
//! - QUERY_PRELOAD_TOO_DEEP
//! - plus the codes of wrapped construction and cursor errors

use thiserror::Error;

use crate::cursor::CursorError;
use crate::token::ConstructionError;

/// Result type for compilation
pub type BuildResult<T> = Result<T, BuildError>;

/// Structural errors found while compiling a Token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Token has no root source
    #[error("Token has no root source")]
    InvalidSource,

    /// Field qualified by a binding no join declares
    #[error("Unknown binding '{binding}' in {context}")]
    UnknownBinding { binding: String, context: String },

    /// Two joins declare the same binding
    #[error("Binding '{0}' declared twice")]
    DuplicateBinding(String),

    /// Cursor fields are not a term-for-term match of the orders
    #[error("cursor_fields do not match orders at position {position}: {reason}")]
    CursorOrderMismatch { position: usize, reason: String },

    /// Offset pagination with a zero limit
    #[error("Offset pagination requires a non-zero limit")]
    DivisionByZero,

    /// Page size outside `1..=max`
    #[error("Limit {limit} outside 1..={max}")]
    InvalidLimit { limit: u64, max: u64 },

    /// Raw template references a parameter that was not bound
    #[error("Raw template references unbound parameter ':{0}'")]
    UnknownPlaceholder(String),

    /// Raw predicate binds a parameter its template never references
    #[error("Raw parameter '{0}' is never referenced")]
    UnusedParameter(String),

    /// Preload Tokens are fetched per parent key set and cannot paginate
    #[error("Preload '{0}' declares pagination")]
    PreloadPagination(String),

    /// Preload tree nested beyond the configured depth
    #[error("Preload nesting depth {depth} exceeds {max}")]
    PreloadDepthExceeded { depth: usize, max: usize },

    /// Item shape re-checked at compile time
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// Cursor supplied on the Token could not be used
    #[error(transparent)]
    Cursor(#[from] CursorError),
}

impl BuildError {
    /// Create a cursor/order mismatch error
    pub fn cursor_order_mismatch(position: usize, reason: impl Into<String>) -> Self {
        BuildError::CursorOrderMismatch {
            position,
            reason: reason.into(),
        }
    }

    /// Create an unknown binding error
    pub fn unknown_binding(binding: impl Into<String>, context: impl Into<String>) -> Self {
        BuildError::UnknownBinding {
            binding: binding.into(),
            context: context.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            BuildError::InvalidSource => "QUERY_INVALID_SOURCE",
            BuildError::UnknownBinding { .. } => "QUERY_UNKNOWN_BINDING",
            BuildError::DuplicateBinding(_) => "QUERY_DUPLICATE_BINDING",
            BuildError::CursorOrderMismatch { .. } => "QUERY_CURSOR_ORDER_MISMATCH",
            BuildError::DivisionByZero => "QUERY_DIVISION_BY_ZERO",
            BuildError::InvalidLimit { .. } => "QUERY_INVALID_LIMIT",
            BuildError::UnknownPlaceholder(_) => "QUERY_UNKNOWN_PLACEHOLDER",
            BuildError::UnusedParameter(_) => "QUERY_UNUSED_PARAMETER",
            BuildError::PreloadPagination(_) => "QUERY_PRELOAD_PAGINATION",
            BuildError::PreloadDepthExceeded { .. } => "QUERY_PRELOAD_TOO_DEEP",
            BuildError::Construction(e) => e.code(),
            BuildError::Cursor(e) => e.code(),
        }
    }

    /// True when the failure came from a caller-supplied cursor
    pub fn is_cursor_error(&self) -> bool {
        matches!(self, BuildError::Cursor(_))
    }

    /// The wrapped cursor error, if any
    pub fn as_cursor_error(&self) -> Option<&CursorError> {
        match self {
            BuildError::Cursor(e) => Some(e),
            _ => None,
        }
    }
}
