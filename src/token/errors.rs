//! Construction errors
//!
//! Raised while a Token is being extended. Every variant is recoverable: the
//! offending item is rejected and the previous Token stays valid.
//!
//! Error codes:
//! - QUERY_INVALID_FILTER_SHAPE
//! - QUERY_INVALID_ORDER_DIRECTION
//! - QUERY_EMPTY_IDENTIFIER
//! - QUERY_INVALID_JOIN_SHAPE
//! - QUERY_INVALID_PAGINATION
//! - QUERY_INVALID_PROJECTION
//! - QUERY_INVALID_RAW_TEMPLATE
//! - QUERY_INVALID_PRELOAD

use thiserror::Error;

/// Result type for token construction
pub type ConstructionResult<T> = Result<T, ConstructionError>;

/// Malformed item handed to a Token builder operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// Operator and value shape are incompatible
    #[error("Invalid filter on '{field}': {reason}")]
    InvalidFilterShape { field: String, reason: String },

    /// Direction string is neither asc nor desc
    #[error("Invalid order direction: '{0}'")]
    InvalidOrderDirection(String),

    /// A field, binding or name was empty
    #[error("Empty identifier in {0}")]
    EmptyIdentifier(&'static str),

    /// Join kind and join condition disagree
    #[error("Invalid join '{binding}': {reason}")]
    InvalidJoinShape { binding: String, reason: String },

    /// Pagination spec is malformed
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    /// Projection entry is malformed
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),

    /// Raw predicate template or parameter names are malformed
    #[error("Invalid raw template: {0}")]
    InvalidRawTemplate(String),

    /// Preload association or keys are malformed
    #[error("Invalid preload '{assoc}': {reason}")]
    InvalidPreload { assoc: String, reason: String },
}

impl ConstructionError {
    /// Create an invalid filter shape error
    pub fn filter_shape(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConstructionError::InvalidFilterShape {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConstructionError::InvalidFilterShape { .. } => "QUERY_INVALID_FILTER_SHAPE",
            ConstructionError::InvalidOrderDirection(_) => "QUERY_INVALID_ORDER_DIRECTION",
            ConstructionError::EmptyIdentifier(_) => "QUERY_EMPTY_IDENTIFIER",
            ConstructionError::InvalidJoinShape { .. } => "QUERY_INVALID_JOIN_SHAPE",
            ConstructionError::InvalidPagination(_) => "QUERY_INVALID_PAGINATION",
            ConstructionError::InvalidProjection(_) => "QUERY_INVALID_PROJECTION",
            ConstructionError::InvalidRawTemplate(_) => "QUERY_INVALID_RAW_TEMPLATE",
            ConstructionError::InvalidPreload { .. } => "QUERY_INVALID_PRELOAD",
        }
    }

    /// Construction errors never poison the Token they were raised against
    pub fn is_recoverable(&self) -> bool {
        true
    }
}

/// Rejects empty or whitespace-only identifiers.
pub(crate) fn require_identifier(value: &str, context: &'static str) -> ConstructionResult<()> {
    if value.trim().is_empty() {
        Err(ConstructionError::EmptyIdentifier(context))
    } else {
        Ok(())
    }
}
