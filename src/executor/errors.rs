//! Executor error types
//!
//! Executor failures pass through the engine untouched: no retry, no
//! reinterpretation. The code only says which side of the adapter failed.
//!
//! Error codes:
//! - EXECUTOR_FAILED
//! - EXECUTOR_UNSUPPORTED
//! - EXECUTOR_UNKNOWN_SOURCE

use std::fmt;

use thiserror::Error;

/// Executor error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// Backend reported a failure
    ExecutionFailed,
    /// Plan uses a feature the executor cannot evaluate
    Unsupported,
    /// Plan names a source the executor does not hold
    UnknownSource,
}

impl ExecutorErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::ExecutionFailed => "EXECUTOR_FAILED",
            ExecutorErrorCode::Unsupported => "EXECUTOR_UNSUPPORTED",
            ExecutorErrorCode::UnknownSource => "EXECUTOR_UNKNOWN_SOURCE",
        }
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Opaque executor failure
#[derive(Debug, Error)]
#[error("[{code}] {message}")]
pub struct ExecutorError {
    code: ExecutorErrorCode,
    message: String,
    #[source]
    source: Option<BoxedSource>,
}

impl ExecutorError {
    /// Create an execution failed error
    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::ExecutionFailed,
            message: reason.into(),
            source: None,
        }
    }

    /// Create an unsupported-feature error
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::Unsupported,
            message: format!("{} is not supported by this executor", feature.into()),
            source: None,
        }
    }

    /// Create an unknown source error
    pub fn unknown_source(source: impl Into<String>) -> Self {
        Self {
            code: ExecutorErrorCode::UnknownSource,
            message: format!("Unknown source '{}'", source.into()),
            source: None,
        }
    }

    /// Wraps a backend error
    pub fn backend<E>(reason: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            code: ExecutorErrorCode::ExecutionFailed,
            message: reason.into(),
            source: Some(Box::new(err)),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
