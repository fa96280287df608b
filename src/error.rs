//! Crate-level error
//!
//! Unifies the four error families for callers of the fetch flow. Each keeps
//! its own code; nothing is reinterpreted on the way up.

use thiserror::Error;

use crate::builder::BuildError;
use crate::cursor::CursorError;
use crate::executor::ExecutorError;
use crate::token::ConstructionError;

/// Result type of the fetch flow
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure of the engine
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed item at Token construction
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    /// Token rejected at compile time
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Cursor could not be decoded or minted
    #[error(transparent)]
    Cursor(#[from] CursorError),

    /// Backend failure, passed through as-is
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl Error {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Construction(e) => e.code(),
            Error::Build(e) => e.code(),
            Error::Cursor(e) => e.code(),
            Error::Executor(e) => e.code().code(),
        }
    }

    /// The cursor error behind this failure, if any
    pub fn cursor_error(&self) -> Option<&CursorError> {
        match self {
            Error::Cursor(e) => Some(e),
            Error::Build(e) => e.as_cursor_error(),
            _ => None,
        }
    }

    /// The caller should restart pagination from the first page
    pub fn restart_pagination(&self) -> bool {
        self.cursor_error()
            .map(CursorError::restart_pagination)
            .unwrap_or(false)
    }
}
