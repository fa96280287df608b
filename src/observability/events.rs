//! Observable events
//!
//! Events are explicit and typed. Each one maps to a stable upper-snake name
//! and a severity.

use std::fmt;

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
}

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Compilation
    /// Token compiled into a plan
    TokenCompiled,
    /// Token rejected by the compiler
    CompileRejected,

    // Cursors
    /// Cursor minted for a page boundary
    CursorMinted,
    /// Supplied cursor could not be used
    CursorRejected,

    // Results
    /// Page assembled from raw rows
    PageAssembled,
    /// Plan handed to an executor
    PlanDispatched,
    /// Preloaded children attached to parent rows
    PreloadAttached,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::TokenCompiled => "TOKEN_COMPILED",
            Event::CompileRejected => "COMPILE_REJECTED",
            Event::CursorMinted => "CURSOR_MINTED",
            Event::CursorRejected => "CURSOR_REJECTED",
            Event::PageAssembled => "PAGE_ASSEMBLED",
            Event::PlanDispatched => "PLAN_DISPATCHED",
            Event::PreloadAttached => "PRELOAD_ATTACHED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::CompileRejected | Event::CursorRejected => Severity::Warn,
            Event::CursorMinted => Severity::Trace,
            Event::TokenCompiled | Event::PlanDispatched => Severity::Debug,
            Event::PageAssembled | Event::PreloadAttached => Severity::Debug,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
