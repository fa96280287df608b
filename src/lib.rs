//! querytoken - immutable query tokens, keyset cursors and plan compilation
//!
//! A [`Token`] describes a query. The [`Compiler`] turns it into a
//! backend-neutral [`QueryPlan`], an [`Executor`] turns the plan into rows,
//! and the assembler turns rows into a page with pagination metadata.

pub mod assembler;
pub mod builder;
pub mod config;
pub mod cursor;
pub mod error;
pub mod executor;
pub mod observability;
pub mod token;
pub mod value;

pub use assembler::{assemble, assemble_page, PaginationMetadata, QueryResult};
pub use builder::{compile, BuildError, Compiler, ExplainPlan, QueryPlan};
pub use config::EngineConfig;
pub use cursor::{CursorError, Seek};
pub use error::{Error, Result};
pub use executor::{fetch, fetch_batch, Executor, ExecutorError, FetchOptions, MemoryExecutor};
pub use token::{
    ConstructionError, CursorField, Direction, Filter, JoinSpec, OrderTerm, PaginationSpec,
    PreloadOpts, Token,
};
pub use value::{Operator, Value};
