//! Executor adapter
//!
//! The engine hands compiled plans to an [`Executor`] and never looks inside
//! the backend. Rows must come back in the plan's `order_list`, with
//! `limit + 1` rows when the plan paginates.
//!
//! [`MemoryExecutor`] is a reference implementation over JSON rows.

mod errors;
mod filters;
mod memory;
mod runner;
mod sorter;

pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult};
pub use filters::PredicateFilter;
pub use memory::MemoryExecutor;
pub use runner::{fetch, fetch_batch, run_plan, FetchOptions};
pub use sorter::ResultSorter;

use crate::builder::QueryPlan;
use crate::value::Row;

/// Rows returned by an executor, in plan order
pub type RawRowSet = Vec<Row>;

/// Backend that turns plans into rows
pub trait Executor {
    /// Runs the plan, honouring its order list and pagination directive.
    /// Rows must satisfy `plan.row_predicate()`, the seek included.
    fn execute(&self, plan: &QueryPlan) -> ExecutorResult<RawRowSet>;

    /// Counts the rows matching `plan.predicate`, ignoring the seek and
    /// pagination
    fn count(&self, plan: &QueryPlan) -> ExecutorResult<u64>;
}
