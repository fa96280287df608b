//! Builder
//!
//! Compiles Tokens into backend-neutral QueryPlans. Every structural problem
//! is reported here, before a plan can reach an executor.

mod compiler;
mod errors;
mod explain;
mod plan;
mod raw;
mod scope;

pub use compiler::{compile, Compiler};
pub use errors::{BuildError, BuildResult};
pub use explain::ExplainPlan;
pub use plan::{
    Binding, Column, Comparison, NamedPlan, Operand, PaginationDirective, PlanJoin, PlanOrder,
    PlanProjection, PlanWindow, Predicate, PreloadPlan, QueryPlan, ScanDirection,
};
