//! In-memory reference executor
//!
//! Holds JSON rows per source and evaluates single-source plans.
//!
//! # Execution Flow (strict order)
//!
//! 1. Reject plan features this executor cannot evaluate
//! 2. Filter rows by the plan predicate, ANDed with the seek on `execute`
//! 3. Sort by the plan order list
//! 4. Skip `offset`, take `limit + 1`
//! 5. Apply the projection

use std::collections::HashMap;

use super::errors::{ExecutorError, ExecutorResult};
use super::filters::{column_value, PredicateFilter};
use super::sorter::ResultSorter;
use super::{Executor, RawRowSet};
use crate::builder::{PlanProjection, Predicate, QueryPlan};
use crate::value::Row;

/// Executor over rows held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutor {
    sources: HashMap<String, Vec<Row>>,
}

impl MemoryExecutor {
    /// Creates an executor with no sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a source
    pub fn with_source(mut self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.sources.insert(name.into(), rows);
        self
    }

    /// Builds a source from a JSON array of objects. Non-object items are
    /// rejected.
    pub fn with_json(self, name: impl Into<String>, rows: serde_json::Value) -> ExecutorResult<Self> {
        let name = name.into();
        let serde_json::Value::Array(items) = rows else {
            return Err(ExecutorError::execution_failed(format!(
                "source '{}' must be a JSON array",
                name
            )));
        };
        let mut parsed = Vec::with_capacity(items.len());
        for item in items {
            match item {
                serde_json::Value::Object(row) => parsed.push(row),
                other => {
                    return Err(ExecutorError::execution_failed(format!(
                        "source '{}' holds a non-object row: {}",
                        name, other
                    )))
                }
            }
        }
        Ok(self.with_source(name, parsed))
    }

    /// Appends a row to a source, creating it if needed
    pub fn insert(&mut self, source: impl Into<String>, row: Row) {
        self.sources.entry(source.into()).or_default().push(row);
    }

    /// Rows currently held for a source
    pub fn rows(&self, source: &str) -> Option<&[Row]> {
        self.sources.get(source).map(Vec::as_slice)
    }

    fn check_supported(plan: &QueryPlan) -> ExecutorResult<()> {
        if !plan.join_list.is_empty() {
            return Err(ExecutorError::unsupported("join"));
        }
        if !plan.group_by.is_empty() || plan.having.is_some() {
            return Err(ExecutorError::unsupported("grouping"));
        }
        if !plan.windows.is_empty() {
            return Err(ExecutorError::unsupported("window"));
        }
        if !plan.ctes.is_empty() {
            return Err(ExecutorError::unsupported("common table expression"));
        }
        if plan
            .projection
            .iter()
            .any(|p| matches!(p, PlanProjection::Aggregate { .. }))
        {
            return Err(ExecutorError::unsupported("aggregate projection"));
        }
        Ok(())
    }

    // Steps 1-2, shared by execute and count.
    fn matching(&self, plan: &QueryPlan, predicate: Option<&Predicate>) -> ExecutorResult<Vec<Row>> {
        Self::check_supported(plan)?;
        let rows = self
            .sources
            .get(&plan.source)
            .ok_or_else(|| ExecutorError::unknown_source(&plan.source))?;

        let Some(predicate) = predicate else {
            return Ok(rows.clone());
        };
        let filter = PredicateFilter::new(&plan.params);
        let mut matched = Vec::new();
        for row in rows {
            if filter.matches(row, predicate)? {
                matched.push(row.clone());
            }
        }
        Ok(matched)
    }

    fn project(row: Row, projection: &[PlanProjection]) -> Row {
        if projection.is_empty() {
            return row;
        }
        let mut out = Row::new();
        for entry in projection {
            if let PlanProjection::Column { column, alias } = entry {
                let name = alias.clone().unwrap_or_else(|| column.field.clone());
                let value = column_value(&row, column)
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                out.insert(name, value);
            }
        }
        out
    }
}

impl Executor for MemoryExecutor {
    fn execute(&self, plan: &QueryPlan) -> ExecutorResult<RawRowSet> {
        let predicate = plan.row_predicate();
        let mut rows = self.matching(plan, predicate.as_ref())?;
        ResultSorter::sort(&mut rows, &plan.order_list);

        let rows: Vec<Row> = match &plan.pagination {
            Some(directive) => rows
                .into_iter()
                .skip(usize::try_from(directive.offset()).unwrap_or(usize::MAX))
                .take(usize::try_from(directive.fetch_limit()).unwrap_or(usize::MAX))
                .collect(),
            None => rows,
        };

        Ok(rows
            .into_iter()
            .map(|row| Self::project(row, &plan.projection))
            .collect())
    }

    fn count(&self, plan: &QueryPlan) -> ExecutorResult<u64> {
        Ok(self.matching(plan, plan.predicate.as_ref())?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::compile;
    use crate::token::{Filter, JoinSpec, OrderTerm, PaginationSpec, Projection, Token};
    use serde_json::json;

    fn executor() -> MemoryExecutor {
        MemoryExecutor::new()
            .with_json(
                "posts",
                json!([
                    {"id": 1, "status": "published", "score": 5},
                    {"id": 2, "status": "draft", "score": 9},
                    {"id": 3, "status": "published", "score": 7},
                    {"id": 4, "status": "published", "score": 1},
                ]),
            )
            .unwrap()
    }

    #[test]
    fn test_filter_sort_limit() {
        let token = Token::new("posts")
            .add_filter(Filter::eq("status", "published"))
            .unwrap()
            .add_order(OrderTerm::desc("score"))
            .unwrap()
            .set_pagination(PaginationSpec::offset(2, 0))
            .unwrap();
        let rows = executor().execute(&compile(&token).unwrap()).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
        // limit + 1 rows come back
        assert_eq!(ids, vec![json!(3), json!(1), json!(4)]);
    }

    #[test]
    fn test_count_ignores_pagination() {
        let token = Token::new("posts")
            .add_filter(Filter::eq("status", "published"))
            .unwrap()
            .set_pagination(PaginationSpec::offset(1, 0))
            .unwrap();
        assert_eq!(executor().count(&compile(&token).unwrap()).unwrap(), 3);
    }

    #[test]
    fn test_count_ignores_seek() {
        let first = Token::new("posts")
            .add_filter(Filter::eq("status", "published"))
            .unwrap()
            .set_pagination(PaginationSpec::cursor(1, ["id"]))
            .unwrap();
        let page = executor().execute(&compile(&first).unwrap()).unwrap();
        let cursor = crate::cursor::encode(&[OrderTerm::asc("id")], &page[0]).unwrap();

        let resumed = first
            .set_pagination(PaginationSpec::cursor(1, ["id"]).after(cursor))
            .unwrap();
        let plan = compile(&resumed).unwrap();
        let rows = executor().execute(&plan).unwrap();
        assert_eq!(rows[0]["id"], json!(3));
        assert_eq!(executor().count(&plan).unwrap(), 3);
    }

    #[test]
    fn test_projection_with_alias() {
        let token = Token::new("posts")
            .add_projection([
                Projection::field("id"),
                Projection::Field {
                    column: "score".into(),
                    alias: Some("points".into()),
                },
            ])
            .unwrap();
        let rows = executor().execute(&compile(&token).unwrap()).unwrap();
        assert_eq!(rows[0], json!({"id": 1, "points": 5}).as_object().cloned().unwrap());
    }

    #[test]
    fn test_unsupported_and_unknown() {
        let joined = Token::new("posts")
            .add_join(JoinSpec::inner("users", "author").on("author_id", crate::token::FieldRef::bound("author", "id")))
            .unwrap();
        let err = executor().execute(&compile(&joined).unwrap()).unwrap_err();
        assert_eq!(err.code().code(), "EXECUTOR_UNSUPPORTED");

        let missing = Token::new("comments");
        let err = executor().execute(&compile(&missing).unwrap()).unwrap_err();
        assert_eq!(err.code().code(), "EXECUTOR_UNKNOWN_SOURCE");
    }

    #[test]
    fn test_with_json_rejects_non_objects() {
        assert!(MemoryExecutor::new().with_json("posts", json!([1, 2])).is_err());
        assert!(MemoryExecutor::new().with_json("posts", json!({})).is_err());
    }
}
