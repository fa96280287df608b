//! Fetch flow
//!
//! compile → execute root plan once → optional count → assemble → preloads.
//! Each plan reaches the executor at most once per call.

use std::thread;

use super::errors::ExecutorError;
use super::Executor;
use crate::assembler::{assemble_with, attach_preloads, parent_keys, QueryResult};
use crate::builder::{Compiler, PreloadPlan, QueryPlan};
use crate::error::{Error, Result};
use crate::observability::{log_event_with_fields, Event};
use crate::token::Token;
use crate::value::Row;

/// Options of one fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Run a separate count query for `total_count` / `total_pages`
    pub total_count: bool,
}

impl FetchOptions {
    /// Options requesting a total count
    pub fn with_total_count() -> Self {
        Self { total_count: true }
    }
}

/// Compiles, executes and assembles one Token.
pub fn fetch<E>(executor: &E, compiler: &Compiler, token: &Token, options: FetchOptions) -> Result<QueryResult>
where
    E: Executor + ?Sized,
{
    let plan = compiler.compile(token)?;
    run_plan(executor, compiler, &plan, options)
}

/// Executes and assembles an already compiled plan.
pub fn run_plan<E>(
    executor: &E,
    compiler: &Compiler,
    plan: &QueryPlan,
    options: FetchOptions,
) -> Result<QueryResult>
where
    E: Executor + ?Sized,
{
    let rows = dispatch(executor, plan)?;
    let total = if options.total_count && plan.pagination.is_some() {
        Some(executor.count(plan)?)
    } else {
        None
    };

    let mut result = assemble_with(compiler.codec(), plan.pagination.as_ref(), rows, total)?;
    load_preloads(executor, &mut result.data, &plan.preloads)?;
    Ok(result)
}

/// Fetches independent Tokens concurrently, one scoped thread per Token.
///
/// Results come back in input order. One failure does not affect the others.
pub fn fetch_batch<E>(
    executor: &E,
    compiler: &Compiler,
    tokens: &[Token],
    options: FetchOptions,
) -> Vec<Result<QueryResult>>
where
    E: Executor + Sync + ?Sized,
{
    thread::scope(|scope| {
        let handles: Vec<_> = tokens
            .iter()
            .map(|token| scope.spawn(move || fetch(executor, compiler, token, options)))
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    Err(Error::Executor(ExecutorError::execution_failed(
                        "fetch thread panicked",
                    )))
                })
            })
            .collect()
    })
}

fn dispatch<E>(executor: &E, plan: &QueryPlan) -> Result<Vec<Row>>
where
    E: Executor + ?Sized,
{
    let params = plan.params.len().to_string();
    log_event_with_fields(
        Event::PlanDispatched,
        &[("source", plan.source.as_str()), ("params", params.as_str())],
    );
    Ok(executor.execute(plan)?)
}

// Children are fetched once per preload for the whole page of parents.
fn load_preloads<E>(executor: &E, parents: &mut [Row], preloads: &[PreloadPlan]) -> Result<()>
where
    E: Executor + ?Sized,
{
    for preload in preloads {
        let keys = parent_keys(parents, &preload.parent_key);
        let children = if keys.is_empty() {
            Vec::new()
        } else {
            let plan = preload.plan.restrict_to_keys(&preload.foreign_key, keys);
            let mut rows = dispatch(executor, &plan)?;
            load_preloads(executor, &mut rows, &plan.preloads)?;
            rows
        };
        attach_preloads(
            parents,
            &preload.assoc,
            &preload.parent_key,
            &preload.foreign_key,
            children,
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecutorResult, MemoryExecutor, RawRowSet};
    use crate::token::{Filter, OrderTerm, PaginationSpec, PreloadOpts};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts executor calls
    struct Counting {
        inner: MemoryExecutor,
        executes: AtomicUsize,
        counts: AtomicUsize,
    }

    impl Executor for Counting {
        fn execute(&self, plan: &QueryPlan) -> ExecutorResult<RawRowSet> {
            self.executes.fetch_add(1, Ordering::SeqCst);
            self.inner.execute(plan)
        }

        fn count(&self, plan: &QueryPlan) -> ExecutorResult<u64> {
            self.counts.fetch_add(1, Ordering::SeqCst);
            self.inner.count(plan)
        }
    }

    fn counting() -> Counting {
        let inner = MemoryExecutor::new()
            .with_json("posts", json!([{"id": 1}, {"id": 2}, {"id": 3}]))
            .unwrap()
            .with_json(
                "comments",
                json!([
                    {"id": 10, "post_id": 1},
                    {"id": 11, "post_id": 3},
                    {"id": 12, "post_id": 1},
                ]),
            )
            .unwrap();
        Counting {
            inner,
            executes: AtomicUsize::new(0),
            counts: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_each_plan_executes_once() {
        let executor = counting();
        let comments = Token::new("comments").add_order(OrderTerm::desc("id")).unwrap();
        let token = Token::new("posts")
            .add_order(OrderTerm::asc("id"))
            .unwrap()
            .set_pagination(PaginationSpec::offset(2, 0))
            .unwrap()
            .add_preload("comments", comments, PreloadOpts::new("id", "post_id"))
            .unwrap();

        let result = fetch(&executor, &Compiler::default(), &token, FetchOptions::with_total_count()).unwrap();
        assert_eq!(executor.executes.load(Ordering::SeqCst), 2);
        assert_eq!(executor.counts.load(Ordering::SeqCst), 1);

        assert_eq!(result.len(), 2);
        assert_eq!(result.pagination.as_ref().unwrap().total_pages, Some(2));
        let first: Vec<_> = result.data[0]["comments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].clone())
            .collect();
        assert_eq!(first, vec![json!(12), json!(10)]);
        assert_eq!(result.data[1]["comments"], json!([]));
    }

    #[test]
    fn test_build_error_never_dispatches() {
        let executor = counting();
        let token = Token::new("posts")
            .set_pagination(PaginationSpec::offset(0, 0))
            .unwrap();
        let err = fetch(&executor, &Compiler::default(), &token, FetchOptions::default()).unwrap_err();
        assert_eq!(err.code(), "QUERY_DIVISION_BY_ZERO");
        assert_eq!(executor.executes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_batch_preserves_order() {
        let executor = counting();
        let tokens = vec![
            Token::new("posts").add_filter(Filter::eq("id", 2)).unwrap(),
            Token::new("missing"),
            Token::new("comments"),
        ];
        let results = fetch_batch(&executor, &Compiler::default(), &tokens, FetchOptions::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().len(), 1);
        assert_eq!(results[1].as_ref().unwrap_err().code(), "EXECUTOR_UNKNOWN_SOURCE");
        assert_eq!(results[2].as_ref().unwrap().len(), 3);
    }
}
