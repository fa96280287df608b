//! Token compiler
//!
//! Turns a Token tree into a QueryPlan tree, or fails with a structural error
//! before anything reaches an executor.
//!
//! Compilation order (per Token):
//! 1. Declare join bindings and resolve their conditions
//! 2. Check limits and the cursor/order invariant
//! 3. Lower filters, raw predicates and decoded cursors into one predicate
//! 4. Emit the order list (reversed for backward scans)
//! 5. Resolve grouping, having, projection and windows
//! 6. Compile CTEs, then preloads under the parent's bindings
//!
//! Compilation is deterministic: the same Token yields the same plan.

use super::errors::{BuildError, BuildResult};
use super::plan::{
    Comparison, NamedPlan, Operand, PaginationDirective, PlanJoin, PlanOrder,
    PlanProjection, PlanWindow, Predicate, PreloadPlan, QueryPlan, ScanDirection,
};
use super::raw::compile_raw;
use super::scope::BindingScope;
use crate::config::EngineConfig;
use crate::cursor::{CompoundPredicate, CursorCodec, KeyBound, KeyComparison, Seek};
use crate::observability::{log_event_with_fields, Event};
use crate::token::{
    ConstructionError, CursorField, Filter, OrderTerm, PaginationSpec, Projection, Token,
};
use crate::value::{Operator, Value};

// Positional parameter list shared by every predicate of one plan.
#[derive(Debug, Default)]
struct Params(Vec<serde_json::Value>);

impl Params {
    fn push(&mut self, value: serde_json::Value) -> Operand {
        self.0.push(value);
        Operand::Param(self.0.len() - 1)
    }
}

/// Compiles Tokens under one configuration
#[derive(Debug, Clone)]
pub struct Compiler {
    config: EngineConfig,
    codec: CursorCodec,
}

impl Compiler {
    /// Creates a compiler
    pub fn new(config: EngineConfig) -> Self {
        let codec = CursorCodec::new(&config);
        Self { config, codec }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Codec used for cursors supplied on Tokens and minted for pages
    pub fn codec(&self) -> &CursorCodec {
        &self.codec
    }

    /// Compiles a Token tree into a plan tree.
    pub fn compile(&self, token: &Token) -> BuildResult<QueryPlan> {
        let root = BindingScope::root();
        match self.compile_token(token, &root, 0) {
            Ok(plan) => {
                let params = plan.params.len().to_string();
                let preloads = plan.preloads.len().to_string();
                log_event_with_fields(
                    Event::TokenCompiled,
                    &[
                        ("source", plan.source.as_str()),
                        ("params", params.as_str()),
                        ("preloads", preloads.as_str()),
                    ],
                );
                Ok(plan)
            }
            Err(err) => {
                if err.is_cursor_error() {
                    log_event_with_fields(
                        Event::CursorRejected,
                        &[("code", err.code()), ("source", token.root.as_str())],
                    );
                }
                let reason = err.to_string();
                log_event_with_fields(
                    Event::CompileRejected,
                    &[
                        ("code", err.code()),
                        ("reason", reason.as_str()),
                        ("source", token.root.as_str()),
                    ],
                );
                Err(err)
            }
        }
    }

    fn compile_token(
        &self,
        token: &Token,
        parent: &BindingScope<'_>,
        depth: usize,
    ) -> BuildResult<QueryPlan> {
        if token.root.trim().is_empty() {
            return Err(BuildError::InvalidSource);
        }

        // 1. Joins
        let mut scope = BindingScope::child(parent);
        for join in &token.joins {
            join.validate()?;
            scope.declare(&join.binding)?;
        }
        let mut join_list = Vec::with_capacity(token.joins.len());
        for join in &token.joins {
            let mut on = Vec::with_capacity(join.on.len());
            for cond in &join.on {
                on.push((
                    scope.resolve(&cond.left, "join condition")?,
                    scope.resolve(&cond.right, "join condition")?,
                ));
            }
            join_list.push(PlanJoin {
                target: join.target.clone(),
                kind: join.kind,
                binding: join.binding.clone(),
                on,
            });
        }

        // 2. Pagination
        let mut seeks = Vec::new();
        let order_terms = token.effective_orders();
        let pagination = match &token.pagination {
            None => None,
            Some(spec) => Some(self.plan_pagination(token, spec, &order_terms, &mut seeks)?),
        };

        // 3. Predicate: filters and raw fragments, then cursor seeks kept apart
        let mut params = Params::default();
        let mut predicate_parts = Vec::with_capacity(token.filters.len());
        for filter in &token.filters {
            predicate_parts.push(lower_filter(filter, &scope, &mut params, "filter")?);
        }
        for raw in &token.raw_predicates {
            raw.validate()?;
            let compiled = compile_raw(raw)?;
            let operands = compiled.values.into_iter().map(|v| params.push(v)).collect();
            predicate_parts.push(Predicate::Raw {
                sql: compiled.sql,
                params: operands,
            });
        }
        let mut seek_parts = Vec::with_capacity(seeks.len());
        for seek in &seeks {
            seek_parts.push(lower_seek(seek, &scope, &mut params)?);
        }

        // 4. Order list
        let backward = pagination
            .as_ref()
            .map(PaginationDirective::is_backward)
            .unwrap_or(false);
        let mut order_list = Vec::with_capacity(order_terms.len());
        for term in &order_terms {
            term.validate()?;
            order_list.push(PlanOrder {
                column: scope.resolve(&term.column(), "order")?,
                direction: if backward {
                    term.direction.reversed()
                } else {
                    term.direction
                },
            });
        }

        // 5. Grouping, having, projection, windows
        let group_by = token
            .group_by
            .iter()
            .map(|c| scope.resolve(c, "group_by"))
            .collect::<BuildResult<Vec<_>>>()?;

        let mut having_parts = Vec::with_capacity(token.having.len());
        for filter in &token.having {
            having_parts.push(lower_filter(filter, &scope, &mut params, "having")?);
        }

        let mut projection = Vec::with_capacity(token.projection.len());
        for entry in &token.projection {
            entry.validate()?;
            projection.push(resolve_projection(entry, &scope)?);
        }

        let mut windows = Vec::with_capacity(token.windows.len());
        for window in &token.windows {
            window.validate()?;
            let partition_by = window
                .partition_by
                .iter()
                .map(|c| scope.resolve(c, "window partition"))
                .collect::<BuildResult<Vec<_>>>()?;
            let order_by = window
                .order_by
                .iter()
                .map(|t| {
                    Ok(PlanOrder {
                        column: scope.resolve(&t.column(), "window order")?,
                        direction: t.direction,
                    })
                })
                .collect::<BuildResult<Vec<_>>>()?;
            windows.push(PlanWindow {
                name: window.name.clone(),
                partition_by,
                order_by,
            });
        }

        // 6. CTEs compile standalone, preloads inherit this scope
        let mut ctes = Vec::with_capacity(token.ctes.len());
        for cte in &token.ctes {
            ctes.push(NamedPlan {
                name: cte.name.clone(),
                plan: self.compile_token(&cte.token, &BindingScope::root(), depth)?,
            });
        }

        let mut preloads = Vec::with_capacity(token.preloads.len());
        for preload in &token.preloads {
            preload.validate()?;
            let child_depth = depth + 1;
            if child_depth > self.config.max_preload_depth {
                return Err(BuildError::PreloadDepthExceeded {
                    depth: child_depth,
                    max: self.config.max_preload_depth,
                });
            }
            if preload.token.pagination.is_some() {
                return Err(BuildError::PreloadPagination(preload.assoc.clone()));
            }
            preloads.push(PreloadPlan {
                assoc: preload.assoc.clone(),
                parent_key: preload.opts.parent_key.clone(),
                foreign_key: preload.opts.foreign_key.clone(),
                plan: self.compile_token(&preload.token, &scope, child_depth)?,
            });
        }

        Ok(QueryPlan {
            source: token.root.clone(),
            predicate: Predicate::all(predicate_parts),
            seek: Predicate::all(seek_parts),
            order_list,
            join_list,
            pagination,
            projection,
            group_by,
            having: Predicate::all(having_parts),
            ctes,
            windows,
            params: params.0,
            preloads,
        })
    }

    fn plan_pagination(
        &self,
        token: &Token,
        spec: &PaginationSpec,
        order_terms: &[OrderTerm],
        seeks: &mut Vec<CompoundPredicate>,
    ) -> BuildResult<PaginationDirective> {
        spec.validate()?;
        let max = self.config.max_limit;

        match spec {
            PaginationSpec::Offset { limit, offset } => {
                if *limit == 0 {
                    return Err(BuildError::DivisionByZero);
                }
                if *limit > max {
                    return Err(BuildError::InvalidLimit { limit: *limit, max });
                }
                Ok(PaginationDirective::Offset {
                    limit: *limit,
                    offset: *offset,
                })
            }
            PaginationSpec::Cursor {
                limit,
                cursor_fields,
                after,
                before,
            } => {
                if *limit == 0 || *limit > max {
                    return Err(BuildError::InvalidLimit { limit: *limit, max });
                }
                check_cursor_fields(&token.orders, cursor_fields)?;

                if let Some(cursor) = after {
                    seeks.push(self.codec.decode(cursor, order_terms, Seek::After)?);
                }
                if let Some(cursor) = before {
                    seeks.push(self.codec.decode(cursor, order_terms, Seek::Before)?);
                }

                let scan = if before.is_some() && after.is_none() {
                    ScanDirection::Backward
                } else {
                    ScanDirection::Forward
                };
                Ok(PaginationDirective::Cursor {
                    limit: *limit,
                    order_terms: order_terms.to_vec(),
                    scan,
                    resumed: after.is_some() || before.is_some(),
                })
            }
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Compiles a Token with the default configuration.
pub fn compile(token: &Token) -> BuildResult<QueryPlan> {
    Compiler::default().compile(token)
}

/// Cursor fields must be a term-for-term prefix of the declared orders. A
/// field that omits its direction takes it from the matching order term. With
/// no declared orders the cursor fields define the order themselves.
///
/// Cursors always carry the full order list, so a shorter prefix still seeks
/// on every order term.
fn check_cursor_fields(orders: &[OrderTerm], fields: &[CursorField]) -> BuildResult<()> {
    if orders.is_empty() {
        return Ok(());
    }
    if fields.len() > orders.len() {
        return Err(BuildError::cursor_order_mismatch(
            orders.len(),
            format!(
                "{} cursor fields for {} order terms",
                fields.len(),
                orders.len()
            ),
        ));
    }
    for (position, (field, term)) in fields.iter().zip(orders).enumerate() {
        if field.column() != term.column() {
            return Err(BuildError::cursor_order_mismatch(
                position,
                format!("expected '{}', found '{}'", term.column(), field.column()),
            ));
        }
        if let Some(direction) = field.direction {
            if direction != term.direction {
                return Err(BuildError::cursor_order_mismatch(
                    position,
                    format!(
                        "'{}' is ordered {} but the cursor field says {}",
                        term.column(),
                        term.direction,
                        direction
                    ),
                ));
            }
        }
    }
    Ok(())
}

// f1 ≻ v1 OR (f1 = v1 AND (f2 ≻ v2 OR (...)))
fn lower_seek(
    seek: &CompoundPredicate,
    scope: &BindingScope<'_>,
    params: &mut Params,
) -> BuildResult<Predicate> {
    lower_bounds(&seek.bounds, scope, params)
        .unwrap_or_else(|| Err(BuildError::cursor_order_mismatch(0, "cursor has no sort keys")))
}

fn lower_bounds(
    bounds: &[KeyBound],
    scope: &BindingScope<'_>,
    params: &mut Params,
) -> Option<BuildResult<Predicate>> {
    let (first, rest) = bounds.split_first()?;
    let column = match scope.resolve(&first.column, "cursor") {
        Ok(column) => Operand::Column(column),
        Err(err) => return Some(Err(err)),
    };
    let value = params.push(first.value.clone());
    let strict = Predicate::Compare {
        lhs: column.clone(),
        op: match first.comparison {
            KeyComparison::Gt => Comparison::Gt,
            KeyComparison::Lt => Comparison::Lt,
        },
        rhs: value.clone(),
    };

    let tail = match lower_bounds(rest, scope, params) {
        None => return Some(Ok(strict)),
        Some(Err(err)) => return Some(Err(err)),
        Some(Ok(tail)) => tail,
    };
    let tie = Predicate::Compare {
        lhs: column,
        op: Comparison::Eq,
        rhs: value,
    };
    Some(Ok(Predicate::Or(vec![
        strict,
        Predicate::And(vec![tie, tail]),
    ])))
}

fn missing_value(filter: &Filter) -> BuildError {
    ConstructionError::filter_shape(&filter.field, format!("{} is missing its value", filter.operator))
        .into()
}

/// Lowers one filter into a predicate, pushing its literals as parameters.
fn lower_filter(
    filter: &Filter,
    scope: &BindingScope<'_>,
    params: &mut Params,
    context: &str,
) -> BuildResult<Predicate> {
    filter.validate()?;

    let column = Operand::Column(scope.resolve(&filter.column(), context)?);
    let fold = |op: Operand| {
        if filter.case_insensitive {
            op.lower()
        } else {
            op
        }
    };
    let mut operands: Vec<Operand> = filter
        .value
        .clone()
        .map(Value::into_params)
        .unwrap_or_default()
        .into_iter()
        .map(|v| params.push(v))
        .collect();

    let compare = |op: Comparison, operands: &mut Vec<Operand>| -> BuildResult<Predicate> {
        let rhs = operands.pop().ok_or_else(|| missing_value(filter))?;
        Ok(Predicate::Compare {
            lhs: fold(column.clone()),
            op,
            rhs: fold(rhs),
        })
    };

    let predicate = match filter.operator {
        Operator::Eq => compare(Comparison::Eq, &mut operands)?,
        Operator::Neq => compare(Comparison::Neq, &mut operands)?,
        Operator::Gt => compare(Comparison::Gt, &mut operands)?,
        Operator::Gte => compare(Comparison::Gte, &mut operands)?,
        Operator::Lt => compare(Comparison::Lt, &mut operands)?,
        Operator::Lte => compare(Comparison::Lte, &mut operands)?,
        Operator::In | Operator::NotIn => Predicate::In {
            lhs: fold(column.clone()),
            rhs: operands.into_iter().map(&fold).collect(),
            negated: filter.operator == Operator::NotIn,
        },
        Operator::Between => {
            let [low, high]: [Operand; 2] =
                operands.try_into().map_err(|_| missing_value(filter))?;
            Predicate::Between {
                lhs: column.clone(),
                low,
                high,
            }
        }
        Operator::Like => Predicate::Like {
            lhs: fold(column.clone()),
            pattern: fold(operands.pop().ok_or_else(|| missing_value(filter))?),
        },
        Operator::Ilike => Predicate::Like {
            lhs: column.clone().lower(),
            pattern: operands.pop().ok_or_else(|| missing_value(filter))?.lower(),
        },
        Operator::IsNil | Operator::NotNil => Predicate::IsNull {
            lhs: column.clone(),
            negated: filter.operator == Operator::NotNil,
        },
        Operator::Contains => Predicate::Contains {
            lhs: column.clone(),
            rhs: operands,
        },
        Operator::JsonContains => Predicate::JsonContains {
            lhs: column.clone(),
            rhs: operands.pop().ok_or_else(|| missing_value(filter))?,
        },
        Operator::JsonHasKey => Predicate::JsonHasKey {
            lhs: column.clone(),
            key: operands.pop().ok_or_else(|| missing_value(filter))?,
        },
    };
    Ok(predicate)
}

fn resolve_projection(entry: &Projection, scope: &BindingScope<'_>) -> BuildResult<PlanProjection> {
    Ok(match entry {
        Projection::Field { column, alias } => PlanProjection::Column {
            column: scope.resolve(column, "projection")?,
            alias: alias.clone(),
        },
        Projection::Aggregate {
            function,
            column,
            alias,
        } => PlanProjection::Aggregate {
            function: *function,
            column: column
                .as_ref()
                .map(|c| scope.resolve(c, "projection"))
                .transpose()?,
            alias: alias.clone(),
        },
    })
}
