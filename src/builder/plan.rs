//! Compiled query plan
//!
//! Backend-neutral, immutable form of a Token. Literal values never appear in
//! the predicate tree: they live in `params` and are referenced positionally,
//! so a dialect can render the plan without string interpolation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::{Aggregate, Direction, JoinKind, OrderTerm};

/// Resolved binding of a column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    Root,
    Named(String),
}

/// Column resolved against the binding scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub binding: Binding,
    pub field: String,
}

impl Column {
    pub fn root(field: impl Into<String>) -> Self {
        Self {
            binding: Binding::Root,
            field: field.into(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.binding {
            Binding::Root => write!(f, "{}", self.field),
            Binding::Named(b) => write!(f, "{}.{}", b, self.field),
        }
    }
}

/// Operand of a predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Column(Column),
    /// Index into `QueryPlan::params`
    Param(usize),
    /// Case-normalizing wrapper
    Lower(Box<Operand>),
}

impl Operand {
    pub(crate) fn lower(self) -> Self {
        Operand::Lower(Box::new(self))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Column(c) => write!(f, "{}", c),
            Operand::Param(i) => write!(f, "${}", i + 1),
            Operand::Lower(inner) => write!(f, "lower({})", inner),
        }
    }
}

/// Binary comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Neq => "<>",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }
}

/// Predicate tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Compare {
        lhs: Operand,
        op: Comparison,
        rhs: Operand,
    },
    In {
        lhs: Operand,
        rhs: Vec<Operand>,
        negated: bool,
    },
    /// Inclusive on both bounds
    Between {
        lhs: Operand,
        low: Operand,
        high: Operand,
    },
    Like {
        lhs: Operand,
        pattern: Operand,
    },
    IsNull {
        lhs: Operand,
        negated: bool,
    },
    /// Column (array or text) contains every listed element
    Contains {
        lhs: Operand,
        rhs: Vec<Operand>,
    },
    JsonContains {
        lhs: Operand,
        rhs: Operand,
    },
    JsonHasKey {
        lhs: Operand,
        key: Operand,
    },
    /// Raw fragment; each `?` in `sql` is the next entry of `params`
    Raw {
        sql: String,
        params: Vec<Operand>,
    },
}

impl Predicate {
    /// Conjunction of `parts`, flattening the single-item case
    pub(crate) fn all(mut parts: Vec<Predicate>) -> Option<Predicate> {
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Predicate::And(parts)),
        }
    }
}

fn join_display<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::And(parts) => write!(f, "({})", join_display(parts, " AND ")),
            Predicate::Or(parts) => write!(f, "({})", join_display(parts, " OR ")),
            Predicate::Compare { lhs, op, rhs } => write!(f, "{} {} {}", lhs, op.symbol(), rhs),
            Predicate::In { lhs, rhs, negated } => {
                let kw = if *negated { "NOT IN" } else { "IN" };
                write!(f, "{} {} ({})", lhs, kw, join_display(rhs, ", "))
            }
            Predicate::Between { lhs, low, high } => {
                write!(f, "{} BETWEEN {} AND {}", lhs, low, high)
            }
            Predicate::Like { lhs, pattern } => write!(f, "{} LIKE {}", lhs, pattern),
            Predicate::IsNull { lhs, negated } => {
                let kw = if *negated { "IS NOT NULL" } else { "IS NULL" };
                write!(f, "{} {}", lhs, kw)
            }
            Predicate::Contains { lhs, rhs } => {
                write!(f, "{} CONTAINS ({})", lhs, join_display(rhs, ", "))
            }
            Predicate::JsonContains { lhs, rhs } => write!(f, "{} @> {}", lhs, rhs),
            Predicate::JsonHasKey { lhs, key } => write!(f, "{} ? {}", lhs, key),
            Predicate::Raw { sql, params } => {
                write!(f, "RAW[{}] ({})", sql, join_display(params, ", "))
            }
        }
    }
}

/// Resolved order entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOrder {
    pub column: Column,
    pub direction: Direction,
}

impl fmt::Display for PlanOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.direction)
    }
}

/// Resolved join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanJoin {
    pub target: String,
    pub kind: JoinKind,
    pub binding: String,
    pub on: Vec<(Column, Column)>,
}

/// Resolved projection entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanProjection {
    Column {
        column: Column,
        alias: Option<String>,
    },
    Aggregate {
        function: Aggregate,
        column: Option<Column>,
        alias: String,
    },
}

/// Resolved window definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanWindow {
    pub name: String,
    pub partition_by: Vec<Column>,
    pub order_by: Vec<PlanOrder>,
}

/// Order in which the executor scans relative to the declared order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanDirection {
    Forward,
    /// `order_list` is reversed; the assembler restores declared order
    Backward,
}

/// Pagination instruction for the executor and the assembler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationDirective {
    Offset {
        limit: u64,
        offset: u64,
    },
    Cursor {
        limit: u64,
        /// Declared sort order; cursors are minted against it
        order_terms: Vec<OrderTerm>,
        scan: ScanDirection,
        /// An `after` or `before` cursor was supplied
        resumed: bool,
    },
}

impl PaginationDirective {
    /// Page size
    pub fn limit(&self) -> u64 {
        match self {
            PaginationDirective::Offset { limit, .. } | PaginationDirective::Cursor { limit, .. } => {
                *limit
            }
        }
    }

    /// Rows the executor fetches: one past the page, to detect `has_more`
    pub fn fetch_limit(&self) -> u64 {
        self.limit().saturating_add(1)
    }

    /// Rows the executor skips first
    pub fn offset(&self) -> u64 {
        match self {
            PaginationDirective::Offset { offset, .. } => *offset,
            PaginationDirective::Cursor { .. } => 0,
        }
    }

    /// Reverse the fetched rows after trimming
    pub fn is_backward(&self) -> bool {
        matches!(
            self,
            PaginationDirective::Cursor {
                scan: ScanDirection::Backward,
                ..
            }
        )
    }
}

/// Compiled common table expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPlan {
    pub name: String,
    pub plan: QueryPlan,
}

/// Compiled preload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreloadPlan {
    pub assoc: String,
    pub parent_key: String,
    pub foreign_key: String,
    pub plan: QueryPlan,
}

/// Compiled query plan, one per Token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub source: String,
    /// Filters and raw fragments. `count` evaluates this alone.
    pub predicate: Option<Predicate>,
    /// Keyset seek decoded from `after` / `before`. Only `execute` applies it.
    pub seek: Option<Predicate>,
    pub order_list: Vec<PlanOrder>,
    pub join_list: Vec<PlanJoin>,
    pub pagination: Option<PaginationDirective>,
    pub projection: Vec<PlanProjection>,
    pub group_by: Vec<Column>,
    pub having: Option<Predicate>,
    pub ctes: Vec<NamedPlan>,
    pub windows: Vec<PlanWindow>,
    /// Positional parameters referenced by `Operand::Param`
    pub params: Vec<serde_json::Value>,
    pub preloads: Vec<PreloadPlan>,
}

impl QueryPlan {
    /// Copy of this plan further restricted to rows whose root `field` is one
    /// of `keys`. Used to fetch preloaded children for a page of parents.
    pub fn restrict_to_keys(&self, field: &str, keys: Vec<serde_json::Value>) -> QueryPlan {
        let mut plan = self.clone();
        let base = plan.params.len();
        let rhs = (0..keys.len()).map(|i| Operand::Param(base + i)).collect();
        plan.params.extend(keys);

        let restriction = Predicate::In {
            lhs: Operand::Column(Column::root(field)),
            rhs,
            negated: false,
        };
        plan.predicate = match plan.predicate.take() {
            None => Some(restriction),
            Some(Predicate::And(mut parts)) => {
                parts.push(restriction);
                Some(Predicate::And(parts))
            }
            Some(existing) => Some(Predicate::And(vec![existing, restriction])),
        };
        plan
    }

    /// Predicate a page of rows must satisfy: the filters ANDed with the seek.
    pub fn row_predicate(&self) -> Option<Predicate> {
        let parts = self.predicate.iter().chain(self.seek.iter()).cloned().collect();
        Predicate::all(parts)
    }

    /// Value of a positional parameter
    pub fn param(&self, index: usize) -> Option<&serde_json::Value> {
        self.params.get(index)
    }
}
