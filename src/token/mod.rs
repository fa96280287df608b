//! Query Token
//!
//! A Token is an immutable description of one query's intended operations.
//! Every builder operation validates the new item, then returns a new Token
//! with the item appended. The receiver is never modified.
//!
//! # Equivalence
//!
//! Single-item and list-accepting operations are interchangeable: only the
//! final item order matters, never the call arity.
//!
//! ```ignore
//! let a = Token::new("posts").add_filter(f1)?.add_filter(f2)?;
//! let b = Token::new("posts").add_filters([f1, f2])?;
//! assert_eq!(a, b);
//! ```

mod clause;
mod errors;
mod field;
mod filter;
mod join;
mod order;
mod pagination;

pub use clause::{Aggregate, Cte, Preload, PreloadOpts, Projection, RawPredicate, WindowSpec};
pub use errors::{ConstructionError, ConstructionResult};
pub use field::FieldRef;
pub use filter::Filter;
pub use join::{JoinCondition, JoinKind, JoinSpec};
pub use order::{Direction, OrderTerm};
pub use pagination::{CursorField, PaginationSpec};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use errors::require_identifier;

/// Immutable description of a pending query
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Token {
    /// Root source name
    pub root: String,
    pub filters: Vec<Filter>,
    pub orders: Vec<OrderTerm>,
    pub joins: Vec<JoinSpec>,
    pub pagination: Option<PaginationSpec>,
    pub group_by: Vec<FieldRef>,
    pub having: Vec<Filter>,
    pub projection: Vec<Projection>,
    pub ctes: Vec<Cte>,
    pub windows: Vec<WindowSpec>,
    pub raw_predicates: Vec<RawPredicate>,
    pub preloads: Vec<Preload>,
}

impl Token {
    /// Creates an empty Token over `root`
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Appends one filter
    pub fn add_filter(&self, filter: Filter) -> ConstructionResult<Self> {
        self.add_filters([filter])
    }

    /// Appends filters in order
    pub fn add_filters(&self, filters: impl IntoIterator<Item = Filter>) -> ConstructionResult<Self> {
        let mut next = self.clone();
        for filter in filters {
            filter.validate()?;
            next.filters.push(filter);
        }
        Ok(next)
    }

    /// Appends one order term
    pub fn add_order(&self, term: OrderTerm) -> ConstructionResult<Self> {
        self.add_orders([term])
    }

    /// Appends order terms in order
    pub fn add_orders(&self, terms: impl IntoIterator<Item = OrderTerm>) -> ConstructionResult<Self> {
        let mut next = self.clone();
        for term in terms {
            term.validate()?;
            next.orders.push(term);
        }
        Ok(next)
    }

    /// Replaces the pagination spec
    pub fn set_pagination(&self, spec: PaginationSpec) -> ConstructionResult<Self> {
        spec.validate()?;
        let mut next = self.clone();
        next.pagination = Some(spec);
        Ok(next)
    }

    /// Appends one join
    pub fn add_join(&self, join: JoinSpec) -> ConstructionResult<Self> {
        self.add_joins([join])
    }

    /// Appends joins in order
    pub fn add_joins(&self, joins: impl IntoIterator<Item = JoinSpec>) -> ConstructionResult<Self> {
        let mut next = self.clone();
        for join in joins {
            join.validate()?;
            next.joins.push(join);
        }
        Ok(next)
    }

    /// Appends grouping columns in order
    pub fn add_group_by<I, F>(&self, columns: I) -> ConstructionResult<Self>
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldRef>,
    {
        let mut next = self.clone();
        for column in columns {
            let column = column.into();
            require_identifier(&column.field, "group_by field")?;
            next.group_by.push(column);
        }
        Ok(next)
    }

    /// Appends one HAVING filter
    pub fn add_having(&self, filter: Filter) -> ConstructionResult<Self> {
        filter.validate()?;
        let mut next = self.clone();
        next.having.push(filter);
        Ok(next)
    }

    /// Appends projection entries in order
    pub fn add_projection(
        &self,
        entries: impl IntoIterator<Item = Projection>,
    ) -> ConstructionResult<Self> {
        let mut next = self.clone();
        for entry in entries {
            entry.validate()?;
            next.projection.push(entry);
        }
        Ok(next)
    }

    /// Appends a named common table expression
    pub fn add_cte(&self, name: impl Into<String>, token: Token) -> ConstructionResult<Self> {
        let name = name.into();
        require_identifier(&name, "cte name")?;
        let mut next = self.clone();
        next.ctes.push(Cte { name, token });
        Ok(next)
    }

    /// Appends a window definition
    pub fn add_window(&self, window: WindowSpec) -> ConstructionResult<Self> {
        window.validate()?;
        let mut next = self.clone();
        next.windows.push(window);
        Ok(next)
    }

    /// Appends a raw predicate fragment
    pub fn add_raw_predicate(&self, raw: RawPredicate) -> ConstructionResult<Self> {
        raw.validate()?;
        let mut next = self.clone();
        next.raw_predicates.push(raw);
        Ok(next)
    }

    /// Attaches a nested Token whose rows are keyed to this Token's rows
    pub fn add_preload(
        &self,
        assoc: impl Into<String>,
        token: Token,
        opts: PreloadOpts,
    ) -> ConstructionResult<Self> {
        let preload = Preload {
            assoc: assoc.into(),
            token,
            opts,
        };
        preload.validate()?;
        let mut next = self.clone();
        next.preloads.push(preload);
        Ok(next)
    }

    /// Effective sort order: the declared orders, or the cursor fields
    /// (ascending unless stated) when no orders were declared.
    pub fn effective_orders(&self) -> Vec<OrderTerm> {
        if !self.orders.is_empty() {
            return self.orders.clone();
        }
        match &self.pagination {
            Some(PaginationSpec::Cursor { cursor_fields, .. }) => cursor_fields
                .iter()
                .map(|f| OrderTerm {
                    field: f.field.clone(),
                    direction: f.direction.unwrap_or(Direction::Asc),
                    binding: f.binding.clone(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Structural hash of the full Token tree, preloads and CTEs included.
    ///
    /// Two Tokens share a key only if they are structurally equal, which makes
    /// this the key any plan cache must use.
    pub fn structural_key(&self) -> String {
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&canonical);
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
