//! Projection, CTE, window, raw predicate and preload entries

use serde::{Deserialize, Serialize};

use super::errors::{require_identifier, ConstructionError, ConstructionResult};
use super::field::FieldRef;
use super::order::OrderTerm;
use super::Token;

/// Aggregate functions usable in a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Count => "count",
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }
}

/// One selected output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    Field {
        column: FieldRef,
        alias: Option<String>,
    },
    Aggregate {
        function: Aggregate,
        /// `None` only for `count(*)`
        column: Option<FieldRef>,
        alias: String,
    },
}

impl Projection {
    pub fn field(column: impl Into<FieldRef>) -> Self {
        Projection::Field {
            column: column.into(),
            alias: None,
        }
    }

    pub fn aggregate(function: Aggregate, column: Option<FieldRef>, alias: impl Into<String>) -> Self {
        Projection::Aggregate {
            function,
            column,
            alias: alias.into(),
        }
    }

    pub fn count_all(alias: impl Into<String>) -> Self {
        Self::aggregate(Aggregate::Count, None, alias)
    }

    pub(crate) fn validate(&self) -> ConstructionResult<()> {
        match self {
            Projection::Field { column, alias } => {
                require_identifier(&column.field, "projection field")?;
                if let Some(alias) = alias {
                    require_identifier(alias, "projection alias")?;
                }
                Ok(())
            }
            Projection::Aggregate {
                function,
                column,
                alias,
            } => {
                require_identifier(alias, "aggregate alias")?;
                match (function, column) {
                    (Aggregate::Count, None) => Ok(()),
                    (_, None) => Err(ConstructionError::InvalidProjection(format!(
                        "{} requires a column",
                        function.as_str()
                    ))),
                    (_, Some(column)) => require_identifier(&column.field, "aggregate field"),
                }
            }
        }
    }
}

/// Named common table expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cte {
    pub name: String,
    pub token: Token,
}

/// Named window definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub name: String,
    pub partition_by: Vec<FieldRef>,
    pub order_by: Vec<OrderTerm>,
}

impl WindowSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_by: Vec::new(),
            order_by: Vec::new(),
        }
    }

    pub fn partition_by(mut self, column: impl Into<FieldRef>) -> Self {
        self.partition_by.push(column.into());
        self
    }

    pub fn order_by(mut self, term: OrderTerm) -> Self {
        self.order_by.push(term);
        self
    }

    pub(crate) fn validate(&self) -> ConstructionResult<()> {
        require_identifier(&self.name, "window name")?;
        for column in &self.partition_by {
            require_identifier(&column.field, "window partition")?;
        }
        for term in &self.order_by {
            term.validate()?;
        }
        Ok(())
    }
}

/// Raw predicate fragment with named placeholders (`:name`).
///
/// Placeholders are replaced by positional parameters at compile time; values
/// are never spliced into the template text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPredicate {
    pub template: String,
    pub params: Vec<(String, serde_json::Value)>,
}

impl RawPredicate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub(crate) fn validate(&self) -> ConstructionResult<()> {
        if self.template.trim().is_empty() {
            return Err(ConstructionError::InvalidRawTemplate(
                "template must not be empty".to_string(),
            ));
        }
        for (i, (name, _)) in self.params.iter().enumerate() {
            if !is_placeholder_name(name) {
                return Err(ConstructionError::InvalidRawTemplate(format!(
                    "invalid parameter name '{}'",
                    name
                )));
            }
            if self.params[..i].iter().any(|(other, _)| other == name) {
                return Err(ConstructionError::InvalidRawTemplate(format!(
                    "parameter '{}' bound twice",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// How preloaded children are keyed to their parents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadOpts {
    /// Field on the parent row
    pub parent_key: String,
    /// Field on the child row that references `parent_key`
    pub foreign_key: String,
}

impl PreloadOpts {
    pub fn new(parent_key: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            parent_key: parent_key.into(),
            foreign_key: foreign_key.into(),
        }
    }
}

/// Nested sub-query attached to the parent's rows under `assoc`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preload {
    pub assoc: String,
    pub token: Token,
    pub opts: PreloadOpts,
}

impl Preload {
    pub(crate) fn validate(&self) -> ConstructionResult<()> {
        let invalid = |reason: &str| ConstructionError::InvalidPreload {
            assoc: self.assoc.clone(),
            reason: reason.to_string(),
        };
        if self.assoc.trim().is_empty() {
            return Err(invalid("association name is empty"));
        }
        if self.opts.parent_key.trim().is_empty() || self.opts.foreign_key.trim().is_empty() {
            return Err(invalid("parent_key and foreign_key are required"));
        }
        Ok(())
    }
}
