//! Comparison operators and the value shapes each one admits.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{is_scalar_literal, Value};

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Like,
    Ilike,
    IsNil,
    NotNil,
    /// Inclusive on both bounds
    Between,
    Contains,
    JsonContains,
    JsonHasKey,
}

impl Operator {
    /// Get the operator string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Like => "like",
            Operator::Ilike => "ilike",
            Operator::IsNil => "is_nil",
            Operator::NotNil => "not_nil",
            Operator::Between => "between",
            Operator::Contains => "contains",
            Operator::JsonContains => "json_contains",
            Operator::JsonHasKey => "json_has_key",
        }
    }

    /// Parses the snake_case operator name.
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "eq" => Operator::Eq,
            "neq" => Operator::Neq,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "like" => Operator::Like,
            "ilike" => Operator::Ilike,
            "is_nil" => Operator::IsNil,
            "not_nil" => Operator::NotNil,
            "between" => Operator::Between,
            "contains" => Operator::Contains,
            "json_contains" => Operator::JsonContains,
            "json_has_key" => Operator::JsonHasKey,
            _ => return None,
        };
        Some(op)
    }

    /// Returns true for operators that take no value at all
    pub fn is_unary(&self) -> bool {
        matches!(self, Operator::IsNil | Operator::NotNil)
    }

    /// Checks that `value` has the shape this operator admits.
    ///
    /// Returns a human-readable reason on mismatch.
    pub fn admits(&self, value: Option<&Value>) -> Result<(), String> {
        let value = match (self.is_unary(), value) {
            (true, None) => return Ok(()),
            (true, Some(v)) => {
                return Err(format!("{} takes no value, got {}", self, v.shape()));
            }
            (false, None) => return Err(format!("{} requires a value", self)),
            (false, Some(v)) => v,
        };

        match (self, value) {
            (
                Operator::Eq
                | Operator::Neq
                | Operator::Gt
                | Operator::Gte
                | Operator::Lt
                | Operator::Lte,
                Value::Scalar(v),
            ) => {
                if v.is_null() {
                    Err(format!("{} against null, use is_nil/not_nil", self))
                } else if !is_scalar_literal(v) {
                    Err(format!("{} requires a scalar, not a JSON document", self))
                } else {
                    Ok(())
                }
            }
            (Operator::In | Operator::NotIn, Value::List(items)) => {
                if items.is_empty() {
                    Err(format!("{} requires a non-empty list", self))
                } else if !items.iter().all(is_scalar_literal) {
                    Err(format!("{} list items must be scalars", self))
                } else {
                    Ok(())
                }
            }
            (Operator::Like | Operator::Ilike, v) if v.is_string_scalar() => Ok(()),
            (Operator::Between, Value::Range(low, high)) => {
                if low.is_null() || high.is_null() {
                    Err("between bounds must not be null".to_string())
                } else if !is_scalar_literal(low) || !is_scalar_literal(high) {
                    Err("between bounds must be scalars".to_string())
                } else {
                    Ok(())
                }
            }
            (Operator::Contains, Value::Scalar(_) | Value::List(_)) => Ok(()),
            (Operator::JsonContains, Value::Json(_)) => Ok(()),
            (Operator::JsonHasKey, v) if v.is_string_scalar() => Ok(()),
            (op, v) => Err(format!("{} does not accept a {} value", op, v.shape())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
