//! Value & Operator model
//!
//! Literal operands used by filters. A `Value` is a closed tagged union so the
//! shape a filter carries can be checked against its `Operator` when the
//! filter is created, not when the plan is rendered.
//!
//! # Shapes
//!
//! - `Scalar`: a single JSON literal (never an array or object)
//! - `List`: an ordered list of scalars (`in`, `not_in`, `contains`)
//! - `Range`: inclusive lower and upper bound (`between`)
//! - `Json`: an arbitrary JSON document (`json_contains`)

mod operator;
mod ordering;
mod row;

pub use operator::Operator;
pub use ordering::compare_values;
pub use row::{lookup, Row};

use serde::{Deserialize, Serialize};

/// Literal operand of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Single literal
    Scalar(serde_json::Value),
    /// Ordered list of literals
    List(Vec<serde_json::Value>),
    /// Inclusive range `[low, high]`
    Range(serde_json::Value, serde_json::Value),
    /// JSON document
    Json(serde_json::Value),
}

impl Value {
    /// Scalar literal from anything convertible to JSON.
    pub fn scalar(value: impl Into<serde_json::Value>) -> Self {
        Value::Scalar(value.into())
    }

    /// List literal.
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<serde_json::Value>,
    {
        Value::List(values.into_iter().map(Into::into).collect())
    }

    /// Inclusive range literal.
    pub fn range(low: impl Into<serde_json::Value>, high: impl Into<serde_json::Value>) -> Self {
        Value::Range(low.into(), high.into())
    }

    /// JSON document literal.
    pub fn json(value: serde_json::Value) -> Self {
        Value::Json(value)
    }

    /// Shape name used in error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::List(_) => "list",
            Value::Range(_, _) => "range",
            Value::Json(_) => "json",
        }
    }

    /// Returns true for a scalar holding a JSON string.
    pub fn is_string_scalar(&self) -> bool {
        matches!(self, Value::Scalar(serde_json::Value::String(_)))
    }

    /// Flattens the literal into the positional parameters it occupies.
    ///
    /// A range contributes two parameters, a list one per element, everything
    /// else exactly one.
    pub fn into_params(self) -> Vec<serde_json::Value> {
        match self {
            Value::Scalar(v) | Value::Json(v) => vec![v],
            Value::List(items) => items,
            Value::Range(low, high) => vec![low, high],
        }
    }
}

/// Returns true if the JSON literal is usable as a scalar operand.
pub(crate) fn is_scalar_literal(value: &serde_json::Value) -> bool {
    !matches!(
        value,
        serde_json::Value::Array(_) | serde_json::Value::Object(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constructors() {
        assert_eq!(Value::scalar(5), Value::Scalar(json!(5)));
        assert_eq!(Value::list(["a", "b"]), Value::List(vec![json!("a"), json!("b")]));
        assert_eq!(Value::range(1, 9), Value::Range(json!(1), json!(9)));
    }

    #[test]
    fn test_params_flattening() {
        assert_eq!(Value::range(1, 2).into_params(), vec![json!(1), json!(2)]);
        assert_eq!(Value::list([3, 4, 5]).into_params().len(), 3);
        assert_eq!(Value::json(json!({"a": 1})).into_params(), vec![json!({"a": 1})]);
    }

    #[test]
    fn test_serde_tagging() {
        let encoded = serde_json::to_value(Value::range("a", "z")).unwrap();
        assert_eq!(encoded, json!({"kind": "range", "value": ["a", "z"]}));
    }
}
