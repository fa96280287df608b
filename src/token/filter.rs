//! Filter entries of a Token

use serde::{Deserialize, Serialize};

use super::errors::{require_identifier, ConstructionError, ConstructionResult};
use super::field::FieldRef;
use crate::value::{Operator, Value};

/// A single filter (field + operator + value)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field name
    pub field: String,
    /// Comparison operator
    pub operator: Operator,
    /// Operand, absent for `is_nil` / `not_nil`
    pub value: Option<Value>,
    /// Binding of a joined table, `None` for the root source
    pub binding: Option<String>,
    /// Compare both sides through a case-normalizing function
    pub case_insensitive: bool,
}

impl Filter {
    /// Create a filter with a value
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Some(value),
            binding: None,
            case_insensitive: false,
        }
    }

    /// Create a filter that takes no value (`is_nil`, `not_nil`)
    pub fn unary(field: impl Into<String>, operator: Operator) -> Self {
        Self {
            field: field.into(),
            operator,
            value: None,
            binding: None,
            case_insensitive: false,
        }
    }

    /// Equality filter
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::new(field, Operator::Eq, Value::scalar(value))
    }

    /// Greater than filter
    pub fn gt(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::new(field, Operator::Gt, Value::scalar(value))
    }

    /// Less than filter
    pub fn lt(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::new(field, Operator::Lt, Value::scalar(value))
    }

    /// "In list" filter
    pub fn in_list<I, T>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<serde_json::Value>,
    {
        Self::new(field, Operator::In, Value::list(values))
    }

    /// Inclusive range filter
    pub fn between(
        field: impl Into<String>,
        low: impl Into<serde_json::Value>,
        high: impl Into<serde_json::Value>,
    ) -> Self {
        Self::new(field, Operator::Between, Value::range(low, high))
    }

    /// Null check
    pub fn is_nil(field: impl Into<String>) -> Self {
        Self::unary(field, Operator::IsNil)
    }

    /// Qualifies the field with a join binding
    pub fn on(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    /// Marks the comparison as case-insensitive
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// The referenced column
    pub fn column(&self) -> FieldRef {
        FieldRef {
            binding: self.binding.clone(),
            field: self.field.clone(),
        }
    }

    /// Validates everything that can be checked without the rest of the Token.
    pub(crate) fn validate(&self) -> ConstructionResult<()> {
        require_identifier(&self.field, "filter field")?;
        if let Some(binding) = &self.binding {
            require_identifier(binding, "filter binding")?;
        }

        self.operator
            .admits(self.value.as_ref())
            .map_err(|reason| ConstructionError::filter_shape(&self.field, reason))?;

        if self.case_insensitive && !self.admits_case_folding() {
            return Err(ConstructionError::filter_shape(
                &self.field,
                format!("{} cannot be case-insensitive", self.operator),
            ));
        }

        Ok(())
    }

    // Case folding only makes sense where both operands are text.
    fn admits_case_folding(&self) -> bool {
        match self.operator {
            Operator::Eq | Operator::Neq | Operator::Like => self
                .value
                .as_ref()
                .map(Value::is_string_scalar)
                .unwrap_or(false),
            Operator::In | Operator::NotIn => match &self.value {
                Some(Value::List(items)) => items.iter().all(serde_json::Value::is_string),
                _ => false,
            },
            _ => false,
        }
    }
}
