//! Predicate evaluation for the in-memory executor
//!
//! Follows SQL three-valued logic collapsed to false: a comparison involving
//! a missing or null operand never matches. Values of different JSON types
//! are never equal and never ordered.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use super::errors::{ExecutorError, ExecutorResult};
use crate::builder::{Binding, Column, Comparison, Operand, Predicate};
use crate::value::{compare_values, Row};

/// Evaluates plan predicates against rows
pub struct PredicateFilter<'a> {
    params: &'a [Value],
}

impl<'a> PredicateFilter<'a> {
    /// Evaluates against the given positional parameters
    pub fn new(params: &'a [Value]) -> Self {
        Self { params }
    }

    /// Checks if a row matches the predicate
    pub fn matches(&self, row: &Row, predicate: &Predicate) -> ExecutorResult<bool> {
        match predicate {
            Predicate::And(parts) => {
                for part in parts {
                    if !self.matches(row, part)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(parts) => {
                for part in parts {
                    if self.matches(row, part)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Compare { lhs, op, rhs } => {
                let (Some(a), Some(b)) = (self.operand(row, lhs)?, self.operand(row, rhs)?) else {
                    return Ok(false);
                };
                Ok(compare(&a, &b).map(|ord| holds(*op, ord)).unwrap_or(false))
            }
            Predicate::In { lhs, rhs, negated } => {
                let Some(actual) = self.operand(row, lhs)? else {
                    return Ok(false);
                };
                let mut found = false;
                for candidate in rhs {
                    if let Some(candidate) = self.operand(row, candidate)? {
                        if compare(&actual, &candidate) == Some(Ordering::Equal) {
                            found = true;
                            break;
                        }
                    }
                }
                Ok(found != *negated)
            }
            Predicate::Between { lhs, low, high } => {
                let (Some(actual), Some(low), Some(high)) = (
                    self.operand(row, lhs)?,
                    self.operand(row, low)?,
                    self.operand(row, high)?,
                ) else {
                    return Ok(false);
                };
                let above = matches!(compare(&actual, &low), Some(Ordering::Greater | Ordering::Equal));
                let below = matches!(compare(&actual, &high), Some(Ordering::Less | Ordering::Equal));
                Ok(above && below)
            }
            Predicate::Like { lhs, pattern } => {
                let (Some(Value::String(text)), Some(Value::String(pattern))) =
                    (self.operand(row, lhs)?, self.operand(row, pattern)?)
                else {
                    return Ok(false);
                };
                Ok(like_regex(&pattern)?.is_match(&text))
            }
            Predicate::IsNull { lhs, negated } => {
                let is_null = self.operand(row, lhs)?.is_none();
                Ok(is_null != *negated)
            }
            Predicate::Contains { lhs, rhs } => {
                let Some(actual) = self.operand(row, lhs)? else {
                    return Ok(false);
                };
                for item in rhs {
                    let Some(item) = self.operand(row, item)? else {
                        return Ok(false);
                    };
                    let contained = match (&actual, &item) {
                        (Value::Array(items), needle) => items.contains(needle),
                        (Value::String(text), Value::String(needle)) => text.contains(needle.as_str()),
                        _ => false,
                    };
                    if !contained {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::JsonContains { lhs, rhs } => {
                let (Some(doc), Some(fragment)) = (self.operand(row, lhs)?, self.operand(row, rhs)?)
                else {
                    return Ok(false);
                };
                Ok(json_contains(&doc, &fragment))
            }
            Predicate::JsonHasKey { lhs, key } => {
                let (Some(Value::Object(doc)), Some(Value::String(key))) =
                    (self.operand(row, lhs)?, self.operand(row, key)?)
                else {
                    return Ok(false);
                };
                Ok(doc.contains_key(&key))
            }
            Predicate::Raw { .. } => Err(ExecutorError::unsupported("raw predicate")),
        }
    }

    // Resolves an operand; `None` for missing or null.
    fn operand(&self, row: &Row, operand: &Operand) -> ExecutorResult<Option<Value>> {
        let value = match operand {
            Operand::Column(column) => column_value(row, column).cloned(),
            Operand::Param(index) => Some(self.params.get(*index).cloned().ok_or_else(|| {
                ExecutorError::execution_failed(format!("parameter ${} is not bound", index + 1))
            })?),
            Operand::Lower(inner) => self.operand(row, inner)?.map(|v| match v {
                Value::String(s) => Value::String(s.to_lowercase()),
                other => other,
            }),
        };
        Ok(value.filter(|v| !v.is_null()))
    }
}

/// Value of a resolved column in a row
pub(crate) fn column_value<'r>(row: &'r Row, column: &Column) -> Option<&'r Value> {
    match &column.binding {
        Binding::Root => row.get(&column.field),
        Binding::Named(binding) => row
            .get(binding)
            .and_then(Value::as_object)
            .and_then(|nested| nested.get(&column.field)),
    }
}

// Ordering of two values of the same JSON type; `None` across types.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if std::mem::discriminant(a) != std::mem::discriminant(b) {
        return None;
    }
    Some(compare_values(a, b))
}

fn holds(op: Comparison, ord: Ordering) -> bool {
    match op {
        Comparison::Eq => ord == Ordering::Equal,
        Comparison::Neq => ord != Ordering::Equal,
        Comparison::Gt => ord == Ordering::Greater,
        Comparison::Gte => ord != Ordering::Less,
        Comparison::Lt => ord == Ordering::Less,
        Comparison::Lte => ord != Ordering::Greater,
    }
}

/// Translates a LIKE pattern (`%`, `_`) into an anchored regex.
fn like_regex(pattern: &str) -> ExecutorResult<Regex> {
    let mut source = String::from("(?s)^");
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '%' | '_' => {
                source.push_str(&regex::escape(&literal));
                literal.clear();
                source.push_str(if c == '%' { ".*" } else { "." });
            }
            other => literal.push(other),
        }
    }
    source.push_str(&regex::escape(&literal));
    source.push('$');
    Regex::new(&source).map_err(|e| ExecutorError::backend("invalid LIKE pattern", e))
}

// Postgres-style `@>`: every part of `fragment` appears in `doc`.
fn json_contains(doc: &Value, fragment: &Value) -> bool {
    match (doc, fragment) {
        (Value::Object(doc), Value::Object(fragment)) => fragment
            .iter()
            .all(|(k, v)| doc.get(k).map(|d| json_contains(d, v)).unwrap_or(false)),
        (Value::Array(doc), Value::Array(fragment)) => fragment
            .iter()
            .all(|f| doc.iter().any(|d| json_contains(d, f))),
        (Value::Array(doc), scalar) => doc.iter().any(|d| d == scalar),
        (a, b) => a == b,
    }
}
