//! Raw predicate templates
//!
//! `:name` placeholders are replaced by `?` and their bound values pushed onto
//! the plan's positional parameter list, in order of appearance. `::` casts
//! and text inside single-quoted literals are left alone.

use super::errors::{BuildError, BuildResult};
use crate::token::RawPredicate;

/// A template with placeholders replaced by `?`
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompiledRaw {
    pub sql: String,
    /// Bound value for each `?`, in order
    pub values: Vec<serde_json::Value>,
}

pub(crate) fn compile_raw(raw: &RawPredicate) -> BuildResult<CompiledRaw> {
    let mut sql = String::with_capacity(raw.template.len());
    let mut values = Vec::new();
    let mut used = vec![false; raw.params.len()];

    let mut chars = raw.template.chars().peekable();
    let mut in_literal = false;

    while let Some(c) = chars.next() {
        if in_literal {
            sql.push(c);
            if c == '\'' {
                in_literal = false;
            }
            continue;
        }
        match c {
            '\'' => {
                in_literal = true;
                sql.push(c);
            }
            ':' if chars.peek() == Some(&':') => {
                sql.push_str("::");
                chars.next();
            }
            ':' if chars
                .peek()
                .map(|n| n.is_ascii_alphabetic() || *n == '_')
                .unwrap_or(false) =>
            {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let index = raw
                    .params
                    .iter()
                    .position(|(bound, _)| *bound == name)
                    .ok_or_else(|| BuildError::UnknownPlaceholder(name.clone()))?;
                used[index] = true;
                values.push(raw.params[index].1.clone());
                sql.push('?');
            }
            _ => sql.push(c),
        }
    }

    if let Some(index) = used.iter().position(|u| !u) {
        return Err(BuildError::UnusedParameter(raw.params[index].0.clone()));
    }

    Ok(CompiledRaw { sql, values })
}
