//! Field references

use std::fmt;

use serde::{Deserialize, Serialize};

/// A field, optionally qualified by the binding of a joined table.
///
/// `binding: None` refers to the root source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub binding: Option<String>,
    pub field: String,
}

impl FieldRef {
    /// Field on the root source
    pub fn root(field: impl Into<String>) -> Self {
        Self {
            binding: None,
            field: field.into(),
        }
    }

    /// Field on a joined binding
    pub fn bound(binding: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            binding: Some(binding.into()),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.binding {
            Some(binding) => write!(f, "{}.{}", binding, self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

impl From<&str> for FieldRef {
    fn from(field: &str) -> Self {
        FieldRef::root(field)
    }
}
