//! Binding resolution
//!
//! A scope holds the bindings declared by one Token's joins. Preload children
//! resolve against their own joins first, then against the parent chain.

use super::errors::{BuildError, BuildResult};
use super::plan::{Binding, Column};
use crate::token::FieldRef;

/// Bindings visible while compiling one Token
#[derive(Debug)]
pub(crate) struct BindingScope<'p> {
    parent: Option<&'p BindingScope<'p>>,
    bindings: Vec<String>,
}

impl<'p> BindingScope<'p> {
    /// Scope with only the implicit root binding
    pub fn root() -> Self {
        Self {
            parent: None,
            bindings: Vec::new(),
        }
    }

    /// Nested scope that falls back to `parent`
    pub fn child(parent: &'p BindingScope<'p>) -> Self {
        Self {
            parent: Some(parent),
            bindings: Vec::new(),
        }
    }

    /// Declares a join binding. Shadowing a parent binding is allowed,
    /// redeclaring one in the same scope is not.
    pub fn declare(&mut self, binding: &str) -> BuildResult<()> {
        if self.bindings.iter().any(|b| b == binding) {
            return Err(BuildError::DuplicateBinding(binding.to_string()));
        }
        self.bindings.push(binding.to_string());
        Ok(())
    }

    fn contains(&self, binding: &str) -> bool {
        self.bindings.iter().any(|b| b == binding)
            || self.parent.map(|p| p.contains(binding)).unwrap_or(false)
    }

    /// Resolves a field reference; `context` names the clause for errors
    pub fn resolve(&self, field: &FieldRef, context: &str) -> BuildResult<Column> {
        let binding = match &field.binding {
            None => Binding::Root,
            Some(name) if self.contains(name) => Binding::Named(name.clone()),
            Some(name) => return Err(BuildError::unknown_binding(name, context)),
        };
        Ok(Column {
            binding,
            field: field.field.clone(),
        })
    }
}
