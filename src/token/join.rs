//! Join specs

use serde::{Deserialize, Serialize};

use super::errors::{require_identifier, ConstructionError, ConstructionResult};
use super::field::FieldRef;

/// Join kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinKind::Inner => "inner",
            JoinKind::Left => "left",
            JoinKind::Right => "right",
            JoinKind::Full => "full",
            JoinKind::Cross => "cross",
        }
    }
}

/// Equality between two columns, `left = right`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinCondition {
    pub left: FieldRef,
    pub right: FieldRef,
}

/// A join introducing a new binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Joined source
    pub target: String,
    pub kind: JoinKind,
    /// Name the joined source is reachable under
    pub binding: String,
    /// Conjunction of column equalities; empty only for cross joins
    pub on: Vec<JoinCondition>,
}

impl JoinSpec {
    pub fn new(kind: JoinKind, target: impl Into<String>, binding: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind,
            binding: binding.into(),
            on: Vec::new(),
        }
    }

    pub fn inner(target: impl Into<String>, binding: impl Into<String>) -> Self {
        Self::new(JoinKind::Inner, target, binding)
    }

    pub fn left(target: impl Into<String>, binding: impl Into<String>) -> Self {
        Self::new(JoinKind::Left, target, binding)
    }

    /// Adds `left = right` to the join condition
    pub fn on(mut self, left: impl Into<FieldRef>, right: impl Into<FieldRef>) -> Self {
        self.on.push(JoinCondition {
            left: left.into(),
            right: right.into(),
        });
        self
    }

    pub(crate) fn validate(&self) -> ConstructionResult<()> {
        require_identifier(&self.target, "join target")?;
        require_identifier(&self.binding, "join binding")?;

        let shape_error = |reason: &str| ConstructionError::InvalidJoinShape {
            binding: self.binding.clone(),
            reason: reason.to_string(),
        };

        match (self.kind, self.on.is_empty()) {
            (JoinKind::Cross, false) => Err(shape_error("cross join takes no condition")),
            (JoinKind::Cross, true) => Ok(()),
            (_, true) => Err(shape_error("join requires at least one condition")),
            (_, false) => {
                for cond in &self.on {
                    require_identifier(&cond.left.field, "join condition")?;
                    require_identifier(&cond.right.field, "join condition")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_join_requires_condition() {
        let join = JoinSpec::inner("users", "author");
        assert_eq!(join.validate().unwrap_err().code(), "QUERY_INVALID_JOIN_SHAPE");

        let join = join.on("author_id", FieldRef::bound("author", "id"));
        assert!(join.validate().is_ok());
    }

    #[test]
    fn test_cross_join_rejects_condition() {
        let join = JoinSpec::new(JoinKind::Cross, "tags", "tag");
        assert!(join.validate().is_ok());

        let join = join.on("tag_id", FieldRef::bound("tag", "id"));
        assert!(join.validate().is_err());
    }
}
