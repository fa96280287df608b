//! Ordering terms

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{require_identifier, ConstructionError, ConstructionResult};
use super::field::FieldRef;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }

    /// The opposite direction
    pub fn reversed(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(ConstructionError::InvalidOrderDirection(s.to_string())),
        }
    }
}

/// One term of an ORDER BY. Position in the order list encodes precedence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderTerm {
    pub field: String,
    pub direction: Direction,
    pub binding: Option<String>,
}

impl OrderTerm {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
            binding: None,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Desc)
    }

    /// Builds a term from a direction string such as `"desc"`.
    pub fn parse(field: impl Into<String>, direction: &str) -> ConstructionResult<Self> {
        Ok(Self::new(field, direction.parse()?))
    }

    /// Qualifies the field with a join binding
    pub fn on(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    /// The referenced column
    pub fn column(&self) -> FieldRef {
        FieldRef {
            binding: self.binding.clone(),
            field: self.field.clone(),
        }
    }

    /// Same term scanning the other way
    pub fn reversed(&self) -> Self {
        Self {
            direction: self.direction.reversed(),
            ..self.clone()
        }
    }

    pub(crate) fn validate(&self) -> ConstructionResult<()> {
        require_identifier(&self.field, "order field")?;
        if let Some(binding) = &self.binding {
            require_identifier(binding, "order binding")?;
        }
        Ok(())
    }
}

impl fmt::Display for OrderTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column(), self.direction)
    }
}
