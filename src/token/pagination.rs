//! Pagination specs
//!
//! Two strategies: numeric offset, and cursor (keyset) pagination resuming
//! from the sort-key tuple of a boundary row.

use serde::{Deserialize, Serialize};

use super::errors::{require_identifier, ConstructionError, ConstructionResult};
use super::field::FieldRef;
use super::order::Direction;

/// A field of a cursor, with an optional explicit direction.
///
/// When `direction` is `None` it defaults from the matching order term, or to
/// ascending when the Token declares no orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorField {
    pub field: String,
    pub binding: Option<String>,
    pub direction: Option<Direction>,
}

impl CursorField {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            binding: None,
            direction: None,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field).direction(Direction::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field).direction(Direction::Desc)
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn on(mut self, binding: impl Into<String>) -> Self {
        self.binding = Some(binding.into());
        self
    }

    pub fn column(&self) -> FieldRef {
        FieldRef {
            binding: self.binding.clone(),
            field: self.field.clone(),
        }
    }
}

impl From<&str> for CursorField {
    fn from(field: &str) -> Self {
        CursorField::new(field)
    }
}

/// Pagination strategy of a Token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationSpec {
    /// Numeric offset
    Offset { limit: u64, offset: u64 },
    /// Keyset pagination
    Cursor {
        limit: u64,
        cursor_fields: Vec<CursorField>,
        after: Option<String>,
        before: Option<String>,
    },
}

impl PaginationSpec {
    /// Offset pagination
    pub fn offset(limit: u64, offset: u64) -> Self {
        PaginationSpec::Offset { limit, offset }
    }

    /// Cursor pagination over the given fields, starting at the first page
    pub fn cursor<I, F>(limit: u64, cursor_fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<CursorField>,
    {
        PaginationSpec::Cursor {
            limit,
            cursor_fields: cursor_fields.into_iter().map(Into::into).collect(),
            after: None,
            before: None,
        }
    }

    /// Resume after the given cursor. No effect on offset pagination.
    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        if let PaginationSpec::Cursor { after, .. } = &mut self {
            *after = Some(cursor.into());
        }
        self
    }

    /// Resume before the given cursor. No effect on offset pagination.
    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        if let PaginationSpec::Cursor { before, .. } = &mut self {
            *before = Some(cursor.into());
        }
        self
    }

    /// Page size
    pub fn limit(&self) -> u64 {
        match self {
            PaginationSpec::Offset { limit, .. } | PaginationSpec::Cursor { limit, .. } => *limit,
        }
    }

    /// Metadata type tag
    pub fn kind(&self) -> &'static str {
        match self {
            PaginationSpec::Offset { .. } => "offset",
            PaginationSpec::Cursor { .. } => "cursor",
        }
    }

    pub(crate) fn validate(&self) -> ConstructionResult<()> {
        let PaginationSpec::Cursor {
            cursor_fields,
            after,
            before,
            ..
        } = self
        else {
            return Ok(());
        };

        if cursor_fields.is_empty() {
            return Err(ConstructionError::InvalidPagination(
                "cursor_fields must not be empty".to_string(),
            ));
        }
        for field in cursor_fields {
            require_identifier(&field.field, "cursor field")?;
            if let Some(binding) = &field.binding {
                require_identifier(binding, "cursor binding")?;
            }
        }
        for (i, field) in cursor_fields.iter().enumerate() {
            if cursor_fields[..i].iter().any(|f| f.column() == field.column()) {
                return Err(ConstructionError::InvalidPagination(format!(
                    "cursor field '{}' listed twice",
                    field.column()
                )));
            }
        }
        for cursor in [after, before].into_iter().flatten() {
            if cursor.trim().is_empty() {
                return Err(ConstructionError::InvalidPagination(
                    "cursor value must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
