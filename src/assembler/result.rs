//! Result types returned to callers

use serde::{Deserialize, Serialize};

use crate::value::Row;

/// Pagination strategy a page was produced under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationKind {
    Offset,
    Cursor,
}

/// Pagination metadata of one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMetadata {
    #[serde(rename = "type")]
    pub kind: PaginationKind,
    pub limit: u64,
    /// More rows exist past this page in scan direction
    pub has_more: bool,
    /// Offset: `offset > 0`. Cursor: a cursor was supplied on input.
    pub has_previous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

/// Rows of one query plus pagination metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Rows in declared order, preloads attached
    pub data: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMetadata>,
}

impl QueryResult {
    /// Creates a result with no pagination
    pub fn unpaged(data: Vec<Row>) -> Self {
        Self {
            data,
            pagination: None,
        }
    }

    /// Returns the number of rows
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the page holds no rows
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether another page follows; false when unpaginated
    pub fn has_more(&self) -> bool {
        self.pagination.as_ref().map(|p| p.has_more).unwrap_or(false)
    }

    /// Cursor for the next page, if any
    pub fn end_cursor(&self) -> Option<&str> {
        self.pagination.as_ref().and_then(|p| p.end_cursor.as_deref())
    }

    /// Cursor for the previous page, if any
    pub fn start_cursor(&self) -> Option<&str> {
        self.pagination.as_ref().and_then(|p| p.start_cursor.as_deref())
    }

    /// Values of `field` across the page, in order
    pub fn column(&self, field: &str) -> Vec<serde_json::Value> {
        self.data
            .iter()
            .map(|row| row.get(field).cloned().unwrap_or(serde_json::Value::Null))
            .collect()
    }
}
