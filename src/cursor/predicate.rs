//! Lexicographic keyset predicate
//!
//! For sort keys `(f1, f2, …, fn)` and a boundary tuple `(v1, v2, …, vn)` the
//! rows strictly past the boundary are
//!
//! ```text
//! f1 ≻ v1 OR (f1 = v1 AND (f2 ≻ v2 OR (f2 = v2 AND … fn ≻ vn)))
//! ```
//!
//! where `≻` is `>` or `<` per field, from the field's own direction and the
//! seek direction. Comparing only the last field, or AND-ing per-field
//! comparisons, skips rows and is not an acceptable substitute.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::token::{Direction, FieldRef, OrderTerm};
use crate::value::{compare_values, lookup, Row};

/// Which side of the boundary row to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seek {
    /// Rows that sort after the boundary
    After,
    /// Rows that sort before the boundary
    Before,
}

/// Strict comparison used by one key of the predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyComparison {
    Gt,
    Lt,
}

impl KeyComparison {
    fn for_term(direction: Direction, seek: Seek) -> Self {
        match (direction, seek) {
            (Direction::Asc, Seek::After) | (Direction::Desc, Seek::Before) => KeyComparison::Gt,
            (Direction::Desc, Seek::After) | (Direction::Asc, Seek::Before) => KeyComparison::Lt,
        }
    }

    fn holds(self, ord: Ordering) -> bool {
        match self {
            KeyComparison::Gt => ord == Ordering::Greater,
            KeyComparison::Lt => ord == Ordering::Less,
        }
    }
}

/// One sort key and its boundary value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBound {
    pub column: FieldRef,
    pub comparison: KeyComparison,
    pub value: serde_json::Value,
}

/// Lexicographic row predicate decoded from a cursor.
///
/// `bounds` is ordered by sort precedence and is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundPredicate {
    pub seek: Seek,
    pub bounds: Vec<KeyBound>,
}

impl CompoundPredicate {
    /// Pairs each order term with its boundary value.
    ///
    /// Callers guarantee `values.len() == order_terms.len()`.
    pub(crate) fn new(order_terms: &[OrderTerm], values: Vec<serde_json::Value>, seek: Seek) -> Self {
        let bounds = order_terms
            .iter()
            .zip(values)
            .map(|(term, value)| KeyBound {
                column: term.column(),
                comparison: KeyComparison::for_term(term.direction, seek),
                value,
            })
            .collect();
        Self { seek, bounds }
    }

    /// Evaluates the predicate against a row.
    ///
    /// The boundary row itself never matches.
    pub fn matches(&self, row: &Row) -> bool {
        for bound in &self.bounds {
            let Some(actual) = lookup(row, &bound.column) else {
                return false;
            };
            let ord = compare_values(actual, &bound.value);
            if bound.comparison.holds(ord) {
                return true;
            }
            if ord != Ordering::Equal {
                return false;
            }
        }
        false
    }
}
