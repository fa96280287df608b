//! Row sorting for the in-memory executor
//!
//! Sorts by the plan's order list, term by term. Missing values sort as null.

use std::cmp::Ordering;

use super::filters::column_value;
use crate::builder::PlanOrder;
use crate::token::Direction;
use crate::value::{compare_values, Row};

/// Sorts result rows
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts rows by `order_list`.
    ///
    /// Sort is stable, so rows tied on every term keep their stored order.
    pub fn sort(rows: &mut [Row], order_list: &[PlanOrder]) {
        if order_list.is_empty() {
            return;
        }
        rows.sort_by(|a, b| Self::compare_rows(a, b, order_list));
    }

    fn compare_rows(a: &Row, b: &Row, order_list: &[PlanOrder]) -> Ordering {
        let null = serde_json::Value::Null;
        for order in order_list {
            let a_val = column_value(a, &order.column).unwrap_or(&null);
            let b_val = column_value(b, &order.column).unwrap_or(&null);
            let ordering = match order.direction {
                Direction::Asc => compare_values(a_val, b_val),
                Direction::Desc => compare_values(a_val, b_val).reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
