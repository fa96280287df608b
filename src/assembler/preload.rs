//! Preload attachment
//!
//! Children fetched for a page of parents are grouped by foreign key and
//! attached to each parent under the association name. Child order within a
//! group is the order the children arrived in, i.e. the child plan's own
//! `order_list`.

use std::collections::HashMap;

use crate::observability::{log_event_with_fields, Event};
use crate::value::Row;

// JSON text is the grouping key so `1` and `"1"` stay distinct.
fn key_of(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Distinct, non-null values of `parent_key` across `parents`, first-seen order.
pub fn parent_keys(parents: &[Row], parent_key: &str) -> Vec<serde_json::Value> {
    let mut seen = std::collections::HashSet::new();
    let mut keys = Vec::new();
    for row in parents {
        let Some(value) = row.get(parent_key) else {
            continue;
        };
        if let Some(key) = key_of(value) {
            if seen.insert(key) {
                keys.push(value.clone());
            }
        }
    }
    keys
}

/// Attaches `children` to `parents` under `assoc`.
///
/// Every parent receives the association, as an empty array when nothing
/// matched. Children whose foreign key is missing or matches no parent are
/// dropped.
pub fn attach_preloads(
    parents: &mut [Row],
    assoc: &str,
    parent_key: &str,
    foreign_key: &str,
    children: Vec<Row>,
) {
    let total = children.len();
    let mut groups: HashMap<String, Vec<serde_json::Value>> = HashMap::new();
    for child in children {
        let Some(key) = child.get(foreign_key).and_then(key_of) else {
            continue;
        };
        groups
            .entry(key)
            .or_default()
            .push(serde_json::Value::Object(child));
    }

    let mut attached = 0usize;
    for parent in parents.iter_mut() {
        let group = parent
            .get(parent_key)
            .and_then(key_of)
            .and_then(|key| groups.get(&key))
            .cloned()
            .unwrap_or_default();
        attached += group.len();
        parent.insert(assoc.to_string(), serde_json::Value::Array(group));
    }

    let total = total.to_string();
    let attached = attached.to_string();
    log_event_with_fields(
        Event::PreloadAttached,
        &[
            ("assoc", assoc),
            ("attached", attached.as_str()),
            ("fetched", total.as_str()),
        ],
    );
}
