//! Raw result rows

use serde_json::{Map, Value};

use crate::token::FieldRef;

/// A raw row as returned by an executor.
///
/// Root fields are top-level keys. Fields of a joined binding live in a nested
/// object under the binding name.
pub type Row = Map<String, Value>;

/// Looks up a column in a row.
pub fn lookup<'a>(row: &'a Row, column: &FieldRef) -> Option<&'a Value> {
    match &column.binding {
        None => row.get(&column.field),
        Some(binding) => row
            .get(binding)
            .and_then(Value::as_object)
            .and_then(|nested| nested.get(&column.field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_root_and_bound() {
        let row = json!({"id": 1, "author": {"name": "ada"}});
        let row = row.as_object().unwrap();
        assert_eq!(lookup(row, &FieldRef::root("id")), Some(&json!(1)));
        assert_eq!(
            lookup(row, &FieldRef::bound("author", "name")),
            Some(&json!("ada"))
        );
        assert_eq!(lookup(row, &FieldRef::bound("editor", "name")), None);
    }
}
