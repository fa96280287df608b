//! Token Construction and Compilation Tests
//!
//! Test Categories:
//! 1. Call-arity equivalence of builder operations
//! 2. Construction-time shape errors
//! 3. Compile-time structural errors
//! 4. Structural keys

use serde_json::json;

use querytoken::builder::BuildError;
use querytoken::token::{FieldRef, JoinSpec, RawPredicate};
use querytoken::{compile, CursorField, Direction, Filter, Operator, OrderTerm, PaginationSpec, Token, Value};

fn filters() -> Vec<Filter> {
    vec![
        Filter::eq("status", "published"),
        Filter::gt("score", 10),
        Filter::in_list("tag", ["rust", "sql"]),
        Filter::is_nil("deleted_at"),
    ]
}

// =============================================================================
// CALL-ARITY EQUIVALENCE
// =============================================================================

/// Test: N single add_filter calls equal one add_filters call.
#[test]
fn test_sequential_filters_equal_bulk() {
    let mut sequential = Token::new("posts");
    for filter in filters() {
        sequential = sequential.add_filter(filter).unwrap();
    }
    let bulk = Token::new("posts").add_filters(filters()).unwrap();
    assert_eq!(sequential, bulk);
    assert_eq!(sequential.structural_key(), bulk.structural_key());
}

/// Test: Interleaved single and bulk order calls equal one bulk call.
#[test]
fn test_interleaved_orders_equal_bulk() {
    let interleaved = Token::new("posts")
        .add_order(OrderTerm::desc("priority"))
        .unwrap()
        .add_orders([OrderTerm::desc("created_at")])
        .unwrap()
        .add_order(OrderTerm::asc("id"))
        .unwrap();
    let bulk = Token::new("posts")
        .add_orders([
            OrderTerm::desc("priority"),
            OrderTerm::desc("created_at"),
            OrderTerm::asc("id"),
        ])
        .unwrap();
    assert_eq!(interleaved, bulk);
}

/// Test: Item order matters even when arity does not.
#[test]
fn test_order_of_items_matters() {
    let a = Token::new("posts")
        .add_orders([OrderTerm::asc("a"), OrderTerm::asc("b")])
        .unwrap();
    let b = Token::new("posts")
        .add_orders([OrderTerm::asc("b"), OrderTerm::asc("a")])
        .unwrap();
    assert_ne!(a, b);
    assert_ne!(a.structural_key(), b.structural_key());
}

// =============================================================================
// CONSTRUCTION ERRORS
// =============================================================================

/// Test: Operator/value mismatches fail at construction.
#[test]
fn test_invalid_filter_shapes() {
    let token = Token::new("posts");
    let cases = [
        Filter::new("score", Operator::Gt, Value::list([1, 2])),
        Filter::new("tag", Operator::In, Value::list(Vec::<i64>::new())),
        Filter::new("title", Operator::Like, Value::scalar(5)),
        Filter::new("score", Operator::Between, Value::scalar(5)),
        Filter::new("data", Operator::JsonContains, Value::scalar("x")),
        Filter::unary("score", Operator::Eq),
        Filter::new("", Operator::Eq, Value::scalar(1)),
        Filter::gt("score", 5).case_insensitive(),
    ];
    for filter in cases {
        let err = token.add_filter(filter.clone()).unwrap_err();
        assert!(err.is_recoverable(), "{:?}", filter);
    }
}

/// Test: Unknown direction strings are rejected.
#[test]
fn test_invalid_order_direction() {
    let err = OrderTerm::parse("created_at", "sideways").unwrap_err();
    assert_eq!(err.code(), "QUERY_INVALID_ORDER_DIRECTION");
    assert_eq!(
        OrderTerm::parse("created_at", "DESC").unwrap(),
        OrderTerm::new("created_at", Direction::Desc)
    );
}

/// Test: Cursor pagination needs at least one cursor field.
#[test]
fn test_empty_cursor_fields_rejected() {
    let err = Token::new("posts")
        .set_pagination(PaginationSpec::cursor(10, Vec::<CursorField>::new()))
        .unwrap_err();
    assert_eq!(err.code(), "QUERY_INVALID_PAGINATION");
}

// =============================================================================
// COMPILE ERRORS
// =============================================================================

/// Test: Cursor fields that are not a term-for-term prefix of orders are
/// rejected; a matching list or prefix compiles.
#[test]
fn test_cursor_order_invariant() {
    let ordered = Token::new("posts")
        .add_orders([OrderTerm::desc("created_at"), OrderTerm::asc("id")])
        .unwrap();

    let matching = ordered
        .set_pagination(PaginationSpec::cursor(10, ["created_at", "id"]))
        .unwrap();
    assert!(compile(&matching).is_ok());

    let explicit = ordered
        .set_pagination(PaginationSpec::cursor(
            10,
            [CursorField::desc("created_at"), CursorField::asc("id")],
        ))
        .unwrap();
    assert!(compile(&explicit).is_ok());

    // The documented failure: a default id-only cursor over a richer order
    let id_only = ordered
        .set_pagination(PaginationSpec::cursor(10, ["id"]))
        .unwrap();
    assert!(matches!(
        compile(&id_only).unwrap_err(),
        BuildError::CursorOrderMismatch { .. }
    ));

    let prefix = ordered
        .set_pagination(PaginationSpec::cursor(10, ["created_at"]))
        .unwrap();
    assert!(compile(&prefix).is_ok());

    let extra = ordered
        .set_pagination(PaginationSpec::cursor(10, ["created_at", "id", "title"]))
        .unwrap();
    assert_eq!(compile(&extra).unwrap_err().code(), "QUERY_CURSOR_ORDER_MISMATCH");
}

/// Test: Bindings must be declared by a join, and only once.
#[test]
fn test_binding_resolution() {
    let author = JoinSpec::inner("users", "author").on("author_id", FieldRef::bound("author", "id"));

    let unbound = Token::new("posts")
        .add_order(OrderTerm::asc("name").on("author"))
        .unwrap();
    assert_eq!(compile(&unbound).unwrap_err().code(), "QUERY_UNKNOWN_BINDING");
    assert!(compile(&unbound.add_join(author.clone()).unwrap()).is_ok());

    let twice = Token::new("posts")
        .add_joins([author.clone(), author])
        .unwrap();
    assert_eq!(compile(&twice).unwrap_err().code(), "QUERY_DUPLICATE_BINDING");
}

/// Test: Raw templates only take named placeholders that are bound.
#[test]
fn test_raw_placeholders() {
    let ok = Token::new("posts")
        .add_raw_predicate(RawPredicate::new("score > :min AND score < :max").bind("min", 1).bind("max", 9))
        .unwrap();
    let plan = compile(&ok).unwrap();
    assert_eq!(plan.params, vec![json!(1), json!(9)]);

    let unknown = Token::new("posts")
        .add_raw_predicate(RawPredicate::new("score > :min"))
        .unwrap();
    assert_eq!(compile(&unknown).unwrap_err().code(), "QUERY_UNKNOWN_PLACEHOLDER");
}

// =============================================================================
// STRUCTURAL KEYS
// =============================================================================

/// Test: Equal trees share a key; any nested difference changes it.
#[test]
fn test_structural_key_tracks_tree() {
    let base = Token::new("posts").add_filters(filters()).unwrap();
    let same = Token::new("posts").add_filters(filters()).unwrap();
    assert_eq!(base.structural_key(), same.structural_key());

    let cte = base.add_cte("recent", Token::new("posts")).unwrap();
    let other_cte = base
        .add_cte("recent", Token::new("posts").add_filter(Filter::eq("id", 1)).unwrap())
        .unwrap();
    assert_ne!(cte.structural_key(), other_cte.structural_key());
}

/// Test: Tokens survive a serde round trip unchanged.
#[test]
fn test_token_serde() {
    let token = Token::new("posts")
        .add_filters(filters())
        .unwrap()
        .set_pagination(PaginationSpec::offset(20, 40))
        .unwrap();
    let text = serde_json::to_string(&token).unwrap();
    let back: Token = serde_json::from_str(&text).unwrap();
    assert_eq!(back, token);
}
