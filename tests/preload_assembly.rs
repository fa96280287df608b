//! Preload Assembly Tests
//!
//! Test Categories:
//! 1. Attachment by foreign key
//! 2. Independent child ordering
//! 3. Nested preloads

use serde_json::json;

use querytoken::{
    fetch, Compiler, FetchOptions, Filter, MemoryExecutor, OrderTerm, PaginationSpec, PreloadOpts,
    QueryResult, Token,
};

fn executor() -> MemoryExecutor {
    MemoryExecutor::new()
        .with_json(
            "posts",
            json!([
                {"id": 1, "title": "first"},
                {"id": 2, "title": "second"},
                {"id": 3, "title": "third"},
            ]),
        )
        .unwrap()
        .with_json(
            "comments",
            json!([
                {"id": 10, "post_id": 1, "approved": true,  "score": 3},
                {"id": 11, "post_id": 1, "approved": false, "score": 9},
                {"id": 12, "post_id": 2, "approved": true,  "score": 7},
                {"id": 13, "post_id": 1, "approved": true,  "score": 8},
                {"id": 14, "post_id": 9, "approved": true,  "score": 1},
            ]),
        )
        .unwrap()
        .with_json(
            "likes",
            json!([
                {"id": 100, "comment_id": 13},
                {"id": 101, "comment_id": 12},
                {"id": 102, "comment_id": 13},
            ]),
        )
        .unwrap()
}

fn child_ids(parent: &serde_json::Map<String, serde_json::Value>, assoc: &str) -> Vec<i64> {
    parent[assoc]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect()
}

fn run(token: &Token) -> QueryResult {
    fetch(&executor(), &Compiler::default(), token, FetchOptions::default()).unwrap()
}

// =============================================================================
// ATTACHMENT
// =============================================================================

/// Test: Children attach to their parent only, filtered by the child Token.
#[test]
fn test_children_attach_by_foreign_key() {
    let approved = Token::new("comments")
        .add_filter(Filter::eq("approved", true))
        .unwrap()
        .add_order(OrderTerm::asc("id"))
        .unwrap();
    let token = Token::new("posts")
        .add_order(OrderTerm::asc("id"))
        .unwrap()
        .add_preload("comments", approved, PreloadOpts::new("id", "post_id"))
        .unwrap();

    let result = run(&token);
    assert_eq!(child_ids(&result.data[0], "comments"), vec![10, 13]);
    assert_eq!(child_ids(&result.data[1], "comments"), vec![12]);
    assert!(child_ids(&result.data[2], "comments").is_empty());
}

/// Test: Only children of parents on the current page are fetched.
#[test]
fn test_children_follow_parent_page() {
    let token = Token::new("posts")
        .add_order(OrderTerm::desc("id"))
        .unwrap()
        .set_pagination(PaginationSpec::offset(1, 0))
        .unwrap()
        .add_preload("comments", Token::new("comments"), PreloadOpts::new("id", "post_id"))
        .unwrap();

    let result = run(&token);
    assert_eq!(result.len(), 1);
    assert_eq!(result.data[0]["id"], json!(3));
    assert_eq!(result.data[0]["comments"], json!([]));
}

// =============================================================================
// CHILD ORDERING
// =============================================================================

/// Test: Child order follows the child Token, not the parent.
#[test]
fn test_child_order_is_independent() {
    let by_score = Token::new("comments")
        .add_order(OrderTerm::desc("score"))
        .unwrap();
    let token = Token::new("posts")
        .add_order(OrderTerm::asc("id"))
        .unwrap()
        .add_preload("comments", by_score, PreloadOpts::new("id", "post_id"))
        .unwrap();

    let result = run(&token);
    assert_eq!(child_ids(&result.data[0], "comments"), vec![11, 13, 10]);
}

// =============================================================================
// NESTED PRELOADS
// =============================================================================

/// Test: Grandchildren attach to their children.
#[test]
fn test_nested_preloads() {
    let likes = Token::new("likes").add_order(OrderTerm::asc("id")).unwrap();
    let comments = Token::new("comments")
        .add_order(OrderTerm::asc("id"))
        .unwrap()
        .add_preload("likes", likes, PreloadOpts::new("id", "comment_id"))
        .unwrap();
    let token = Token::new("posts")
        .add_order(OrderTerm::asc("id"))
        .unwrap()
        .add_preload("comments", comments, PreloadOpts::new("id", "post_id"))
        .unwrap();

    let result = run(&token);
    let post_one_comments = result.data[0]["comments"].as_array().unwrap();
    let thirteen = post_one_comments
        .iter()
        .find(|c| c["id"] == json!(13))
        .unwrap()
        .as_object()
        .unwrap();
    assert_eq!(child_ids(thirteen, "likes"), vec![100, 102]);

    let twelve = result.data[1]["comments"][0].as_object().unwrap();
    assert_eq!(child_ids(twelve, "likes"), vec![101]);
}
