//! Keyset Pagination Consistency Tests
//!
//! Walks multi-column cursor pagination end to end through the compiler, the
//! in-memory executor and the assembler.
//!
//! Test Categories:
//! 1. Completeness and exclusivity across pages
//! 2. Robustness against inserts between page fetches
//! 3. Backward and bounded navigation
//! 4. Cursor rejection

use serde_json::json;

use querytoken::{
    fetch, Compiler, CursorField, FetchOptions, MemoryExecutor, OrderTerm, PaginationSpec,
    QueryResult, Token,
};

fn row(value: serde_json::Value) -> querytoken::value::Row {
    value.as_object().cloned().unwrap()
}

/// Five rows whose declared order is r1..r5. Stored out of order on purpose.
fn executor() -> MemoryExecutor {
    MemoryExecutor::new()
        .with_json(
            "tasks",
            json!([
                {"id": 4, "priority": 2, "created_at": "2024-01-03"},
                {"id": 1, "priority": 3, "created_at": "2024-01-05"},
                {"id": 5, "priority": 1, "created_at": "2024-01-09"},
                {"id": 3, "priority": 2, "created_at": "2024-01-07"},
                {"id": 2, "priority": 3, "created_at": "2024-01-05"},
            ]),
        )
        .unwrap()
}

fn feed_orders() -> Vec<OrderTerm> {
    vec![
        OrderTerm::desc("priority"),
        OrderTerm::desc("created_at"),
        OrderTerm::asc("id"),
    ]
}

fn feed(pagination: PaginationSpec) -> Token {
    Token::new("tasks")
        .add_orders(feed_orders())
        .unwrap()
        .set_pagination(pagination)
        .unwrap()
}

fn cursor(limit: u64) -> PaginationSpec {
    PaginationSpec::cursor(limit, ["priority", "created_at", "id"])
}

fn ids(page: &QueryResult) -> Vec<i64> {
    page.data.iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

fn get(executor: &MemoryExecutor, token: &Token) -> QueryResult {
    fetch(executor, &Compiler::default(), token, FetchOptions::default()).unwrap()
}

// =============================================================================
// COMPLETENESS AND EXCLUSIVITY
// =============================================================================

/// Test: Five rows at page size two come back as [r1,r2], [r3,r4], [r5].
#[test]
fn test_pages_are_complete_and_exclusive() {
    let executor = executor();

    let first = get(&executor, &feed(cursor(2)));
    assert_eq!(ids(&first), vec![1, 2]);
    assert!(first.has_more());
    assert!(!first.pagination.as_ref().unwrap().has_previous);

    let second = get(&executor, &feed(cursor(2).after(first.end_cursor().unwrap())));
    assert_eq!(ids(&second), vec![3, 4]);
    assert!(second.has_more());
    assert!(second.pagination.as_ref().unwrap().has_previous);

    let third = get(&executor, &feed(cursor(2).after(second.end_cursor().unwrap())));
    assert_eq!(ids(&third), vec![5]);
    assert!(!third.has_more());
}

/// Test: Rows tied on the leading keys are split by the trailing key only.
#[test]
fn test_ties_break_on_trailing_key() {
    let executor = executor();
    let first = get(&executor, &feed(cursor(1)));
    assert_eq!(ids(&first), vec![1]);

    // r2 ties r1 on (priority, created_at)
    let second = get(&executor, &feed(cursor(1).after(first.end_cursor().unwrap())));
    assert_eq!(ids(&second), vec![2]);
}

/// Test: Without declared orders, the cursor fields define the order.
#[test]
fn test_cursor_fields_alone_define_order() {
    let executor = executor();
    let token = Token::new("tasks")
        .set_pagination(PaginationSpec::cursor(
            3,
            [CursorField::desc("created_at"), CursorField::asc("id")],
        ))
        .unwrap();
    let first = get(&executor, &token);
    assert_eq!(ids(&first), vec![5, 3, 1]);

    let next = Token::new("tasks")
        .set_pagination(
            PaginationSpec::cursor(3, [CursorField::desc("created_at"), CursorField::asc("id")])
                .after(first.end_cursor().unwrap()),
        )
        .unwrap();
    assert_eq!(ids(&get(&executor, &next)), vec![2, 4]);
}

/// Test: A cursor-field prefix of the orders still walks every row once.
#[test]
fn test_prefix_cursor_fields_walk_full_order() {
    let executor = executor();
    let prefix = |after: Option<&str>| {
        let mut spec = PaginationSpec::cursor(2, ["priority"]);
        if let Some(position) = after {
            spec = spec.after(position);
        }
        feed(spec)
    };

    let first = get(&executor, &prefix(None));
    assert_eq!(ids(&first), vec![1, 2]);
    let second = get(&executor, &prefix(first.end_cursor()));
    assert_eq!(ids(&second), vec![3, 4]);
    let third = get(&executor, &prefix(second.end_cursor()));
    assert_eq!(ids(&third), vec![5]);
    assert!(!third.has_more());
}

// =============================================================================
// TOTAL COUNT
// =============================================================================

/// Test: Resumed pages report the same total as the first page.
#[test]
fn test_total_count_stable_across_pages() {
    let executor = executor();
    let counted = |token: &Token| {
        fetch(&executor, &Compiler::default(), token, FetchOptions::with_total_count()).unwrap()
    };

    let first = counted(&feed(cursor(2)));
    let second = counted(&feed(cursor(2).after(first.end_cursor().unwrap())));
    let third = counted(&feed(cursor(2).after(second.end_cursor().unwrap())));

    for page in [&first, &second, &third] {
        let meta = page.pagination.as_ref().unwrap();
        assert_eq!(meta.total_count, Some(5));
        assert_eq!(meta.total_pages, Some(3));
    }
    assert_eq!(ids(&third), vec![5]);

    let back = counted(&feed(cursor(2).before(third.start_cursor().unwrap())));
    assert_eq!(back.pagination.as_ref().unwrap().total_count, Some(5));
}

// =============================================================================
// INSERTION ROBUSTNESS
// =============================================================================

/// Test: Inserting rows between fetches neither repeats nor skips rows.
#[test]
fn test_insert_between_pages() {
    let mut executor = executor();
    let mut seen = Vec::new();

    let first = get(&executor, &feed(cursor(2)));
    seen.extend(ids(&first));

    // Sorts before the current position: must never surface.
    executor.insert("tasks", row(json!({"id": 0, "priority": 9, "created_at": "2024-01-01"})));
    // Sorts right after r2: must show up next.
    executor.insert("tasks", row(json!({"id": 6, "priority": 3, "created_at": "2024-01-04"})));

    let mut after = first.end_cursor().map(str::to_string);
    while let Some(position) = after {
        let page = get(&executor, &feed(cursor(2).after(position)));
        seen.extend(ids(&page));
        after = if page.has_more() {
            page.end_cursor().map(str::to_string)
        } else {
            None
        };
    }

    assert_eq!(seen, vec![1, 2, 6, 3, 4, 5]);
}

// =============================================================================
// BACKWARD AND BOUNDED NAVIGATION
// =============================================================================

/// Test: `before` returns the rows preceding the boundary in declared order.
#[test]
fn test_before_returns_previous_page() {
    let executor = executor();
    let first = get(&executor, &feed(cursor(2)));
    let second = get(&executor, &feed(cursor(2).after(first.end_cursor().unwrap())));

    let back = get(&executor, &feed(cursor(2).before(second.start_cursor().unwrap())));
    assert_eq!(ids(&back), vec![1, 2]);
    assert!(!back.has_more());
    assert!(back.pagination.as_ref().unwrap().has_previous);
}

/// Test: `after` and `before` together select the rows strictly between.
#[test]
fn test_after_and_before_bound_a_window() {
    let executor = executor();
    let all = get(&executor, &feed(cursor(5)));
    assert_eq!(ids(&all), vec![1, 2, 3, 4, 5]);

    let order = feed_orders();
    let compiler = Compiler::default();
    let lower = compiler.codec().encode(&order, &all.data[0]).unwrap();
    let upper = compiler.codec().encode(&order, &all.data[3]).unwrap();

    let window = get(&executor, &feed(cursor(5).after(lower).before(upper)));
    assert_eq!(ids(&window), vec![2, 3]);
}

// =============================================================================
// CURSOR REJECTION
// =============================================================================

/// Test: A cursor minted under a different ordering fails closed.
#[test]
fn test_cursor_from_other_ordering_rejected() {
    let executor = executor();
    let short = Token::new("tasks")
        .add_orders([OrderTerm::desc("created_at"), OrderTerm::asc("id")])
        .unwrap()
        .set_pagination(PaginationSpec::cursor(2, ["created_at", "id"]))
        .unwrap();
    let page = get(&executor, &short);

    let err = fetch(
        &executor,
        &Compiler::default(),
        &feed(cursor(2).after(page.end_cursor().unwrap())),
        FetchOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.code(), "CURSOR_FIELD_MISMATCH");
    assert!(err.restart_pagination());
}

/// Test: A corrupted cursor is an error, never an empty last page.
#[test]
fn test_corrupted_cursor_is_not_end_of_list() {
    let executor = executor();
    let err = fetch(
        &executor,
        &Compiler::default(),
        &feed(cursor(2).after("not-a-cursor")),
        FetchOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.code(), "CURSOR_DECODE_FAILURE");
    assert!(err.cursor_error().is_some());
}
