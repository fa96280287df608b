//! Page assembly
//!
//! The executor fetches `limit + 1` rows. A row past the limit means another
//! page exists; it is trimmed here so no second query is needed.

use super::result::{PaginationKind, PaginationMetadata, QueryResult};
use crate::builder::{PaginationDirective, ScanDirection};
use crate::cursor::{CursorCodec, CursorResult};
use crate::token::{OrderTerm, PaginationSpec};
use crate::observability::{log_event_with_fields, Event};
use crate::value::Row;

/// Assembles one page from the raw rows of a plan.
///
/// Rows must arrive in the plan's `order_list`. For a backward scan they are
/// reversed back into declared order after trimming.
pub fn assemble(
    directive: Option<&PaginationDirective>,
    rows: Vec<Row>,
    total_count: Option<u64>,
) -> CursorResult<QueryResult> {
    assemble_with(&CursorCodec::default(), directive, rows, total_count)
}

/// Assembles one page straight from a Token's pagination spec.
///
/// `order_terms` is the effective order the rows were fetched in (see
/// `Token::effective_orders`). A spec with only `before` is treated as a
/// backward scan, as the compiler plans it.
pub fn assemble_page(
    spec: &PaginationSpec,
    rows: Vec<Row>,
    order_terms: &[OrderTerm],
    total_count: Option<u64>,
) -> CursorResult<QueryResult> {
    let directive = match spec {
        PaginationSpec::Offset { limit, offset } => PaginationDirective::Offset {
            limit: *limit,
            offset: *offset,
        },
        PaginationSpec::Cursor {
            limit, after, before, ..
        } => PaginationDirective::Cursor {
            limit: *limit,
            order_terms: order_terms.to_vec(),
            scan: if before.is_some() && after.is_none() {
                ScanDirection::Backward
            } else {
                ScanDirection::Forward
            },
            resumed: after.is_some() || before.is_some(),
        },
    };
    assemble(Some(&directive), rows, total_count)
}

/// Like [`assemble`], minting cursors with `codec`.
pub fn assemble_with(
    codec: &CursorCodec,
    directive: Option<&PaginationDirective>,
    mut rows: Vec<Row>,
    total_count: Option<u64>,
) -> CursorResult<QueryResult> {
    let Some(directive) = directive else {
        return Ok(QueryResult::unpaged(rows));
    };

    let limit = directive.limit();
    let fetched = rows.len() as u64;
    let has_more = fetched > limit;
    rows.truncate(limit.min(fetched) as usize);

    let pagination = match directive {
        PaginationDirective::Offset { offset, .. } => PaginationMetadata {
            kind: PaginationKind::Offset,
            limit,
            has_more,
            has_previous: *offset > 0,
            start_cursor: None,
            end_cursor: None,
            current_page: Some(offset / limit + 1),
            total_pages: total_count.map(|total| total_pages(total, limit)),
            total_count,
        },
        PaginationDirective::Cursor {
            order_terms,
            resumed,
            ..
        } => {
            if directive.is_backward() {
                rows.reverse();
            }
            let start_cursor = rows
                .first()
                .map(|row| codec.encode(order_terms, row))
                .transpose()?;
            let end_cursor = rows
                .last()
                .map(|row| codec.encode(order_terms, row))
                .transpose()?;
            if end_cursor.is_some() {
                let limit = limit.to_string();
                log_event_with_fields(Event::CursorMinted, &[("limit", limit.as_str())]);
            }
            PaginationMetadata {
                kind: PaginationKind::Cursor,
                limit,
                has_more,
                has_previous: *resumed,
                start_cursor,
                end_cursor,
                current_page: None,
                total_pages: total_count.map(|total| total_pages(total, limit)),
                total_count,
            }
        }
    };

    let returned = rows.len().to_string();
    let fetched = fetched.to_string();
    log_event_with_fields(
        Event::PageAssembled,
        &[
            ("fetched", fetched.as_str()),
            ("returned", returned.as_str()),
            ("has_more", if has_more { "true" } else { "false" }),
        ],
    );

    Ok(QueryResult {
        data: rows,
        pagination: Some(pagination),
    })
}

// Callers never pass a zero limit: the compiler rejects it.
fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total / limit + u64::from(total % limit != 0)
}
