//! Observability
//!
//! Structured logging of engine events through `tracing`.
//!
//! # Principles
//!
//! 1. Observability is read-only and never changes a result
//! 2. One event = one record, named by a stable `Event`
//! 3. The library never installs a subscriber
//!
//! # Usage
//!
//! ```ignore
//! use querytoken::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::TokenCompiled, &[("source", "posts")]);
//! ```

mod events;

pub use events::{Event, Severity};

/// Log an event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Keys recorded as structured `tracing` fields. Anything else lands in
/// the `extra` field.
pub const KNOWN_FIELDS: [&str; 11] = [
    "source", "code", "reason", "limit", "params", "preloads", "returned", "fetched",
    "has_more", "assoc", "attached",
];

macro_rules! emit {
    ($macro:ident, $name:expr, $get:ident, $extra:expr) => {
        tracing::$macro!(
            target: "querytoken",
            event = $name,
            source = $get("source"),
            code = $get("code"),
            reason = $get("reason"),
            limit = $get("limit"),
            params = $get("params"),
            preloads = $get("preloads"),
            returned = $get("returned"),
            fetched = $get("fetched"),
            has_more = $get("has_more"),
            assoc = $get("assoc"),
            attached = $get("attached"),
            extra = $extra,
        )
    };
}

/// Log an event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let name = event.as_str();
    let get = |key: &str| fields.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
    let extra = render_extra(fields);
    let extra = extra.as_deref();
    match event.severity() {
        Severity::Trace => emit!(trace, name, get, extra),
        Severity::Debug => emit!(debug, name, get, extra),
        Severity::Info => emit!(info, name, get, extra),
        Severity::Warn => emit!(warn, name, get, extra),
    }
}

// Unknown keys, sorted so records are deterministic.
fn render_extra(fields: &[(&str, &str)]) -> Option<String> {
    let mut unknown: Vec<_> = fields
        .iter()
        .filter(|(k, _)| !KNOWN_FIELDS.contains(k))
        .collect();
    if unknown.is_empty() {
        return None;
    }
    unknown.sort_by_key(|(k, _)| *k);
    Some(
        unknown
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" "),
    )
}
