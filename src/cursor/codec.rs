//! Cursor wire format
//!
//! A cursor is URL-safe, unpadded base64 of a JSON envelope:
//!
//! ```text
//! {"v":1,"f":"<fingerprint>","k":[<sort key values in order>]}
//! ```
//!
//! The fingerprint is derived from the `(binding, field, direction)` list the
//! cursor was minted under. Decoding recomputes it from the caller's current
//! order terms and fails closed on any difference.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::errors::{CursorError, CursorResult};
use super::predicate::{CompoundPredicate, Seek};
use crate::config::EngineConfig;
use crate::token::OrderTerm;
use crate::value::{lookup, Row};

/// Envelope version written by this codec
pub const CURSOR_VERSION: u8 = 1;

// Bytes of the SHA-256 digest kept in the fingerprint.
const FINGERPRINT_BYTES: usize = 16;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: u8,
    f: String,
    k: Vec<serde_json::Value>,
}

/// Fingerprint of an ordered `(binding, field, direction)` list.
pub fn fingerprint(order_terms: &[OrderTerm]) -> String {
    let mut hasher = Sha256::new();
    for term in order_terms {
        hasher.update(term.binding.as_deref().unwrap_or("").as_bytes());
        hasher.update([0x1f]);
        hasher.update(term.field.as_bytes());
        hasher.update([0x1f]);
        hasher.update(term.direction.as_str().as_bytes());
        hasher.update([0x1e]);
    }
    hasher.finalize()[..FINGERPRINT_BYTES]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Encodes and decodes cursors under a length policy
#[derive(Debug, Clone, Copy)]
pub struct CursorCodec {
    max_len: usize,
}

impl CursorCodec {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_len: config.max_cursor_len,
        }
    }

    /// Mints a cursor from the sort-key values of `row`.
    pub fn encode(&self, order_terms: &[OrderTerm], row: &Row) -> CursorResult<String> {
        if order_terms.is_empty() {
            return Err(CursorError::decode("cursor requires at least one sort key"));
        }

        let mut keys = Vec::with_capacity(order_terms.len());
        for term in order_terms {
            let column = term.column();
            match lookup(row, &column) {
                None => return Err(CursorError::MissingSortKey(column.to_string())),
                Some(serde_json::Value::Null) => {
                    return Err(CursorError::NullSortKey(column.to_string()))
                }
                Some(value) => keys.push(value.clone()),
            }
        }

        let envelope = Envelope {
            v: CURSOR_VERSION,
            f: fingerprint(order_terms),
            k: keys,
        };
        let json = serde_json::to_vec(&envelope)
            .map_err(|e| CursorError::decode(format!("serialize failed: {}", e)))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decodes the raw sort-key values of a cursor, checking its fingerprint
    /// against `order_terms`.
    pub fn decode_values(
        &self,
        cursor: &str,
        order_terms: &[OrderTerm],
    ) -> CursorResult<Vec<serde_json::Value>> {
        let cursor = cursor.trim();
        if cursor.is_empty() {
            return Err(CursorError::decode("cursor is empty"));
        }
        if cursor.len() > self.max_len {
            return Err(CursorError::decode(format!(
                "cursor exceeds max length: {} chars (max {})",
                cursor.len(),
                self.max_len
            )));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(cursor)
            .map_err(|e| CursorError::decode(format!("invalid base64: {}", e)))?;
        let envelope: Envelope = serde_json::from_slice(&bytes)
            .map_err(|e| CursorError::decode(format!("invalid envelope: {}", e)))?;

        if envelope.v != CURSOR_VERSION {
            return Err(CursorError::decode(format!(
                "unsupported cursor version {}",
                envelope.v
            )));
        }

        let expected = fingerprint(order_terms);
        if envelope.f != expected {
            return Err(CursorError::CursorFieldMismatch {
                expected,
                found: envelope.f,
            });
        }

        if envelope.k.len() != order_terms.len() {
            return Err(CursorError::decode(format!(
                "cursor carries {} keys, ordering has {}",
                envelope.k.len(),
                order_terms.len()
            )));
        }
        if envelope.k.iter().any(serde_json::Value::is_null) {
            return Err(CursorError::decode("cursor carries a null sort key"));
        }

        Ok(envelope.k)
    }

    /// Decodes a cursor into the lexicographic predicate selecting the rows
    /// on the `seek` side of the boundary row.
    pub fn decode(
        &self,
        cursor: &str,
        order_terms: &[OrderTerm],
        seek: Seek,
    ) -> CursorResult<CompoundPredicate> {
        let values = self.decode_values(cursor, order_terms)?;
        Ok(CompoundPredicate::new(order_terms, values, seek))
    }
}

impl Default for CursorCodec {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

/// Mints a cursor with the default codec policy.
pub fn encode(order_terms: &[OrderTerm], row: &Row) -> CursorResult<String> {
    CursorCodec::default().encode(order_terms, row)
}

/// Decodes a cursor with the default codec policy.
pub fn decode(cursor: &str, order_terms: &[OrderTerm], seek: Seek) -> CursorResult<CompoundPredicate> {
    CursorCodec::default().decode(cursor, order_terms, seek)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    fn terms() -> Vec<OrderTerm> {
        vec![OrderTerm::desc("created_at"), OrderTerm::asc("id")]
    }

    #[test]
    fn test_cursor_is_url_safe() {
        let cursor = encode(&terms(), &row(json!({"created_at": "2024-01-01T00:00:00Z", "id": 7}))).unwrap();
        assert!(cursor
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_decode_recovers_values() {
        let cursor = encode(&terms(), &row(json!({"created_at": "2024-01-01", "id": 7, "title": "x"}))).unwrap();
        let values = CursorCodec::default().decode_values(&cursor, &terms()).unwrap();
        assert_eq!(values, vec![json!("2024-01-01"), json!(7)]);
    }

    #[test]
    fn test_fingerprint_depends_on_direction_and_position() {
        let base = fingerprint(&terms());
        assert_ne!(base, fingerprint(&[OrderTerm::asc("created_at"), OrderTerm::asc("id")]));
        assert_ne!(base, fingerprint(&[OrderTerm::asc("id"), OrderTerm::desc("created_at")]));
        assert_ne!(
            base,
            fingerprint(&[OrderTerm::desc("created_at").on("post"), OrderTerm::asc("id")])
        );
        assert_eq!(base.len(), FINGERPRINT_BYTES * 2);
    }

    #[test]
    fn test_mismatched_ordering_fails_closed() {
        let cursor = encode(&terms(), &row(json!({"created_at": "2024-01-01", "id": 7}))).unwrap();
        let declared = vec![
            OrderTerm::desc("priority"),
            OrderTerm::desc("created_at"),
            OrderTerm::asc("id"),
        ];
        let err = decode(&cursor, &declared, Seek::After).unwrap_err();
        assert_eq!(err.code(), "CURSOR_FIELD_MISMATCH");
    }

    #[test]
    fn test_garbage_is_decode_failure() {
        for bad in ["", "   ", "!!!", "bm90IGpzb24"] {
            let err = decode(bad, &terms(), Seek::After).unwrap_err();
            assert_eq!(err.code(), "CURSOR_DECODE_FAILURE", "input {:?}", bad);
        }
    }

    #[test]
    fn test_oversized_cursor_rejected() {
        let config = EngineConfig {
            max_cursor_len: 8,
            ..EngineConfig::default()
        };
        let codec = CursorCodec::new(&config);
        let err = codec.decode("aaaaaaaaaaaa", &terms(), Seek::After).unwrap_err();
        assert_eq!(err.code(), "CURSOR_DECODE_FAILURE");
    }

    #[test]
    fn test_missing_and_null_sort_keys() {
        let err = encode(&terms(), &row(json!({"id": 1}))).unwrap_err();
        assert_eq!(err, CursorError::MissingSortKey("created_at".into()));

        let err = encode(&terms(), &row(json!({"created_at": null, "id": 1}))).unwrap_err();
        assert_eq!(err, CursorError::NullSortKey("created_at".into()));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let envelope = json!({"v": 9, "f": fingerprint(&terms()), "k": ["a", 1]});
        let cursor = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&envelope).unwrap());
        let err = decode(&cursor, &terms(), Seek::After).unwrap_err();
        assert_eq!(err.code(), "CURSOR_DECODE_FAILURE");
    }

    #[test]
    fn test_decoded_predicate_starts_after_row() {
        let boundary = row(json!({"created_at": "2024-01-02", "id": 3}));
        let cursor = encode(&terms(), &boundary).unwrap();
        let predicate = decode(&cursor, &terms(), Seek::After).unwrap();

        assert!(!predicate.matches(&boundary));
        assert!(predicate.matches(&row(json!({"created_at": "2024-01-02", "id": 4}))));
        assert!(predicate.matches(&row(json!({"created_at": "2024-01-01", "id": 1}))));
        assert!(!predicate.matches(&row(json!({"created_at": "2024-01-03", "id": 9}))));
    }
}
