//! Cursor codec
//!
//! Cursors are opaque position markers minted while assembling a page and
//! handed back unmodified to resume pagination.
//!
//! # Guarantees
//!
//! - A cursor only decodes against the exact `(field, direction)` list it was
//!   minted under; anything else is `CursorFieldMismatch`
//! - Decoding yields a lexicographic compound predicate, so multi-column
//!   keysets neither skip nor repeat rows
//! - Malformed input is `CursorDecodeFailure`, never an empty page

mod codec;
mod errors;
mod predicate;

pub use codec::{decode, encode, fingerprint, CursorCodec, CURSOR_VERSION};
pub use errors::{CursorError, CursorResult};
pub use predicate::{CompoundPredicate, KeyBound, KeyComparison, Seek};
