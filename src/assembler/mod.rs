//! Result assembler
//!
//! Turns raw executor rows into pages: trims the extra row, mints cursors,
//! computes offset arithmetic and attaches preloaded children.

mod assemble;
mod preload;
mod result;

pub use assemble::{assemble, assemble_page, assemble_with};
pub use preload::{attach_preloads, parent_keys};
pub use result::{PaginationKind, PaginationMetadata, QueryResult};
