//! Foundation types shared by the table loader, the engine, and the tree.
//!
//! - [`TextRange`], [`TextSize`] - Byte offsets into the source
//! - [`LineCol`], [`LineIndex`] - Line/column conversion for node positions
//!
//! This module has no dependencies on other crate modules.

mod position;

pub use position::{LineCol, LineIndex};

// Re-export text-size types for convenience
pub use text_size::{self, TextRange, TextSize};
