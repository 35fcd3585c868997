//! Error handling
//!
//! Two families of errors live here:
//! - Load-time and usage failures ([`LanguageError`], [`ParseError`]) are
//!   returned as `Err` to the embedder.
//! - Syntax problems in the parsed text are never failures. They become
//!   `ERROR` nodes in the tree plus a [`SyntaxError`] diagnostic.

mod diagnostic;
mod error;

pub use diagnostic::SyntaxError;
pub use error::{LanguageError, ParseError};
