//! Table-driven parsing
//!
//! ```text
//! Language (grammar table)
//!     ↓
//! Parser::parse(text, old_tree)
//!     ↓
//! Engine: rule graph on a frame stack, terminals matched on demand
//!     ↓
//! SyntaxTree (ERROR nodes + diagnostics for bad input)
//! ```
//!
//! ## Incremental reparsing
//!
//! Record the change with [`SyntaxTree::edit`], then pass the old tree to
//! the next [`Parser::parse`]. Rules whose old nodes did not look at any
//! edited byte are taken over without being parsed again.

mod engine;
mod options;
mod reuse;

pub use options::ParseOptions;

use crate::errors::{LanguageError, ParseError};
use crate::language::Language;
use crate::table::{MIN_COMPATIBLE_TABLE_VERSION, TABLE_VERSION};
use crate::tree::SyntaxTree;
use engine::Engine;

/// A parser, bound to at most one [`Language`] at a time.
///
/// Parsers keep their internal buffers between parses; reuse one parser for
/// many documents rather than creating one per parse.
#[derive(Debug, Default)]
pub struct Parser {
    language: Option<Language>,
    options: ParseOptions,
    engine: Engine,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    /// Bind a language.
    ///
    /// Fails if the language's table version is outside the range this
    /// engine understands; the previous language stays set in that case.
    pub fn set_language(&mut self, language: &Language) -> Result<(), LanguageError> {
        if !language.is_compatible() {
            return Err(LanguageError::IncompatibleVersion {
                version: language.version(),
                min: MIN_COMPATIBLE_TABLE_VERSION,
                max: TABLE_VERSION,
            });
        }
        self.language = Some(language.clone());
        Ok(())
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn set_options(&mut self, options: ParseOptions) {
        self.options = options;
    }

    /// Parse `text`.
    ///
    /// Any byte sequence parses; syntax errors are reported as `ERROR` nodes
    /// and [`SyntaxTree::errors`]. `old_tree` is an earlier tree for the
    /// same language with its edits recorded through [`SyntaxTree::edit`].
    pub fn parse(
        &mut self,
        text: impl AsRef<[u8]>,
        old_tree: Option<&SyntaxTree>,
    ) -> Result<SyntaxTree, ParseError> {
        let language = self.language.as_ref().ok_or(ParseError::NoLanguage)?;
        let input = text.as_ref();
        // lookahead may reach one byte past the end
        if input.len() >= u32::MAX as usize {
            return Err(ParseError::InputTooLarge { len: input.len() });
        }

        let old_tree = old_tree.filter(|old| {
            if !self.options.reuse_subtrees {
                return false;
            }
            if old.language() != language {
                tracing::warn!(
                    expected = %language.name(),
                    found = %old.language().name(),
                    "ignoring old tree from another language"
                );
                return false;
            }
            match reuse::edited_len(old) {
                Some(len) if len == input.len() => true,
                edited => {
                    tracing::warn!(
                        edited_len = ?edited,
                        len = input.len(),
                        "ignoring old tree whose edits do not match the new text"
                    );
                    false
                }
            }
        });

        Ok(self
            .engine
            .parse(language, input, old_tree, self.options))
    }
}
