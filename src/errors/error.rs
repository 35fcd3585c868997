//! Error types for table loading and parser usage.

use thiserror::Error;

use crate::grammar::GrammarError;

/// Errors raised while turning table bytes into a [`Language`](crate::Language)
/// or while binding a language to a parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageError {
    /// The table format version is outside the range this engine reads.
    #[error("incompatible grammar table version {version} (supported: {min}..={max})")]
    IncompatibleVersion { version: u32, min: u32, max: u32 },

    /// The table bytes are malformed or reference data that does not exist.
    #[error("corrupt grammar table: {0}")]
    CorruptTable(String),

    /// A bundled grammar failed to compile into a table.
    #[error("grammar compilation failed: {0}")]
    Grammar(#[from] GrammarError),
}

impl LanguageError {
    /// Create a corrupt table error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptTable(message.into())
    }

    /// Check if this error is a version mismatch
    pub fn is_version_mismatch(&self) -> bool {
        matches!(self, Self::IncompatibleVersion { .. })
    }
}

/// Errors returned by [`Parser::parse`](crate::Parser::parse).
///
/// These describe misuse of the parser. Invalid source text is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// `parse` was called before `set_language`.
    #[error("no language is set on the parser")]
    NoLanguage,

    /// Node offsets are 32-bit, so larger inputs cannot be represented.
    #[error("input of {len} bytes exceeds the 4 GiB limit")]
    InputTooLarge { len: usize },
}
