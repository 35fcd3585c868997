//! Syntax diagnostics attached to parse trees

use std::fmt;

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

/// A syntax error recorded while parsing.
///
/// Every `ERROR` node in a tree has one diagnostic. The range is the span of
/// the error node; `offset` is the furthest position the parser reached
/// before giving up, which is usually the more precise place to point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Human-readable error message
    pub message: String,
    /// Range of the error node
    pub range: TextRange,
    /// Furthest offset reached by the failed attempt
    pub offset: TextSize,
    /// Terminals that would have been accepted at `offset`, sorted
    pub expected: Vec<SmolStr>,
}

impl SyntaxError {
    /// Create a syntax error with no expectation list
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            offset: range.start(),
            range,
            expected: Vec::new(),
        }
    }

    /// Build the diagnostic for a failed attempt.
    ///
    /// `found` is the text at `offset`, or `None` at end of input.
    pub fn unexpected(
        range: TextRange,
        offset: TextSize,
        expected: Vec<SmolStr>,
        found: Option<&str>,
    ) -> Self {
        let found = match found {
            Some(text) => format!("{text:?}"),
            None => "end of input".to_string(),
        };
        let message = match expected.as_slice() {
            [] => format!("unexpected {found}"),
            [only] => format!("expected {only}, found {found}"),
            many => format!("expected one of {}, found {found}", many.join(", ")),
        };
        Self {
            message,
            range,
            offset,
            expected,
        }
    }

    /// Set the furthest offset
    pub fn at_offset(mut self, offset: TextSize) -> Self {
        self.offset = offset;
        self
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}: {}",
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )
    }
}
