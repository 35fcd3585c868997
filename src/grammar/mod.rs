//! Grammar compiler
//!
//! Grammars are written in a small PEG notation and compiled into the binary
//! table format loaded by [`Language::from_bytes`](crate::Language::from_bytes).
//!
//! ```text
//! @grammar greeting;
//! @start source_file;
//! @recover /\n/;
//!
//! source_file = (command /\n/?)*;
//! command = "say" " " message: word;
//! word = @token(/[a-z]+/);
//! _hidden = "x";            // hidden rules splice their children
//! ```
//!
//! Expressions: ordered choice `a | b`, sequence `a b`, repetition `a* a+ a?`,
//! lookahead `!a &a`, fields `name: a`, literals `"..."`, patterns `/.../`,
//! grouping `( )`, the empty sequence `()`, `@token(a)` (match without
//! producing nodes) and `@end` (end of input).

mod emit;
mod error;
mod lexer;
mod parser;
mod regex;

pub use error::GrammarError;
pub use lexer::{Token, TokenKind, tokenize};

use smol_str::SmolStr;

use crate::table::TableData;

/// A parsed grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub name: SmolStr,
    pub start: SmolStr,
    /// Source of the recovery pattern, without slashes
    pub recover: Option<String>,
    pub rules: Vec<RuleDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDef {
    pub name: SmolStr,
    pub body: Expr,
    /// Byte offset of the rule name in the grammar text
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(String),
    /// Pattern source, without slashes
    Pattern(String),
    Rule(SmolStr),
    Seq(Vec<Expr>),
    Choice(Vec<Expr>),
    Repeat(Box<Expr>),
    Repeat1(Box<Expr>),
    Optional(Box<Expr>),
    Field(SmolStr, Box<Expr>),
    Token(Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>),
    End,
}

impl Grammar {
    /// Parse grammar text
    pub fn parse(source: &str) -> Result<Self, GrammarError> {
        parser::parse_grammar(source)
    }

    /// Compile into binary table bytes
    pub fn compile(&self) -> Result<Vec<u8>, GrammarError> {
        Ok(self.to_table()?.encode())
    }

    pub(crate) fn to_table(&self) -> Result<TableData, GrammarError> {
        emit::emit(self)
    }
}

/// Parse and compile grammar text into binary table bytes.
pub fn compile(source: &str) -> Result<Vec<u8>, GrammarError> {
    Grammar::parse(source)?.compile()
}

#[cfg(test)]
mod tests;
