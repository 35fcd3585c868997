//! # mcfunction-syntax
//!
//! A table-driven parse engine and the mcfunction grammar it ships with.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! mcfunction → Bundled grammar: source, table, Language
//!   ↓
//! grammar    → Grammar DSL compiler (logos lexer, pattern compiler, emitter)
//!   ↓
//! parser     → Parser, frame-stack engine, subtree reuse
//!   ↓
//! tree       → SyntaxTree arena, SyntaxNode views, InputEdit
//!   ↓
//! lexer      → Literal and pattern matching against table automata
//!   ↓
//! language   → Language handle over a validated table
//!   ↓
//! table      → Binary grammar table format and validation
//!   ↓
//! base       → Primitives (TextRange, line/column)
//! ```
//!
//! ## Example
//!
//! ```
//! use mcfunction_syntax::{Parser, mcfunction};
//!
//! let language = mcfunction::language().unwrap();
//! let mut parser = Parser::new();
//! parser.set_language(&language).unwrap();
//!
//! let tree = parser.parse("say hello\n", None).unwrap();
//! assert!(!tree.has_error());
//! ```

// ============================================================================
// MODULES (dependency order: base → table → language → tree → parser)
// ============================================================================

/// Foundation types: TextRange, line/column conversion
pub mod base;

/// Load-time errors, usage errors, and syntax diagnostics
pub mod errors;

/// Binary grammar tables
pub mod table;

/// Language handles
mod language;

/// Terminal matching
mod lexer;

/// Syntax trees and node queries
pub mod tree;

/// Parser and engine
pub mod parser;

/// Grammar compiler
pub mod grammar;

/// The bundled mcfunction grammar
pub mod mcfunction;

// Re-export commonly needed items
pub use errors::{LanguageError, ParseError, SyntaxError};
pub use language::{FieldId, KindId, Language};
pub use parser::{ParseOptions, Parser};
pub use tree::{InputEdit, SyntaxNode, SyntaxTree};

// Re-export foundation types
pub use base::{LineCol, LineIndex, TextRange, TextSize};
