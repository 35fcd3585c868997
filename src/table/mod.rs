//! Grammar tables
//!
//! A grammar table is the compiled, immutable description of a language:
//!
//! ```text
//! symbols      node kinds (named rules, hidden rules, anonymous literals)
//! fields       field names used to label children
//! rules        (symbol, body op) per grammar rule
//! ops + edges  the rule graph: sequence, choice, repetition, calls, ...
//! literals     byte strings matched verbatim
//! lex states   character-class NFAs, one entry state per pattern
//! ```
//!
//! [`TableData`] is the decoded form. The binary layout lives in `format`,
//! reading and validation in `decode`.

mod decode;
mod format;

pub(crate) use decode::decode;
pub use format::{HEADER_LEN, MIN_COMPATIBLE_TABLE_VERSION, TABLE_MAGIC, TABLE_VERSION};

use smol_str::SmolStr;

/// Symbol id reserved for error nodes
pub const ERROR_SYMBOL: u16 = 0;

/// Name of the reserved error symbol
pub const ERROR_SYMBOL_NAME: &str = "ERROR";

pub(crate) const SYMBOL_VISIBLE: u32 = 1;
pub(crate) const SYMBOL_NAMED: u32 = 2;

/// A node kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SymbolInfo {
    pub name: SmolStr,
    /// Visible symbols become nodes; hidden rules splice their children
    pub visible: bool,
    /// Named symbols come from rules, anonymous ones from literals
    pub named: bool,
}

impl SymbolInfo {
    pub(crate) fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.visible {
            flags |= SYMBOL_VISIBLE;
        }
        if self.named {
            flags |= SYMBOL_NAMED;
        }
        flags
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RuleInfo {
    pub symbol: u16,
    pub body: u32,
}

/// One node of the rule graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    /// Match a literal; produces an anonymous leaf of `symbol`
    Literal { literal: u32, symbol: u16 },
    /// Match a pattern; produces no node
    Pattern { pattern: u32 },
    Seq { first: u32, len: u32 },
    /// Ordered choice: the first alternative that matches wins
    Choice { first: u32, len: u32 },
    Repeat { child: u32 },
    Repeat1 { child: u32 },
    Optional { child: u32 },
    Rule { rule: u32 },
    Field { field: u16, child: u32 },
    /// Match `child` without producing any nodes for it
    Token { child: u32 },
    Not { child: u32 },
    And { child: u32 },
    End,
}

impl Op {
    pub(crate) const LITERAL: u32 = 0;
    pub(crate) const PATTERN: u32 = 1;
    pub(crate) const SEQ: u32 = 2;
    pub(crate) const CHOICE: u32 = 3;
    pub(crate) const REPEAT: u32 = 4;
    pub(crate) const REPEAT1: u32 = 5;
    pub(crate) const OPTIONAL: u32 = 6;
    pub(crate) const RULE: u32 = 7;
    pub(crate) const FIELD: u32 = 8;
    pub(crate) const TOKEN: u32 = 9;
    pub(crate) const NOT: u32 = 10;
    pub(crate) const AND: u32 = 11;
    pub(crate) const END: u32 = 12;

    /// `(tag, a, b)` record as stored in the table
    pub(crate) fn to_record(self) -> [u32; 3] {
        match self {
            Op::Literal { literal, symbol } => [Self::LITERAL, literal, symbol as u32],
            Op::Pattern { pattern } => [Self::PATTERN, pattern, 0],
            Op::Seq { first, len } => [Self::SEQ, first, len],
            Op::Choice { first, len } => [Self::CHOICE, first, len],
            Op::Repeat { child } => [Self::REPEAT, child, 0],
            Op::Repeat1 { child } => [Self::REPEAT1, child, 0],
            Op::Optional { child } => [Self::OPTIONAL, child, 0],
            Op::Rule { rule } => [Self::RULE, rule, 0],
            Op::Field { field, child } => [Self::FIELD, field as u32, child],
            Op::Token { child } => [Self::TOKEN, child, 0],
            Op::Not { child } => [Self::NOT, child, 0],
            Op::And { child } => [Self::AND, child, 0],
            Op::End => [Self::END, 0, 0],
        }
    }
}

/// One state of a pattern automaton
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LexState {
    /// Consume one character inside any of `class_ranges[first..first + len]`
    Class { first: u32, len: u32, next: u32 },
    Split { x: u32, y: u32 },
    Jump { next: u32 },
    Match,
}

impl LexState {
    pub(crate) const CLASS: u32 = 0;
    pub(crate) const SPLIT: u32 = 1;
    pub(crate) const JUMP: u32 = 2;
    pub(crate) const MATCH: u32 = 3;

    pub(crate) fn to_record(self) -> [u32; 4] {
        match self {
            LexState::Class { first, len, next } => [Self::CLASS, first, len, next],
            LexState::Split { x, y } => [Self::SPLIT, x, y, 0],
            LexState::Jump { next } => [Self::JUMP, next, 0, 0],
            LexState::Match => [Self::MATCH, 0, 0, 0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PatternInfo {
    /// Source text of the pattern, used in diagnostics
    pub name: SmolStr,
    pub start: u32,
}

/// A decoded grammar table
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TableData {
    pub version: u32,
    pub name: SmolStr,
    pub symbols: Vec<SymbolInfo>,
    pub fields: Vec<SmolStr>,
    pub rules: Vec<RuleInfo>,
    pub ops: Vec<Op>,
    pub edges: Vec<u32>,
    pub literals: Vec<Box<[u8]>>,
    pub lex_states: Vec<LexState>,
    pub class_ranges: Vec<(u32, u32)>,
    pub patterns: Vec<PatternInfo>,
    pub start_rule: u32,
    pub recovery: Option<u32>,
}

impl TableData {
    /// Serialize into the binary table format
    pub(crate) fn encode(&self) -> Vec<u8> {
        format::encode(self)
    }
}
