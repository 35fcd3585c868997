//! Binary layout of grammar tables
//!
//! All integers are little-endian `u32`. The header is followed by ten
//! sections whose offsets are recorded in the header:
//!
//! ```text
//! 0    magic "GTBL"
//! 4    format version
//! 8    grammar name (pool offset, length)
//! 16   counts: symbols fields rules ops edges literals lex_states class_ranges patterns
//! 52   string pool length
//! 56   start rule
//! 60   recovery pattern (u32::MAX = none)
//! 64   section offsets: pool symbols fields rules ops edges literals lex_states class_ranges patterns
//! 104  sections
//! ```

use super::TableData;

pub const TABLE_MAGIC: [u8; 4] = *b"GTBL";

/// Format version written by this crate
pub const TABLE_VERSION: u32 = 1;

/// Oldest format version this engine still reads
pub const MIN_COMPATIBLE_TABLE_VERSION: u32 = 1;

pub const HEADER_LEN: usize = 104;

pub(crate) const NO_PATTERN: u32 = u32::MAX;

pub(crate) const COUNTS_OFFSET: usize = 16;
pub(crate) const POOL_LEN_OFFSET: usize = 52;
pub(crate) const START_RULE_OFFSET: usize = 56;
pub(crate) const RECOVERY_OFFSET: usize = 60;
pub(crate) const SECTIONS_OFFSET: usize = 64;

/// Sections in file order, with the size of one record in bytes
/// (the pool is addressed in bytes)
pub(crate) const SECTIONS: [(&str, usize); 10] = [
    ("string pool", 1),
    ("symbols", 12),
    ("fields", 8),
    ("rules", 8),
    ("ops", 12),
    ("edges", 4),
    ("literals", 8),
    ("lexer states", 16),
    ("class ranges", 8),
    ("patterns", 12),
];

struct Pool {
    bytes: Vec<u8>,
}

impl Pool {
    fn add(&mut self, data: &[u8]) -> [u32; 2] {
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(data);
        [offset, data.len() as u32]
    }
}

fn put(out: &mut Vec<u8>, values: &[u32]) {
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

pub(crate) fn encode(table: &TableData) -> Vec<u8> {
    let mut pool = Pool { bytes: Vec::new() };
    let name = pool.add(table.name.as_bytes());

    let mut symbols = Vec::with_capacity(table.symbols.len() * 12);
    for symbol in &table.symbols {
        let [off, len] = pool.add(symbol.name.as_bytes());
        put(&mut symbols, &[off, len, symbol.flags()]);
    }

    let mut fields = Vec::with_capacity(table.fields.len() * 8);
    for field in &table.fields {
        put(&mut fields, &pool.add(field.as_bytes()));
    }

    let mut rules = Vec::with_capacity(table.rules.len() * 8);
    for rule in &table.rules {
        put(&mut rules, &[rule.symbol as u32, rule.body]);
    }

    let mut ops = Vec::with_capacity(table.ops.len() * 12);
    for op in &table.ops {
        put(&mut ops, &op.to_record());
    }

    let mut edges = Vec::with_capacity(table.edges.len() * 4);
    put(&mut edges, &table.edges);

    let mut literals = Vec::with_capacity(table.literals.len() * 8);
    for literal in &table.literals {
        put(&mut literals, &pool.add(literal));
    }

    let mut lex_states = Vec::with_capacity(table.lex_states.len() * 16);
    for state in &table.lex_states {
        put(&mut lex_states, &state.to_record());
    }

    let mut class_ranges = Vec::with_capacity(table.class_ranges.len() * 8);
    for (lo, hi) in &table.class_ranges {
        put(&mut class_ranges, &[*lo, *hi]);
    }

    let mut patterns = Vec::with_capacity(table.patterns.len() * 12);
    for pattern in &table.patterns {
        let [off, len] = pool.add(pattern.name.as_bytes());
        put(&mut patterns, &[off, len, pattern.start]);
    }

    let sections = [
        pool.bytes,
        symbols,
        fields,
        rules,
        ops,
        edges,
        literals,
        lex_states,
        class_ranges,
        patterns,
    ];

    let mut out = Vec::with_capacity(HEADER_LEN + sections.iter().map(Vec::len).sum::<usize>());
    out.extend_from_slice(&TABLE_MAGIC);
    put(&mut out, &[table.version]);
    put(&mut out, &name);
    put(
        &mut out,
        &[
            table.symbols.len() as u32,
            table.fields.len() as u32,
            table.rules.len() as u32,
            table.ops.len() as u32,
            table.edges.len() as u32,
            table.literals.len() as u32,
            table.lex_states.len() as u32,
            table.class_ranges.len() as u32,
            table.patterns.len() as u32,
        ],
    );
    put(
        &mut out,
        &[
            sections[0].len() as u32,
            table.start_rule,
            table.recovery.unwrap_or(NO_PATTERN),
        ],
    );

    let mut offset = HEADER_LEN as u32;
    for section in &sections {
        put(&mut out, &[offset]);
        offset += section.len() as u32;
    }
    debug_assert_eq!(out.len(), HEADER_LEN);

    for section in &sections {
        out.extend_from_slice(section);
    }
    out
}
