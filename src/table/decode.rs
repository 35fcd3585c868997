//! Reading and validating grammar tables
//!
//! Decoding is strict: every count, offset, and cross reference is checked
//! before a [`TableData`] is handed to the engine, so the engine can index
//! the tables without further checks.

use smol_str::SmolStr;

use super::format::{
    COUNTS_OFFSET, HEADER_LEN, MIN_COMPATIBLE_TABLE_VERSION, NO_PATTERN, POOL_LEN_OFFSET,
    RECOVERY_OFFSET, SECTIONS, SECTIONS_OFFSET, START_RULE_OFFSET, TABLE_MAGIC, TABLE_VERSION,
};
use super::{
    ERROR_SYMBOL, ERROR_SYMBOL_NAME, LexState, Op, PatternInfo, RuleInfo, SYMBOL_NAMED,
    SYMBOL_VISIBLE, SymbolInfo, TableData,
};
use crate::errors::LanguageError;

type Result<T> = std::result::Result<T, LanguageError>;

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

/// A validated section: `count` records of `stride` bytes at `offset`
struct Section<'a> {
    bytes: &'a [u8],
    stride: usize,
}

impl Section<'_> {
    fn len(&self) -> usize {
        self.bytes.len() / self.stride.max(1)
    }

    fn record<const N: usize>(&self, index: usize) -> [u32; N] {
        let base = index * self.stride;
        std::array::from_fn(|i| read_u32(self.bytes, base + i * 4))
    }
}

/// Decode and validate a grammar table.
pub(crate) fn decode(bytes: &[u8]) -> Result<TableData> {
    if bytes.len() < 8 {
        return Err(LanguageError::corrupt(format!(
            "table is {} bytes, too short for a header",
            bytes.len()
        )));
    }
    if bytes[..4] != TABLE_MAGIC {
        return Err(LanguageError::corrupt("bad magic number"));
    }
    let version = read_u32(bytes, 4);
    if !(MIN_COMPATIBLE_TABLE_VERSION..=TABLE_VERSION).contains(&version) {
        return Err(LanguageError::IncompatibleVersion {
            version,
            min: MIN_COMPATIBLE_TABLE_VERSION,
            max: TABLE_VERSION,
        });
    }
    if bytes.len() < HEADER_LEN {
        return Err(LanguageError::corrupt(format!(
            "table is {} bytes, header needs {HEADER_LEN}",
            bytes.len()
        )));
    }

    let counts: [usize; 9] =
        std::array::from_fn(|i| read_u32(bytes, COUNTS_OFFSET + i * 4) as usize);
    let pool_len = read_u32(bytes, POOL_LEN_OFFSET) as usize;
    let start_rule = read_u32(bytes, START_RULE_OFFSET);
    let recovery = read_u32(bytes, RECOVERY_OFFSET);

    let mut lengths = [0usize; 10];
    lengths[0] = pool_len;
    lengths[1..].copy_from_slice(&counts);

    let sections = read_sections(bytes, &lengths)?;
    let [pool, symbols, fields, rules, ops, edges, literals, lex_states, class_ranges, patterns] =
        sections;
    let pool = pool.bytes;

    let string = |what: &str, off: u32, len: u32| -> Result<SmolStr> {
        let (off, len) = (off as usize, len as usize);
        let data = off
            .checked_add(len)
            .and_then(|end| pool.get(off..end))
            .ok_or_else(|| LanguageError::corrupt(format!("{what} lies outside the string pool")))?;
        std::str::from_utf8(data)
            .map(SmolStr::new)
            .map_err(|_| LanguageError::corrupt(format!("{what} is not valid UTF-8")))
    };

    let name = string("grammar name", read_u32(bytes, 8), read_u32(bytes, 12))?;

    let symbols = (0..symbols.len())
        .map(|i| {
            let [off, len, flags] = symbols.record::<3>(i);
            if flags & !(SYMBOL_VISIBLE | SYMBOL_NAMED) != 0 {
                return Err(LanguageError::corrupt(format!(
                    "symbol {i} has unknown flags {flags:#x}"
                )));
            }
            Ok(SymbolInfo {
                name: string(&format!("name of symbol {i}"), off, len)?,
                visible: flags & SYMBOL_VISIBLE != 0,
                named: flags & SYMBOL_NAMED != 0,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    match symbols.get(ERROR_SYMBOL as usize) {
        Some(symbol) if symbol.name == ERROR_SYMBOL_NAME => {}
        _ => {
            return Err(LanguageError::corrupt(format!(
                "symbol {ERROR_SYMBOL} must be {ERROR_SYMBOL_NAME}"
            )));
        }
    }
    if symbols.len() > u16::MAX as usize + 1 {
        return Err(LanguageError::corrupt("too many symbols for 16-bit kind ids"));
    }

    let fields = (0..fields.len())
        .map(|i| {
            let [off, len] = fields.record::<2>(i);
            string(&format!("name of field {i}"), off, len)
        })
        .collect::<Result<Vec<_>>>()?;
    if fields.len() > u16::MAX as usize {
        return Err(LanguageError::corrupt("too many fields for 16-bit field ids"));
    }

    let literals = (0..literals.len())
        .map(|i| {
            let [off, len] = literals.record::<2>(i);
            let (off, len) = (off as usize, len as usize);
            let data = off
                .checked_add(len)
                .and_then(|end| pool.get(off..end))
                .ok_or_else(|| {
                    LanguageError::corrupt(format!("literal {i} lies outside the string pool"))
                })?;
            if data.is_empty() {
                return Err(LanguageError::corrupt(format!("literal {i} is empty")));
            }
            Ok(Box::from(data))
        })
        .collect::<Result<Vec<Box<[u8]>>>>()?;

    let edges: Vec<u32> = (0..edges.len()).map(|i| edges.record::<1>(i)[0]).collect();

    let class_ranges = (0..class_ranges.len())
        .map(|i| {
            let [lo, hi] = class_ranges.record::<2>(i);
            if char::from_u32(lo).is_none() || char::from_u32(hi).is_none() || lo > hi {
                return Err(LanguageError::corrupt(format!(
                    "class range {i} ({lo:#x}..={hi:#x}) is not an ordered scalar range"
                )));
            }
            Ok((lo, hi))
        })
        .collect::<Result<Vec<_>>>()?;

    let lex_states = (0..lex_states.len())
        .map(|i| {
            let [tag, a, b, c] = lex_states.record::<4>(i);
            Ok(match tag {
                LexState::CLASS => LexState::Class {
                    first: a,
                    len: b,
                    next: c,
                },
                LexState::SPLIT => LexState::Split { x: a, y: b },
                LexState::JUMP => LexState::Jump { next: a },
                LexState::MATCH => LexState::Match,
                _ => {
                    return Err(LanguageError::corrupt(format!(
                        "lexer state {i} has unknown tag {tag}"
                    )));
                }
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let patterns = (0..patterns.len())
        .map(|i| {
            let [off, len, start] = patterns.record::<3>(i);
            Ok(PatternInfo {
                name: string(&format!("name of pattern {i}"), off, len)?,
                start,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let rules = (0..rules.len())
        .map(|i| {
            let [symbol, body] = rules.record::<2>(i);
            if symbol as usize >= symbols.len() {
                return Err(LanguageError::corrupt(format!(
                    "rule {i} references missing symbol {symbol}"
                )));
            }
            Ok(RuleInfo {
                symbol: symbol as u16,
                body,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let ops = (0..ops.len())
        .map(|i| {
            let [tag, a, b] = ops.record::<3>(i);
            Ok(match tag {
                Op::LITERAL => {
                    if b as usize >= symbols.len() {
                        return Err(LanguageError::corrupt(format!(
                            "op {i} references missing symbol {b}"
                        )));
                    }
                    Op::Literal {
                        literal: a,
                        symbol: b as u16,
                    }
                }
                Op::PATTERN => Op::Pattern { pattern: a },
                Op::SEQ => Op::Seq { first: a, len: b },
                Op::CHOICE => Op::Choice { first: a, len: b },
                Op::REPEAT => Op::Repeat { child: a },
                Op::REPEAT1 => Op::Repeat1 { child: a },
                Op::OPTIONAL => Op::Optional { child: a },
                Op::RULE => Op::Rule { rule: a },
                Op::FIELD => {
                    if a as usize >= fields.len() {
                        return Err(LanguageError::corrupt(format!(
                            "op {i} references missing field {a}"
                        )));
                    }
                    Op::Field {
                        field: a as u16,
                        child: b,
                    }
                }
                Op::TOKEN => Op::Token { child: a },
                Op::NOT => Op::Not { child: a },
                Op::AND => Op::And { child: a },
                Op::END => Op::End,
                _ => {
                    return Err(LanguageError::corrupt(format!(
                        "op {i} has unknown tag {tag}"
                    )));
                }
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let table = TableData {
        version,
        name,
        symbols,
        fields,
        rules,
        ops,
        edges,
        literals,
        lex_states,
        class_ranges,
        patterns,
        start_rule,
        recovery: (recovery != NO_PATTERN).then_some(recovery),
    };
    validate_references(&table)?;
    Ok(table)
}

/// Reject op cycles that do not pass through a rule call.
fn check_op_cycles(table: &TableData) -> Result<()> {
    const UNSEEN: u8 = 0;
    const ACTIVE: u8 = 1;
    const DONE: u8 = 2;

    fn successors<'t>(edges: &'t [u32], op: &'t Op) -> &'t [u32] {
        match op {
            Op::Seq { first, len } | Op::Choice { first, len } => {
                let first = *first as usize;
                &edges[first..first + *len as usize]
            }
            Op::Repeat { child }
            | Op::Repeat1 { child }
            | Op::Optional { child }
            | Op::Field { child, .. }
            | Op::Token { child }
            | Op::Not { child }
            | Op::And { child } => std::slice::from_ref(child),
            Op::Literal { .. } | Op::Pattern { .. } | Op::Rule { .. } | Op::End => &[],
        }
    }

    let mut state = vec![UNSEEN; table.ops.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for root in 0..table.ops.len() {
        if state[root] != UNSEEN {
            continue;
        }
        state[root] = ACTIVE;
        stack.push((root, 0));
        while let Some((op, next)) = stack.pop() {
            let Some(&child) = successors(&table.edges, &table.ops[op]).get(next) else {
                state[op] = DONE;
                continue;
            };
            stack.push((op, next + 1));
            let child = child as usize;
            match state[child] {
                UNSEEN => {
                    state[child] = ACTIVE;
                    stack.push((child, 0));
                }
                ACTIVE => {
                    return Err(LanguageError::corrupt(format!(
                        "op {child} is part of a cycle without a rule call"
                    )));
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Locate the ten sections and check they fit the blob without overlapping.
fn read_sections<'a>(bytes: &'a [u8], lengths: &[usize; 10]) -> Result<[Section<'a>; 10]> {
    let mut spans = Vec::with_capacity(SECTIONS.len());
    for (index, ((what, stride), count)) in SECTIONS.iter().zip(lengths).enumerate() {
        let offset = read_u32(bytes, SECTIONS_OFFSET + index * 4) as usize;
        let size = count
            .checked_mul(*stride)
            .ok_or_else(|| LanguageError::corrupt(format!("{what} section size overflows")))?;
        let end = offset
            .checked_add(size)
            .filter(|end| offset >= HEADER_LEN && *end <= bytes.len())
            .ok_or_else(|| {
                LanguageError::corrupt(format!(
                    "{what} section ({count} records at offset {offset}) lies outside the table"
                ))
            })?;
        spans.push((offset, end, *what));
    }

    let mut ordered = spans.clone();
    ordered.sort_by_key(|(start, end, _)| (*start, *end));
    let mut reach: Option<(usize, &str)> = None;
    for &(start, end, what) in ordered.iter().filter(|(start, end, _)| start < end) {
        if let Some((max_end, owner)) = reach {
            if start < max_end {
                return Err(LanguageError::corrupt(format!(
                    "{owner} and {what} sections overlap"
                )));
            }
        }
        if reach.is_none_or(|(max_end, _)| end > max_end) {
            reach = Some((end, what));
        }
    }

    Ok(std::array::from_fn(|index| {
        let (start, end, _) = spans[index];
        Section {
            bytes: &bytes[start..end],
            stride: SECTIONS[index].1,
        }
    }))
}

fn validate_references(table: &TableData) -> Result<()> {
    let ops = table.ops.len();
    let check_op = |owner: &str, target: u32| -> Result<()> {
        if target as usize >= ops {
            return Err(LanguageError::corrupt(format!(
                "{owner} references missing op {target}"
            )));
        }
        Ok(())
    };

    for (i, rule) in table.rules.iter().enumerate() {
        check_op(&format!("rule {i}"), rule.body)?;
    }

    for &edge in &table.edges {
        check_op("edge", edge)?;
    }

    for (i, op) in table.ops.iter().enumerate() {
        let owner = format!("op {i}");
        match *op {
            Op::Literal { literal, .. } => {
                if literal as usize >= table.literals.len() {
                    return Err(LanguageError::corrupt(format!(
                        "{owner} references missing literal {literal}"
                    )));
                }
            }
            Op::Pattern { pattern } => {
                if pattern as usize >= table.patterns.len() {
                    return Err(LanguageError::corrupt(format!(
                        "{owner} references missing pattern {pattern}"
                    )));
                }
            }
            Op::Seq { first, len } | Op::Choice { first, len } => {
                let end = first as usize + len as usize;
                if end > table.edges.len() {
                    return Err(LanguageError::corrupt(format!(
                        "{owner} references edges {first}..{end} past the edge table"
                    )));
                }
            }
            Op::Rule { rule } => {
                if rule as usize >= table.rules.len() {
                    return Err(LanguageError::corrupt(format!(
                        "{owner} references missing rule {rule}"
                    )));
                }
            }
            Op::Repeat { child }
            | Op::Repeat1 { child }
            | Op::Optional { child }
            | Op::Field { child, .. }
            | Op::Token { child }
            | Op::Not { child }
            | Op::And { child } => check_op(&owner, child)?,
            Op::End => {}
        }
    }
    check_op_cycles(table)?;

    let states = table.lex_states.len();
    let check_state = |owner: &str, target: u32| -> Result<()> {
        if target as usize >= states {
            return Err(LanguageError::corrupt(format!(
                "{owner} references missing lexer state {target}"
            )));
        }
        Ok(())
    };
    for (i, state) in table.lex_states.iter().enumerate() {
        let owner = format!("lexer state {i}");
        match *state {
            LexState::Class { first, len, next } => {
                let end = first as usize + len as usize;
                if end > table.class_ranges.len() {
                    return Err(LanguageError::corrupt(format!(
                        "{owner} references class ranges {first}..{end} past the range table"
                    )));
                }
                check_state(&owner, next)?;
            }
            LexState::Split { x, y } => {
                check_state(&owner, x)?;
                check_state(&owner, y)?;
            }
            LexState::Jump { next } => check_state(&owner, next)?,
            LexState::Match => {}
        }
    }
    for (i, pattern) in table.patterns.iter().enumerate() {
        check_state(&format!("pattern {i}"), pattern.start)?;
    }

    if table.start_rule as usize >= table.rules.len() {
        return Err(LanguageError::corrupt(format!(
            "start rule {} does not exist",
            table.start_rule
        )));
    }
    if let Some(recovery) = table.recovery {
        if recovery as usize >= table.patterns.len() {
            return Err(LanguageError::corrupt(format!(
                "recovery pattern {recovery} does not exist"
            )));
        }
    }
    Ok(())
}
