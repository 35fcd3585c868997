//! Table-driven lexing
//!
//! Terminals are matched where the rule graph asks for them, so there is no
//! token stream. Literals compare bytes; patterns run the character-class
//! NFA stored in the table as a Thompson simulation and take the longest
//! match.
//!
//! Both report how far they looked. A read of the end of input counts as one
//! byte past the end, so a terminal that saw the end is invalidated by an
//! append. Incremental reparsing relies on this.

use crate::table::{LexState, TableData};

/// Outcome of one terminal attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scan {
    /// End of the match, if any
    pub end: Option<usize>,
    /// Exclusive end of the bytes inspected
    pub examined: usize,
}

/// Decode the UTF-8 character at the start of `bytes`.
///
/// Returns `None` at end of input or on an invalid sequence.
pub(crate) fn decode_char(bytes: &[u8]) -> Option<(char, usize)> {
    let chunk = &bytes[..bytes.len().min(4)];
    let valid = match std::str::from_utf8(chunk) {
        Ok(text) => text,
        Err(error) => std::str::from_utf8(&chunk[..error.valid_up_to()]).ok()?,
    };
    valid.chars().next().map(|c| (c, c.len_utf8()))
}

/// Match a literal at `pos`
pub(crate) fn match_literal(literal: &[u8], input: &[u8], pos: usize) -> Scan {
    for (i, expected) in literal.iter().enumerate() {
        match input.get(pos + i) {
            Some(byte) if byte == expected => {}
            // a mismatch reads the byte, the end of input reads one past it
            _ => {
                return Scan {
                    end: None,
                    examined: pos + i + 1,
                };
            }
        }
    }
    Scan {
        end: Some(pos + literal.len()),
        examined: pos + literal.len(),
    }
}

/// Reusable buffers for pattern simulation
#[derive(Debug, Default)]
pub(crate) struct Scanner {
    current: Vec<u32>,
    next: Vec<u32>,
    stack: Vec<u32>,
    /// Generation stamp per state, to deduplicate without clearing
    seen: Vec<u32>,
    generation: u32,
}

impl Scanner {
    /// Run the pattern whose automaton starts at `start` from `pos`.
    pub(crate) fn scan(&mut self, table: &TableData, start: u32, input: &[u8], pos: usize) -> Scan {
        if self.seen.len() < table.lex_states.len() {
            self.seen.resize(table.lex_states.len(), 0);
        }

        self.current.clear();
        let mut matched = self.add_closure(table, start);
        let mut end = matched.then_some(pos);
        let mut at = pos;

        loop {
            if self.current.is_empty() {
                // the last character read killed every thread
                return Scan { end, examined: at };
            }
            let Some((c, width)) = decode_char(&input[at.min(input.len())..]) else {
                // an invalid sequence may have been read up to its fourth byte
                return Scan {
                    end,
                    examined: (at + 4).min(input.len() + 1),
                };
            };

            let code = c as u32;
            let mut current = std::mem::take(&mut self.current);
            self.next.clear();
            self.bump_generation();
            matched = false;
            for &state in &current {
                if let LexState::Class { first, len, next } = table.lex_states[state as usize] {
                    let ranges = &table.class_ranges[first as usize..(first + len) as usize];
                    if ranges.iter().any(|&(lo, hi)| lo <= code && code <= hi) {
                        matched |= self.add_closure_into_next(table, next);
                    }
                }
            }
            current.clear();
            self.current = std::mem::replace(&mut self.next, current);
            at += width;
            if matched {
                end = Some(at);
            }
        }
    }

    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.seen.iter_mut().for_each(|stamp| *stamp = 0);
            self.generation = 1;
        }
    }

    /// Seed `current` with the closure of `start`; returns whether it matches
    fn add_closure(&mut self, table: &TableData, start: u32) -> bool {
        self.bump_generation();
        let mut out = std::mem::take(&mut self.current);
        let matched = self.closure(table, start, &mut out);
        self.current = out;
        matched
    }

    fn add_closure_into_next(&mut self, table: &TableData, start: u32) -> bool {
        let mut out = std::mem::take(&mut self.next);
        let matched = self.closure(table, start, &mut out);
        self.next = out;
        matched
    }

    /// Follow epsilon edges from `start`, pushing class states into `out`
    fn closure(&mut self, table: &TableData, start: u32, out: &mut Vec<u32>) -> bool {
        let mut matched = false;
        self.stack.clear();
        self.stack.push(start);
        while let Some(state) = self.stack.pop() {
            let stamp = &mut self.seen[state as usize];
            if *stamp == self.generation {
                continue;
            }
            *stamp = self.generation;
            match table.lex_states[state as usize] {
                LexState::Class { .. } => out.push(state),
                LexState::Split { x, y } => {
                    // y first so x is explored first, keeping thread order stable
                    self.stack.push(y);
                    self.stack.push(x);
                }
                LexState::Jump { next } => self.stack.push(next),
                LexState::Match => matched = true,
            }
        }
        matched
    }
}

#[cfg(test)]
mod tests;
