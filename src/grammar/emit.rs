//! Lowering a parsed grammar into table data
//!
//! Symbol ids are assigned as `ERROR`, then one symbol per rule in
//! definition order, then one anonymous symbol per distinct literal. Literal
//! `i` in the literal section is always symbol `1 + rules + i`.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::regex::Automata;
use super::{Expr, Grammar, GrammarError};
use crate::table::{
    ERROR_SYMBOL_NAME, LexState, Op, PatternInfo, RuleInfo, SymbolInfo, TABLE_VERSION,
    TableData,
};

type Result<T> = std::result::Result<T, GrammarError>;

pub(crate) fn emit(grammar: &Grammar) -> Result<TableData> {
    let mut rule_index = FxHashMap::default();
    for (index, rule) in grammar.rules.iter().enumerate() {
        if rule_index.insert(rule.name.as_str(), index as u32).is_some() {
            return Err(GrammarError::DuplicateRule(rule.name.clone()));
        }
    }
    let start_rule = *rule_index
        .get(grammar.start.as_str())
        .ok_or_else(|| GrammarError::UndefinedRule {
            rule: SmolStr::new_static("@start"),
            name: grammar.start.clone(),
        })?;

    let mut emitter = Emitter {
        rule_index,
        literal_base: grammar.rules.len() + 1,
        ops: Vec::new(),
        edges: Vec::new(),
        literals: IndexMap::new(),
        fields: IndexMap::new(),
        patterns: IndexMap::new(),
        automata: Automata::default(),
    };

    let mut rules = Vec::with_capacity(grammar.rules.len());
    for (index, rule) in grammar.rules.iter().enumerate() {
        let body = emitter.lower(&rule.name, &rule.body)?;
        rules.push(RuleInfo {
            symbol: (index + 1) as u16,
            body,
        });
    }
    let recovery = match &grammar.recover {
        Some(pattern) => Some(emitter.pattern(pattern)?),
        None => None,
    };

    let symbol_count = emitter.literal_base + emitter.literals.len();
    if symbol_count > u16::MAX as usize + 1 {
        return Err(GrammarError::TooMany("symbols"));
    }
    if emitter.fields.len() > u16::MAX as usize {
        return Err(GrammarError::TooMany("fields"));
    }

    let mut symbols = Vec::with_capacity(symbol_count);
    symbols.push(SymbolInfo {
        name: SmolStr::new_static(ERROR_SYMBOL_NAME),
        visible: true,
        named: true,
    });
    symbols.extend(grammar.rules.iter().map(|rule| SymbolInfo {
        name: rule.name.clone(),
        visible: !rule.name.starts_with('_'),
        named: true,
    }));
    symbols.extend(emitter.literals.keys().map(|literal| SymbolInfo {
        name: SmolStr::new(literal),
        visible: true,
        named: false,
    }));

    let table = TableData {
        version: TABLE_VERSION,
        name: grammar.name.clone(),
        symbols,
        fields: emitter.fields.into_keys().collect(),
        rules,
        ops: emitter.ops,
        edges: emitter.edges,
        literals: emitter
            .literals
            .into_keys()
            .map(|literal| literal.into_bytes().into_boxed_slice())
            .collect(),
        lex_states: emitter.automata.states,
        class_ranges: emitter.automata.ranges,
        patterns: emitter
            .patterns
            .into_iter()
            .map(|(source, start)| PatternInfo {
                name: SmolStr::new(format!("/{source}/")),
                start,
            })
            .collect(),
        start_rule,
        recovery,
    };

    if let Some(rule) = left_recursive_rule(&table) {
        return Err(GrammarError::LeftRecursion(grammar.rules[rule].name.clone()));
    }

    tracing::debug!(
        grammar = %table.name,
        rules = table.rules.len(),
        symbols = table.symbols.len(),
        ops = table.ops.len(),
        lex_states = table.lex_states.len(),
        "compiled grammar"
    );
    Ok(table)
}

struct Emitter<'g> {
    rule_index: FxHashMap<&'g str, u32>,
    literal_base: usize,
    ops: Vec<Op>,
    edges: Vec<u32>,
    literals: IndexMap<String, ()>,
    fields: IndexMap<SmolStr, ()>,
    /// Pattern source to entry state
    patterns: IndexMap<String, u32>,
    automata: Automata,
}

impl Emitter<'_> {
    fn push(&mut self, op: Op) -> u32 {
        self.ops.push(op);
        (self.ops.len() - 1) as u32
    }

    /// Lower an expression, returning the index of its op
    fn lower(&mut self, rule: &SmolStr, expr: &Expr) -> Result<u32> {
        let op = match expr {
            Expr::Literal(text) => {
                if text.is_empty() {
                    return Err(GrammarError::EmptyLiteral(rule.clone()));
                }
                let (index, _) = self.literals.insert_full(text.clone(), ());
                Op::Literal {
                    literal: index as u32,
                    // checked against the 16-bit limit once all literals are known
                    symbol: (self.literal_base + index).min(u16::MAX as usize) as u16,
                }
            }
            Expr::Pattern(source) => Op::Pattern {
                pattern: self.pattern(source)?,
            },
            Expr::Rule(name) => match self.rule_index.get(name.as_str()) {
                Some(&index) => Op::Rule { rule: index },
                None => {
                    return Err(GrammarError::UndefinedRule {
                        rule: rule.clone(),
                        name: name.clone(),
                    });
                }
            },
            Expr::Seq(items) => {
                let (first, len) = self.lower_all(rule, items.iter())?;
                Op::Seq { first, len }
            }
            Expr::Choice(alternatives) => {
                let (first, len) = if alternatives.iter().all(|a| matches!(a, Expr::Literal(_))) {
                    let mut sorted: Vec<&Expr> = alternatives.iter().collect();
                    // longest first, so "minecraft:" is tried before "m"
                    sorted.sort_by_key(|a| match a {
                        Expr::Literal(text) => std::cmp::Reverse(text.len()),
                        _ => std::cmp::Reverse(0),
                    });
                    self.lower_all(rule, sorted.into_iter())?
                } else {
                    self.lower_all(rule, alternatives.iter())?
                };
                Op::Choice { first, len }
            }
            Expr::Repeat(inner) => Op::Repeat {
                child: self.lower(rule, inner)?,
            },
            Expr::Repeat1(inner) => Op::Repeat1 {
                child: self.lower(rule, inner)?,
            },
            Expr::Optional(inner) => Op::Optional {
                child: self.lower(rule, inner)?,
            },
            Expr::Field(name, inner) => {
                let child = self.lower(rule, inner)?;
                let (index, _) = self.fields.insert_full(name.clone(), ());
                Op::Field {
                    field: index.min(u16::MAX as usize) as u16,
                    child,
                }
            }
            Expr::Token(inner) => Op::Token {
                child: self.lower(rule, inner)?,
            },
            Expr::Not(inner) => Op::Not {
                child: self.lower(rule, inner)?,
            },
            Expr::And(inner) => Op::And {
                child: self.lower(rule, inner)?,
            },
            Expr::End => Op::End,
        };
        Ok(self.push(op))
    }

    /// Lower children first, then lay their ops out as one edge run
    fn lower_all<'e>(
        &mut self,
        rule: &SmolStr,
        items: impl Iterator<Item = &'e Expr>,
    ) -> Result<(u32, u32)> {
        let children = items
            .map(|item| self.lower(rule, item))
            .collect::<Result<Vec<_>>>()?;
        let first = self.edges.len() as u32;
        self.edges.extend_from_slice(&children);
        Ok((first, children.len() as u32))
    }

    fn pattern(&mut self, source: &str) -> Result<u32> {
        if let Some(index) = self.patterns.get_index_of(source) {
            return Ok(index as u32);
        }
        let start = self
            .automata
            .compile(source)
            .map_err(|message| GrammarError::InvalidPattern {
                pattern: source.to_string(),
                message,
            })?;
        let (index, _) = self.patterns.insert_full(source.to_string(), start);
        Ok(index as u32)
    }
}

/// Find a rule that can call itself again before consuming any input.
///
/// Returns the rule closing the first such cycle in definition order.
fn left_recursive_rule(table: &TableData) -> Option<usize> {
    const UNSEEN: u8 = 0;
    const ACTIVE: u8 = 1;
    const DONE: u8 = 2;

    let nullable = nullable_rules(table);
    let calls: Vec<Vec<usize>> = table
        .rules
        .iter()
        .map(|rule| {
            let mut calls = Vec::new();
            leading_calls(table, &nullable, rule.body, &mut calls);
            calls
        })
        .collect();

    let mut state = vec![UNSEEN; calls.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for root in 0..calls.len() {
        if state[root] != UNSEEN {
            continue;
        }
        state[root] = ACTIVE;
        stack.push((root, 0));
        while let Some((rule, next)) = stack.pop() {
            let Some(&callee) = calls[rule].get(next) else {
                state[rule] = DONE;
                continue;
            };
            stack.push((rule, next + 1));
            match state[callee] {
                UNSEEN => {
                    state[callee] = ACTIVE;
                    stack.push((callee, 0));
                }
                ACTIVE => return Some(callee),
                _ => {}
            }
        }
    }
    None
}

/// Rules that can succeed without consuming input, solved to a fixpoint
fn nullable_rules(table: &TableData) -> Vec<bool> {
    let mut nullable = vec![false; table.rules.len()];
    loop {
        let mut changed = false;
        for (index, rule) in table.rules.iter().enumerate() {
            if !nullable[index] && op_nullable(table, &nullable, rule.body) {
                nullable[index] = true;
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn op_nullable(table: &TableData, nullable: &[bool], op: u32) -> bool {
    let children = |first: u32, len: u32| {
        table.edges[first as usize..(first + len) as usize]
            .iter()
            .map(|&child| op_nullable(table, nullable, child))
    };
    match table.ops[op as usize] {
        Op::Literal { .. } => false,
        Op::Pattern { pattern } => pattern_nullable(table, table.patterns[pattern as usize].start),
        Op::Rule { rule } => nullable[rule as usize],
        Op::Seq { first, len } => children(first, len).all(|n| n),
        Op::Choice { first, len } => children(first, len).any(|n| n),
        Op::Repeat { .. } | Op::Optional { .. } | Op::Not { .. } | Op::And { .. } | Op::End => {
            true
        }
        Op::Repeat1 { child } | Op::Field { child, .. } | Op::Token { child } => {
            op_nullable(table, nullable, child)
        }
    }
}

/// Whether the automaton reaches `Match` from `start` through empty moves only
fn pattern_nullable(table: &TableData, start: u32) -> bool {
    let mut seen = vec![false; table.lex_states.len()];
    let mut pending = vec![start];
    while let Some(state) = pending.pop() {
        if std::mem::replace(&mut seen[state as usize], true) {
            continue;
        }
        match table.lex_states[state as usize] {
            LexState::Match => return true,
            LexState::Split { x, y } => pending.extend([x, y]),
            LexState::Jump { next } => pending.push(next),
            LexState::Class { .. } => {}
        }
    }
    false
}

/// Collect the rules `op` may call at the position it starts at
fn leading_calls(table: &TableData, nullable: &[bool], op: u32, calls: &mut Vec<usize>) {
    match table.ops[op as usize] {
        Op::Rule { rule } => calls.push(rule as usize),
        Op::Seq { first, len } => {
            for &child in &table.edges[first as usize..(first + len) as usize] {
                leading_calls(table, nullable, child, calls);
                if !op_nullable(table, nullable, child) {
                    break;
                }
            }
        }
        Op::Choice { first, len } => {
            for &child in &table.edges[first as usize..(first + len) as usize] {
                leading_calls(table, nullable, child, calls);
            }
        }
        Op::Repeat { child }
        | Op::Repeat1 { child }
        | Op::Optional { child }
        | Op::Field { child, .. }
        | Op::Token { child }
        | Op::Not { child }
        | Op::And { child } => leading_calls(table, nullable, child, calls),
        Op::Literal { .. } | Op::Pattern { .. } | Op::End => {}
    }
}
