//! Pattern compiler
//!
//! Patterns are parsed by `regex-syntax` and the resulting HIR is lowered
//! into the character-class NFA stored in grammar tables. Anchors and
//! look-around are rejected, counted repetition is expanded.
//!
//! The automaton is built continuation first: each node is compiled knowing
//! the state that follows it, so no fragment patching is needed except for
//! the loops of `*` and `+`.

use regex_syntax::ParserBuilder;
use regex_syntax::hir::{Class, Hir, HirKind, Literal, Repetition};

use crate::table::LexState;

/// Largest bound accepted in `x{n}` and `x{n,m}`
const MAX_REPEAT: u32 = 64;

/// Lexer states and class ranges shared by every pattern of a grammar
#[derive(Debug, Default)]
pub(crate) struct Automata {
    pub states: Vec<LexState>,
    pub ranges: Vec<(u32, u32)>,
}

impl Automata {
    /// Compile `pattern` and return its entry state
    pub(crate) fn compile(&mut self, pattern: &str) -> Result<u32, String> {
        let node = parse(pattern)?;
        let accept = self.push(LexState::Match);
        Ok(self.lower(&node, accept))
    }

    fn push(&mut self, state: LexState) -> u32 {
        self.states.push(state);
        (self.states.len() - 1) as u32
    }

    fn lower(&mut self, node: &Node, next: u32) -> u32 {
        match node {
            Node::Empty => next,
            Node::Class(ranges) => {
                let first = self.ranges.len() as u32;
                self.ranges.extend_from_slice(ranges);
                self.push(LexState::Class {
                    first,
                    len: ranges.len() as u32,
                    next,
                })
            }
            Node::Concat(items) => items
                .iter()
                .rev()
                .fold(next, |next, item| self.lower(item, next)),
            Node::Alt(alternatives) => {
                let starts: Vec<u32> = alternatives
                    .iter()
                    .map(|alternative| self.lower(alternative, next))
                    .collect();
                let mut iter = starts.into_iter().rev();
                let last = iter.next().unwrap_or(next);
                iter.fold(last, |y, x| self.push(LexState::Split { x, y }))
            }
            Node::Optional(inner) => {
                let body = self.lower(inner, next);
                self.push(LexState::Split { x: body, y: next })
            }
            Node::Star(inner) => {
                let split = self.push(LexState::Split { x: next, y: next });
                let body = self.lower(inner, split);
                self.states[split as usize] = LexState::Split { x: body, y: next };
                split
            }
            Node::Plus(inner) => {
                let split = self.push(LexState::Split { x: next, y: next });
                let body = self.lower(inner, split);
                self.states[split as usize] = LexState::Split { x: body, y: next };
                body
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Empty,
    /// Sorted, merged scalar ranges
    Class(Vec<(u32, u32)>),
    Concat(Vec<Node>),
    Alt(Vec<Node>),
    Optional(Box<Node>),
    Star(Box<Node>),
    Plus(Box<Node>),
}

/// Parse `pattern` with regex-syntax and translate the result
fn parse(pattern: &str) -> Result<Node, String> {
    let hir = ParserBuilder::new()
        .build()
        .parse(pattern)
        .map_err(|error| error.to_string())?;
    translate(&hir)
}

fn translate(hir: &Hir) -> Result<Node, String> {
    Ok(match hir.kind() {
        HirKind::Empty => Node::Empty,
        HirKind::Literal(Literal(bytes)) => {
            let text = std::str::from_utf8(bytes).map_err(|error| error.to_string())?;
            let mut chars: Vec<Node> = text
                .chars()
                .map(|c| Node::Class(vec![(c as u32, c as u32)]))
                .collect();
            match chars.len() {
                0 => Node::Empty,
                1 => chars.remove(0),
                _ => Node::Concat(chars),
            }
        }
        HirKind::Class(Class::Unicode(class)) => Node::Class(
            class
                .ranges()
                .iter()
                .map(|range| (range.start() as u32, range.end() as u32))
                .collect(),
        ),
        HirKind::Class(Class::Bytes(_)) => {
            return Err("byte classes are not supported; keep Unicode mode on".to_string());
        }
        HirKind::Look(_) => {
            return Err("anchors and word boundaries are not supported".to_string());
        }
        HirKind::Capture(capture) => translate(&capture.sub)?,
        HirKind::Concat(items) => Node::Concat(items.iter().map(translate).collect::<Result<_, _>>()?),
        HirKind::Alternation(alternatives) => {
            Node::Alt(alternatives.iter().map(translate).collect::<Result<_, _>>()?)
        }
        HirKind::Repetition(repetition) => repeat(repetition)?,
    })
}

/// Expand `x{min,max}` into copies, optionals and loops
fn repeat(repetition: &Repetition) -> Result<Node, String> {
    let node = translate(&repetition.sub)?;
    let (min, max) = (repetition.min, repetition.max);
    if min > MAX_REPEAT || max.is_some_and(|max| max > MAX_REPEAT) {
        return Err(format!("counted repetition above {MAX_REPEAT} is not supported"));
    }
    Ok(match (min, max) {
        (0, None) => Node::Star(Box::new(node)),
        (0, Some(1)) => Node::Optional(Box::new(node)),
        (1, None) => Node::Plus(Box::new(node)),
        (_, None) => {
            let mut items = vec![node.clone(); min as usize - 1];
            items.push(Node::Plus(Box::new(node)));
            Node::Concat(items)
        }
        (_, Some(max)) => {
            let mut items = vec![node.clone(); min as usize];
            items.extend((min..max).map(|_| Node::Optional(Box::new(node.clone()))));
            Node::Concat(items)
        }
    })
}
