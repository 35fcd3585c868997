//! The parse engine
//!
//! The rule graph of a grammar table is interpreted by an explicit frame
//! stack. Entering an op either settles it at once (terminals, memo hits,
//! reused subtrees) or pushes a frame and enters a child; a child's outcome
//! is handed back to the frame on top of the stack.
//!
//! Nodes are collected while parsing in an append-only scratch arena. The
//! entries produced so far sit on the `pending` stack; a frame remembers the
//! stack height it started at, so backtracking is a truncate. When a visible
//! rule succeeds its pending entries become the children of a new scratch
//! node. Hidden rules leave their entries in place for the parent.
//!
//! Every rule result records how far its terminals looked (`examined`), which
//! is stored as the node's lookahead and decides whether an old node can be
//! reused after an edit.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::ParseOptions;
use super::reuse::ReuseIndex;
use crate::errors::SyntaxError;
use crate::language::{FieldId, KindId, Language};
use crate::lexer::{Scanner, decode_char, match_literal};
use crate::table::{ERROR_SYMBOL, Op, TableData};
use crate::tree::{NO_PARENT, NodeData, SyntaxTree};

/// A node produced during the current parse or taken from the old tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeRef {
    Fresh(u32),
    Reused { id: u32, delta: i64 },
}

/// A pending child and its field label
type Entry = (NodeRef, Option<FieldId>);

#[derive(Debug, Clone, Copy)]
struct Scratch {
    kind: KindId,
    start: u32,
    end: u32,
    lookahead: u32,
    /// Children in `child_refs`
    first: u32,
    len: u32,
}

#[derive(Debug, Clone, Copy)]
enum Memo {
    /// Left recursion guard
    InProgress,
    Failed {
        examined: usize,
    },
    Success {
        end: usize,
        examined: usize,
        /// Produced entries in `memo_store`
        first: u32,
        len: u32,
    },
}

/// `(rule, position, mode)`
type MemoKey = (u32, u32, u8);

#[derive(Debug, Clone, Copy)]
enum Frame {
    Seq {
        first: u32,
        len: u32,
        index: u32,
        start: usize,
        mark: usize,
    },
    Choice {
        first: u32,
        len: u32,
        index: u32,
        start: usize,
        mark: usize,
    },
    Repeat {
        child: u32,
        min: u32,
        count: u32,
        /// Start of the current iteration
        start: usize,
        mark: usize,
    },
    Optional {
        start: usize,
        mark: usize,
    },
    Field {
        field: FieldId,
        mark: usize,
    },
    Token {
        build: bool,
    },
    Lookahead {
        negative: bool,
        start: usize,
        mark: usize,
        build: bool,
        quiet: bool,
    },
    Rule {
        rule: u32,
        start: usize,
        mark: usize,
        /// Examined register of the caller
        examined: usize,
        key: MemoKey,
    },
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Enter(u32),
    Return(bool),
}

/// Buffers kept across parses
#[derive(Debug, Default)]
pub(crate) struct Engine {
    scanner: Scanner,
    frames: Vec<Frame>,
    pending: Vec<Entry>,
    memo: FxHashMap<MemoKey, Memo>,
    memo_store: Vec<Entry>,
    scratch: Vec<Scratch>,
    child_refs: Vec<Entry>,
}

impl Engine {
    fn reset(&mut self) {
        self.frames.clear();
        self.pending.clear();
        self.memo.clear();
        self.memo_store.clear();
        self.scratch.clear();
        self.child_refs.clear();
    }

    /// Parse `input` into a tree. Never fails: syntax errors become `ERROR`
    /// nodes.
    pub(crate) fn parse(
        &mut self,
        language: &Language,
        input: &[u8],
        old: Option<&SyntaxTree>,
        options: ParseOptions,
    ) -> SyntaxTree {
        self.reset();
        let table = language.table();
        let reuse = old.map(|old| ReuseIndex::new(old, language));
        if let Some(reuse) = &reuse {
            tracing::trace!(candidates = reuse.len(), "indexed reusable subtrees");
        }

        let mut run = Run {
            table,
            input,
            reuse: reuse.as_ref(),
            memoize: options.memoize,
            buf: self,
            pos: 0,
            build: true,
            quiet: false,
            diagnostic: false,
            examined: 0,
            furthest: 0,
            expected: BTreeSet::new(),
            reused: 0,
        };
        let errors = run.parse_root();
        let reused = run.reused;

        let (nodes, lookahead) = self.build_tree(table, input.len(), old);
        let tree = SyntaxTree::new(
            nodes,
            lookahead,
            input.to_vec(),
            language.clone(),
            errors,
            reused,
        );
        tracing::debug!(
            grammar = %language.name(),
            bytes = input.len(),
            nodes = tree.node_count(),
            errors = tree.errors().len(),
            reused,
            "parsed"
        );
        tree
    }

    /// Lay the scratch arena out breadth-first from the root, expanding
    /// reused subtrees from the old tree.
    fn build_tree(
        &self,
        table: &TableData,
        len: usize,
        old: Option<&SyntaxTree>,
    ) -> (Vec<NodeData>, Vec<u32>) {
        #[derive(Clone, Copy)]
        enum Source {
            /// Children in `child_refs`, or in `pending` for the root
            Fresh { first: u32, len: u32 },
            Old { id: u32, delta: i64 },
        }

        let root_kind = table.rules[table.start_rule as usize].symbol;
        let mut nodes = vec![NodeData {
            kind: root_kind,
            field: None,
            start: 0,
            end: len as u32,
            parent: NO_PARENT,
            first_child: 0,
            child_count: 0,
            has_error: false,
        }];
        let mut lookahead = vec![len as u32 + 1];
        let mut sources = vec![Source::Fresh {
            first: 0,
            len: self.pending.len() as u32,
        }];

        let shift = |offset: u32, delta: i64| (offset as i64 + delta) as u32;
        let mut index = 0;
        while index < nodes.len() {
            let parent = index as u32;
            let first_child = nodes.len() as u32;
            match sources[index] {
                Source::Fresh { first, len } => {
                    let entries = if index == 0 {
                        &self.pending[..]
                    } else {
                        &self.child_refs[first as usize..(first + len) as usize]
                    };
                    for &(node, field) in entries {
                        match node {
                            NodeRef::Fresh(id) => {
                                let scratch = self.scratch[id as usize];
                                nodes.push(NodeData {
                                    kind: scratch.kind,
                                    field,
                                    start: scratch.start,
                                    end: scratch.end,
                                    parent,
                                    first_child: 0,
                                    child_count: 0,
                                    has_error: false,
                                });
                                lookahead.push(scratch.lookahead);
                                sources.push(Source::Fresh {
                                    first: scratch.first,
                                    len: scratch.len,
                                });
                            }
                            NodeRef::Reused { id, delta } => {
                                if let Some(old) = old {
                                    let data = old.node(id);
                                    nodes.push(NodeData {
                                        kind: data.kind,
                                        field,
                                        start: shift(data.start, delta),
                                        end: shift(data.end, delta),
                                        parent,
                                        first_child: 0,
                                        child_count: 0,
                                        has_error: false,
                                    });
                                    lookahead.push(shift(old.lookahead[id as usize], delta));
                                    sources.push(Source::Old { id, delta });
                                }
                            }
                        }
                    }
                }
                Source::Old { id, delta } => {
                    if let Some(old) = old {
                        let data = old.node(id);
                        for child in data.first_child..data.first_child + data.child_count {
                            let child_data = old.node(child);
                            nodes.push(NodeData {
                                start: shift(child_data.start, delta),
                                end: shift(child_data.end, delta),
                                parent,
                                first_child: 0,
                                child_count: 0,
                                has_error: false,
                                ..*child_data
                            });
                            lookahead.push(shift(old.lookahead[child as usize], delta));
                            sources.push(Source::Old { id: child, delta });
                        }
                    }
                }
            }
            nodes[index].first_child = first_child;
            nodes[index].child_count = nodes.len() as u32 - first_child;
            index += 1;
        }

        for node in &mut nodes {
            node.has_error = node.kind == ERROR_SYMBOL;
        }
        for index in (1..nodes.len()).rev() {
            if nodes[index].has_error {
                let parent = nodes[index].parent as usize;
                nodes[parent].has_error = true;
            }
        }
        (nodes, lookahead)
    }
}

/// State of one parse
struct Run<'a> {
    table: &'a TableData,
    input: &'a [u8],
    reuse: Option<&'a ReuseIndex>,
    memoize: bool,
    buf: &'a mut Engine,
    pos: usize,
    /// Create nodes; off inside tokens and lookahead
    build: bool,
    /// Do not record expectations; on inside lookahead
    quiet: bool,
    /// Collecting expectations for a diagnostic
    diagnostic: bool,
    /// Exclusive end of the bytes inspected by the current rule so far
    examined: usize,
    furthest: usize,
    expected: BTreeSet<SmolStr>,
    reused: usize,
}

impl Run<'_> {
    // =========================================================================
    // Root and recovery
    // =========================================================================

    /// Parse the whole input, leaving the root's children in `pending`
    fn parse_root(&mut self) -> Vec<SyntaxError> {
        let len = self.input.len();
        let body = self.table.rules[self.table.start_rule as usize].body;
        let mut errors = Vec::new();

        match self.table.ops[body as usize] {
            Op::Repeat { child } => self.parse_items(child, 0, &mut errors),
            Op::Repeat1 { child } => self.parse_items(child, 1, &mut errors),
            _ => match self.run(body, 0) {
                Some(end) if end == len => {}
                Some(end) => self.push_error(body, 0, end, len, &mut errors),
                None => {
                    self.buf.pending.clear();
                    self.push_error(body, 0, 0, len, &mut errors);
                }
            },
        }
        errors
    }

    /// Parse the items of a repeated start rule, skipping to the recovery
    /// pattern after each item that fails.
    fn parse_items(&mut self, child: u32, min: usize, errors: &mut Vec<SyntaxError>) {
        let len = self.input.len();
        let mut pos = 0;
        let mut items = 0;
        while pos < len {
            let mark = self.buf.pending.len();
            if let Some(end) = self.run(child, pos) {
                if end > pos {
                    pos = end;
                    items += 1;
                    continue;
                }
            }
            self.buf.pending.truncate(mark);

            let resume = self.recovery_point(pos);
            tracing::trace!(start = pos, end = resume, "recovered from syntax error");
            self.push_error(child, pos, pos, resume, errors);
            pos = resume;
        }
        if items < min && errors.is_empty() {
            self.push_error(child, 0, 0, 0, errors);
        }
    }

    /// End of the first recovery pattern match that moves past `pos`
    fn recovery_point(&mut self, pos: usize) -> usize {
        let len = self.input.len();
        let Some(pattern) = self.table.recovery else {
            return len;
        };
        let start = self.table.patterns[pattern as usize].start;
        for at in pos..len {
            // continuation bytes never start a character
            if self.input[at] & 0xC0 == 0x80 {
                continue;
            }
            let scan = self.buf.scanner.scan(self.table, start, self.input, at);
            if let Some(end) = scan.end {
                if end > pos {
                    return end;
                }
            }
        }
        len
    }

    /// Append an `ERROR` node for `start..end` to the root, merging it with
    /// an error that ends at `start`.
    fn push_error(
        &mut self,
        op: u32,
        attempt: usize,
        start: usize,
        end: usize,
        errors: &mut Vec<SyntaxError>,
    ) {
        if let Some(&(NodeRef::Fresh(id), _)) = self.buf.pending.last() {
            let node = &mut self.buf.scratch[id as usize];
            if node.kind == ERROR_SYMBOL && node.end as usize == start {
                node.end = end as u32;
                node.lookahead = end as u32;
                if let Some(last) = errors.last_mut() {
                    last.range = TextRange::new(last.range.start(), TextSize::new(end as u32));
                }
                return;
            }
        }

        let range = TextRange::new(TextSize::new(start as u32), TextSize::new(end as u32));
        errors.push(self.diagnose(op, attempt, range));
        let mark = self.buf.pending.len();
        self.push_node(ERROR_SYMBOL, start, end, end, mark);
    }

    /// Run `op` again from `pos` collecting the terminals expected where it
    /// got furthest.
    ///
    /// The rerun uses a fresh memo table and no reuse, so the diagnostic
    /// depends only on the text.
    fn diagnose(&mut self, op: u32, pos: usize, range: TextRange) -> SyntaxError {
        let memo = std::mem::take(&mut self.buf.memo);
        let saved = (self.build, self.quiet, self.examined);
        self.build = false;
        self.quiet = false;
        self.diagnostic = true;
        self.furthest = pos;
        self.expected.clear();

        self.run(op, pos);

        (self.build, self.quiet, self.examined) = saved;
        self.diagnostic = false;
        self.buf.memo = memo;

        let expected: Vec<SmolStr> = std::mem::take(&mut self.expected).into_iter().collect();
        let found = self.found_at(self.furthest);
        SyntaxError::unexpected(
            range,
            TextSize::new(self.furthest as u32),
            expected,
            found.as_deref(),
        )
    }

    fn found_at(&self, offset: usize) -> Option<String> {
        let rest = self.input.get(offset..).filter(|rest| !rest.is_empty())?;
        Some(match decode_char(rest) {
            Some((c, _)) => c.to_string(),
            None => format!("\\x{:02X}", rest[0]),
        })
    }

    // =========================================================================
    // The machine
    // =========================================================================

    /// Match `op` at `pos`, returning the end on success
    fn run(&mut self, op: u32, pos: usize) -> Option<usize> {
        self.pos = pos;
        let mut step = Step::Enter(op);
        loop {
            step = match step {
                Step::Enter(op) => self.enter(op),
                Step::Return(ok) => match self.buf.frames.pop() {
                    Some(frame) => self.resume(frame, ok),
                    None => return ok.then_some(self.pos),
                },
            };
        }
    }

    fn enter(&mut self, op: u32) -> Step {
        let table = self.table;
        let pos = self.pos;
        let mark = self.buf.pending.len();
        match table.ops[op as usize] {
            Op::Literal { literal, symbol } => {
                let scan = match_literal(&table.literals[literal as usize], self.input, pos);
                self.touch(scan.examined);
                match scan.end {
                    Some(end) => {
                        if self.build {
                            self.push_node(symbol, pos, end, end, mark);
                        }
                        self.pos = end;
                        Step::Return(true)
                    }
                    None => {
                        self.expect(pos, || {
                            let name = &table.symbols[symbol as usize].name;
                            SmolStr::new(format!("{:?}", name.as_str()))
                        });
                        Step::Return(false)
                    }
                }
            }
            Op::Pattern { pattern } => {
                let info = &table.patterns[pattern as usize];
                let scan = self.buf.scanner.scan(table, info.start, self.input, pos);
                self.touch(scan.examined);
                match scan.end {
                    Some(end) => {
                        self.pos = end;
                        Step::Return(true)
                    }
                    None => {
                        self.expect(pos, || info.name.clone());
                        Step::Return(false)
                    }
                }
            }
            Op::End => {
                // reading the end of input counts as one byte past it
                self.touch(pos + 1);
                if pos >= self.input.len() {
                    Step::Return(true)
                } else {
                    self.expect(pos, || SmolStr::new_static("end of input"));
                    Step::Return(false)
                }
            }
            Op::Seq { first, len } => {
                if len == 0 {
                    return Step::Return(true);
                }
                self.buf.frames.push(Frame::Seq {
                    first,
                    len,
                    index: 0,
                    start: pos,
                    mark,
                });
                Step::Enter(table.edges[first as usize])
            }
            Op::Choice { first, len } => {
                if len == 0 {
                    return Step::Return(false);
                }
                self.buf.frames.push(Frame::Choice {
                    first,
                    len,
                    index: 0,
                    start: pos,
                    mark,
                });
                Step::Enter(table.edges[first as usize])
            }
            Op::Repeat { child } | Op::Repeat1 { child } => {
                let min = u32::from(matches!(table.ops[op as usize], Op::Repeat1 { .. }));
                self.buf.frames.push(Frame::Repeat {
                    child,
                    min,
                    count: 0,
                    start: pos,
                    mark,
                });
                Step::Enter(child)
            }
            Op::Optional { child } => {
                self.buf.frames.push(Frame::Optional { start: pos, mark });
                Step::Enter(child)
            }
            Op::Rule { rule } => self.enter_rule(rule),
            Op::Field { field, child } => {
                self.buf.frames.push(Frame::Field { field, mark });
                Step::Enter(child)
            }
            Op::Token { child } => {
                self.buf.frames.push(Frame::Token { build: self.build });
                self.build = false;
                Step::Enter(child)
            }
            Op::Not { child } | Op::And { child } => {
                self.buf.frames.push(Frame::Lookahead {
                    negative: matches!(table.ops[op as usize], Op::Not { .. }),
                    start: pos,
                    mark,
                    build: self.build,
                    quiet: self.quiet,
                });
                self.build = false;
                self.quiet = true;
                Step::Enter(child)
            }
        }
    }

    fn enter_rule(&mut self, rule: u32) -> Step {
        let pos = self.pos;
        let info = self.table.rules[rule as usize];

        if self.build && self.table.symbols[info.symbol as usize].visible {
            if let Some(candidate) = self.reuse.and_then(|reuse| reuse.get(rule, pos)) {
                if candidate.end <= self.input.len() {
                    self.buf.pending.push((
                        NodeRef::Reused {
                            id: candidate.id,
                            delta: candidate.delta,
                        },
                        None,
                    ));
                    self.pos = candidate.end;
                    self.touch(candidate.lookahead);
                    self.reused += 1;
                    return Step::Return(true);
                }
            }
        }

        let key = (rule, pos as u32, self.mode());
        match self.buf.memo.get(&key).copied() {
            Some(Memo::InProgress) => return Step::Return(false),
            Some(Memo::Failed { examined }) => {
                self.touch(examined);
                return Step::Return(false);
            }
            Some(Memo::Success {
                end,
                examined,
                first,
                len,
            }) => {
                let buf = &mut *self.buf;
                buf.pending
                    .extend_from_slice(&buf.memo_store[first as usize..(first + len) as usize]);
                self.pos = end;
                self.touch(examined);
                return Step::Return(true);
            }
            None => {}
        }

        self.buf.memo.insert(key, Memo::InProgress);
        self.buf.frames.push(Frame::Rule {
            rule,
            start: pos,
            mark: self.buf.pending.len(),
            examined: self.examined,
            key,
        });
        self.examined = pos;
        Step::Enter(info.body)
    }

    fn resume(&mut self, frame: Frame, ok: bool) -> Step {
        match frame {
            Frame::Seq {
                first,
                len,
                index,
                start,
                mark,
            } => {
                if !ok {
                    self.backtrack(start, mark);
                    return Step::Return(false);
                }
                let index = index + 1;
                if index == len {
                    return Step::Return(true);
                }
                self.buf.frames.push(Frame::Seq {
                    first,
                    len,
                    index,
                    start,
                    mark,
                });
                Step::Enter(self.table.edges[(first + index) as usize])
            }
            Frame::Choice {
                first,
                len,
                index,
                start,
                mark,
            } => {
                if ok {
                    return Step::Return(true);
                }
                self.backtrack(start, mark);
                let index = index + 1;
                if index == len {
                    return Step::Return(false);
                }
                self.buf.frames.push(Frame::Choice {
                    first,
                    len,
                    index,
                    start,
                    mark,
                });
                Step::Enter(self.table.edges[(first + index) as usize])
            }
            Frame::Repeat {
                child,
                min,
                count,
                start,
                mark,
            } => {
                if !ok {
                    self.backtrack(start, mark);
                    return Step::Return(count >= min);
                }
                // a zero-width iteration would repeat forever
                if self.pos == start {
                    return Step::Return(true);
                }
                self.buf.frames.push(Frame::Repeat {
                    child,
                    min,
                    count: count.saturating_add(1),
                    start: self.pos,
                    mark: self.buf.pending.len(),
                });
                Step::Enter(child)
            }
            Frame::Optional { start, mark } => {
                if !ok {
                    self.backtrack(start, mark);
                }
                Step::Return(true)
            }
            Frame::Field { field, mark } => {
                if ok {
                    for entry in &mut self.buf.pending[mark..] {
                        entry.1.get_or_insert(field);
                    }
                }
                Step::Return(ok)
            }
            Frame::Token { build } => {
                self.build = build;
                Step::Return(ok)
            }
            Frame::Lookahead {
                negative,
                start,
                mark,
                build,
                quiet,
            } => {
                self.build = build;
                self.quiet = quiet;
                self.backtrack(start, mark);
                Step::Return(ok != negative)
            }
            Frame::Rule {
                rule,
                start,
                mark,
                examined,
                key,
            } => self.finish_rule(rule, start, mark, examined, key, ok),
        }
    }

    fn finish_rule(
        &mut self,
        rule: u32,
        start: usize,
        mark: usize,
        caller_examined: usize,
        key: MemoKey,
        ok: bool,
    ) -> Step {
        let examined = self.examined.max(self.pos);
        self.examined = caller_examined.max(examined);

        if !ok {
            self.backtrack(start, mark);
            if self.memoize {
                self.buf.memo.insert(key, Memo::Failed { examined });
            } else {
                self.buf.memo.remove(&key);
            }
            return Step::Return(false);
        }

        let symbol = self.table.rules[rule as usize].symbol;
        if self.build && self.table.symbols[symbol as usize].visible {
            self.push_node(symbol, start, self.pos, examined, mark);
        }

        if self.memoize {
            let buf = &mut *self.buf;
            let first = buf.memo_store.len() as u32;
            buf.memo_store.extend_from_slice(&buf.pending[mark..]);
            let len = buf.memo_store.len() as u32 - first;
            buf.memo.insert(
                key,
                Memo::Success {
                    end: self.pos,
                    examined,
                    first,
                    len,
                },
            );
        } else {
            self.buf.memo.remove(&key);
        }
        Step::Return(true)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn mode(&self) -> u8 {
        u8::from(self.build) | (u8::from(self.quiet) << 1)
    }

    fn touch(&mut self, examined: usize) {
        self.examined = self.examined.max(examined);
    }

    fn backtrack(&mut self, pos: usize, mark: usize) {
        self.pos = pos;
        self.buf.pending.truncate(mark);
    }

    fn expect(&mut self, pos: usize, name: impl FnOnce() -> SmolStr) {
        if !self.diagnostic || self.quiet || pos < self.furthest {
            return;
        }
        if pos > self.furthest {
            self.furthest = pos;
            self.expected.clear();
        }
        self.expected.insert(name());
    }

    /// Turn `pending[mark..]` into the children of a new node
    fn push_node(&mut self, kind: KindId, start: usize, end: usize, lookahead: usize, mark: usize) {
        let buf = &mut *self.buf;
        let first = buf.child_refs.len() as u32;
        buf.child_refs.extend_from_slice(&buf.pending[mark..]);
        let len = buf.child_refs.len() as u32 - first;
        buf.pending.truncate(mark);

        let id = buf.scratch.len() as u32;
        buf.scratch.push(Scratch {
            kind,
            start: start as u32,
            end: end as u32,
            lookahead: lookahead.max(end) as u32,
            first,
            len,
        });
        buf.pending.push((NodeRef::Fresh(id), None));
    }
}
