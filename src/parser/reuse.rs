//! Subtree reuse for incremental parsing
//!
//! Every error-free named node of the old tree is mapped through the recorded
//! edits. A node survives if no edit touches the bytes it inspected, from its
//! start up to its lookahead. Survivors are indexed by the rule that produced
//! them and their new start, which is exactly the question the engine asks
//! when it is about to invoke a rule.

use rustc_hash::FxHashMap;

use crate::language::Language;
use crate::table::ERROR_SYMBOL;
use crate::tree::SyntaxTree;

/// An old node that may stand in for a rule invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Candidate {
    /// Node index in the old tree
    pub id: u32,
    /// Offset to add to old positions
    pub delta: i64,
    pub end: usize,
    pub lookahead: usize,
}

#[derive(Debug, Default)]
pub(crate) struct ReuseIndex {
    candidates: FxHashMap<(u32, u32), Candidate>,
}

impl ReuseIndex {
    pub(crate) fn new(old: &SyntaxTree, language: &Language) -> Self {
        let mut candidates = FxHashMap::default();
        // the root is never requested through a rule call
        for (id, node) in old.nodes.iter().enumerate().skip(1) {
            if node.has_error || node.kind == ERROR_SYMBOL {
                continue;
            }
            let Some(rule) = language.rule_for_symbol(node.kind) else {
                continue;
            };

            let mut span = (
                node.start as usize,
                node.end as usize,
                old.lookahead[id] as usize,
            );
            let mut touched = false;
            for edit in old.edits() {
                if edit.affects(span.0, span.2) {
                    touched = true;
                    break;
                }
                span = edit.map(span.0, span.1, span.2);
            }
            if touched {
                continue;
            }

            // breadth-first order keeps the outermost node for a start
            candidates
                .entry((rule, span.0 as u32))
                .or_insert(Candidate {
                    id: id as u32,
                    delta: span.0 as i64 - node.start as i64,
                    end: span.1,
                    lookahead: span.2,
                });
        }
        Self { candidates }
    }

    pub(crate) fn get(&self, rule: u32, pos: usize) -> Option<Candidate> {
        self.candidates.get(&(rule, pos as u32)).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// Length of the old tree's source after its recorded edits, or `None` if an
/// edit reaches past the text it applies to.
pub(crate) fn edited_len(old: &SyntaxTree) -> Option<usize> {
    old.edits().iter().try_fold(old.source().len(), |len, edit| {
        (edit.old_end_byte <= len).then(|| len - edit.old_end_byte + edit.new_end_byte)
    })
}
