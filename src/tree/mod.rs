//! Concrete syntax trees
//!
//! A [`SyntaxTree`] owns its nodes in a flat arena laid out breadth-first
//! from the root, so the children of a node are contiguous and identical
//! parses produce identical arenas. [`SyntaxNode`] is a `Copy` view of one
//! node.

mod edit;
mod node;

pub use edit::InputEdit;
pub use node::{Descendants, SyntaxNode};

use std::fmt;

use text_size::TextSize;

use crate::base::{LineCol, LineIndex};
use crate::errors::SyntaxError;
use crate::language::{FieldId, KindId, Language};

/// Parent index of the root
pub(crate) const NO_PARENT: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeData {
    pub kind: KindId,
    /// Field label of this node within its parent
    pub field: Option<FieldId>,
    pub start: u32,
    pub end: u32,
    pub parent: u32,
    pub first_child: u32,
    pub child_count: u32,
    /// This node or a descendant is an error
    pub has_error: bool,
}

/// The result of a parse.
///
/// Trees are immutable apart from [`edit`](SyntaxTree::edit), which records
/// a change to the source so the tree can be handed to the next parse as
/// the old tree.
#[derive(Clone)]
pub struct SyntaxTree {
    pub(crate) nodes: Vec<NodeData>,
    /// Exclusive end of the bytes inspected while parsing each node
    pub(crate) lookahead: Vec<u32>,
    source: Vec<u8>,
    language: Language,
    errors: Vec<SyntaxError>,
    edits: Vec<InputEdit>,
    reused: usize,
    line_index: LineIndex,
}

impl SyntaxTree {
    pub(crate) fn new(
        nodes: Vec<NodeData>,
        lookahead: Vec<u32>,
        source: Vec<u8>,
        language: Language,
        errors: Vec<SyntaxError>,
        reused: usize,
    ) -> Self {
        let line_index = LineIndex::new(&source);
        Self {
            nodes,
            lookahead,
            source,
            language,
            errors,
            edits: Vec::new(),
            reused,
            line_index,
        }
    }

    pub fn root_node(&self) -> SyntaxNode<'_> {
        SyntaxNode::new(self, 0)
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// The source text this tree was parsed from
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// One diagnostic per error node, in source order
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    pub fn has_error(&self) -> bool {
        self.nodes.first().is_some_and(|root| root.has_error)
    }

    /// Record an edit to the source.
    ///
    /// The tree itself is left as it is. The next parse that receives this
    /// tree maps its nodes through the recorded edits and reuses those the
    /// edits did not touch.
    pub fn edit(&mut self, edit: &InputEdit) {
        self.edits.push(*edit);
    }

    /// Edits recorded since the tree was produced
    pub fn edits(&self) -> &[InputEdit] {
        &self.edits
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of subtrees taken over from the old tree
    pub fn reused_nodes(&self) -> usize {
        self.reused
    }

    /// Line and column of a byte offset
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        self.line_index.line_col(offset)
    }

    pub(crate) fn node(&self, index: u32) -> &NodeData {
        &self.nodes[index as usize]
    }
}

/// Trees compare by content: source, language, nodes and diagnostics.
impl PartialEq for SyntaxTree {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.nodes == other.nodes
            && self.errors == other.errors
            && self.language == other.language
    }
}

impl Eq for SyntaxTree {}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("language", &self.language.name())
            .field("root", &self.root_node().to_sexp())
            .field("errors", &self.errors)
            .finish()
    }
}

#[cfg(test)]
mod tests;
