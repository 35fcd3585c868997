use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use text_size::{TextRange, TextSize};

use super::{NO_PARENT, NodeData, SyntaxTree};
use crate::base::LineCol;
use crate::language::KindId;
use crate::table::ERROR_SYMBOL;

/// A node in a [`SyntaxTree`]
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    index: u32,
}

impl<'t> SyntaxNode<'t> {
    pub(crate) fn new(tree: &'t SyntaxTree, index: u32) -> Self {
        Self { tree, index }
    }

    fn data(&self) -> &'t NodeData {
        self.tree.node(self.index)
    }

    fn at(&self, index: u32) -> Self {
        Self::new(self.tree, index)
    }

    // =========================================================================
    // Kind
    // =========================================================================

    /// Kind name: the rule name for named nodes, the literal for anonymous ones
    pub fn kind(&self) -> &'t str {
        self.tree
            .language()
            .node_kind_for_id(self.data().kind)
            .unwrap_or_default()
    }

    pub fn kind_id(&self) -> KindId {
        self.data().kind
    }

    pub fn is_named(&self) -> bool {
        self.tree.language().node_kind_is_named(self.data().kind)
    }

    pub fn is_error(&self) -> bool {
        self.data().kind == ERROR_SYMBOL
    }

    /// Whether this node or any descendant is an error
    pub fn has_error(&self) -> bool {
        self.data().has_error
    }

    // =========================================================================
    // Position
    // =========================================================================

    pub fn start_byte(&self) -> usize {
        self.data().start as usize
    }

    pub fn end_byte(&self) -> usize {
        self.data().end as usize
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte()..self.end_byte()
    }

    pub fn text_range(&self) -> TextRange {
        TextRange::new(TextSize::new(self.data().start), TextSize::new(self.data().end))
    }

    pub fn start_position(&self) -> LineCol {
        self.tree.line_col(TextSize::new(self.data().start))
    }

    pub fn end_position(&self) -> LineCol {
        self.tree.line_col(TextSize::new(self.data().end))
    }

    // =========================================================================
    // Children
    // =========================================================================

    pub fn child_count(&self) -> usize {
        self.data().child_count as usize
    }

    pub fn child(&self, i: usize) -> Option<Self> {
        let data = self.data();
        (i < data.child_count as usize).then(|| self.at(data.first_child + i as u32))
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = SyntaxNode<'t>> + use<'t> {
        let tree = self.tree;
        let data = self.data();
        (data.first_child..data.first_child + data.child_count).map(move |i| Self::new(tree, i))
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn named_child(&self, i: usize) -> Option<Self> {
        self.named_children().nth(i)
    }

    pub fn named_children(&self) -> impl Iterator<Item = SyntaxNode<'t>> + use<'t> {
        self.children().filter(|child| child.is_named())
    }

    /// First child labelled with the field `name`
    pub fn child_by_field_name(&self, name: &str) -> Option<Self> {
        self.children_by_field_name(name).next()
    }

    pub fn children_by_field_name(&self, name: &str) -> impl Iterator<Item = SyntaxNode<'t>> + use<'t> {
        let field = self.tree.language().field_id_for_name(name);
        self.children()
            .filter(move |child| field.is_some() && child.data().field == field)
    }

    /// Field label of this node within its parent
    pub fn field_name(&self) -> Option<&'t str> {
        let field = self.data().field?;
        self.tree.language().field_name_for_id(field)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn parent(&self) -> Option<Self> {
        let parent = self.data().parent;
        (parent != NO_PARENT).then(|| self.at(parent))
    }

    pub fn next_sibling(&self) -> Option<Self> {
        let parent = self.parent()?.data();
        let next = self.index + 1;
        (next < parent.first_child + parent.child_count).then(|| self.at(next))
    }

    pub fn prev_sibling(&self) -> Option<Self> {
        let parent = self.parent()?.data();
        (self.index > parent.first_child).then(|| self.at(self.index - 1))
    }

    /// This node and everything below it, in pre-order
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: vec![self.index],
        }
    }

    /// Smallest node that spans `start..end`
    pub fn descendant_for_byte_range(&self, start: usize, end: usize) -> Option<Self> {
        if start < self.start_byte() || end > self.end_byte() || start > end {
            return None;
        }
        let mut node = *self;
        'descend: loop {
            for child in node.children() {
                let range = child.byte_range();
                // an empty child only contains an empty range at its position
                if range.start <= start && end <= range.end && (range.start < range.end || start == end) {
                    node = child;
                    continue 'descend;
                }
            }
            return Some(node);
        }
    }

    // =========================================================================
    // Text
    // =========================================================================

    pub fn text(&self) -> Cow<'t, str> {
        String::from_utf8_lossy(self.bytes())
    }

    pub fn utf8_text(&self) -> Result<&'t str, std::str::Utf8Error> {
        std::str::from_utf8(self.bytes())
    }

    fn bytes(&self) -> &'t [u8] {
        &self.tree.source()[self.byte_range()]
    }

    /// Render named nodes as an S-expression, e.g.
    /// `(command name: (command_name) (argument))`
    pub fn to_sexp(&self) -> String {
        enum Step<'n> {
            Open(SyntaxNode<'n>, bool),
            Close,
        }

        let mut out = String::new();
        let mut stack = vec![Step::Open(*self, true)];
        while let Some(step) = stack.pop() {
            let (node, top) = match step {
                Step::Close => {
                    out.push(')');
                    continue;
                }
                Step::Open(node, top) => (node, top),
            };
            if !top {
                out.push(' ');
                if let Some(field) = node.field_name() {
                    out.push_str(field);
                    out.push_str(": ");
                }
            }
            out.push('(');
            out.push_str(node.kind());
            stack.push(Step::Close);
            stack.extend(
                node.children()
                    .rev()
                    .filter(|child| child.is_named())
                    .map(|child| Step::Open(child, false)),
            );
        }
        out
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.index == other.index
    }
}

impl Eq for SyntaxNode<'_> {}

impl Hash for SyntaxNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.tree, state);
        self.index.hash(state);
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.kind(), self.start_byte(), self.end_byte())
    }
}

/// Pre-order iterator over a subtree
#[derive(Debug, Clone)]
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<u32>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let data = self.tree.node(index);
        self.stack
            .extend((data.first_child..data.first_child + data.child_count).rev());
        Some(SyntaxNode::new(self.tree, index))
    }
}
