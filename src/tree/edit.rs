//! Text edits recorded against a tree

/// One replacement of `start_byte..old_end_byte` by text ending at
/// `new_end_byte`.
///
/// Offsets are in the coordinates of the text as it stood after every edit
/// recorded before this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEdit {
    pub start_byte: usize,
    pub old_end_byte: usize,
    pub new_end_byte: usize,
}

impl InputEdit {
    pub fn new(start_byte: usize, old_end_byte: usize, new_end_byte: usize) -> Self {
        Self {
            start_byte,
            old_end_byte: old_end_byte.max(start_byte),
            new_end_byte: new_end_byte.max(start_byte),
        }
    }

    /// Insert `len` bytes at `at`
    pub fn insert(at: usize, len: usize) -> Self {
        Self::new(at, at, at + len)
    }

    /// Delete `start..end`
    pub fn delete(start: usize, end: usize) -> Self {
        Self::new(start, end, start)
    }

    /// Replace `start..end` with `len` bytes
    pub fn replace(start: usize, end: usize, len: usize) -> Self {
        Self::new(start, end, start + len)
    }

    pub fn is_insertion(&self) -> bool {
        self.old_end_byte == self.start_byte
    }

    /// Whether a node that started at `start` and inspected bytes up to
    /// (excluding) `lookahead` may parse differently after this edit.
    pub(crate) fn affects(&self, start: usize, lookahead: usize) -> bool {
        if self.is_insertion() {
            start < self.start_byte && self.start_byte < lookahead
        } else {
            self.start_byte < lookahead && self.old_end_byte > start
        }
    }

    /// Map an offset at or after `old_end_byte` into the edited text
    pub(crate) fn shift(&self, offset: usize) -> usize {
        offset - self.old_end_byte + self.new_end_byte
    }

    /// Map an unaffected `start..lookahead` span; spans before the edit stay
    /// put.
    pub(crate) fn map(&self, start: usize, end: usize, lookahead: usize) -> (usize, usize, usize) {
        if start >= self.old_end_byte {
            (self.shift(start), self.shift(end), self.shift(lookahead))
        } else {
            (start, end, lookahead)
        }
    }
}
