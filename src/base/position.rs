//! Line/column tracking for syntax nodes
//!
//! Converts byte offsets into 0-indexed line/column pairs. Columns count bytes,
//! like the offsets they are derived from.

use text_size::TextSize;

/// A position in source code (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

impl LineCol {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Start offsets of every line in a text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    /// Index the lines of `text`. Only `\n` starts a new line; a preceding
    /// `\r` stays at the end of its line.
    pub fn new(text: &[u8]) -> Self {
        let mut line_starts = vec![TextSize::new(0)];
        for (offset, byte) in text.iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(TextSize::new(offset as u32 + 1));
            }
        }
        Self {
            line_starts,
            len: TextSize::new(text.len() as u32),
        }
    }

    /// Number of lines (an empty text has one)
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert an offset to a line/column pair. Offsets past the end clamp
    /// to the end of the text.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1);
        let column = offset - self.line_starts[line];
        LineCol::new(line as u32, column.into())
    }

    /// Offset of the first byte of `line`, if the line exists
    pub fn line_start(&self, line: u32) -> Option<TextSize> {
        self.line_starts.get(line as usize).copied()
    }
}
