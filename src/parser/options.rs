/// Options controlling how a [`Parser`](super::Parser) runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Take unchanged subtrees over from an edited old tree
    pub reuse_subtrees: bool,
    /// Cache rule results per position (packrat parsing)
    pub memoize: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            reuse_subtrees: true,
            memoize: true,
        }
    }
}

impl ParseOptions {
    /// Options that make every parse start from scratch
    pub fn from_scratch() -> Self {
        Self {
            reuse_subtrees: false,
            ..Self::default()
        }
    }
}
