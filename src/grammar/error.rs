//! Grammar compilation errors

use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised while compiling a grammar into a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// The grammar text is malformed.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Two rules share a name.
    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(SmolStr),

    /// A rule refers to a rule that does not exist.
    #[error("rule `{rule}` references undefined rule `{name}`")]
    UndefinedRule { rule: SmolStr, name: SmolStr },

    /// A required `@grammar` or `@start` directive is missing.
    #[error("missing @{0} directive")]
    MissingDirective(&'static str),

    /// A string literal matches nothing.
    #[error("empty literal in rule `{0}`")]
    EmptyLiteral(SmolStr),

    /// A pattern uses unsupported or malformed syntax.
    #[error("invalid pattern /{pattern}/: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A rule can reach itself again without consuming input.
    #[error("rule `{0}` is left recursive")]
    LeftRecursion(SmolStr),

    /// The grammar needs more node kinds or fields than the table can address.
    #[error("grammar defines too many {0}")]
    TooMany(&'static str),
}

impl GrammarError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }
}
