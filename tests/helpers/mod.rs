//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use mcfunction_syntax::{Language, Parser, SyntaxTree, mcfunction};
use once_cell::sync::Lazy;

/// The mcfunction language, compiled once per test binary
pub static MCFUNCTION: Lazy<Language> =
    Lazy::new(|| mcfunction::language().expect("bundled grammar compiles"));

/// Two-rule grammar: `source_file = (command /\n/?)*; command = "say" " " "hello";`
pub const SAY_HELLO: &str = r#"
@grammar say;
@start source_file;
@recover /\n/;

source_file = (command /\n/?)*;
command = "say" " " "hello";
"#;

pub fn mcfunction_parser() -> Parser {
    let mut parser = Parser::new();
    parser
        .set_language(&MCFUNCTION)
        .expect("mcfunction table is compatible");
    parser
}

pub fn parse(text: &str) -> SyntaxTree {
    mcfunction_parser()
        .parse(text, None)
        .expect("a language is set")
}

/// S-expression of the whole tree
pub fn sexp(text: &str) -> String {
    parse(text).root_node().to_sexp()
}

/// Panic with the diagnostics if `text` has syntax errors
pub fn assert_parses_cleanly(text: &str) {
    let tree = parse(text);
    assert!(
        !tree.has_error(),
        "unexpected errors in {text:?}: {:?}\n{}",
        tree.errors(),
        tree.root_node().to_sexp()
    );
}
