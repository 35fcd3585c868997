//! Embedding contract: load a table, bind it, parse

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::SAY_HELLO;
use mcfunction_syntax::{Language, Parser, TextSize, grammar, mcfunction};

fn say_hello() -> Parser {
    let language = Language::from_bytes(&grammar::compile(SAY_HELLO).unwrap()).unwrap();
    let mut parser = Parser::new();
    parser.set_language(&language).unwrap();
    parser
}

#[test]
fn test_mcfunction_smoke() {
    let language = mcfunction::language().unwrap();
    let mut parser = Parser::new();
    assert!(parser.set_language(&language).is_ok());
    let tree = parser.parse("say hello\n", None).unwrap();
    assert!(!tree.has_error());
}

#[test]
fn test_say_hello_tree() {
    let tree = say_hello().parse("say hello", None).unwrap();
    let root = tree.root_node();
    assert_eq!(root.kind(), "source_file");
    assert_eq!(root.byte_range(), 0..9);

    let command = root.child(0).unwrap();
    assert_eq!(command.kind(), "command");
    assert_eq!(command.byte_range(), 0..9);
    let leaves: Vec<_> = command.children().map(|leaf| leaf.kind()).collect();
    assert_eq!(leaves, ["say", " ", "hello"]);
    assert!(command.children().all(|leaf| !leaf.is_named()));
}

#[test]
fn test_say_without_argument() {
    let tree = say_hello().parse("say", None).unwrap();
    let error = tree.root_node().child(0).unwrap();
    assert!(error.is_error());
    assert_eq!(error.byte_range(), 0..3);

    assert_eq!(tree.errors().len(), 1);
    let diagnostic = &tree.errors()[0];
    assert_eq!(diagnostic.offset, TextSize::new(3));
    assert_eq!(diagnostic.to_string(), "0..3: expected \" \", found end of input");
}

#[test]
fn test_parser_is_reusable() {
    let mut parser = say_hello();
    for text in ["say hello", "oops", "say hello\nsay hello\n", ""] {
        let first = parser.parse(text, None).unwrap();
        let again = say_hello().parse(text, None).unwrap();
        assert_eq!(first, again, "{text:?}");
    }
}

#[test]
fn test_tree_keeps_source_and_language() {
    let mut parser = say_hello();
    let tree = parser.parse("say hello\n", None).unwrap();
    assert_eq!(tree.source(), b"say hello\n");
    assert_eq!(tree.language().name(), "say");
    assert_eq!(tree.node_count(), 5);
    assert_eq!(tree.line_col(TextSize::new(10)).line, 1);
}
