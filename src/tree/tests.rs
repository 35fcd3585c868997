use super::*;
use crate::Parser;
use crate::grammar::Grammar;

const CALLS: &str = r#"
@grammar calls;
@start source_file;
@recover /\n/;

source_file = (call /\n/?)*;
call = name: ident "(" (args: ident ("," args: ident)*)? ")";
ident = /[a-z]+/;
"#;

fn calls() -> Language {
    let table = Grammar::parse(CALLS).unwrap().to_table().unwrap();
    Language::from_table(table)
}

fn parse(text: &str) -> SyntaxTree {
    let mut parser = Parser::new();
    parser.set_language(&calls()).unwrap();
    parser.parse(text, None).unwrap()
}

#[test]
fn test_root_spans_the_input() {
    let tree = parse("f(a,b)\ng()");
    let root = tree.root_node();
    assert_eq!(root.kind(), "source_file");
    assert_eq!(root.byte_range(), 0..10);
    assert!(root.parent().is_none());
    assert_eq!(root.child_count(), 2);
    assert!(!tree.has_error());
}

#[test]
fn test_children_and_fields() {
    let tree = parse("f(a,b)\ng()");
    let call = tree.root_node().child(0).unwrap();
    assert_eq!(call.kind(), "call");
    assert_eq!(call.byte_range(), 0..6);

    let kinds: Vec<_> = call.children().map(|child| child.kind()).collect();
    assert_eq!(kinds, ["ident", "(", "ident", ",", "ident", ")"]);
    assert_eq!(call.named_child_count(), 3);
    assert!(!call.child(1).unwrap().is_named());

    let name = call.child_by_field_name("name").unwrap();
    assert_eq!(name.text(), "f");
    assert_eq!(name.field_name(), Some("name"));

    let args: Vec<_> = call
        .children_by_field_name("args")
        .map(|arg| arg.text().into_owned())
        .collect();
    assert_eq!(args, ["a", "b"]);

    assert!(call.child_by_field_name("missing").is_none());
    assert!(call.child(1).unwrap().field_name().is_none());
}

#[test]
fn test_siblings() {
    let tree = parse("f(a,b)");
    let call = tree.root_node().child(0).unwrap();
    let open = call.child(1).unwrap();
    assert_eq!(open.prev_sibling().unwrap().kind(), "ident");
    assert_eq!(open.next_sibling().unwrap().text(), "a");
    assert!(call.child(0).unwrap().prev_sibling().is_none());
    assert!(call.child(5).unwrap().next_sibling().is_none());
    assert_eq!(open.parent().unwrap(), call);
}

#[test]
fn test_descendants_pre_order() {
    let tree = parse("f(a,b)\ng()");
    let kinds: Vec<_> = tree.root_node().descendants().map(|node| node.kind()).collect();
    assert_eq!(
        kinds,
        [
            "source_file",
            "call",
            "ident",
            "(",
            "ident",
            ",",
            "ident",
            ")",
            "call",
            "ident",
            "(",
            ")"
        ]
    );
}

#[test]
fn test_descendant_for_byte_range() {
    let tree = parse("f(a,b)\ng()");
    let root = tree.root_node();
    let arg = root.descendant_for_byte_range(2, 3).unwrap();
    assert_eq!(arg.kind(), "ident");
    assert_eq!(arg.text(), "a");

    let call = root.descendant_for_byte_range(1, 4).unwrap();
    assert_eq!(call.kind(), "call");

    // the newline belongs to no call
    assert_eq!(root.descendant_for_byte_range(6, 7).unwrap(), root);
    assert!(root.descendant_for_byte_range(3, 20).is_none());
}

#[test]
fn test_positions() {
    let tree = parse("f(a,b)\ng()");
    let second = tree.root_node().child(1).unwrap();
    assert_eq!(second.start_position(), LineCol::new(1, 0));
    assert_eq!(second.end_position(), LineCol::new(1, 3));
    assert_eq!(
        second.text_range(),
        text_size::TextRange::new(TextSize::new(7), TextSize::new(10))
    );
}

#[test]
fn test_to_sexp_lists_named_nodes_with_fields() {
    let tree = parse("f(a,b)\ng()");
    assert_eq!(
        tree.root_node().to_sexp(),
        "(source_file (call name: (ident) args: (ident) args: (ident)) (call name: (ident)))"
    );
    assert_eq!(format!("{:?}", tree.root_node().child(1).unwrap()), "call@7..10");
}

#[test]
fn test_error_nodes_mark_ancestors() {
    let tree = parse("f(a\ng()");
    let root = tree.root_node();
    assert!(tree.has_error());
    assert!(root.has_error());

    let error = root.child(0).unwrap();
    assert!(error.is_error());
    assert_eq!(error.kind(), "ERROR");
    assert_eq!(error.byte_range(), 0..4);
    assert!(!root.child(1).unwrap().has_error());
    assert_eq!(tree.errors().len(), 1);
}

#[test]
fn test_text_of_invalid_utf8() {
    let mut parser = Parser::new();
    parser.set_language(&calls()).unwrap();
    let tree = parser.parse(b"\xFF(a)", None).unwrap();
    let error = tree.root_node().child(0).unwrap();
    assert!(error.is_error());
    assert!(error.utf8_text().is_err());
    assert_eq!(error.text(), "\u{FFFD}(a)");
}

#[test]
fn test_equal_parses_compare_equal() {
    let first = parse("f(a)\n");
    let mut second = parse("f(a)\n");
    assert_eq!(first, second);

    second.edit(&InputEdit::insert(0, 1));
    assert_eq!(second.edits().len(), 1);
    assert_eq!(first, second, "recorded edits do not change the content");
    assert_ne!(first, parse("f(b)\n"));
}

#[test]
fn test_node_identity() {
    let tree = parse("f(a)");
    let a = tree.root_node().child(0).unwrap();
    let b = tree.root_node().child(0).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, tree.root_node());

    let mut seen = std::collections::HashSet::new();
    seen.insert(a);
    assert!(seen.contains(&b));
}

#[test]
fn test_deeply_nested_tree_renders() {
    let table = Grammar::parse(
        r#"@grammar nest; @start source_file; source_file = item*; item = "[" item* "]";"#,
    )
    .unwrap()
    .to_table()
    .unwrap();
    let mut parser = Parser::new();
    parser.set_language(&Language::from_table(table)).unwrap();

    let depth = 20_000;
    let text = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
    let tree = parser.parse(&text, None).unwrap();
    assert!(!tree.has_error());

    let sexp = tree.root_node().to_sexp();
    assert!(sexp.starts_with("(source_file (item (item"));
    assert!(sexp.ends_with(")))"));
    assert_eq!(sexp.matches("(item").count(), depth);
    assert!(format!("{tree:?}").contains("source_file"));
}
