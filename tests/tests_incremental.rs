//! Incremental reparsing of mcfunction files

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::mcfunction_parser;
use mcfunction_syntax::{InputEdit, ParseOptions, Parser, SyntaxTree};
use rstest::rstest;

const FILE: &str = "\
# setup
scoreboard objectives add kills playerKillCount
execute as @a[tag=builder] run tp @s ~ ~1 ~
say hello
data merge entity @s {Tags:[\"a\",\"b\"]}
";

/// Apply `replacement` over `start..end`, record the edit on `old` and parse
/// the new text with and without the old tree.
fn reparse(old_text: &str, start: usize, end: usize, replacement: &str) -> (SyntaxTree, SyntaxTree) {
    let mut parser = mcfunction_parser();
    let mut old = parser.parse(old_text, None).unwrap();

    let new_text = format!("{}{}{}", &old_text[..start], replacement, &old_text[end..]);
    old.edit(&InputEdit::replace(start, end, replacement.len()));

    let incremental = parser.parse(&new_text, Some(&old)).unwrap();
    let fresh = parser.parse(&new_text, None).unwrap();
    (incremental, fresh)
}

#[test]
fn test_edit_in_one_line_reuses_the_others() {
    let start = FILE.find("hello").unwrap();
    let (incremental, fresh) = reparse(FILE, start, start + 5, "world");
    assert_eq!(incremental, fresh);
    assert!(!incremental.has_error());
    // the comment and the three commands around the edit
    assert!(incremental.reused_nodes() >= 4, "{}", incremental.reused_nodes());
}

#[test]
fn test_inserted_line_shifts_later_nodes() {
    let (incremental, fresh) = reparse(FILE, 0, 0, "say first\n");
    assert_eq!(incremental, fresh);
    assert!(incremental.reused_nodes() >= 4);

    let lines: Vec<_> = incremental
        .root_node()
        .named_children()
        .map(|node| node.start_position().line)
        .collect();
    assert_eq!(lines, [0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_edit_that_breaks_a_line() {
    let start = FILE.find("~1").unwrap();
    let (incremental, fresh) = reparse(FILE, start, start + 2, "~\"");
    assert_eq!(incremental, fresh);
    assert!(incremental.has_error());
    assert_eq!(incremental.errors().len(), 1);
}

#[test]
fn test_edit_that_repairs_a_line() {
    let broken = "say hi\nfrob x\nsay ho\n";
    let start = broken.find("frob").unwrap();
    let (incremental, fresh) = reparse(broken, start, start + 4, "kill");
    assert_eq!(incremental, fresh);
    assert!(!incremental.has_error());
}

#[test]
fn test_appending_reparses_the_last_line() {
    let text = "say a\nsay b";
    let (incremental, fresh) = reparse(text, text.len(), text.len(), " c");
    assert_eq!(incremental, fresh);
    // the first command; the last one read the end of input
    assert!(incremental.reused_nodes() >= 1);
    let last = incremental.root_node().child(1).unwrap();
    assert_eq!(last.text(), "say b c");
}

#[test]
fn test_several_edits_in_sequence() {
    let mut parser = mcfunction_parser();
    let mut old = parser.parse(FILE, None).unwrap();

    let mut text = FILE.to_string();
    for (needle, replacement) in [("kills", "deaths"), ("hello", "bye"), ("builder", "x")] {
        let start = text.find(needle).unwrap();
        let end = start + needle.len();
        text.replace_range(start..end, replacement);
        old.edit(&InputEdit::replace(start, end, replacement.len()));
    }

    let incremental = parser.parse(&text, Some(&old)).unwrap();
    assert_eq!(incremental, parser.parse(&text, None).unwrap());
    assert!(incremental.reused_nodes() > 0);
}

#[rstest]
#[case::reuse_off(ParseOptions { reuse_subtrees: false, memoize: true })]
#[case::nothing(ParseOptions { reuse_subtrees: false, memoize: false })]
fn test_options_without_reuse(#[case] options: ParseOptions) {
    let mut parser = Parser::with_options(options);
    parser.set_language(&helpers::MCFUNCTION).unwrap();
    assert_eq!(parser.options(), options);

    let mut old = parser.parse(FILE, None).unwrap();
    old.edit(&InputEdit::insert(0, 1));
    let text = format!("\n{FILE}");
    let tree = parser.parse(&text, Some(&old)).unwrap();
    assert_eq!(tree.reused_nodes(), 0);
    assert_eq!(tree, mcfunction_parser().parse(&text, None).unwrap());
}
