use rstest::rstest;

use super::*;
use crate::table::{self, Op};

const SAY: &str = r#"
@grammar say;
@start source_file;
@recover /\n/;
source_file = command*;
command = "say" " " "hello";
"#;

#[test]
fn test_parse_directives_and_rules() {
    let grammar = Grammar::parse(SAY).unwrap();
    assert_eq!(grammar.name, "say");
    assert_eq!(grammar.start, "source_file");
    assert_eq!(grammar.recover.as_deref(), Some(r"\n"));
    assert_eq!(
        grammar.rules[0].body,
        Expr::Repeat(Box::new(Expr::Rule("command".into())))
    );
    assert_eq!(
        grammar.rules[1].body,
        Expr::Seq(vec![
            Expr::Literal("say".into()),
            Expr::Literal(" ".into()),
            Expr::Literal("hello".into()),
        ])
    );
}

#[test]
fn test_fields_prefixes_and_groups() {
    let grammar = Grammar::parse(
        r#"@grammar g; @start a;
        a = key: b+ !"x" &@end ( "y" | ) @token(/z/) ();
        b = "b";"#,
    );
    // `( "y" | )` has an empty alternative, which is a syntax error
    assert!(matches!(grammar, Err(GrammarError::Syntax { .. })));

    let grammar = Grammar::parse(
        r#"@grammar g; @start a;
        a = key: b+ !"x" &@end ("y" | ()) @token(/z/);
        b = "b";"#,
    )
    .unwrap();
    assert_eq!(
        grammar.rules[0].body,
        Expr::Seq(vec![
            Expr::Field(
                "key".into(),
                Box::new(Expr::Repeat1(Box::new(Expr::Rule("b".into()))))
            ),
            Expr::Not(Box::new(Expr::Literal("x".into()))),
            Expr::And(Box::new(Expr::End)),
            Expr::Choice(vec![Expr::Literal("y".into()), Expr::Seq(vec![])]),
            Expr::Token(Box::new(Expr::Pattern("z".into()))),
        ])
    );
}

#[test]
fn test_string_escapes() {
    let grammar = Grammar::parse(r#"@grammar g; @start a; a = "\"\\\n\t";"#).unwrap();
    assert_eq!(grammar.rules[0].body, Expr::Literal("\"\\\n\t".into()));
}

#[test]
fn test_compile_produces_loadable_table() {
    let bytes = compile(SAY).unwrap();
    let table = table::decode(&bytes).unwrap();

    let names: Vec<&str> = table.symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["ERROR", "source_file", "command", "say", " ", "hello"]);
    assert!(table.symbols[1].named && table.symbols[1].visible);
    assert!(!table.symbols[3].named);
    assert_eq!(table.start_rule, 0);
    assert_eq!(table.recovery, Some(0));
    assert_eq!(table.patterns[0].name, "/\\n/");
}

#[test]
fn test_hidden_rules_are_invisible() {
    let table = Grammar::parse(r#"@grammar g; @start a; a = _b; _b = "b";"#)
        .unwrap()
        .to_table()
        .unwrap();
    assert!(table.symbols[1].visible);
    assert!(!table.symbols[2].visible);
}

#[test]
fn test_literal_choice_is_sorted_longest_first() {
    let table = Grammar::parse(r#"@grammar g; @start a; a = "m" | "minecraft:" | "mc" | "n";"#)
        .unwrap()
        .to_table()
        .unwrap();
    let body = table.ops[table.rules[0].body as usize];
    let Op::Choice { first, len } = body else {
        panic!("expected a choice, got {body:?}");
    };
    let order: Vec<&[u8]> = table.edges[first as usize..(first + len) as usize]
        .iter()
        .map(|&op| match table.ops[op as usize] {
            Op::Literal { literal, .. } => &*table.literals[literal as usize],
            other => panic!("expected a literal, got {other:?}"),
        })
        .collect();
    assert_eq!(order, [&b"minecraft:"[..], &b"mc"[..], &b"m"[..], &b"n"[..]]);
}

#[test]
fn test_literals_and_patterns_are_deduplicated() {
    let table = Grammar::parse(r#"@grammar g; @start a; a = "x" /y/ "x" /y/ b; b = "x";"#)
        .unwrap()
        .to_table()
        .unwrap();
    assert_eq!(table.literals.len(), 1);
    assert_eq!(table.patterns.len(), 1);
    assert_eq!(table.symbols.len(), 4);
}

#[test]
fn test_fields_are_numbered_in_order_of_use() {
    let table = Grammar::parse(r#"@grammar g; @start a; a = name: b value: b name: b; b = "b";"#)
        .unwrap()
        .to_table()
        .unwrap();
    assert_eq!(table.fields, ["name", "value"]);
}

#[rstest]
#[case::duplicate(
    r#"@grammar g; @start a; a = "a"; a = "b";"#,
    GrammarError::DuplicateRule("a".into())
)]
#[case::undefined(
    r#"@grammar g; @start a; a = b;"#,
    GrammarError::UndefinedRule { rule: "a".into(), name: "b".into() }
)]
#[case::undefined_start(
    r#"@grammar g; @start b; a = "a";"#,
    GrammarError::UndefinedRule { rule: "@start".into(), name: "b".into() }
)]
#[case::missing_grammar(r#"@start a; a = "a";"#, GrammarError::MissingDirective("grammar"))]
#[case::missing_start(r#"@grammar g; a = "a";"#, GrammarError::MissingDirective("start"))]
#[case::empty_literal(r#"@grammar g; @start a; a = "";"#, GrammarError::EmptyLiteral("a".into()))]
#[case::left_recursion(
    r#"@grammar g; @start a; a = a "x" | "x";"#,
    GrammarError::LeftRecursion("a".into())
)]
#[case::indirect_left_recursion(
    r#"@grammar g; @start a; a = b "x"; b = a | "y";"#,
    GrammarError::LeftRecursion("a".into())
)]
#[case::left_recursion_behind_optional(
    r#"@grammar g; @start a; a = "x"? a "y" | "z";"#,
    GrammarError::LeftRecursion("a".into())
)]
#[case::left_recursion_behind_nullable_pattern(
    r#"@grammar g; @start a; a = /x*/ a | "z";"#,
    GrammarError::LeftRecursion("a".into())
)]
fn test_grammar_errors(#[case] source: &str, #[case] expected: GrammarError) {
    assert_eq!(compile(source), Err(expected));
}

#[rstest]
#[case::right_recursion(r#"@grammar g; @start a; a = "x" a | "x";"#)]
#[case::recursion_after_input(r#"@grammar g; @start a; a = b a?; b = "y";"#)]
#[case::recursion_after_pattern(r#"@grammar g; @start a; a = /x+/ a | "z";"#)]
fn test_recursion_after_input_is_accepted(#[case] source: &str) {
    assert!(compile(source).is_ok(), "{source}");
}

#[test]
fn test_invalid_pattern_names_the_pattern() {
    let error = compile(r#"@grammar g; @start a; a = /^x/;"#).unwrap_err();
    match error {
        GrammarError::InvalidPattern { pattern, message } => {
            assert_eq!(pattern, "^x");
            assert!(message.contains("anchors"));
        }
        other => panic!("expected InvalidPattern, got {other:?}"),
    }
}

#[rstest]
#[case::missing_semicolon("@grammar g @start a;", 11)]
#[case::missing_body("@grammar g; @start a; a = ;", 26)]
#[case::stray_token("@grammar g; | ", 12)]
#[case::unclosed_group(r#"@grammar g; @start a; a = ("a";"#, 30)]
#[case::bad_escape(r#"@grammar g; @start a; a = "\q";"#, 27)]
fn test_syntax_error_offsets(#[case] source: &str, #[case] offset: usize) {
    match Grammar::parse(source) {
        Err(GrammarError::Syntax { offset: at, .. }) => assert_eq!(at, offset, "{source}"),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn test_syntax_error_message_names_the_token() {
    let error = Grammar::parse("@grammar g; @start a; a = \"a\" )").unwrap_err();
    assert_eq!(
        error.to_string(),
        "syntax error at offset 30: expected `;`, found `)`"
    );
}
