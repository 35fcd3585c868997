use rstest::rstest;

use super::*;
use crate::grammar::Grammar;

/// A table whose only rule is the given pattern
fn pattern_table(pattern: &str) -> TableData {
    let source = format!("@grammar t; @start a; a = /{pattern}/;");
    Grammar::parse(&source).unwrap().to_table().unwrap()
}

fn scan(pattern: &str, input: &str, pos: usize) -> Scan {
    let table = pattern_table(pattern);
    let start = table.patterns[0].start;
    Scanner::default().scan(&table, start, input.as_bytes(), pos)
}

#[rstest]
#[case::longest_match(r"[a-z]+", "abc def", 0, Some(3), 4)]
#[case::offset_start(r"[a-z]+", "abc def", 4, Some(7), 8)]
#[case::no_match(r"[0-9]+", "abc", 0, None, 1)]
#[case::optional_tail(r"-?[0-9]+(\.[0-9]+)?", "-12.5x", 0, Some(5), 6)]
#[case::backtracks_to_last_accept(r"[0-9]+(\.[0-9]+)?", "12.x", 0, Some(2), 4)]
#[case::alternation(r"true|false", "false ", 0, Some(5), 5)]
#[case::zero_width(r"a*", "bbb", 0, Some(0), 1)]
#[case::reads_end_of_input(r"[a-z]+", "abc", 0, Some(3), 4)]
#[case::dot_stops_at_newline(r".*", "ab\ncd", 0, Some(2), 3)]
#[case::multibyte(r"[^ ]+", "§a b", 0, Some(3), 4)]
#[case::counted(r"[0-9]{2,3}", "12345", 0, Some(3), 3)]
fn test_scan(
    #[case] pattern: &str,
    #[case] input: &str,
    #[case] pos: usize,
    #[case] end: Option<usize>,
    #[case] examined: usize,
) {
    assert_eq!(scan(pattern, input, pos), Scan { end, examined });
}

#[test]
fn test_invalid_utf8_matches_no_class() {
    let table = pattern_table(r"[^ ]+");
    let start = table.patterns[0].start;
    let input = b"ab\xFF\xFEcd";
    let result = Scanner::default().scan(&table, start, input, 0);
    assert_eq!(result.end, Some(2));
    assert!(result.examined > 2 && result.examined <= input.len() + 1);
}

#[test]
fn test_scanner_is_reusable_across_tables() {
    let mut scanner = Scanner::default();
    let small = pattern_table("a");
    let large = pattern_table("(a|b|c|d)+x");
    assert_eq!(
        scanner.scan(&small, small.patterns[0].start, b"a", 0).end,
        Some(1)
    );
    assert_eq!(
        scanner.scan(&large, large.patterns[0].start, b"abcdx", 0).end,
        Some(5)
    );
    assert_eq!(
        scanner.scan(&small, small.patterns[0].start, b"b", 0).end,
        None
    );
}

#[rstest]
#[case::full(b"say", b"say hi", 0, Some(3), 3)]
#[case::mismatch(b"say", b"sat", 0, None, 3)]
#[case::first_byte(b"say", b"xay", 0, None, 1)]
#[case::end_of_input(b"say", b"sa", 0, None, 3)]
#[case::at_offset(b"hi", b"say hi", 4, Some(6), 6)]
fn test_match_literal(
    #[case] literal: &[u8],
    #[case] input: &[u8],
    #[case] pos: usize,
    #[case] end: Option<usize>,
    #[case] examined: usize,
) {
    assert_eq!(match_literal(literal, input, pos), Scan { end, examined });
}

#[test]
fn test_decode_char() {
    assert_eq!(decode_char("é!".as_bytes()), Some(('é', 2)));
    assert_eq!(decode_char(b""), None);
    assert_eq!(decode_char(b"\xC3"), None);
}
