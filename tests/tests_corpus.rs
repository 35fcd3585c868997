//! Every file under `tests/corpus/` must parse without errors.

#[path = "helpers/mod.rs"]
mod helpers;

use std::path::Path;

use walkdir::WalkDir;

fn corpus_files() -> Vec<std::path::PathBuf> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/corpus");
    let mut files: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "mcfunction"))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

#[test]
fn test_corpus_is_not_empty() {
    assert!(corpus_files().len() >= 3);
}

#[test]
fn test_corpus_parses_cleanly() {
    let mut parser = helpers::mcfunction_parser();
    let mut failures = Vec::new();
    for path in corpus_files() {
        let source = std::fs::read(&path).unwrap();
        let tree = parser.parse(&source, None).unwrap();
        for error in tree.errors() {
            let at = tree.line_col(error.range.start());
            failures.push(format!("{}:{}: {error}", path.display(), at.line + 1));
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn test_corpus_trees_cover_every_line() {
    let mut parser = helpers::mcfunction_parser();
    for path in corpus_files() {
        let source = std::fs::read(&path).unwrap();
        let tree = parser.parse(&source, None).unwrap();
        let statements = tree
            .root_node()
            .named_children()
            .filter(|node| node.kind() != "macro_indicator")
            .count();
        let lines = source
            .split(|byte| *byte == b'\n')
            .filter(|line| line.iter().any(|byte| !byte.is_ascii_whitespace()))
            .count();
        // continuation lines belong to the statement above them
        assert!(statements <= lines, "{}", path.display());
        assert!(statements > 0, "{}", path.display());
    }
}
