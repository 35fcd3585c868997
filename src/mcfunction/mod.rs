//! The bundled mcfunction grammar
//!
//! Minecraft function files: one command per line, `#` comments, `#!`
//! headers, `$` macro lines and `\` line continuations. The grammar text
//! ships with the crate and is compiled on request.
//!
//! ```text
//! execute as @a[tag=builder] run tp @s ~ ~1 ~
//! ```
//!
//! parses into
//!
//! ```text
//! (source_file
//!   (execute_statement
//!     (subcommand_identifier)
//!     (selector key: (compound_identifier) value: (compound_value (word)))
//!     body: (command name: (command_identifier) (selector) (position) (position (integer)) (position))))
//! ```

use crate::errors::LanguageError;
use crate::grammar::{Grammar, GrammarError};
use crate::language::Language;

/// Grammar name recorded in the table
pub const NAME: &str = "mcfunction";

const SOURCE: &str = include_str!("../../grammars/mcfunction.grammar");

/// The grammar text
pub fn grammar_source() -> &'static str {
    SOURCE
}

/// Compile the grammar into table bytes, loadable with
/// [`Language::from_bytes`].
pub fn table() -> Result<Vec<u8>, GrammarError> {
    crate::grammar::compile(SOURCE)
}

/// Compile the grammar and load it.
///
/// Compilation takes a few milliseconds; embedders that parse many files
/// should load the language once and clone the handle.
pub fn language() -> Result<Language, LanguageError> {
    let table = Grammar::parse(SOURCE)?.to_table()?;
    Ok(Language::from_table(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_compiles() {
        let language = language().unwrap();
        assert_eq!(language.name(), NAME);
        assert!(language.is_compatible());
    }

    #[test]
    fn test_table_round_trips_through_bytes() {
        let bytes = table().unwrap();
        let loaded = Language::from_bytes(&bytes).unwrap();
        assert_eq!(loaded, language().unwrap());
    }

    #[test]
    fn test_node_kinds() {
        let language = language().unwrap();
        for name in [
            "source_file",
            "command",
            "execute_statement",
            "comment",
            "mime_comment",
            "selector",
            "nbt_compound",
            "resource",
            "macro",
        ] {
            let id = language.id_for_node_kind(name, true);
            assert!(id.is_some(), "missing kind {name}");
            assert!(language.node_kind_is_visible(id.unwrap()));
        }
        let hidden = language.id_for_node_kind("_argument", true).unwrap();
        assert!(!language.node_kind_is_visible(hidden));
        assert!(language.id_for_node_kind("execute", false).is_some());
    }

    #[test]
    fn test_fields() {
        let language = language().unwrap();
        for name in ["name", "body", "key", "value"] {
            assert!(language.field_id_for_name(name).is_some(), "missing field {name}");
        }
    }
}
