//! Language handles
//!
//! A [`Language`] is a validated grammar table behind an `Arc`. Cloning is
//! cheap and the handle is shared read-only between parsers and threads.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::errors::LanguageError;
use crate::table::{self, MIN_COMPATIBLE_TABLE_VERSION, TABLE_VERSION, TableData};

/// Node kind id
pub type KindId = u16;

/// Field id
pub type FieldId = u16;

/// An immutable, loaded grammar.
#[derive(Clone)]
pub struct Language {
    inner: Arc<LanguageInner>,
}

struct LanguageInner {
    table: TableData,
    kinds_by_name: FxHashMap<(SmolStr, bool), KindId>,
    fields_by_name: FxHashMap<SmolStr, FieldId>,
    /// Rule that produces each visible named symbol, used for subtree reuse
    rule_for_symbol: FxHashMap<KindId, u32>,
}

impl Language {
    /// Load a language from grammar table bytes.
    ///
    /// The bytes are validated and copied; the caller may drop them afterwards.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LanguageError> {
        let table = table::decode(bytes).inspect_err(|error| {
            tracing::debug!(%error, "rejected grammar table");
        })?;
        Ok(Self::from_table(table))
    }

    pub(crate) fn from_table(table: TableData) -> Self {
        let mut kinds_by_name = FxHashMap::default();
        for (id, symbol) in table.symbols.iter().enumerate() {
            kinds_by_name
                .entry((symbol.name.clone(), symbol.named))
                .or_insert(id as KindId);
        }
        let fields_by_name = table
            .fields
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id as FieldId))
            .collect();
        let rule_for_symbol = table
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| table.symbols[rule.symbol as usize].visible)
            .map(|(index, rule)| (rule.symbol, index as u32))
            .collect();

        tracing::debug!(
            grammar = %table.name,
            version = table.version,
            symbols = table.symbols.len(),
            rules = table.rules.len(),
            "loaded grammar table"
        );

        Self {
            inner: Arc::new(LanguageInner {
                table,
                kinds_by_name,
                fields_by_name,
                rule_for_symbol,
            }),
        }
    }

    pub(crate) fn table(&self) -> &TableData {
        &self.inner.table
    }

    pub(crate) fn rule_for_symbol(&self, kind: KindId) -> Option<u32> {
        self.inner.rule_for_symbol.get(&kind).copied()
    }

    /// Table format version (the ABI tag)
    pub fn version(&self) -> u32 {
        self.inner.table.version
    }

    /// Check the version against the range this engine reads
    pub fn is_compatible(&self) -> bool {
        (MIN_COMPATIBLE_TABLE_VERSION..=TABLE_VERSION).contains(&self.version())
    }

    /// Grammar name, e.g. `mcfunction`
    pub fn name(&self) -> &str {
        &self.inner.table.name
    }

    pub fn node_kind_count(&self) -> usize {
        self.inner.table.symbols.len()
    }

    pub fn node_kind_for_id(&self, id: KindId) -> Option<&str> {
        self.inner
            .table
            .symbols
            .get(id as usize)
            .map(|symbol| symbol.name.as_str())
    }

    /// Look up a kind by name. Rules are named, literals are anonymous.
    pub fn id_for_node_kind(&self, name: &str, named: bool) -> Option<KindId> {
        self.inner
            .kinds_by_name
            .get(&(SmolStr::new(name), named))
            .copied()
    }

    pub fn node_kind_is_named(&self, id: KindId) -> bool {
        self.inner
            .table
            .symbols
            .get(id as usize)
            .is_some_and(|symbol| symbol.named)
    }

    /// Hidden kinds (rules whose name starts with `_`) never appear in trees
    pub fn node_kind_is_visible(&self, id: KindId) -> bool {
        self.inner
            .table
            .symbols
            .get(id as usize)
            .is_some_and(|symbol| symbol.visible)
    }

    pub fn field_count(&self) -> usize {
        self.inner.table.fields.len()
    }

    pub fn field_name_for_id(&self, id: FieldId) -> Option<&str> {
        self.inner.table.fields.get(id as usize).map(SmolStr::as_str)
    }

    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.inner.fields_by_name.get(name).copied()
    }

    /// Check whether two handles share the same loaded table
    pub fn same(&self, other: &Language) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.same(other) || self.inner.table == other.inner.table
    }
}

impl Eq for Language {}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name())
            .field("version", &self.version())
            .field("node_kinds", &self.node_kind_count())
            .field("fields", &self.field_count())
            .finish()
    }
}
