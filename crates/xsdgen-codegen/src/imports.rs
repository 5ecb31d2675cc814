//! Import tracking for one generated module
//!
//! Every namespace the schema can refer to gets an alias up front, but an alias
//! only reaches the output once a resolved reference actually used it. The
//! built-in scalar library is registered like any other import.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

/// Preferred alias of the built-in scalar type library.
pub const BUILTIN_ALIAS: &str = "xsdt";

/// Import aliases of one module and which of them are used.
#[derive(Debug, Clone)]
pub struct ImportTable {
    /// alias -> Rust path, sorted so the rendered block is deterministic
    imports: BTreeMap<String, String>,
    used: BTreeSet<String>,
    builtin_alias: String,
}

impl ImportTable {
    /// Create a table with the built-in library registered under `builtin_alias`.
    pub fn new(builtin_alias: impl Into<String>, builtin_path: impl Into<String>) -> Self {
        let builtin_alias = builtin_alias.into();
        let mut imports = BTreeMap::new();
        imports.insert(builtin_alias.clone(), builtin_path.into());
        Self {
            imports,
            used: BTreeSet::new(),
            builtin_alias,
        }
    }

    /// Pick the built-in alias: `xsdt`, or `xsdt0`, `xsdt1`, ... when the schema
    /// itself binds a namespace prefix of that name.
    pub fn choose_builtin_alias<'a>(taken: impl IntoIterator<Item = &'a str> + Clone) -> String {
        let is_taken = |candidate: &str| taken.clone().into_iter().any(|p| p == candidate);
        if !is_taken(BUILTIN_ALIAS) {
            return BUILTIN_ALIAS.to_string();
        }
        (0u32..)
            .map(|i| format!("{}{}", BUILTIN_ALIAS, i))
            .find(|candidate| !is_taken(candidate))
            .unwrap_or_else(|| BUILTIN_ALIAS.to_string())
    }

    pub fn builtin_alias(&self) -> &str {
        &self.builtin_alias
    }

    /// Register (or re-point) an import alias.
    pub fn register(&mut self, alias: impl Into<String>, path: impl Into<String>) {
        let alias = alias.into();
        let path = path.into();
        trace!("import registered: {} -> {}", alias, path);
        self.imports.insert(alias, path);
    }

    pub fn is_registered(&self, alias: &str) -> bool {
        self.imports.contains_key(alias)
    }

    /// Record that generated code refers to `alias`.
    pub fn mark_used(&mut self, alias: &str) {
        if alias.is_empty() {
            return;
        }
        if self.used.insert(alias.to_string()) {
            trace!("import used: {}", alias);
        }
    }

    pub fn is_used(&self, alias: &str) -> bool {
        self.used.contains(alias)
    }

    /// `use` lines for every registered alias that was used, sorted by alias.
    pub fn render(&self) -> Vec<String> {
        self.imports
            .iter()
            .filter(|(alias, _)| self.used.contains(*alias))
            .map(|(alias, path)| {
                if path.rsplit("::").next() == Some(alias.as_str()) {
                    format!("use {};", path)
                } else {
                    format!("use {} as {};", path, alias)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unused_imports_are_not_rendered() {
        let mut table = ImportTable::new("xsdt", "xsd_types");
        table.register("atom", "crate::xsd_atom");
        table.register("xlink", "crate::xsd_xlink");
        assert!(table.render().is_empty());

        table.mark_used("atom");
        assert_eq!(table.render(), vec!["use crate::xsd_atom as atom;"]);

        table.mark_used("xsdt");
        assert_eq!(
            table.render(),
            vec!["use crate::xsd_atom as atom;", "use xsd_types as xsdt;"]
        );
    }

    #[test]
    fn test_used_but_unregistered_alias_is_ignored() {
        let mut table = ImportTable::new("xsdt", "xsd_types");
        table.mark_used("nowhere");
        assert!(table.is_used("nowhere"));
        assert!(table.render().is_empty());
    }

    #[test]
    fn test_alias_matching_path_tail() {
        let mut table = ImportTable::new("xsdt", "xsd_types");
        table.register("xsd_atom", "crate::xsd_atom");
        table.mark_used("xsd_atom");
        assert_eq!(table.render(), vec!["use crate::xsd_atom;"]);
    }

    #[test]
    fn test_choose_builtin_alias() {
        assert_eq!(ImportTable::choose_builtin_alias(["xs", "tns"]), "xsdt");
        assert_eq!(ImportTable::choose_builtin_alias(["xsdt", "xs"]), "xsdt0");
        assert_eq!(ImportTable::choose_builtin_alias(["xsdt", "xsdt0"]), "xsdt1");
    }
}
