//! Per-symbol summary types that populate a [`crate::project_index::ProjectIndex`].

use crate::types::{LineRange, SymbolId};
use serde::{Deserialize, Serialize};

/// One function or method extracted from a module, as surfaced by a
/// [`crate::language::LanguageAdapter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub id: SymbolId,
    pub name: String,
    /// `Some("Class")` for a method, `None` for a free function.
    pub owner: Option<String>,
    pub signature: String,
    pub doc_comment: Option<String>,
    pub range: LineRange,
    /// Callee qualified names found in the body, in source order,
    /// de-duplicated while preserving first occurrence.
    pub calls: Vec<String>,
    pub is_async: bool,
    pub is_exported: bool,
}

impl FunctionInfo {
    pub fn qualified_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{owner}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A class/struct/interface record and its method names, kept separate
/// from [`FunctionInfo`] so a module's type hierarchy can be inspected
/// without walking every function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: SymbolId,
    pub name: String,
    pub doc_comment: Option<String>,
    pub range: LineRange,
    pub methods: Vec<String>,
    /// Base classes / implemented interfaces, as written in source
    /// (unresolved across files).
    pub extends: Vec<String>,
}

/// A single import/use statement, kept for cross-file call resolution
/// in the project index's call graph pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Module path as written, e.g. `"./utils"` or `"crate::config"`.
    pub module_path: String,
    /// Names imported from `module_path`; empty means a whole-module
    /// import (`import foo`, `use foo::*`).
    pub names: Vec<String>,
    pub alias: Option<String>,
}

/// Everything extracted from a single source file by a language adapter
/// (§4.1), before it is folded into the project-wide index (§4.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub rel_path: String,
    pub language: String,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassRecord>,
    pub imports: Vec<Import>,
    /// `true` if the adapter fell back to a best-effort partial parse
    /// (syntax error recovery); callers may want to flag this.
    pub partial: bool,
}

impl ModuleSummary {
    pub fn new(rel_path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            rel_path: rel_path.into(),
            language: language.into(),
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            partial: false,
        }
    }

    pub fn all_symbol_ids(&self) -> impl Iterator<Item = &SymbolId> {
        self.functions
            .iter()
            .map(|f| &f.id)
            .chain(self.classes.iter().map(|c| &c.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> LineRange {
        LineRange::new(1, 10)
    }

    #[test]
    fn function_qualified_name_includes_owner() {
        let f = FunctionInfo {
            id: SymbolId::new("a.py", "Foo.bar"),
            name: "bar".into(),
            owner: Some("Foo".into()),
            signature: "def bar(self)".into(),
            doc_comment: None,
            range: range(),
            calls: vec![],
            is_async: false,
            is_exported: true,
        };
        assert_eq!(f.qualified_name(), "Foo.bar");
    }

    #[test]
    fn function_qualified_name_without_owner_is_bare() {
        let f = FunctionInfo {
            id: SymbolId::new("a.py", "top"),
            name: "top".into(),
            owner: None,
            signature: "def top()".into(),
            doc_comment: None,
            range: range(),
            calls: vec![],
            is_async: false,
            is_exported: true,
        };
        assert_eq!(f.qualified_name(), "top");
    }

    #[test]
    fn module_summary_collects_all_ids() {
        let mut m = ModuleSummary::new("a.py", "python");
        m.functions.push(FunctionInfo {
            id: SymbolId::new("a.py", "top"),
            name: "top".into(),
            owner: None,
            signature: "def top()".into(),
            doc_comment: None,
            range: range(),
            calls: vec![],
            is_async: false,
            is_exported: true,
        });
        m.classes.push(ClassRecord {
            id: SymbolId::new("a.py", "Foo"),
            name: "Foo".into(),
            doc_comment: None,
            range: range(),
            methods: vec!["bar".into()],
            extends: vec![],
        });
        let ids: Vec<_> = m.all_symbol_ids().map(|i| i.as_str()).collect();
        assert_eq!(ids, vec!["a.py:top", "a.py:Foo"]);
    }
}
