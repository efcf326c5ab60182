//! The §4.1 language-adapter contract and its one shared implementation.

use super::{cfg, dfg, generic, pdg, Language, CFGInfo, DFGInfo, PDGInfo};
use crate::error::ParseError;
use crate::symbol::ModuleSummary;

/// Four extraction operations every language exposes. `QueryAdapter` is
/// presently the only implementor; the trait exists so call sites never
/// match on `Language` directly.
pub trait LanguageAdapter {
    fn extract_module(&self, rel_path: &str, source: &str) -> Result<ModuleSummary, ParseError>;
    fn extract_cfg(&self, source: &str, function_name: &str) -> CFGInfo;
    fn extract_dfg(&self, source: &str, function_name: &str) -> DFGInfo;
    fn extract_pdg(&self, source: &str, function_name: &str) -> PDGInfo;
}

/// The query-driven adapter generalized over every supported language.
pub struct QueryAdapter {
    language: Language,
}

impl QueryAdapter {
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

impl LanguageAdapter for QueryAdapter {
    fn extract_module(&self, rel_path: &str, source: &str) -> Result<ModuleSummary, ParseError> {
        generic::extract_module_generic(rel_path, source, self.language)
    }

    fn extract_cfg(&self, source: &str, function_name: &str) -> CFGInfo {
        cfg::build_cfg(source, function_name, self.language)
    }

    fn extract_dfg(&self, source: &str, function_name: &str) -> DFGInfo {
        dfg::build_dfg(source, function_name, self.language)
    }

    fn extract_pdg(&self, source: &str, function_name: &str) -> PDGInfo {
        let cfg = self.extract_cfg(source, function_name);
        let dfg = self.extract_dfg(source, function_name);
        pdg::build_pdg(cfg, dfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_module_on_simple_rust_function() {
        let adapter = QueryAdapter::new(Language::Rust);
        let src = "fn top() -> i32 {\n    mid()\n}\n\nfn mid() -> i32 {\n    1\n}\n";
        let summary = adapter.extract_module("a.rs", src).unwrap();
        assert_eq!(summary.functions.len(), 2);
        assert_eq!(summary.functions[0].name, "top");
        assert_eq!(summary.functions[0].calls, vec!["mid".to_string()]);
    }

    #[test]
    fn extract_module_on_syntax_error_marks_partial_but_does_not_fail() {
        let adapter = QueryAdapter::new(Language::Rust);
        let summary = adapter.extract_module("a.rs", "fn broken( {{{").unwrap();
        assert!(summary.partial);
    }

    #[test]
    fn missing_function_yields_empty_cfg() {
        let adapter = QueryAdapter::new(Language::Rust);
        let cfg = adapter.extract_cfg("fn a() {}", "nonexistent");
        assert!(cfg.blocks.is_empty());
    }
}
