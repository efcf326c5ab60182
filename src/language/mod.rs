//! Language enumeration, grammar loading, and the query-driven adapter
//! shared by every supported language (§4.1).
//!
//! Where the teacher hand-writes one extraction walker per language
//! (`parsing/rust.rs`, `parsing/python/`, …), adapters here are data:
//! a [`GrammarProfile`] names the grammar and a handful of node-kind
//! strings, and one generic extractor (`generic.rs`) does the walking.

mod adapter;
mod cfg;
mod dfg;
mod generic;
mod grammar;
mod pdg;
mod queries;

pub use adapter::{LanguageAdapter, QueryAdapter};
pub use cfg::{CfgBlock, CfgEdge, CFGInfo};
pub use dfg::{DFGInfo, VarRefKind, VariableRef};
pub use grammar::GrammarProfile;
pub use pdg::PDGInfo;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The spec's core set of fifteen language tags plus Rust itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Go,
    Rust,
    Java,
    C,
    Cpp,
    Ruby,
    Php,
    Kotlin,
    Swift,
    CSharp,
    Scala,
    Lua,
    Elixir,
}

impl Language {
    pub fn all() -> &'static [Language] {
        use Language::*;
        &[
            Python, TypeScript, JavaScript, Go, Rust, Java, C, Cpp, Ruby, Php, Kotlin, Swift,
            CSharp, Scala, Lua, Elixir,
        ]
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        use Language::*;
        Some(match ext.to_lowercase().as_str() {
            "py" | "pyi" => Python,
            "ts" | "mts" | "cts" => TypeScript,
            "tsx" => TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => JavaScript,
            "go" => Go,
            "rs" => Rust,
            "java" => Java,
            "c" | "h" => C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Cpp,
            "rb" => Ruby,
            "php" | "php3" | "php4" | "php5" | "php7" | "php8" | "phtml" => Php,
            "kt" | "kts" => Kotlin,
            "swift" => Swift,
            "cs" => CSharp,
            "scala" | "sc" => Scala,
            "lua" => Lua,
            "ex" | "exs" => Elixir,
            _ => return None,
        })
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::from_extension)
    }

    /// Key used in `Settings.languages` and `qualified_index` module
    /// aliasing, matching the spec's language-tag vocabulary.
    pub fn config_key(&self) -> &'static str {
        use Language::*;
        match self {
            Python => "python",
            TypeScript => "typescript",
            JavaScript => "javascript",
            Go => "go",
            Rust => "rust",
            Java => "java",
            C => "c",
            Cpp => "cpp",
            Ruby => "ruby",
            Php => "php",
            Kotlin => "kotlin",
            Swift => "swift",
            CSharp => "csharp",
            Scala => "scala",
            Lua => "lua",
            Elixir => "elixir",
        }
    }

    pub fn name(&self) -> &'static str {
        use Language::*;
        match self {
            Python => "Python",
            TypeScript => "TypeScript",
            JavaScript => "JavaScript",
            Go => "Go",
            Rust => "Rust",
            Java => "Java",
            C => "C",
            Cpp => "C++",
            Ruby => "Ruby",
            Php => "PHP",
            Kotlin => "Kotlin",
            Swift => "Swift",
            CSharp => "C#",
            Scala => "Scala",
            Lua => "Lua",
            Elixir => "Elixir",
        }
    }

    /// The tree-sitter grammar for this language tag.
    pub fn tree_sitter_language(&self) -> tree_sitter::Language {
        use Language::*;
        match self {
            Python => tree_sitter_python::LANGUAGE.into(),
            TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Go => tree_sitter_go::LANGUAGE.into(),
            Rust => tree_sitter_rust::LANGUAGE.into(),
            Java => tree_sitter_java::LANGUAGE.into(),
            C => tree_sitter_c::LANGUAGE.into(),
            Cpp => tree_sitter_cpp::LANGUAGE.into(),
            Ruby => tree_sitter_ruby::LANGUAGE.into(),
            Php => tree_sitter_php::LANGUAGE_PHP.into(),
            Kotlin => tree_sitter_kotlin_codanna::language().into(),
            Swift => tree_sitter_swift::LANGUAGE.into(),
            CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
            Scala => tree_sitter_scala::LANGUAGE.into(),
            Lua => tree_sitter_lua::LANGUAGE.into(),
            Elixir => tree_sitter_elixir::LANGUAGE.into(),
        }
    }

    /// Grammar-specific node-kind tables driving the generic extractor
    /// and the shared CFG/DFG/PDG builders.
    pub fn grammar_profile(&self) -> &'static GrammarProfile {
        grammar::profile_for(*self)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_language_has_a_config_key_entry_in_all() {
        let keys: std::collections::HashSet<_> = Language::all().iter().map(|l| l.config_key()).collect();
        assert_eq!(keys.len(), Language::all().len());
    }

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(Language::from_extension("RS"), Some(Language::Rust));
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
    }

    #[test]
    fn unknown_extension_is_none() {
        assert_eq!(Language::from_extension("xyz"), None);
    }

    #[test]
    fn from_path_uses_extension() {
        assert_eq!(Language::from_path(Path::new("src/main.rs")), Some(Language::Rust));
        assert_eq!(Language::from_path(Path::new("README")), None);
    }
}
