//! Workspace scan result: the symbol table, call graph, and lookup
//! indexes a single project snapshot is built from (§4.2).

mod call_graph;
mod ignore_filter;

use crate::ast_cache::AstCache;
use crate::error::TldrsError;
use crate::language::{Language, LanguageAdapter, QueryAdapter};
use crate::symbol::FunctionInfo;
use crate::types::{LineRange, SymbolId};
use ignore_filter::IgnoreFilter;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ProjectIndex {
    pub symbol_index: FxHashMap<SymbolId, FunctionInfo>,
    pub symbol_files: FxHashMap<SymbolId, PathBuf>,
    pub symbol_raw_names: FxHashMap<SymbolId, String>,
    pub signature_overrides: FxHashMap<SymbolId, String>,
    pub name_index: FxHashMap<String, Vec<SymbolId>>,
    pub qualified_index: FxHashMap<String, Vec<SymbolId>>,
    pub file_name_index: FxHashMap<String, FxHashMap<String, Vec<SymbolId>>>,
    pub symbol_ranges: Option<FxHashMap<SymbolId, LineRange>>,
    pub file_sources: Option<FxHashMap<PathBuf, String>>,
    pub adjacency: FxHashMap<SymbolId, Vec<SymbolId>>,
    pub reverse_adjacency: Option<FxHashMap<SymbolId, Vec<SymbolId>>>,
}

pub struct BuildOptions {
    pub include_file_sources: bool,
    pub include_ranges: bool,
    pub include_reverse_adjacency: bool,
    pub ignore_patterns: Vec<String>,
    pub respect_gitignore: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            include_file_sources: false,
            include_ranges: true,
            include_reverse_adjacency: true,
            ignore_patterns: Vec::new(),
            respect_gitignore: false,
        }
    }
}

pub enum ResolveResult {
    Found(SymbolId),
    Ambiguous { candidates: Vec<SymbolId> },
    NotFound,
}

impl ProjectIndex {
    /// Walk `root` depth-first, extract every recognized-language file
    /// through its adapter (via the AST cache), and assemble the symbol
    /// table and call graph.
    pub fn build(root: &Path, options: &BuildOptions, cache: Option<&AstCache>) -> Self {
        let filter = IgnoreFilter::build(root, &options.ignore_patterns, options.respect_gitignore);
        let mut index = ProjectIndex {
            symbol_ranges: options.include_ranges.then(FxHashMap::default),
            file_sources: options.include_file_sources.then(FxHashMap::default),
            ..Default::default()
        };

        for rel_path in walk_files(root, &filter) {
            let Some(language) = Language::from_path(&rel_path) else { continue };
            let abs_path = root.join(&rel_path);
            let Ok(source) = std::fs::read_to_string(&abs_path) else { continue };
            let rel_str = rel_path.to_string_lossy().replace('\\', "/");

            let summary = match cache {
                Some(cache) => cache.get_or_extract(&abs_path, &rel_str, &source, language),
                None => QueryAdapter::new(language).extract_module(&rel_str, &source).ok(),
            };
            let Some(summary) = summary else { continue };

            if options.include_file_sources {
                index.file_sources.get_or_insert_with(FxHashMap::default).insert(abs_path.clone(), source.clone());
            }

            register_module(&mut index, &rel_str, &abs_path, &summary, options.include_ranges);
        }

        call_graph::build(&mut index, options.include_reverse_adjacency);
        index
    }

    /// §4.2 entry-point resolution.
    pub fn resolve_entry(&self, name: &str) -> ResolveResult {
        if let Some((path_part, rest)) = name.split_once(':') {
            let candidate = SymbolId::new(path_part, rest);
            if self.symbol_index.contains_key(&candidate) {
                return ResolveResult::Found(candidate);
            }
            if let Some(ids) = self.file_name_index.get(path_part).and_then(|m| m.get(rest)) {
                if let [single] = ids.as_slice() {
                    return ResolveResult::Found(single.clone());
                }
            }
            let suffix_matches: Vec<_> = self
                .symbol_files
                .keys()
                .filter(|id| id.as_str().ends_with(&format!("{path_part}:{rest}")))
                .cloned()
                .collect();
            return match suffix_matches.as_slice() {
                [] => ResolveResult::NotFound,
                [single] => ResolveResult::Found(single.clone()),
                many => ResolveResult::Ambiguous { candidates: many.to_vec() },
            };
        }

        if name.contains('.') {
            return match self.qualified_index.get(name).map(|v| v.as_slice()) {
                None | Some([]) => ResolveResult::NotFound,
                Some([single]) => ResolveResult::Found(single.clone()),
                Some(many) => ResolveResult::Ambiguous { candidates: many.to_vec() },
            };
        }

        match self.name_index.get(name).map(|v| v.as_slice()) {
            None | Some([]) => ResolveResult::NotFound,
            Some([single]) => ResolveResult::Found(single.clone()),
            Some(many) => self.disambiguate(name, many),
        }
    }

    fn disambiguate(&self, name: &str, candidates: &[SymbolId]) -> ResolveResult {
        let mut scored: Vec<_> = candidates
            .iter()
            .map(|id| {
                let rel_path = id.rel_path().unwrap_or_default();
                let stem = Path::new(rel_path).file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                let tail = id.qualified_name().unwrap_or_default();
                let basename_matches_tail = stem == tail;
                let exact_bare_name = self.symbol_raw_names.get(id).map(|n| n == name).unwrap_or(false);
                let depth = rel_path.matches('/').count();
                (id, basename_matches_tail, exact_bare_name, depth, rel_path.to_string())
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then(b.2.cmp(&a.2))
                .then(a.3.cmp(&b.3))
                .then(a.4.cmp(&b.4))
        });

        match scored.first() {
            Some((best, true, true, _, _)) => ResolveResult::Found((*best).clone()),
            _ => ResolveResult::Ambiguous { candidates: candidates.to_vec() },
        }
    }

    pub fn entry_point_error(&self, name: &str) -> Result<SymbolId, TldrsError> {
        match self.resolve_entry(name) {
            ResolveResult::Found(id) => Ok(id),
            ResolveResult::NotFound => Err(TldrsError::not_found(format!("no symbol matches '{name}'"))),
            ResolveResult::Ambiguous { candidates } => {
                Err(TldrsError::ambiguous(name, candidates.into_iter().map(String::from).collect()))
            }
        }
    }
}

fn register_module(
    index: &mut ProjectIndex,
    rel_path: &str,
    abs_path: &Path,
    summary: &crate::symbol::ModuleSummary,
    include_ranges: bool,
) {
    let module_stem = Path::new(rel_path).file_stem().and_then(|s| s.to_str()).unwrap_or(rel_path);

    for function in &summary.functions {
        let id = function.id.clone();
        register(index, &id, abs_path, &function.name, rel_path, function.range, include_ranges);

        if function.owner.is_none() {
            index
                .qualified_index
                .entry(format!("{module_stem}.{}", function.name))
                .or_default()
                .push(id.clone());
        } else {
            index.qualified_index.entry(function.qualified_name()).or_default().push(id.clone());
        }
        index.symbol_index.insert(id, function.clone());
    }

    for class in &summary.classes {
        let id = class.id.clone();
        register(index, &id, abs_path, &class.name, rel_path, class.range, include_ranges);
        index.signature_overrides.insert(id.clone(), format!("class {}", class.name));
        index.symbol_index.insert(
            id,
            FunctionInfo {
                id: class.id.clone(),
                name: class.name.clone(),
                owner: None,
                signature: format!("class {}", class.name),
                doc_comment: class.doc_comment.clone(),
                range: class.range,
                calls: Vec::new(),
                is_async: false,
                is_exported: true,
            },
        );
    }
}

fn register(
    index: &mut ProjectIndex,
    id: &SymbolId,
    abs_path: &Path,
    bare_name: &str,
    rel_path: &str,
    range: LineRange,
    include_ranges: bool,
) {
    index.symbol_files.insert(id.clone(), abs_path.to_path_buf());
    index.symbol_raw_names.insert(id.clone(), bare_name.to_string());
    index.name_index.entry(bare_name.to_string()).or_default().push(id.clone());
    index
        .file_name_index
        .entry(rel_path.to_string())
        .or_default()
        .entry(bare_name.to_string())
        .or_default()
        .push(id.clone());
    if include_ranges {
        index.symbol_ranges.get_or_insert_with(FxHashMap::default).insert(id.clone(), range);
    }
}

fn walk_files(root: &Path, filter: &IgnoreFilter) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk_dir(root, root, filter, &mut out);
    out.sort();
    out
}

fn walk_dir(root: &Path, dir: &Path, filter: &IgnoreFilter, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        let rel = path.strip_prefix(root).unwrap_or(&path);
        let file_name = entry.file_name();
        let hidden = file_name.to_string_lossy().starts_with('.');
        if hidden {
            continue;
        }
        let is_dir = path.is_dir();
        if filter.is_ignored(rel, is_dir) {
            continue;
        }
        if is_dir {
            walk_dir(root, &path, filter, out);
        } else if Language::from_path(&path).is_some() {
            out.push(rel.to_path_buf());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_workspace_yields_empty_index() {
        let dir = TempDir::new().unwrap();
        let index = ProjectIndex::build(dir.path(), &BuildOptions::default(), None);
        assert!(index.symbol_index.is_empty());
        assert!(matches!(index.resolve_entry("anything"), ResolveResult::NotFound));
    }

    #[test]
    fn builds_symbol_table_and_call_graph() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def top():\n    mid()\n\ndef mid():\n    pass\n").unwrap();

        let index = ProjectIndex::build(dir.path(), &BuildOptions::default(), None);
        assert!(index.symbol_index.contains_key(&SymbolId::from_raw("a.py:top")));
        assert!(index.symbol_index.contains_key(&SymbolId::from_raw("a.py:mid")));
        let top_id = SymbolId::from_raw("a.py:top");
        let mid_id = SymbolId::from_raw("a.py:mid");
        assert_eq!(index.adjacency.get(&top_id), Some(&vec![mid_id]));
    }

    #[test]
    fn every_symbol_id_starts_with_its_file_rel_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def f():\n    pass\n").unwrap();
        let index = ProjectIndex::build(dir.path(), &BuildOptions::default(), None);
        for id in index.symbol_index.keys() {
            assert!(id.as_str().starts_with("a.py:"));
        }
    }

    #[test]
    fn ambiguous_bare_name_across_files_is_ambiguous() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("x")).unwrap();
        fs::create_dir_all(dir.path().join("y")).unwrap();
        fs::write(dir.path().join("x/a.py"), "def parse():\n    pass\n").unwrap();
        fs::write(dir.path().join("y/b.py"), "def parse():\n    pass\n").unwrap();

        let index = ProjectIndex::build(dir.path(), &BuildOptions::default(), None);
        match index.resolve_entry("parse") {
            ResolveResult::Ambiguous { candidates } => assert_eq!(candidates.len(), 2),
            _ => panic!("expected ambiguous resolution"),
        }
    }
}
