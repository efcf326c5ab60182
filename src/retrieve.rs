//! Top-level orchestration wiring symbolkite/difflens into the delivery
//! cache and pack builder (§4.7 "Delta orchestration", steps i-vi).

use crate::ast_cache::AstCache;
use crate::delivery::{delta, Delivery, DeliveryCache, Representation};
use crate::difflens;
use crate::error::TldrsError;
use crate::pack::{Candidate, ContextPack, PackBuilder};
use crate::project_index::{BuildOptions, ProjectIndex};
use crate::symbolkite;
use crate::types::{LineRange, SymbolId};
use std::collections::HashMap;
use std::path::Path;

pub struct RetrieveOptions {
    pub max_depth: u32,
    pub budget: Option<usize>,
    pub session_id: Option<String>,
    pub respect_gitignore: bool,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self { max_depth: 2, budget: None, session_id: None, respect_gitignore: false }
    }
}

/// `get_relevant_context`: resolve `entry`, BFS the call graph, and run
/// the full delta orchestration against `cache` when a session id is
/// set (steps i-vi of §4.7).
pub fn get_relevant_context(
    root: &Path,
    entry: &str,
    options: &RetrieveOptions,
    ast_cache: Option<&AstCache>,
    delivery_cache: Option<&DeliveryCache>,
) -> Result<ContextPack, TldrsError> {
    let build_options =
        BuildOptions { include_ranges: true, respect_gitignore: options.respect_gitignore, ..BuildOptions::default() };
    let index = ProjectIndex::build(root, &build_options, ast_cache);

    // (i) obtain signatures without reading any code bodies yet.
    let visited = symbolkite::traverse_signatures_only(&index, entry, options.max_depth)?;

    // (ii) signature-only ETags.
    let mut etags = HashMap::new();
    for v in &visited {
        etags.insert(v.symbol_id.clone(), delta::signature_etag(&v.signature, None));
    }

    // (iii) check_delta, if a session was supplied.
    let delta_result = check_delta_if_present(delivery_cache, &options.session_id, &etags)?;

    let mut candidates = Vec::new();
    let mut delivered = Vec::new();

    for (order, v) in visited.iter().enumerate() {
        let relevance = (options.max_depth.saturating_sub(v.depth) + 1).max(1) as i64;
        let mut candidate = Candidate::new(v.symbol_id.clone(), relevance, crate::types::RelevanceLabel::Depth(v.depth), order)
            .with_signature(v.signature.clone());

        let etag = etags.get(&v.symbol_id).cloned().unwrap_or_default();
        let is_unchanged = delta_result.as_ref().map(|d| d.unchanged.contains(&v.symbol_id)).unwrap_or(false);

        // (iv)/(v): fetch full bodies only for changed symbols.
        if !is_unchanged {
            if let Some((code, lines)) = read_symbol_body(root, &index, &v.symbol_id) {
                candidate = candidate.with_code(code, lines);
                delivered.push(full_delivery(v.symbol_id.clone(), etag));
            }
        } else {
            delivered.push(signature_delivery(v.symbol_id.clone(), etag));
        }
        candidates.push(candidate);
    }

    let pack = PackBuilder::new().build(candidates, options.budget, delta_result.as_ref());

    // (vi) record deliveries for symbols actually included.
    record_if_present(delivery_cache, &options.session_id, delivered)?;

    Ok(pack)
}

/// `get_diff_context`: parse (or fetch via git) a unified diff, rank
/// symbols by diff proximity, and run the same delta orchestration.
pub fn get_diff_context(
    root: &Path,
    diff_text: Option<&str>,
    options: &RetrieveOptions,
    ast_cache: Option<&AstCache>,
    delivery_cache: Option<&DeliveryCache>,
) -> Result<ContextPack, TldrsError> {
    let build_options = BuildOptions {
        include_ranges: true,
        include_reverse_adjacency: true,
        respect_gitignore: options.respect_gitignore,
        ..BuildOptions::default()
    };
    let index = ProjectIndex::build(root, &build_options, ast_cache);

    let fetched_diff;
    let effective_diff: &str = match diff_text {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            fetched_diff = difflens::git_diff_text(root);
            &fetched_diff
        }
    };

    let hunks = if effective_diff.trim().is_empty() {
        let mut files: Vec<_> =
            index.symbol_index.keys().filter_map(|id| id.rel_path()).map(std::path::PathBuf::from).collect();
        files.sort();
        files.dedup();
        difflens::recent_files_fallback(root, &files)
    } else {
        difflens::parse_unified_diff(effective_diff)
    };

    let mapping = difflens::map_hunks_to_symbols(&index, &hunks);
    let skeleton = difflens::rank(&index, &mapping);

    // (i)/(ii): signature + diff-aware ETag per ranked symbol.
    let mut etags = HashMap::new();
    for c in &skeleton {
        let Some(info) = index.symbol_index.get(&c.symbol_id) else { continue };
        let diff_lines: Option<Vec<u32>> =
            mapping.symbol_diff_lines.get(&c.symbol_id).map(|lines| lines.iter().copied().collect());
        etags.insert(c.symbol_id.clone(), delta::signature_etag(&info.signature, diff_lines.as_deref()));
    }

    let delta_result = check_delta_if_present(delivery_cache, &options.session_id, &etags)?;

    let mut candidates = Vec::new();
    let mut delivered = Vec::new();

    for mut candidate in skeleton {
        let Some(info) = index.symbol_index.get(&candidate.symbol_id) else { continue };
        candidate = candidate.with_signature(info.signature.clone());
        let etag = etags.get(&candidate.symbol_id).cloned().unwrap_or_default();
        let is_unchanged = delta_result.as_ref().map(|d| d.unchanged.contains(&candidate.symbol_id)).unwrap_or(false);

        if !is_unchanged {
            if let Some((code, lines)) = read_symbol_body(root, &index, &candidate.symbol_id) {
                let rendered = match mapping.symbol_diff_lines.get(&candidate.symbol_id) {
                    Some(diff_lines) if !diff_lines.is_empty() => {
                        let context = difflens::adaptive_context_lines(&code, options.budget.unwrap_or(2000) / 200);
                        difflens::extract_window(&code, lines, diff_lines, context)
                    }
                    _ => code,
                };
                candidate = candidate.with_code(rendered, lines);
                delivered.push(full_delivery(candidate.symbol_id.clone(), etag));
            }
        } else {
            delivered.push(signature_delivery(candidate.symbol_id.clone(), etag));
        }
        candidates.push(candidate);
    }

    let pack = PackBuilder::new().build(candidates, options.budget, delta_result.as_ref());
    record_if_present(delivery_cache, &options.session_id, delivered)?;

    Ok(pack)
}

fn check_delta_if_present(
    cache: Option<&DeliveryCache>,
    session_id: &Option<String>,
    etags: &HashMap<SymbolId, String>,
) -> Result<Option<delta::DeltaResult>, TldrsError> {
    match (cache, session_id) {
        (Some(cache), Some(session_id)) => {
            let result = delta::check_delta(cache, session_id, etags).map_err(|e| TldrsError::Internal(e.to_string()))?;
            Ok(Some(result))
        }
        _ => Ok(None),
    }
}

fn record_if_present(
    cache: Option<&DeliveryCache>,
    session_id: &Option<String>,
    deliveries: Vec<Delivery>,
) -> Result<(), TldrsError> {
    if let (Some(cache), Some(session_id)) = (cache, session_id) {
        delta::record_delivered(cache, session_id, deliveries).map_err(|e| TldrsError::Internal(e.to_string()))?;
    }
    Ok(())
}

fn full_delivery(symbol_id: SymbolId, etag: String) -> Delivery {
    Delivery { symbol_id, etag, representation: Representation::Full, vhs_ref: None, token_estimate: None }
}

fn signature_delivery(symbol_id: SymbolId, etag: String) -> Delivery {
    Delivery { symbol_id, etag, representation: Representation::Signature, vhs_ref: None, token_estimate: None }
}

fn read_symbol_body(root: &Path, index: &ProjectIndex, symbol_id: &SymbolId) -> Option<(String, LineRange)> {
    let info = index.symbol_index.get(symbol_id)?;
    let file = index.symbol_files.get(symbol_id)?;
    if !crate::types::is_within_root(root, file) {
        return None;
    }
    let source = std::fs::read_to_string(root.join(file)).ok()?;
    let lines: Vec<&str> = source.lines().collect();
    let start = info.range.start.saturating_sub(1) as usize;
    let end = (info.range.end as usize).min(lines.len());
    if start >= end || start >= lines.len() {
        return None;
    }
    Some((lines[start..end].join("\n"), info.range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn get_relevant_context_without_session_returns_full_bodies() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def top():\n    mid()\n\ndef mid():\n    pass\n").unwrap();

        let pack = get_relevant_context(dir.path(), "top", &RetrieveOptions { max_depth: 1, ..Default::default() }, None, None).unwrap();
        assert_eq!(pack.slices.len(), 2);
        assert!(pack.slices[0].code.is_some());
    }

    #[test]
    fn delta_cache_skips_code_for_unchanged_symbols() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def top():\n    pass\n").unwrap();

        let cache_dir = TempDir::new().unwrap();
        let delivery = DeliveryCache::open(&cache_dir.path().join("vhs.db")).unwrap();
        delivery.open_session("s1", "fp", None).unwrap();

        let options = RetrieveOptions { max_depth: 0, session_id: Some("s1".to_string()), ..Default::default() };

        let first = get_relevant_context(dir.path(), "top", &options, None, Some(&delivery)).unwrap();
        assert!(first.slices[0].code.is_some());

        let second = get_relevant_context(dir.path(), "top", &options, None, Some(&delivery)).unwrap();
        assert!(second.slices[0].code.is_none());
        assert_eq!(second.unchanged.as_deref(), Some(&["a.py:top".to_string()][..]));
    }

    #[test]
    fn diff_context_falls_back_to_recent_files_when_diff_is_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def top():\n    pass\n").unwrap();

        let pack = get_diff_context(dir.path(), Some(""), &RetrieveOptions::default(), None, None).unwrap();
        assert!(!pack.slices.is_empty());
    }
}
