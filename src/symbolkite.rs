//! BFS candidate engine over a [`ProjectIndex`]'s adjacency list (§4.4).

use crate::pack::Candidate;
use crate::project_index::{BuildOptions, ProjectIndex, ResolveResult};
use crate::types::{RelevanceLabel, SymbolId};
use std::collections::{HashSet, VecDeque};

/// Signatures-only visited node, for delta-first flows that compute
/// ETags before ever reading a file body (§4.4 "Signatures-only mode").
#[derive(Debug, Clone)]
pub struct VisitedSignature {
    pub symbol_id: SymbolId,
    pub signature: String,
    pub line: u32,
    pub depth: u32,
    pub file_path: String,
    pub calls: Vec<String>,
}

/// BFS from `entry` over `index.adjacency`, up to `max_depth` hops.
/// Each symbol is reported once (first discovery wins); relevance is
/// `max(1, (max_depth - depth) + 1)`.
pub fn traverse(index: &ProjectIndex, entry: &str, max_depth: u32) -> Result<Vec<Candidate>, crate::error::TldrsError> {
    if let Some(candidates) = module_special_case(index, entry) {
        return Ok(candidates);
    }

    let start = index.entry_point_error(entry)?;
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    let mut out = Vec::new();
    let mut order = 0usize;

    queue.push_back((start.clone(), 0u32));
    visited.insert(start);

    while let Some((symbol, depth)) = queue.pop_front() {
        let relevance = ((max_depth.saturating_sub(depth)) + 1).max(1) as i64;
        out.push(Candidate::new(symbol.clone(), relevance, RelevanceLabel::Depth(depth), order));
        order += 1;

        if depth >= max_depth {
            continue;
        }
        if let Some(successors) = index.adjacency.get(&symbol) {
            for next in successors {
                if visited.insert(next.clone()) {
                    queue.push_back((next.clone(), depth + 1));
                }
            }
        }
    }

    Ok(out)
}

/// `{symbol_id, signature, line, depth, file_path, calls}` for every
/// visited node, skipping file-body acquisition entirely.
pub fn traverse_signatures_only(
    index: &ProjectIndex,
    entry: &str,
    max_depth: u32,
) -> Result<Vec<VisitedSignature>, crate::error::TldrsError> {
    let start = index.entry_point_error(entry)?;
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    let mut out = Vec::new();

    queue.push_back((start.clone(), 0u32));
    visited.insert(start);

    while let Some((symbol, depth)) = queue.pop_front() {
        let Some(info) = index.symbol_index.get(&symbol) else { continue };
        out.push(VisitedSignature {
            symbol_id: symbol.clone(),
            signature: info.signature.clone(),
            line: info.range.start,
            depth,
            file_path: symbol.rel_path().unwrap_or_default().to_string(),
            calls: info.calls.clone(),
        });

        if depth >= max_depth {
            continue;
        }
        if let Some(successors) = index.adjacency.get(&symbol) {
            for next in successors {
                if visited.insert(next.clone()) {
                    queue.push_back((next.clone(), depth + 1));
                }
            }
        }
    }

    Ok(out)
}

/// If `entry` names a module path (a slash-separated rel path, with or
/// without its extension) rather than a symbol, return every top-level
/// symbol registered in that file instead of running BFS. A bare symbol
/// name that happens to collide with a module path still resolves as a
/// symbol first.
fn module_special_case(index: &ProjectIndex, entry: &str) -> Option<Vec<Candidate>> {
    if entry.contains(':') || !entry.contains('/') {
        return None;
    }
    if matches!(index.resolve_entry(entry), ResolveResult::Found(_)) {
        return None;
    }
    let names = index
        .file_name_index
        .get(entry)
        .or_else(|| index.file_name_index.keys().find(|k| strip_ext(k) == entry).and_then(|k| index.file_name_index.get(k)))?;

    let mut order = 0usize;
    let mut out: Vec<_> = names
        .values()
        .flatten()
        .map(|id| {
            let c = Candidate::new(id.clone(), 1, RelevanceLabel::Depth(0), order);
            order += 1;
            c
        })
        .collect();
    out.sort_by(|a, b| a.symbol_id.cmp(&b.symbol_id));
    Some(out)
}

fn strip_ext(rel_path: &str) -> &str {
    match rel_path.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => rel_path,
    }
}

/// Convenience wrapper matching the §8 seed-scenario call shape.
pub fn get_relevant_context(
    root: &std::path::Path,
    entry: &str,
    depth: u32,
) -> Result<Vec<Candidate>, crate::error::TldrsError> {
    let index = ProjectIndex::build(root, &BuildOptions::default(), None);
    traverse(&index, entry, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn depth_one_bfs_returns_top_and_mid() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "def top():\n    mid()\n\ndef mid():\n    leaf()\n\ndef leaf():\n    pass\n",
        )
        .unwrap();

        let candidates = get_relevant_context(dir.path(), "top", 1).unwrap();
        let ids: Vec<_> = candidates.iter().map(|c| c.symbol_id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["a.py:top", "a.py:mid"]);
    }

    #[test]
    fn depth_two_bfs_adds_leaf() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "def top():\n    mid()\n\ndef mid():\n    leaf()\n\ndef leaf():\n    pass\n",
        )
        .unwrap();

        let candidates = get_relevant_context(dir.path(), "top", 2).unwrap();
        let ids: Vec<_> = candidates.iter().map(|c| c.symbol_id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["a.py:top", "a.py:mid", "a.py:leaf"]);
    }

    #[test]
    fn unknown_entry_point_errors() {
        let dir = TempDir::new().unwrap();
        let err = get_relevant_context(dir.path(), "nope", 1).unwrap_err();
        assert_eq!(err.code(), "TLDRS_ERR_NOT_FOUND");
    }
}
