//! Diff-anchored relevance engine: turn a unified-diff text stream into a
//! ranked candidate list (§4.5).

pub mod compress;
pub mod extract;

pub use compress::{compress, CompressionMode};
pub use extract::{adaptive_context_lines, extract_window};

use crate::pack::Candidate;
use crate::project_index::ProjectIndex;
use crate::types::{LineRange, RelevanceLabel, SymbolId};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub file_path: String,
    pub range: LineRange,
}

/// Split unified-diff text into `(file, +range)` hunks, derived from the
/// `+` side of `@@` markers. A hunk with a zero line count collapses to
/// a single line. Files deleted on the `+` side (count `0`) are ignored.
pub fn parse_unified_diff(diff_text: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut current_file: Option<String> = None;

    for line in diff_text.lines() {
        if let Some(path) = line.strip_prefix("+++ ") {
            let path = path.trim();
            current_file = if path == "/dev/null" { None } else { Some(strip_diff_prefix(path).to_string()) };
            continue;
        }
        if let Some(rest) = line.strip_prefix("@@ ") {
            let Some(file_path) = current_file.clone() else { continue };
            if let Some((start, count)) = parse_hunk_header(rest) {
                if count == 0 {
                    // Pure deletion hunk on the old side with nothing added; skip.
                    if start == 0 {
                        continue;
                    }
                    hunks.push(Hunk { file_path, range: LineRange::new(start, start) });
                } else {
                    hunks.push(Hunk { file_path, range: LineRange::new(start, start + count - 1) });
                }
            }
        }
    }
    hunks
}

fn strip_diff_prefix(path: &str) -> &str {
    path.strip_prefix("b/").or_else(|| path.strip_prefix("a/")).unwrap_or(path)
}

/// Parse the `+start,count` component of an `@@ -old +new @@` header.
fn parse_hunk_header(rest: &str) -> Option<(u32, u32)> {
    let plus = rest.split_whitespace().find(|tok| tok.starts_with('+'))?;
    let spec = plus.trim_start_matches('+');
    let mut parts = spec.splitn(2, ',');
    let start: u32 = parts.next()?.parse().ok()?;
    let count: u32 = match parts.next() {
        Some(c) => c.parse().ok()?,
        None => 1,
    };
    Some((start, count))
}

/// Result of mapping hunks onto symbol ranges: touched line numbers per
/// symbol, and the enclosing-class "scope" range for any hit method.
#[derive(Debug, Clone, Default)]
pub struct HunkMapping {
    pub symbol_diff_lines: HashMap<SymbolId, BTreeSet<u32>>,
    pub scopes: HashMap<SymbolId, LineRange>,
}

/// For each hunk, find the symbol(s) in that file whose range overlaps
/// the hunk — choosing the tightest enclosing symbol when several
/// overlap — and record the touched lines. A hit method also marks its
/// enclosing class as a candidate with the class's range recorded as a
/// compression scope.
pub fn map_hunks_to_symbols(index: &ProjectIndex, hunks: &[Hunk]) -> HunkMapping {
    let mut mapping = HunkMapping::default();
    let Some(ranges) = &index.symbol_ranges else { return mapping };

    for hunk in hunks {
        let mut best: Option<(SymbolId, LineRange)> = None;
        for (symbol_id, range) in ranges {
            let Some(rel_path) = symbol_id.rel_path() else { continue };
            if rel_path != hunk.file_path {
                continue;
            }
            if !range.overlaps(&hunk.range) {
                continue;
            }
            best = Some(match best {
                None => (symbol_id.clone(), *range),
                Some((best_id, best_range)) => {
                    if *range.tighter(&best_range) == *range {
                        (symbol_id.clone(), *range)
                    } else {
                        (best_id, best_range)
                    }
                }
            });
        }

        let Some((symbol_id, symbol_range)) = best else { continue };
        let overlap_start = hunk.range.start.max(symbol_range.start).max(1);
        let overlap_end = hunk.range.end.min(symbol_range.end);
        let entry = mapping.symbol_diff_lines.entry(symbol_id.clone()).or_default();
        for line in overlap_start..=overlap_end {
            entry.insert(line);
        }

        if let Some((class_name, _)) = symbol_id.class_and_method() {
            let rel_path = symbol_id.rel_path().unwrap_or_default();
            let class_id = SymbolId::new(rel_path, class_name);
            if let Some(class_range) = ranges.get(&class_id) {
                mapping.scopes.insert(class_id.clone(), *class_range);
                mapping.symbol_diff_lines.entry(class_id).or_default();
            }
        }
    }

    mapping
}

/// Rank diff-bearing symbols plus their direct callers/callees.
/// `{contains_diff: 3, caller/callee: 2, adjacent: 1}`; ties follow
/// discovery order; no symbol is added twice.
pub fn rank(index: &ProjectIndex, mapping: &HunkMapping) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut seen: std::collections::HashSet<SymbolId> = std::collections::HashSet::new();
    let mut order = 0usize;

    let mut diff_symbols: Vec<&SymbolId> = mapping.symbol_diff_lines.keys().collect();
    diff_symbols.sort();

    for symbol_id in &diff_symbols {
        if !seen.insert((*symbol_id).clone()) {
            continue;
        }
        let lines = mapping.symbol_diff_lines.get(*symbol_id).cloned().unwrap_or_default();
        let mut candidate = Candidate::new((*symbol_id).clone(), 3, RelevanceLabel::ContainsDiff, order);
        if !lines.is_empty() {
            let csv = lines.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
            candidate.meta.insert("diff_lines".to_string(), csv);
        }
        candidates.push(candidate);
        order += 1;
    }

    for symbol_id in &diff_symbols {
        for callee in index.adjacency.get(*symbol_id).into_iter().flatten() {
            if seen.insert(callee.clone()) {
                candidates.push(Candidate::new(callee.clone(), 2, RelevanceLabel::Callee, order));
                order += 1;
            }
        }
        if let Some(reverse) = &index.reverse_adjacency {
            for caller in reverse.get(*symbol_id).into_iter().flatten() {
                if seen.insert(caller.clone()) {
                    candidates.push(Candidate::new(caller.clone(), 2, RelevanceLabel::Caller, order));
                    order += 1;
                }
            }
        }
    }

    candidates
}

/// `git diff --unified=0` invoked for the committed range, staged
/// changes, and unstaged changes, concatenated. Any failing invocation
/// (missing repo, non-zero exit, git not installed) contributes nothing.
pub fn git_diff_text(repo_root: &Path) -> String {
    let mut combined = String::new();
    for args in [
        vec!["diff", "--unified=0", "HEAD~1", "HEAD"],
        vec!["diff", "--unified=0", "--cached"],
        vec!["diff", "--unified=0"],
    ] {
        if let Some(output) = run_git(repo_root, &args) {
            combined.push_str(&output);
            combined.push('\n');
        }
    }
    combined
}

fn run_git(repo_root: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git").arg("-C").arg(repo_root).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

/// When the diff text is empty, the five most recently modified
/// workspace files become synthetic whole-file hunks.
pub fn recent_files_fallback(root: &Path, files: &[std::path::PathBuf]) -> Vec<Hunk> {
    let mut with_mtime: Vec<(std::path::PathBuf, std::time::SystemTime)> = files
        .iter()
        .filter_map(|f| {
            std::fs::metadata(root.join(f)).ok().and_then(|m| m.modified().ok()).map(|mtime| (f.clone(), mtime))
        })
        .collect();
    with_mtime.sort_by(|a, b| b.1.cmp(&a.1));

    with_mtime
        .into_iter()
        .take(5)
        .map(|(path, _)| Hunk { file_path: path.to_string_lossy().replace('\\', "/"), range: LineRange::new(1, u32::MAX) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_DIFF: &str = "diff --git a/file.py b/file.py\n--- a/file.py\n+++ b/file.py\n@@ -20,0 +22,4 @@\n+    x = 1\n+    y = 2\n";

    #[test]
    fn parses_hunk_from_at_markers() {
        let hunks = parse_unified_diff(SAMPLE_DIFF);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].file_path, "file.py");
        assert_eq!(hunks[0].range, LineRange::new(22, 25));
    }

    #[test]
    fn deleted_file_hunks_are_ignored() {
        let diff = "--- a/gone.py\n+++ /dev/null\n@@ -1,3 +0,0 @@\n-x = 1\n";
        assert!(parse_unified_diff(diff).is_empty());
    }

    #[test]
    fn diff_hunk_maps_to_tightest_enclosing_method() {
        let mut index = ProjectIndex::default();
        let mut ranges = std::collections::HashMap::default();
        let class_id = SymbolId::from_raw("file.py:Foo");
        let method_id = SymbolId::from_raw("file.py:Foo.bar");
        ranges.insert(class_id.clone(), LineRange::new(10, 40));
        ranges.insert(method_id.clone(), LineRange::new(20, 30));
        index.symbol_ranges = Some(ranges);
        index.symbol_files.insert(class_id, std::path::PathBuf::from("file.py"));
        index.symbol_files.insert(method_id.clone(), std::path::PathBuf::from("file.py"));

        let hunks = vec![Hunk { file_path: "file.py".to_string(), range: LineRange::new(22, 25) }];
        let mapping = map_hunks_to_symbols(&index, &hunks);

        let touched = &mapping.symbol_diff_lines[&method_id];
        assert_eq!(touched, &BTreeSet::from([22, 23, 24, 25]));
        assert!(mapping.scopes.contains_key(&SymbolId::from_raw("file.py:Foo")));
    }
}
