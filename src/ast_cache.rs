//! Persistent, file-system-backed AST cache keyed by `md5(rel_path)`
//! (§4.3).
//!
//! An entry stores `(mtime_ns, size, serialized ModuleSummary)`; `get`
//! only returns a hit when both still match the file on disk, so a
//! cache entry can never silently serve a stale summary.

use crate::language::{Language, LanguageAdapter, QueryAdapter};
use crate::symbol::ModuleSummary;
use md5::{Digest, Md5};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    mtime_ns: i128,
    size: u64,
    summary: ModuleSummary,
}

#[derive(Debug, Default)]
struct Stats {
    hits: u64,
    misses: u64,
}

pub struct AstCache {
    dir: PathBuf,
    stats: Mutex<Stats>,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl AstCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let _ = std::fs::create_dir_all(&dir);
        Self { dir, stats: Mutex::new(Stats::default()) }
    }

    fn cache_path(&self, rel_path: &str) -> PathBuf {
        let mut hasher = Md5::new();
        hasher.update(rel_path.as_bytes());
        let digest = hasher.finalize();
        self.dir.join(format!("{digest:x}.json"))
    }

    /// Return a cached summary for `abs_path` when mtime and size still
    /// match, otherwise re-extract through `language`'s adapter and
    /// write the fresh entry back. Corrupted cache entries and I/O
    /// failures are treated as misses, never propagated.
    pub fn get_or_extract(
        &self,
        abs_path: &Path,
        rel_path: &str,
        source: &str,
        language: Language,
    ) -> Option<ModuleSummary> {
        let metadata = std::fs::metadata(abs_path).ok()?;
        let mtime_ns = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as i128)
            .unwrap_or(0);
        let size = metadata.len();

        if let Some(summary) = self.get(rel_path, mtime_ns, size) {
            return Some(summary);
        }

        let summary = QueryAdapter::new(language).extract_module(rel_path, source).ok()?;
        self.put(rel_path, mtime_ns, size, &summary);
        Some(summary)
    }

    pub fn get(&self, rel_path: &str, mtime_ns: i128, size: u64) -> Option<ModuleSummary> {
        let path = self.cache_path(rel_path);
        let result = std::fs::read(&path)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<CacheEntry>(&bytes).ok())
            .filter(|entry| entry.mtime_ns == mtime_ns && entry.size == size)
            .map(|entry| entry.summary);

        let mut stats = self.stats.lock();
        if result.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        result
    }

    /// Atomic write: serialize to a sibling temp file, then rename.
    pub fn put(&self, rel_path: &str, mtime_ns: i128, size: u64, summary: &ModuleSummary) {
        let entry = CacheEntry { mtime_ns, size, summary: summary.clone() };
        let Ok(bytes) = serde_json::to_vec(&entry) else { return };
        let path = self.cache_path(rel_path);
        let tmp = path.with_extension("json.tmp");
        if std::fs::write(&tmp, &bytes).is_ok() {
            let _ = std::fs::rename(&tmp, &path);
        }
    }

    pub fn invalidate(&self, rel_path: &str) {
        let _ = std::fs::remove_file(self.cache_path(rel_path));
    }

    pub fn clear(&self) {
        if let Ok(entries) = std::fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let stats = self.stats.lock();
        CacheStats { hits: stats.hits, misses: stats.misses }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn miss_then_hit_on_unchanged_file() {
        let cache_dir = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        let file = workspace.path().join("a.py");
        std::fs::write(&file, "def f():\n    pass\n").unwrap();

        let cache = AstCache::new(cache_dir.path());
        let first = cache.get_or_extract(&file, "a.py", "def f():\n    pass\n", Language::Python);
        assert!(first.is_some());
        assert_eq!(cache.stats().misses, 1);

        let second = cache.get_or_extract(&file, "a.py", "def f():\n    pass\n", Language::Python);
        assert!(second.is_some());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn invalidate_forces_a_miss() {
        let cache_dir = TempDir::new().unwrap();
        let workspace = TempDir::new().unwrap();
        let file = workspace.path().join("a.py");
        std::fs::write(&file, "def f():\n    pass\n").unwrap();

        let cache = AstCache::new(cache_dir.path());
        cache.get_or_extract(&file, "a.py", "def f():\n    pass\n", Language::Python);
        cache.invalidate("a.py");
        cache.get_or_extract(&file, "a.py", "def f():\n    pass\n", Language::Python);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn corrupted_entry_counts_as_miss() {
        let cache_dir = TempDir::new().unwrap();
        let cache = AstCache::new(cache_dir.path());
        let path = cache.cache_path("a.py");
        std::fs::write(&path, b"not json").unwrap();
        assert!(cache.get("a.py", 0, 0).is_none());
        assert_eq!(cache.stats().misses, 1);
    }
}
