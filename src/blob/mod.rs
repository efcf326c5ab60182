//! Content-addressed blob store backing `vhs://` refs (§4.8).
//!
//! Blobs live on disk under `<state_dir>/blobs/<shard>/<digest>`, sharded
//! by the first two hex characters of their SHA-256 digest. A companion
//! SQLite table tracks size, compression, and access metadata so `gc`
//! doesn't need to stat every file on disk.

use crate::error::StorageError;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const VHS_PREFIX: &str = "vhs://";

#[derive(Debug, Clone)]
pub struct BlobInfo {
    pub digest: String,
    pub size_bytes: u64,
    pub compressed: bool,
    pub created_at: i64,
    pub last_accessed: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlobStats {
    pub count: u64,
    pub total_bytes: u64,
}

pub struct BlobStore {
    root: PathBuf,
    conn: Mutex<Connection>,
    compress_threshold_bytes: usize,
}

impl BlobStore {
    pub fn open(root: &Path, db_path: &Path, compress_threshold_bytes: usize) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root).map_err(|source| StorageError::Io { path: root.to_path_buf(), source })?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io { path: parent.to_path_buf(), source })?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS blobs (
                digest TEXT PRIMARY KEY,
                size_bytes INTEGER NOT NULL,
                compressed INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                last_accessed INTEGER NOT NULL
             );",
        )?;
        Ok(Self { root: root.to_path_buf(), conn: Mutex::new(conn), compress_threshold_bytes })
    }

    fn path_for(&self, digest: &str) -> PathBuf {
        let shard = &digest[..2.min(digest.len())];
        self.root.join(shard).join(digest)
    }

    /// Hash, optionally zstd-compress, and write `data`. Returns a
    /// `vhs://<digest>` reference. Idempotent: writing the same content
    /// twice is a no-op past the first call.
    pub fn put(&self, data: &[u8]) -> Result<String, StorageError> {
        let digest = format!("{:x}", Sha256::digest(data));
        let now = crate::utils::get_utc_timestamp() as i64;

        let conn = self.conn.lock();
        let exists: Option<String> =
            conn.query_row("SELECT digest FROM blobs WHERE digest = ?1", params![digest], |row| row.get(0)).optional()?;
        if exists.is_some() {
            conn.execute("UPDATE blobs SET last_accessed = ?1 WHERE digest = ?2", params![now, digest])?;
            return Ok(format!("{VHS_PREFIX}{digest}"));
        }

        let compress = data.len() >= self.compress_threshold_bytes;
        let payload = if compress {
            zstd::encode_all(data, 0).map_err(|source| StorageError::Io { path: self.path_for(&digest), source })?
        } else {
            data.to_vec()
        };

        let path = self.path_for(&digest);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io { path: parent.to_path_buf(), source })?;
        }
        let tmp_path = path.with_extension("tmp");
        {
            let mut f = std::fs::File::create(&tmp_path).map_err(|source| StorageError::Io { path: tmp_path.clone(), source })?;
            f.write_all(&payload).map_err(|source| StorageError::Io { path: tmp_path.clone(), source })?;
        }
        std::fs::rename(&tmp_path, &path).map_err(|source| StorageError::Io { path, source })?;

        conn.execute(
            "INSERT INTO blobs (digest, size_bytes, compressed, created_at, last_accessed) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![digest, data.len() as i64, compress, now],
        )?;

        Ok(format!("{VHS_PREFIX}{digest}"))
    }

    fn digest_from_ref(vhs_ref: &str) -> Result<&str, StorageError> {
        vhs_ref
            .strip_prefix(VHS_PREFIX)
            .ok_or_else(|| StorageError::Corrupted { reason: format!("not a vhs:// ref: '{vhs_ref}'") })
    }

    pub fn has(&self, vhs_ref: &str) -> Result<bool, StorageError> {
        let digest = Self::digest_from_ref(vhs_ref)?;
        let conn = self.conn.lock();
        let found: Option<String> =
            conn.query_row("SELECT digest FROM blobs WHERE digest = ?1", params![digest], |row| row.get(0)).optional()?;
        Ok(found.is_some())
    }

    pub fn info(&self, vhs_ref: &str) -> Result<BlobInfo, StorageError> {
        let digest = Self::digest_from_ref(vhs_ref)?;
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT digest, size_bytes, compressed, created_at, last_accessed FROM blobs WHERE digest = ?1",
            params![digest],
            |row| {
                Ok(BlobInfo {
                    digest: row.get(0)?,
                    size_bytes: row.get::<_, i64>(1)? as u64,
                    compressed: row.get(2)?,
                    created_at: row.get(3)?,
                    last_accessed: row.get(4)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| StorageError::BlobNotFound { vhs_ref: vhs_ref.to_string() })
    }

    pub fn get(&self, vhs_ref: &str) -> Result<Vec<u8>, StorageError> {
        let digest = Self::digest_from_ref(vhs_ref)?;
        let info = self.info(vhs_ref)?;
        let now = crate::utils::get_utc_timestamp() as i64;
        {
            let conn = self.conn.lock();
            conn.execute("UPDATE blobs SET last_accessed = ?1 WHERE digest = ?2", params![now, digest])?;
        }

        let path = self.path_for(digest);
        let mut raw = Vec::new();
        std::fs::File::open(&path)
            .and_then(|mut f| f.read_to_end(&mut raw))
            .map_err(|source| StorageError::Io { path: path.clone(), source })?;

        if info.compressed {
            zstd::decode_all(raw.as_slice()).map_err(|source| StorageError::Io { path, source })
        } else {
            Ok(raw)
        }
    }

    pub fn delete(&self, vhs_ref: &str) -> Result<(), StorageError> {
        let digest = Self::digest_from_ref(vhs_ref)?.to_string();
        let path = self.path_for(&digest);
        let _ = std::fs::remove_file(&path);
        let conn = self.conn.lock();
        conn.execute("DELETE FROM blobs WHERE digest = ?1", params![digest])?;
        Ok(())
    }

    pub fn ls(&self, limit: usize) -> Result<Vec<BlobInfo>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT digest, size_bytes, compressed, created_at, last_accessed FROM blobs ORDER BY last_accessed DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(BlobInfo {
                digest: row.get(0)?,
                size_bytes: row.get::<_, i64>(1)? as u64,
                compressed: row.get(2)?,
                created_at: row.get(3)?,
                last_accessed: row.get(4)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(StorageError::from)
    }

    pub fn stats(&self) -> Result<BlobStats, StorageError> {
        let conn = self.conn.lock();
        conn.query_row("SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM blobs", [], |row| {
            Ok(BlobStats { count: row.get::<_, i64>(0)? as u64, total_bytes: row.get::<_, i64>(1)? as u64 })
        })
        .map_err(StorageError::from)
    }

    /// Delete blobs older than `max_age_days`, keeping the `keep_last`
    /// most recently accessed regardless of age, and stop once total
    /// size drops under `max_size_mb`. `dry_run` reports what would be
    /// deleted without touching disk or the index.
    pub fn gc(
        &self,
        max_age_days: Option<u32>,
        max_size_mb: Option<u64>,
        keep_last: usize,
        dry_run: bool,
    ) -> Result<(usize, u64), StorageError> {
        let now = crate::utils::get_utc_timestamp() as i64;
        let cutoff = max_age_days.map(|days| now - (days as i64) * 86_400);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT digest, size_bytes, last_accessed FROM blobs ORDER BY last_accessed DESC")?;
        let all: Vec<(String, u64, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64, row.get(2)?)))?
            .collect::<Result<_, _>>()?;
        drop(stmt);

        let max_size_bytes = max_size_mb.map(|mb| mb * 1_048_576);
        let mut running_total: u64 = all.iter().map(|(_, size, _)| size).sum();

        let mut deleted = 0usize;
        let mut freed = 0u64;

        for (idx, (digest, size, last_accessed)) in all.iter().enumerate() {
            if idx < keep_last {
                continue;
            }
            let too_old = cutoff.map(|c| *last_accessed < c).unwrap_or(false);
            let over_budget = max_size_bytes.map(|budget| running_total > budget).unwrap_or(false);
            if !too_old && !over_budget {
                continue;
            }

            if !dry_run {
                conn.execute("DELETE FROM blobs WHERE digest = ?1", params![digest])?;
                let _ = std::fs::remove_file(self.path_for(digest));
            }
            deleted += 1;
            freed += size;
            running_total = running_total.saturating_sub(*size);
        }

        Ok((deleted, freed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(threshold: usize) -> (TempDir, BlobStore) {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::open(&dir.path().join("blobs"), &dir.path().join("vhs.db"), threshold).unwrap();
        (dir, store)
    }

    #[test]
    fn put_then_get_round_trips() {
        let (_dir, store) = store(4096);
        let r = store.put(b"hello world").unwrap();
        assert!(r.starts_with("vhs://"));
        assert_eq!(store.get(&r).unwrap(), b"hello world");
    }

    #[test]
    fn identical_content_dedupes_to_same_ref() {
        let (_dir, store) = store(4096);
        let a = store.put(b"same").unwrap();
        let b = store.put(b"same").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.stats().unwrap().count, 1);
    }

    #[test]
    fn large_payload_is_compressed_and_still_round_trips() {
        let (_dir, store) = store(8);
        let data = "x".repeat(4096);
        let r = store.put(data.as_bytes()).unwrap();
        assert!(store.info(&r).unwrap().compressed);
        assert_eq!(store.get(&r).unwrap(), data.as_bytes());
    }

    #[test]
    fn missing_ref_errors() {
        let (_dir, store) = store(4096);
        assert!(store.get("vhs://deadbeef").is_err());
    }

    #[test]
    fn gc_respects_keep_last() {
        let (_dir, store) = store(4096);
        store.put(b"one").unwrap();
        store.put(b"two").unwrap();
        let (deleted, _) = store.gc(Some(0), None, 2, false).unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(store.stats().unwrap().count, 2);
    }
}
