//! Delivery cache & delta engine: a project-local SQLite database
//! tracking which symbol bodies a session has already received (§4.7).

pub mod delta;

pub use delta::DeltaResult;

use crate::error::StorageError;
use crate::types::SymbolId;
use crate::utils::get_utc_timestamp;
use parking_lot::Mutex;
use rand::RngExt;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub created_at: i64,
    pub last_accessed_at: i64,
    pub repo_fingerprint: String,
    pub default_language: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub symbol_id: SymbolId,
    pub etag: String,
    pub representation: Representation,
    pub vhs_ref: Option<String>,
    pub token_estimate: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Full,
    Signature,
}

impl Representation {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Signature => "signature",
        }
    }
}

pub struct DeliveryCache {
    conn: Mutex<Connection>,
}

impl DeliveryCache {
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io { path: parent.to_path_buf(), source })?;
        }
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL,
                last_accessed_at INTEGER NOT NULL,
                repo_fingerprint TEXT NOT NULL,
                default_language TEXT
             );
             CREATE TABLE IF NOT EXISTS deliveries (
                session_id TEXT NOT NULL,
                symbol_id TEXT NOT NULL,
                etag TEXT NOT NULL,
                representation TEXT NOT NULL,
                vhs_ref TEXT,
                token_estimate INTEGER,
                last_accessed INTEGER NOT NULL,
                PRIMARY KEY (session_id, symbol_id)
             );
             CREATE INDEX IF NOT EXISTS idx_deliveries_last_accessed ON deliveries(last_accessed);",
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Create the session if absent, and always touch `last_accessed_at`.
    pub fn open_session(&self, id: &str, fingerprint: &str, language: Option<&str>) -> Result<Session, StorageError> {
        let now = get_utc_timestamp() as i64;
        let conn = self.conn.lock();

        let existing: Option<(i64, String, Option<String>)> = conn
            .query_row(
                "SELECT created_at, repo_fingerprint, default_language FROM sessions WHERE session_id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let created_at = match existing {
            Some((created_at, _, _)) => {
                conn.execute(
                    "UPDATE sessions SET last_accessed_at = ?1 WHERE session_id = ?2",
                    params![now, id],
                )?;
                created_at
            }
            None => {
                conn.execute(
                    "INSERT INTO sessions (session_id, created_at, last_accessed_at, repo_fingerprint, default_language)
                     VALUES (?1, ?2, ?2, ?3, ?4)",
                    params![id, now, fingerprint, language],
                )?;
                now
            }
        };

        Ok(Session {
            session_id: id.to_string(),
            created_at,
            last_accessed_at: now,
            repo_fingerprint: fingerprint.to_string(),
            default_language: language.map(str::to_string),
        })
    }

    /// Read (or create and persist) the project's default session id,
    /// a random 16-hex-char string stored at `.tldrs/default_session_id`.
    pub fn default_session_id(state_dir: &Path) -> std::io::Result<String> {
        let path = state_dir.join("default_session_id");
        if let Ok(existing) = std::fs::read_to_string(&path) {
            let trimmed = existing.trim();
            if trimmed.len() == 16 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
                return Ok(trimmed.to_string());
            }
        }
        let id = random_hex_id();
        std::fs::create_dir_all(state_dir)?;
        std::fs::write(&path, &id)?;
        Ok(id)
    }

    pub fn check_delta(
        &self,
        session_id: &str,
        current_etags: &HashMap<SymbolId, String>,
    ) -> Result<DeltaResult, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT etag, vhs_ref FROM deliveries WHERE session_id = ?1 AND symbol_id = ?2",
        )?;

        let mut result = DeltaResult::default();
        for (symbol_id, current_etag) in current_etags {
            let cached: Option<(String, Option<String>)> = stmt
                .query_row(params![session_id, symbol_id.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?;

            match cached {
                Some((cached_etag, vhs_ref)) if &cached_etag == current_etag => {
                    result.unchanged.push(symbol_id.clone());
                    if let Some(vhs_ref) = vhs_ref {
                        result.rehydrate.insert(symbol_id.clone(), vhs_ref);
                    }
                }
                _ => result.changed.push(symbol_id.clone()),
            }
        }
        result.unchanged.sort();
        result.changed.sort();
        Ok(result)
    }

    /// `INSERT ... ON CONFLICT ... UPDATE`, one transaction, stamping
    /// `last_accessed` on every row.
    pub fn record_deliveries_batch(&self, session_id: &str, deliveries: Vec<Delivery>) -> Result<(), StorageError> {
        let now = get_utc_timestamp() as i64;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for delivery in &deliveries {
            tx.execute(
                "INSERT INTO deliveries (session_id, symbol_id, etag, representation, vhs_ref, token_estimate, last_accessed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(session_id, symbol_id) DO UPDATE SET
                    etag = excluded.etag,
                    representation = excluded.representation,
                    vhs_ref = excluded.vhs_ref,
                    token_estimate = excluded.token_estimate,
                    last_accessed = excluded.last_accessed",
                params![
                    session_id,
                    delivery.symbol_id.as_str(),
                    delivery.etag,
                    delivery.representation.as_str(),
                    delivery.vhs_ref,
                    delivery.token_estimate.map(|t| t as i64),
                    now,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete sessions not touched within `ttl_seconds`, cascading to
    /// their deliveries.
    pub fn cleanup_expired(&self, ttl_seconds: i64) -> Result<usize, StorageError> {
        let cutoff = get_utc_timestamp() as i64 - ttl_seconds;
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let expired: Vec<String> = {
            let mut stmt = tx.prepare("SELECT session_id FROM sessions WHERE last_accessed_at < ?1")?;
            let rows = stmt.query_map(params![cutoff], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };
        for session_id in &expired {
            tx.execute("DELETE FROM deliveries WHERE session_id = ?1", params![session_id])?;
            tx.execute("DELETE FROM sessions WHERE session_id = ?1", params![session_id])?;
        }
        tx.commit()?;
        Ok(expired.len())
    }
}

fn random_hex_id() -> String {
    let mut rng = rand::rng();
    (0..16).map(|_| std::char::from_digit(rng.random_range(0..16), 16).unwrap()).collect()
}

pub fn db_path_for(project_root: &Path, settings: &crate::config::Settings) -> PathBuf {
    settings.db_path(project_root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cache() -> (TempDir, DeliveryCache) {
        let dir = TempDir::new().unwrap();
        let cache = DeliveryCache::open(&dir.path().join("vhs.db")).unwrap();
        (dir, cache)
    }

    #[test]
    fn open_session_creates_then_touches() {
        let (_dir, cache) = cache();
        let first = cache.open_session("s1", "fp1", Some("python")).unwrap();
        let second = cache.open_session("s1", "fp1", Some("python")).unwrap();
        assert_eq!(first.created_at, second.created_at);
    }

    #[test]
    fn delta_cache_hit_round_trip() {
        let (_dir, cache) = cache();
        cache.open_session("s1", "fp1", None).unwrap();

        let a = SymbolId::from_raw("a.py:f");
        let b = SymbolId::from_raw("a.py:g");
        cache
            .record_deliveries_batch(
                "s1",
                vec![
                    Delivery { symbol_id: a.clone(), etag: "h1".into(), representation: Representation::Full, vhs_ref: None, token_estimate: None },
                    Delivery { symbol_id: b.clone(), etag: "h2".into(), representation: Representation::Full, vhs_ref: None, token_estimate: None },
                ],
            )
            .unwrap();

        let mut current = HashMap::new();
        current.insert(a.clone(), "h1".to_string());
        current.insert(b.clone(), "h2".to_string());

        let delta = cache.check_delta("s1", &current).unwrap();
        assert_eq!(delta.changed.len(), 0);
        assert_eq!(delta.unchanged.len(), 2);
    }

    #[test]
    fn delta_idempotence_for_unchanged_etags() {
        let (_dir, cache) = cache();
        cache.open_session("s1", "fp1", None).unwrap();
        let a = SymbolId::from_raw("a.py:f");
        cache
            .record_deliveries_batch(
                "s1",
                vec![Delivery { symbol_id: a.clone(), etag: "h1".into(), representation: Representation::Full, vhs_ref: None, token_estimate: None }],
            )
            .unwrap();

        let mut current = HashMap::new();
        current.insert(a, "h1".to_string());
        let delta = cache.check_delta("s1", &current).unwrap();
        assert!(delta.changed.is_empty());
    }

    #[test]
    fn cleanup_expired_removes_stale_sessions() {
        let (_dir, cache) = cache();
        cache.open_session("stale", "fp", None).unwrap();
        {
            let conn = cache.conn.lock();
            conn.execute("UPDATE sessions SET last_accessed_at = 0 WHERE session_id = 'stale'", []).unwrap();
        }
        let removed = cache.cleanup_expired(60).unwrap();
        assert_eq!(removed, 1);
    }
}
