//! Configuration for the context-pack pipeline.
//!
//! Layered the same way as every other setting in this crate family:
//! defaults, then a `.tldrs/settings.toml` file, then `TLDRS_`-prefixed
//! environment variables.
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `TLDRS_` and use double
//! underscores to separate nested levels:
//! - `TLDRS_INDEXING__PARALLEL_THREADS=8` sets `indexing.parallel_threads`
//! - `TLDRS_PACK__DEFAULT_BUDGET=20000` sets `pack.default_budget`
//! - `TLDRS_DELIVERY__TTL_SECONDS=0` sets `delivery.ttl_seconds`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Root of the `.tldrs/` persisted-state directory, relative to the
    /// project root (§6 Persisted state layout).
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Workspace scanning configuration.
    #[serde(default)]
    pub indexing: IndexingConfig,

    /// Language-specific enablement.
    #[serde(default)]
    pub languages: HashMap<String, LanguageConfig>,

    /// Pack builder defaults.
    #[serde(default)]
    pub pack: PackConfig,

    /// Delivery cache / session lifecycle.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Blob store knobs.
    #[serde(default)]
    pub blobs: BlobConfig,

    /// Structured logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Number of parallel threads used for per-file extraction.
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Extra ignore patterns, same syntax as `.tldrsignore`.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Merge `.gitignore` rules in addition to `.tldrsignore`.
    #[serde(default = "default_false")]
    pub respect_gitignore: bool,

    /// Include per-symbol source line ranges in the `ProjectIndex`.
    #[serde(default = "default_true")]
    pub include_ranges: bool,

    /// Include reverse adjacency (callers) in the `ProjectIndex`.
    #[serde(default = "default_true")]
    pub include_reverse_adjacency: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LanguageConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PackConfig {
    /// Token budget used when a caller does not specify one.
    #[serde(default = "default_budget")]
    pub default_budget: Option<usize>,

    /// Default zoom level (0-4).
    #[serde(default = "default_zoom")]
    pub default_zoom: u8,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeliveryConfig {
    /// Seconds of inactivity after which a session is evicted.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: i64,

    /// Use (and create) a persistent default session id.
    #[serde(default = "default_true")]
    pub use_default_session: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BlobConfig {
    /// Payloads at or above this size are zstd-compressed.
    #[serde(default = "default_compress_threshold")]
    pub compress_threshold_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,

    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_state_dir() -> PathBuf {
    PathBuf::from(".tldrs")
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_budget() -> Option<usize> {
    None
}
fn default_zoom() -> u8 {
    3
}
fn default_ttl_seconds() -> i64 {
    7 * 24 * 60 * 60
}
fn default_compress_threshold() -> usize {
    4096
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            state_dir: default_state_dir(),
            indexing: IndexingConfig::default(),
            languages: default_languages(),
            pack: PackConfig::default(),
            delivery: DeliveryConfig::default(),
            blobs: BlobConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            ignore_patterns: Vec::new(),
            respect_gitignore: false,
            include_ranges: true,
            include_reverse_adjacency: true,
        }
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            default_budget: default_budget(),
            default_zoom: default_zoom(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            use_default_session: true,
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            compress_threshold_bytes: default_compress_threshold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

fn default_languages() -> HashMap<String, LanguageConfig> {
    crate::language::Language::all()
        .iter()
        .map(|lang| (lang.config_key().to_string(), LanguageConfig { enabled: true }))
        .collect()
}

impl Settings {
    /// Load configuration from all sources, searching for `.tldrs/` from
    /// the current directory upward.
    pub fn load() -> Result<Self, figment::Error> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(".tldrs/settings.toml"));

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("TLDRS_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
    }

    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            let state_dir = ancestor.join(".tldrs");
            if state_dir.is_dir() {
                return Some(state_dir.join("settings.toml"));
            }
        }
        None
    }

    /// Find the workspace root (the ancestor that owns `.tldrs/`).
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        current
            .ancestors()
            .find(|ancestor| ancestor.join(".tldrs").is_dir())
            .map(|p| p.to_path_buf())
    }

    /// Load configuration from a specific file, defaults layered underneath.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("TLDRS_").split("__"))
            .extract()
    }

    /// Persist this configuration to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("invalid path")?;
        std::fs::create_dir_all(parent)?;
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Absolute path to the blob store root under `state_dir`.
    pub fn blobs_dir(&self, project_root: &std::path::Path) -> PathBuf {
        project_root.join(&self.state_dir).join("blobs")
    }

    /// Absolute path to the AST cache root under `state_dir`.
    pub fn ast_cache_dir(&self, project_root: &std::path::Path) -> PathBuf {
        project_root.join(&self.state_dir).join("cache").join("ast")
    }

    /// Absolute path to the delivery/session SQLite database.
    pub fn db_path(&self, project_root: &std::path::Path) -> PathBuf {
        project_root.join(&self.state_dir).join("vhs.db")
    }

    /// Absolute path to the persisted default session id file.
    pub fn default_session_path(&self, project_root: &std::path::Path) -> PathBuf {
        project_root.join(&self.state_dir).join("default_session_id")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.state_dir, PathBuf::from(".tldrs"));
        assert!(settings.indexing.parallel_threads > 0);
        assert!(settings.languages.contains_key("rust"));
        assert_eq!(settings.pack.default_zoom, 3);
    }

    #[test]
    fn loads_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        fs::write(
            &config_path,
            r#"
version = 2

[indexing]
parallel_threads = 4
respect_gitignore = true

[pack]
default_budget = 8000
default_zoom = 2

[delivery]
ttl_seconds = 60
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.indexing.parallel_threads, 4);
        assert!(settings.indexing.respect_gitignore);
        assert_eq!(settings.pack.default_budget, Some(8000));
        assert_eq!(settings.pack.default_zoom, 2);
        assert_eq!(settings.delivery.ttl_seconds, 60);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        fs::write(
            &config_path,
            r#"
[indexing]
parallel_threads = 16
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.indexing.parallel_threads, 16);
        assert_eq!(settings.version, 1);
        assert_eq!(settings.delivery.ttl_seconds, 7 * 24 * 60 * 60);
    }

    #[test]
    fn state_dir_paths_are_project_relative() {
        let settings = Settings::default();
        let root = std::path::Path::new("/repo");
        assert_eq!(root.join(".tldrs/blobs"), settings.blobs_dir(root));
        assert_eq!(root.join(".tldrs/vhs.db"), settings.db_path(root));
    }
}
