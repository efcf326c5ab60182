//! Error types for the context-pack pipeline.
//!
//! This module provides structured error types using thiserror, following
//! the stable machine-code taxonomy the pipeline's callers (an external
//! CLI, an MCP server, a daemon) dispatch on.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for the context-pack pipeline.
///
/// Variants map onto the stable machine codes callers are expected to
/// branch on; `code()` returns that string for serialization into the
/// `{error: true, code, message, ...}` boundary shape.
#[derive(Error, Debug)]
pub enum TldrsError {
    #[error("not found: {reason}")]
    NotFound { reason: String },

    #[error("ambiguous entry point '{query}': {} candidates", candidates.len())]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },

    #[error("failed to parse {language} file '{}': {reason}", path.display())]
    ParseError {
        path: PathBuf,
        language: String,
        reason: String,
    },

    #[error("path traversal rejected: '{}' escapes the project root", path.display())]
    PathTraversal { path: PathBuf },

    #[error("internal error: {0}")]
    Internal(String),
}

impl TldrsError {
    /// Stable machine code, as listed in the error taxonomy.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "TLDRS_ERR_NOT_FOUND",
            Self::Ambiguous { .. } => "TLDRS_ERR_AMBIGUOUS",
            Self::ParseError { .. } => "TLDRS_ERR_PARSE",
            Self::PathTraversal { .. } => "TLDRS_ERR_PATH_TRAVERSAL",
            Self::Internal(_) => "TLDRS_ERR_INTERNAL",
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    pub fn ambiguous(query: impl Into<String>, candidates: Vec<String>) -> Self {
        Self::Ambiguous {
            query: query.into(),
            candidates,
        }
    }
}

/// Errors specific to a single-file parse request.
///
/// Distinct from [`TldrsError::ParseError`]: a workspace scan absorbs
/// per-file parse failures silently (the file contributes nothing), but a
/// request scoped to one file surfaces this directly.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to initialize {language} parser: {reason}")]
    GrammarInit { language: String, reason: String },

    #[error("catastrophic parse failure in '{}': {reason}", path.display())]
    Catastrophic { path: PathBuf, reason: String },
}

/// Errors specific to the AST cache, blob store, and delivery database.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("io error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("blob not found for ref '{vhs_ref}'")]
    BlobNotFound { vhs_ref: String },

    #[error("index corrupted: {reason}")]
    Corrupted { reason: String },
}

/// Result type alias for the top-level pipeline error.
pub type TldrsResult<T> = Result<T, TldrsError>;

/// Result type alias for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Helper trait for adding context to errors at their call site.
pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> Result<T, TldrsError>;
    fn with_path(self, path: &std::path::Path) -> Result<T, TldrsError>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: &str) -> Result<T, TldrsError> {
        self.map_err(|e| TldrsError::Internal(format!("{msg}: {e}")))
    }

    fn with_path(self, path: &std::path::Path) -> Result<T, TldrsError> {
        self.map_err(|e| TldrsError::Internal(format!("error processing '{}': {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(TldrsError::not_found("x").code(), "TLDRS_ERR_NOT_FOUND");
        assert_eq!(
            TldrsError::ambiguous("x", vec!["a".into()]).code(),
            "TLDRS_ERR_AMBIGUOUS"
        );
        assert_eq!(
            TldrsError::PathTraversal {
                path: PathBuf::from("../etc")
            }
            .code(),
            "TLDRS_ERR_PATH_TRAVERSAL"
        );
    }

    #[test]
    fn error_context_wraps_message() {
        let result: Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
        let wrapped = result.context("loading settings");
        assert!(wrapped
            .unwrap_err()
            .to_string()
            .contains("loading settings"));
    }
}
