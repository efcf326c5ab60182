//! Core identifiers and small value types shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Canonical symbol identifier: `"<rel_path>:<qualified_name>"`, where
/// `qualified_name` is a bare function name, a class name, or
/// `Class.method`. Unique within a project snapshot.
///
/// Implemented as a string newtype, not an interned integer, because the
/// canonical form *is* the string: callers split on `:` and `.` to
/// resolve entry points (§4.2) and match path suffixes directly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(Box<str>);

impl SymbolId {
    pub fn new(rel_path: &str, qualified_name: &str) -> Self {
        Self(format!("{rel_path}:{qualified_name}").into_boxed_str())
    }

    /// Build directly from an already-canonical string, e.g. read back
    /// from storage.
    pub fn from_raw(raw: impl Into<Box<str>>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `(rel_path, qualified_name)` on the first colon.
    pub fn split(&self) -> Option<(&str, &str)> {
        self.0.split_once(':')
    }

    pub fn rel_path(&self) -> Option<&str> {
        self.split().map(|(p, _)| p)
    }

    pub fn qualified_name(&self) -> Option<&str> {
        self.split().map(|(_, q)| q)
    }

    /// `Class.method` -> `("Class", "method")`; `free_fn` -> `None`.
    pub fn class_and_method(&self) -> Option<(&str, &str)> {
        self.qualified_name().and_then(|q| q.split_once('.'))
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SymbolId> for String {
    fn from(id: SymbolId) -> String {
        id.0.into_string()
    }
}

/// An inclusive source line range, 1-indexed, matching `symbol_ranges`
/// entries in the `ProjectIndex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn span(&self) -> u32 {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn contains_line(&self, line: u32) -> bool {
        line >= self.start && line <= self.end
    }

    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Tightest of two enclosing ranges, by span.
    pub fn tighter<'a>(&'a self, other: &'a LineRange) -> &'a LineRange {
        if self.span() <= other.span() { self } else { other }
    }
}

/// Relevance label attached to a [`crate::pack::Candidate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelevanceLabel {
    ContainsDiff,
    Caller,
    Callee,
    Adjacent,
    Depth(u32),
    Custom(String),
}

impl fmt::Display for RelevanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainsDiff => write!(f, "contains_diff"),
            Self::Caller => write!(f, "caller"),
            Self::Callee => write!(f, "callee"),
            Self::Adjacent => write!(f, "adjacent"),
            Self::Depth(n) => write!(f, "depth_{n}"),
            Self::Custom(s) => write!(f, "{s}"),
        }
    }
}

/// Returns `false` (and should block the operation) if `candidate`
/// resolves outside of `root` once symlinks and `..` segments are
/// accounted for. Used wherever a SymbolId's rel_path is turned back
/// into a filesystem path.
pub fn is_within_root(root: &Path, candidate: &Path) -> bool {
    let root = match root.canonicalize() {
        Ok(p) => p,
        Err(_) => return false,
    };
    let full = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };
    match full.canonicalize() {
        Ok(resolved) => resolved.starts_with(&root),
        // A not-yet-existing path is judged lexically: no ".." component
        // may appear once joined to an already-canonical root.
        Err(_) => !full.components().any(|c| matches!(c, std::path::Component::ParentDir)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_id_roundtrip() {
        let id = SymbolId::new("a/b.py", "Foo.bar");
        assert_eq!(id.as_str(), "a/b.py:Foo.bar");
        assert_eq!(id.rel_path(), Some("a/b.py"));
        assert_eq!(id.qualified_name(), Some("Foo.bar"));
        assert_eq!(id.class_and_method(), Some(("Foo", "bar")));
    }

    #[test]
    fn symbol_id_free_function_has_no_class() {
        let id = SymbolId::new("a.py", "top");
        assert_eq!(id.class_and_method(), None);
    }

    #[test]
    fn line_range_tighter_picks_smaller_span() {
        let outer = LineRange::new(10, 40);
        let inner = LineRange::new(20, 30);
        assert_eq!(outer.tighter(&inner).span(), 11);
        assert_eq!(inner.tighter(&outer).span(), 11);
    }

    #[test]
    fn line_range_overlap() {
        let a = LineRange::new(1, 5);
        let b = LineRange::new(5, 10);
        let c = LineRange::new(6, 10);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn relevance_label_display() {
        assert_eq!(RelevanceLabel::ContainsDiff.to_string(), "contains_diff");
        assert_eq!(RelevanceLabel::Depth(2).to_string(), "depth_2");
    }
}
