//! `.tldrsignore` (and optionally `.gitignore`) matching, same pattern
//! syntax as `.gitignore` per §6 External Interfaces.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

pub struct IgnoreFilter {
    matcher: Gitignore,
}

impl IgnoreFilter {
    /// Build a matcher from `.tldrsignore`, found by searching upward
    /// from `root`, plus `.gitignore` when `respect_gitignore` is set.
    pub fn build(root: &Path, extra_patterns: &[String], respect_gitignore: bool) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        if let Some(tldrsignore) = find_upward(root, ".tldrsignore") {
            let _ = builder.add(tldrsignore);
        }
        if respect_gitignore {
            if let Some(gitignore) = find_upward(root, ".gitignore") {
                let _ = builder.add(gitignore);
            }
        }
        for pattern in extra_patterns {
            let _ = builder.add_line(None, pattern);
        }

        let matcher = builder.build().unwrap_or_else(|_| Gitignore::empty());
        Self { matcher }
    }

    /// `true` if `path` (relative to the matcher's root) should be
    /// excluded from the scan.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.matcher.matched(path, is_dir).is_ignore()
    }
}

fn find_upward(start: &Path, filename: &str) -> Option<std::path::PathBuf> {
    start.ancestors().map(|dir| dir.join(filename)).find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn respects_tldrsignore_patterns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".tldrsignore"), "target/\n*.log\n").unwrap();

        let filter = IgnoreFilter::build(dir.path(), &[], false);
        assert!(filter.is_ignored(Path::new("target"), true));
        assert!(filter.is_ignored(Path::new("debug.log"), false));
        assert!(!filter.is_ignored(Path::new("src/main.rs"), false));
    }

    #[test]
    fn extra_patterns_apply() {
        let dir = TempDir::new().unwrap();
        let filter = IgnoreFilter::build(dir.path(), &["vendor/".to_string()], false);
        assert!(filter.is_ignored(Path::new("vendor"), true));
    }
}
