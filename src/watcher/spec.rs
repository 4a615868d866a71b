//! What a subscription watches: a base directory, recursion, a name pattern.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use super::WatchError;

/// Scope of one subscription.
///
/// Flat specs only see direct children of the base directory. Recursive
/// specs see every descendant. When a pattern is set it must match the
/// whole file name.
///
/// A recursive spec may narrow its matches to one subdirectory with
/// [`WatchSpec::under`] while the OS watch stays on the base directory, so
/// the subdirectory is picked up even if it is created after subscribing.
#[derive(Debug, Clone)]
pub struct WatchSpec {
    path: PathBuf,
    recursive: bool,
    scope: Option<PathBuf>,
    pattern: Option<Regex>,
}

impl WatchSpec {
    /// Watch direct children of `path`.
    pub fn flat(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: false,
            scope: None,
            pattern: None,
        }
    }

    /// Watch everything below `path`.
    pub fn recursive(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recursive: true,
            scope: None,
            pattern: None,
        }
    }

    /// Restrict matches to file names fully matching `pattern`.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, WatchError> {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored).map_err(|e| WatchError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.pattern = Some(regex);
        Ok(self)
    }

    /// Only match paths below `sub`, relative to the base directory.
    ///
    /// Has no effect on flat specs.
    pub fn under(mut self, sub: impl AsRef<Path>) -> Self {
        if self.recursive {
            self.scope = Some(self.path.join(sub));
        }
        self
    }

    /// Directory registered with the OS watcher.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory whose descendants can match: the scope if set, else the
    /// base directory.
    pub fn root(&self) -> &Path {
        self.scope.as_deref().unwrap_or(&self.path)
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Check whether an event path falls inside this spec.
    ///
    /// Pure path logic: works for paths that no longer exist.
    pub fn matches(&self, path: &Path) -> bool {
        let root = self.root();
        if path == root {
            return false;
        }

        let in_scope = if self.recursive {
            path.starts_with(root)
        } else {
            path.parent() == Some(self.path.as_path())
        };

        in_scope && self.name_matches(path)
    }

    fn name_matches(&self, path: &Path) -> bool {
        match &self.pattern {
            None => true,
            Some(regex) => path
                .file_name()
                .map(|name| regex.is_match(&name.to_string_lossy()))
                .unwrap_or(false),
        }
    }

    /// Paths currently present that this spec matches, sorted.
    ///
    /// A missing base directory yields an empty scan.
    pub fn initial_paths(&self) -> Vec<PathBuf> {
        let root = self.root();
        if !root.is_dir() {
            crate::debug_event!("watcher", "base missing", "{}", root.display());
            return Vec::new();
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut paths: Vec<PathBuf> = WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.into_path()),
                Err(e) => {
                    tracing::warn!("[watcher] scan error under {}: {e}", root.display());
                    None
                }
            })
            .filter(|p| self.name_matches(p))
            .collect();

        paths.sort();
        paths
    }
}
