//! Concurrent map of catalog path to derived state.

use std::path::{Path, PathBuf};

use dashmap::DashMap;

use crate::correlation::CorrelationToken;

use super::{CatalogEntry, CatalogSnapshot};

/// The controller's entire state: one [`CatalogEntry`] per catalog path.
///
/// Operations are atomic per key; entries for different paths are
/// independent. Never persisted, rebuilt from the initial scan.
#[derive(Default)]
pub struct CatalogRegistry {
    entries: DashMap<PathBuf, CatalogEntry>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the one it replaced.
    pub fn insert(&self, entry: CatalogEntry) -> Option<CatalogEntry> {
        self.entries.insert(entry.path().to_path_buf(), entry)
    }

    pub fn remove(&self, path: &Path) -> Option<CatalogEntry> {
        self.entries.remove(path).map(|(_, entry)| entry)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Live correlation token of a catalog.
    pub fn token(&self, path: &Path) -> Option<CorrelationToken> {
        self.entries.get(path).map(|entry| entry.token().clone())
    }

    pub fn snapshot_of(&self, path: &Path) -> Option<CatalogSnapshot> {
        self.entries.get(path).map(|entry| entry.snapshot())
    }

    /// Registered catalog paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.entries.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Snapshots of every entry, sorted by path.
    pub fn snapshot(&self) -> Vec<CatalogSnapshot> {
        let mut snapshots: Vec<CatalogSnapshot> =
            self.entries.iter().map(|e| e.value().snapshot()).collect();
        snapshots.sort_by(|a, b| a.path.cmp(&b.path));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
