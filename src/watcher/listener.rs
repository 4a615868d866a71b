//! Listener trait and event kinds for watch delivery.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// The three event kinds a listener receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathEventKind {
    Created,
    Modified,
    Deleted,
}

impl fmt::Display for PathEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathEventKind::Created => "created",
            PathEventKind::Modified => "modified",
            PathEventKind::Deleted => "deleted",
        })
    }
}

/// Receives the initial scan and subsequent events for one subscription.
///
/// Handlers run synchronously to completion. Delivery is serialized per
/// subscription, but different subscriptions may deliver concurrently.
pub trait WatchListener: Send + Sync {
    /// Listener name for logging.
    fn name(&self) -> &str;

    /// Called once with the subscription's base path, before the initial scan.
    fn handle_base_path(&self, _base: &Path) {}

    /// Called once with the paths present when the subscription was made.
    fn handle_initial_paths(&self, paths: &[PathBuf]);

    /// Called for every matching event after the initial scan.
    fn handle_path_event(&self, path: &Path, kind: PathEventKind);
}
