//! Subscription table routing events to listeners.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use notify::{RecursiveMode, Watcher};
use parking_lot::Mutex;

use super::{PathEventKind, WatchError, WatchListener, WatchSpec};

/// Identifies one subscription on a [`WatchHub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone)]
struct Subscription {
    spec: Arc<WatchSpec>,
    listener: Arc<dyn WatchListener>,
}

/// Routes filesystem events to subscribed listeners.
///
/// A hub built with [`WatchHub::new`] never touches the OS watcher; events
/// are fed in through [`WatchHub::dispatch`]. [`super::FsWatcher`] builds a
/// hub that also registers every subscription with `notify`.
pub struct WatchHub {
    subscriptions: DashMap<SubscriptionId, Subscription>,
    next_id: AtomicU64,
    notifier: Option<Mutex<notify::RecommendedWatcher>>,
}

impl WatchHub {
    /// Hub without an OS watcher; the host dispatches events itself.
    pub fn new() -> Self {
        Self {
            subscriptions: DashMap::new(),
            next_id: AtomicU64::new(1),
            notifier: None,
        }
    }

    pub(super) fn with_notifier(watcher: notify::RecommendedWatcher) -> Self {
        Self {
            notifier: Some(Mutex::new(watcher)),
            ..Self::new()
        }
    }

    /// Register a listener and deliver its base path and initial scan.
    ///
    /// The initial scan is delivered synchronously before this returns. A
    /// base directory that cannot be watched is logged, not fatal: the
    /// listener still receives its (possibly empty) initial scan.
    pub fn subscribe(&self, spec: WatchSpec, listener: Arc<dyn WatchListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let spec = Arc::new(spec);

        self.subscriptions.insert(
            id,
            Subscription {
                spec: spec.clone(),
                listener: listener.clone(),
            },
        );
        self.watch_os(&spec);

        crate::debug_event!(
            "watcher",
            "subscribed",
            "{} {id} {}",
            listener.name(),
            spec.path().display()
        );

        listener.handle_base_path(spec.root());
        let initial = spec.initial_paths();
        listener.handle_initial_paths(&initial);

        id
    }

    /// Remove a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Some((_, removed)) = self.subscriptions.remove(&id) else {
            return false;
        };

        let still_watched = self
            .subscriptions
            .iter()
            .any(|s| s.spec.path() == removed.spec.path());
        if !still_watched {
            self.unwatch_os(removed.spec.path());
        }

        crate::debug_event!(
            "watcher",
            "unsubscribed",
            "{} {id} {}",
            removed.listener.name(),
            removed.spec.path().display()
        );
        true
    }

    /// Deliver an event to every subscription whose spec matches `path`.
    ///
    /// Returns the number of listeners notified.
    pub fn dispatch(&self, path: &Path, kind: PathEventKind) -> usize {
        // Snapshot first: listeners subscribe and unsubscribe while handling.
        let targets: Vec<Subscription> = self
            .subscriptions
            .iter()
            .filter(|s| s.spec.matches(path))
            .map(|s| s.value().clone())
            .collect();

        if targets.is_empty() {
            crate::debug_event!("watcher", "unmatched", "{kind} {}", path.display());
        }

        for target in &targets {
            target.listener.handle_path_event(path, kind);
        }
        targets.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn watch_os(&self, spec: &WatchSpec) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        let mode = if spec.is_recursive() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        match notifier.lock().watch(spec.path(), mode) {
            Ok(()) => crate::debug_event!("watcher", "watching", "{}", spec.path().display()),
            Err(e) => {
                let err = WatchError::PathWatchFailed {
                    path: spec.path().to_path_buf(),
                    reason: e.to_string(),
                };
                tracing::warn!("[watcher] {err}");
            }
        }
    }

    fn unwatch_os(&self, path: &Path) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        // The directory may already be gone, which removes the OS watch too.
        if let Err(e) = notifier.lock().unwatch(path) {
            crate::debug_event!("watcher", "unwatch failed", "{}: {e}", path.display());
        }
    }
}

impl Default for WatchHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        initial: Mutex<Vec<Vec<PathBuf>>>,
        events: Mutex<Vec<(PathBuf, PathEventKind)>>,
    }

    impl WatchListener for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn handle_initial_paths(&self, paths: &[PathBuf]) {
            self.initial.lock().push(paths.to_vec());
        }

        fn handle_path_event(&self, path: &Path, kind: PathEventKind) {
            self.events.lock().push((path.to_path_buf(), kind));
        }
    }

    #[test]
    fn test_subscribe_delivers_initial_scan() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("sales")).unwrap();

        let hub = WatchHub::new();
        let recorder = Arc::new(Recorder::default());
        hub.subscribe(WatchSpec::flat(temp.path()), recorder.clone());

        assert_eq!(
            *recorder.initial.lock(),
            vec![vec![temp.path().join("sales")]]
        );
        assert_eq!(hub.subscription_count(), 1);
    }

    #[test]
    fn test_dispatch_routes_by_spec() {
        let hub = WatchHub::new();
        let flat = Arc::new(Recorder::default());
        let nested = Arc::new(Recorder::default());

        hub.subscribe(WatchSpec::flat("/catalogs"), flat.clone());
        hub.subscribe(
            WatchSpec::recursive("/catalogs/sales/mapping")
                .with_pattern(r".*\.xmi")
                .unwrap(),
            nested.clone(),
        );

        assert_eq!(
            hub.dispatch(Path::new("/catalogs/sales"), PathEventKind::Modified),
            1
        );
        assert_eq!(
            hub.dispatch(
                Path::new("/catalogs/sales/mapping/catalog.xmi"),
                PathEventKind::Modified
            ),
            1
        );
        assert_eq!(
            hub.dispatch(Path::new("/catalogs/sales/notes.txt"), PathEventKind::Created),
            0
        );

        assert_eq!(flat.events.lock().len(), 1);
        assert_eq!(nested.events.lock().len(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let hub = WatchHub::new();
        let recorder = Arc::new(Recorder::default());
        let id = hub.subscribe(WatchSpec::flat("/catalogs"), recorder.clone());

        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert_eq!(
            hub.dispatch(Path::new("/catalogs/sales"), PathEventKind::Created),
            0
        );
        assert!(recorder.events.lock().is_empty());
    }
}
