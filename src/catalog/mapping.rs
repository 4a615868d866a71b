//! Replace-on-change reconciler for one catalog's mapping directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::correlation::CorrelationToken;
use crate::resource::{ResourceBackend, ResourceHandle, ResourceKind, recipe};
use crate::watcher::{PathEventKind, WatchError, WatchListener, WatchSpec};

use super::MAPPING_DIR;

struct MappingState {
    current: Option<ResourceHandle>,
    active: bool,
}

/// Owns the mapping resource of one catalog.
///
/// Any change below the mapping directory deletes the current mapping
/// resource and creates a fresh one pointing at `mapping/catalog.xmi`,
/// tagged with the catalog's correlation token. Content is never compared:
/// every event recreates. Replacement holds the state lock for the whole
/// delete-then-create, so at most one mapping resource is live per watcher.
pub struct MappingWatcher {
    catalog: PathBuf,
    mapping_dir: PathBuf,
    token: CorrelationToken,
    backend: Arc<dyn ResourceBackend>,
    state: Mutex<MappingState>,
}

impl MappingWatcher {
    pub fn new(catalog: &Path, token: CorrelationToken, backend: Arc<dyn ResourceBackend>) -> Self {
        Self {
            catalog: catalog.to_path_buf(),
            mapping_dir: catalog.join(MAPPING_DIR),
            token,
            backend,
            state: Mutex::new(MappingState {
                current: None,
                active: true,
            }),
        }
    }

    pub fn mapping_dir(&self) -> &Path {
        &self.mapping_dir
    }

    pub fn token(&self) -> &CorrelationToken {
        &self.token
    }

    /// Backend id of the live mapping resource.
    pub fn current_id(&self) -> Option<String> {
        self.state
            .lock()
            .current
            .as_ref()
            .map(|handle| handle.id().to_string())
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Subscription scope: files matching `pattern` below the mapping
    /// directory. The OS watch sits on the catalog directory so a mapping
    /// directory created later is still seen.
    pub fn watch_spec(&self, pattern: &str) -> Result<WatchSpec, WatchError> {
        WatchSpec::recursive(&self.catalog)
            .under(MAPPING_DIR)
            .with_pattern(pattern)
    }

    /// Delete the current mapping resource (if any), then create a new one.
    ///
    /// Both steps are best-effort: a failed delete is logged and the create
    /// still runs. Does nothing once deactivated.
    pub fn replace(&self) {
        let mut state = self.state.lock();
        if !state.active {
            crate::debug_event!("mapping", "inactive, skipped", "{}", self.catalog.display());
            return;
        }

        if let Some(previous) = state.current.take() {
            self.delete(previous);
        }

        let properties = recipe::mapping(&self.mapping_dir, &self.token);
        match self
            .backend
            .create(ResourceKind::MappingResource, &recipe::unique_id(), properties)
        {
            Ok(handle) => {
                crate::log_event!("mapping", "configured", "{} -> {}", self.catalog.display(), handle.id());
                state.current = Some(handle);
            }
            Err(e) => {
                tracing::error!(
                    "[mapping] failed to create mapping resource for {}: {e}",
                    self.catalog.display()
                );
            }
        }
    }

    /// Delete the current mapping resource and ignore further events.
    pub fn deactivate(&self) {
        let mut state = self.state.lock();
        state.active = false;
        if let Some(previous) = state.current.take() {
            self.delete(previous);
        }
        crate::debug_event!("mapping", "deactivated", "{}", self.catalog.display());
    }

    fn delete(&self, handle: ResourceHandle) {
        let id = handle.id().to_string();
        if let Err(e) = self.backend.delete(handle) {
            tracing::error!(
                "[mapping] failed to delete mapping resource {id} for {}: {e}",
                self.catalog.display()
            );
        }
    }
}

impl WatchListener for MappingWatcher {
    fn name(&self) -> &str {
        "mapping"
    }

    fn handle_base_path(&self, base: &Path) {
        crate::debug_event!("mapping", "base path", "{}", base.display());
    }

    fn handle_initial_paths(&self, paths: &[PathBuf]) {
        crate::debug_event!(
            "mapping",
            "initial scan",
            "{} files in {}",
            paths.len(),
            self.mapping_dir.display()
        );
        self.replace();
    }

    fn handle_path_event(&self, path: &Path, kind: PathEventKind) {
        crate::log_event!("mapping", kind, "{}", path.display());
        self.replace();
    }
}
