//! Top-level reconciler: catalog directories in, correlated resources out.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Settings;
use crate::correlation::CorrelationToken;
use crate::resource::{Properties, ResourceBackend, ResourceHandle, ResourceKind, recipe};
use crate::watcher::{PathEventKind, SubscriptionId, WatchError, WatchHub, WatchListener, WatchSpec};

use super::{CatalogEntry, CatalogRegistry, CatalogSnapshot, MappingBinding, MappingWatcher};

/// Teardown order for directly owned handles. The mapping resource goes last.
const DIRECT_KINDS: [ResourceKind; 3] = [
    ResourceKind::DataSource,
    ResourceKind::Importer,
    ResourceKind::Context,
];

/// Keeps one [`CatalogEntry`] per catalog directory under the base directory.
///
/// Every backend call is best-effort: failures are logged and the remaining
/// steps still run, so a catalog may end up partially provisioned or
/// partially torn down until the next event for its path.
pub struct CatalogOrchestrator {
    base_dir: PathBuf,
    mapping_pattern: String,
    backend: Arc<dyn ResourceBackend>,
    hub: Arc<WatchHub>,
    registry: Arc<CatalogRegistry>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl CatalogOrchestrator {
    pub fn builder() -> CatalogOrchestratorBuilder {
        CatalogOrchestratorBuilder::new()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn registry(&self) -> &Arc<CatalogRegistry> {
        &self.registry
    }

    pub fn snapshot(&self) -> Vec<CatalogSnapshot> {
        self.registry.snapshot()
    }

    pub fn is_started(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Subscribe to the base directory. The initial scan provisions every
    /// catalog already present before this returns.
    pub fn start(self: &Arc<Self>) {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            tracing::warn!("[catalog] already started on {}", self.base_dir.display());
            return;
        }

        crate::log_event!("catalog", "starting", "{}", self.base_dir.display());
        let listener: Arc<dyn WatchListener> = self.clone();
        *subscription = Some(self.hub.subscribe(WatchSpec::flat(&self.base_dir), listener));
    }

    /// Unsubscribe and tear down every catalog still registered.
    pub fn stop(&self) {
        if let Some(id) = self.subscription.lock().take() {
            self.hub.unsubscribe(id);
        }

        let paths = self.registry.paths();
        crate::log_event!("catalog", "stopping", "{} catalogs", paths.len());
        for path in paths {
            self.remove_catalog(&path);
        }
    }

    /// Provision the four resources of a catalog under a fresh token.
    ///
    /// Order: data source, importer, mapping resource, context. The entry is
    /// registered even when some creations fail.
    pub fn add_catalog(&self, path: &Path) {
        let token = CorrelationToken::mint();
        crate::log_event!("catalog", "adding", "{} (token {token})", path.display());

        let mut entry = CatalogEntry::new(path.to_path_buf(), token.clone());

        if let Some(handle) = self.create(path, ResourceKind::DataSource, recipe::data_source(&token)) {
            entry.set_handle(handle);
        }
        if let Some(handle) = self.create(path, ResourceKind::Importer, recipe::importer(path, &token)) {
            entry.set_handle(handle);
        }
        entry.set_mapping(self.bind_mapping(path, &token));
        if let Some(handle) = self.create(path, ResourceKind::Context, recipe::context(path, &token)) {
            entry.set_handle(handle);
        }

        let live = entry.live_kinds().len();
        if let Some(previous) = self.registry.insert(entry) {
            self.supersede(path, previous);
        }
        crate::log_event!("catalog", "added", "{} ({live}/4 resources)", path.display());
    }

    /// Delete every resource of a catalog. Unknown paths are a no-op.
    ///
    /// Each deletion is attempted independently of the others' outcome.
    pub fn remove_catalog(&self, path: &Path) {
        let Some(entry) = self.registry.remove(path) else {
            crate::debug_event!("catalog", "not registered", "{}", path.display());
            return;
        };

        crate::log_event!(
            "catalog",
            "removing",
            "{} (token {})",
            path.display(),
            entry.token()
        );

        let (mut handles, mapping) = entry.into_parts();
        for kind in DIRECT_KINDS {
            if let Some(handle) = handles.remove(&kind) {
                self.delete(path, handle);
            }
        }

        if let Some(binding) = mapping {
            self.release_mapping(binding);
        }
    }

    /// Retire an entry displaced by a second add for the same path.
    ///
    /// The remove protocol is not run: direct handles are dropped and their
    /// resources stay live in the backend. The old mapping watcher is
    /// stopped so only the new entry reacts to mapping changes.
    fn supersede(&self, path: &Path, previous: CatalogEntry) {
        let token = previous.token().clone();
        let (handles, mapping) = previous.into_parts();

        if let Some(binding) = mapping {
            self.release_mapping(binding);
        }

        for kind in DIRECT_KINDS {
            if let Some(handle) = handles.get(&kind) {
                tracing::warn!(
                    "[catalog] leaked {kind} {} of {} (token {token}): entry replaced without teardown",
                    handle.id(),
                    path.display()
                );
            }
        }
    }

    fn release_mapping(&self, binding: MappingBinding) {
        if let Some(id) = binding.subscription {
            self.hub.unsubscribe(id);
        }
        binding.watcher.deactivate();
    }

    fn create(&self, path: &Path, kind: ResourceKind, properties: Properties) -> Option<ResourceHandle> {
        match self.backend.create(kind, &recipe::unique_id(), properties) {
            Ok(handle) => {
                crate::debug_event!("catalog", "created", "{handle} for {}", path.display());
                Some(handle)
            }
            Err(e) => {
                tracing::error!("[catalog] failed to create {kind} for {}: {e}", path.display());
                None
            }
        }
    }

    fn delete(&self, path: &Path, handle: ResourceHandle) {
        let kind = handle.kind();
        if let Err(e) = self.backend.delete(handle) {
            tracing::error!("[catalog] failed to delete {kind} for {}: {e}", path.display());
        }
    }

    /// Start the nested mapping watcher. Its initial scan creates the first
    /// mapping resource before this returns.
    fn bind_mapping(&self, path: &Path, token: &CorrelationToken) -> MappingBinding {
        let watcher = Arc::new(MappingWatcher::new(path, token.clone(), self.backend.clone()));

        match watcher.watch_spec(&self.mapping_pattern) {
            Ok(spec) => {
                let listener: Arc<dyn WatchListener> = watcher.clone();
                let id = self.hub.subscribe(spec, listener);
                MappingBinding::new(watcher, Some(id))
            }
            Err(e) => {
                tracing::error!(
                    "[catalog] cannot watch mapping of {}: {e}; configuring once",
                    path.display()
                );
                watcher.replace();
                MappingBinding::new(watcher, None)
            }
        }
    }
}

impl WatchListener for CatalogOrchestrator {
    fn name(&self) -> &str {
        "catalog"
    }

    fn handle_base_path(&self, base: &Path) {
        crate::log_event!("catalog", "base path", "{}", base.display());
    }

    fn handle_initial_paths(&self, paths: &[PathBuf]) {
        crate::log_event!("catalog", "initial scan", "{} entries", paths.len());
        for path in paths.iter().filter(|p| p.is_dir()) {
            self.add_catalog(path);
        }
    }

    fn handle_path_event(&self, path: &Path, kind: PathEventKind) {
        // A deleted directory is no longer a directory; fall back to the
        // registry to tell catalogs from stray files.
        let relevant = path.is_dir()
            || (kind == PathEventKind::Deleted && self.registry.contains(path));
        if !relevant {
            crate::debug_event!("catalog", "ignored", "{kind} {}", path.display());
            return;
        }

        crate::log_event!("catalog", kind, "{}", path.display());
        match kind {
            PathEventKind::Modified => {
                self.remove_catalog(path);
                self.add_catalog(path);
            }
            PathEventKind::Created => self.add_catalog(path),
            PathEventKind::Deleted => self.remove_catalog(path),
        }
    }
}

/// Builder for [`CatalogOrchestrator`].
pub struct CatalogOrchestratorBuilder {
    base_dir: Option<PathBuf>,
    mapping_pattern: String,
    backend: Option<Arc<dyn ResourceBackend>>,
    hub: Option<Arc<WatchHub>>,
    registry: Option<Arc<CatalogRegistry>>,
}

impl CatalogOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            base_dir: None,
            mapping_pattern: crate::config::default_mapping_pattern(),
            backend: None,
            hub: None,
            registry: None,
        }
    }

    /// Take the base directory and mapping pattern from settings.
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.base_dir = Some(settings.catalog_dir.clone());
        self.mapping_pattern = settings.watch.mapping_pattern.clone();
        self
    }

    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(path.into());
        self
    }

    pub fn mapping_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.mapping_pattern = pattern.into();
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ResourceBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn hub(mut self, hub: Arc<WatchHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Inject the registry; a fresh one is created otherwise.
    pub fn registry(mut self, registry: Arc<CatalogRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<Arc<CatalogOrchestrator>, WatchError> {
        let backend = self.backend.ok_or_else(|| WatchError::InitFailed {
            reason: "Resource backend is required".to_string(),
        })?;

        let hub = self.hub.ok_or_else(|| WatchError::InitFailed {
            reason: "Watch hub is required".to_string(),
        })?;

        // Fail early on a bad pattern rather than once per catalog.
        WatchSpec::flat(".").with_pattern(&self.mapping_pattern)?;

        let base_dir = self
            .base_dir
            .unwrap_or_else(|| PathBuf::from(crate::config::DEFAULT_CATALOG_DIR));
        let base_dir = std::path::absolute(&base_dir).unwrap_or(base_dir);

        Ok(Arc::new(CatalogOrchestrator {
            base_dir,
            mapping_pattern: self.mapping_pattern,
            backend,
            hub,
            registry: self.registry.unwrap_or_default(),
            subscription: Mutex::new(None),
        }))
    }
}

impl Default for CatalogOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{CallOp, MemoryBackend};
    use std::fs;
    use tempfile::TempDir;

    fn catalog(root: &Path, name: &str) -> PathBuf {
        let path = root.join(name);
        fs::create_dir_all(path.join("data")).unwrap();
        fs::create_dir_all(path.join("mapping")).unwrap();
        fs::write(path.join("mapping/catalog.xmi"), "<xmi/>").unwrap();
        path
    }

    fn orchestrator(root: &Path, backend: &Arc<MemoryBackend>) -> Arc<CatalogOrchestrator> {
        CatalogOrchestrator::builder()
            .base_dir(root)
            .backend(backend.clone())
            .hub(Arc::new(WatchHub::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_add_catalog_creates_in_order() {
        let temp = TempDir::new().unwrap();
        let sales = catalog(temp.path(), "sales");
        let backend = Arc::new(MemoryBackend::new());
        let orchestrator = orchestrator(temp.path(), &backend);

        orchestrator.add_catalog(&sales);

        let kinds: Vec<ResourceKind> = backend.calls().iter().map(|c| c.kind).collect();
        assert_eq!(kinds, ResourceKind::ALL.to_vec());
        assert_eq!(
            orchestrator.registry().snapshot_of(&sales).unwrap().resources.len(),
            4
        );
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let temp = TempDir::new().unwrap();
        let sales = catalog(temp.path(), "sales");
        let backend = Arc::new(MemoryBackend::new());
        let orchestrator = orchestrator(temp.path(), &backend);

        orchestrator.add_catalog(&sales);
        orchestrator.remove_catalog(&sales);
        let calls_after_first = backend.calls().len();

        orchestrator.remove_catalog(&sales);

        assert_eq!(backend.calls().len(), calls_after_first);
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn test_modified_mints_new_token() {
        let temp = TempDir::new().unwrap();
        let sales = catalog(temp.path(), "sales");
        let backend = Arc::new(MemoryBackend::new());
        let orchestrator = orchestrator(temp.path(), &backend);

        orchestrator.add_catalog(&sales);
        let before = orchestrator.registry().token(&sales).unwrap();

        orchestrator.handle_path_event(&sales, PathEventKind::Modified);

        let after = orchestrator.registry().token(&sales).unwrap();
        assert_ne!(before, after);
        assert_eq!(backend.count(CallOp::Delete, ResourceKind::Context), 1);
        assert_eq!(backend.count(CallOp::Create, ResourceKind::Context), 2);
        assert_eq!(backend.live_count(), 4);
    }

    #[test]
    fn test_non_directory_event_ignored() {
        let temp = TempDir::new().unwrap();
        let sales = catalog(temp.path(), "sales");
        let notes = sales.join("notes.txt");
        fs::write(&notes, "hello").unwrap();
        let backend = Arc::new(MemoryBackend::new());
        let orchestrator = orchestrator(temp.path(), &backend);

        for kind in [PathEventKind::Created, PathEventKind::Modified, PathEventKind::Deleted] {
            orchestrator.handle_path_event(&notes, kind);
        }

        assert!(backend.calls().is_empty());
        assert!(orchestrator.registry().is_empty());
    }

    #[test]
    fn test_build_requires_backend_and_hub() {
        assert!(matches!(
            CatalogOrchestrator::builder().hub(Arc::new(WatchHub::new())).build(),
            Err(WatchError::InitFailed { .. })
        ));
        assert!(matches!(
            CatalogOrchestrator::builder()
                .backend(Arc::new(MemoryBackend::new()))
                .build(),
            Err(WatchError::InitFailed { .. })
        ));
    }

    #[test]
    fn test_build_rejects_bad_pattern() {
        let result = CatalogOrchestrator::builder()
            .backend(Arc::new(MemoryBackend::new()))
            .hub(Arc::new(WatchHub::new()))
            .mapping_pattern("(")
            .build();
        assert!(matches!(result, Err(WatchError::InvalidPattern { .. })));
    }
}
