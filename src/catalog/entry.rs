use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::correlation::CorrelationToken;
use crate::resource::{ResourceHandle, ResourceKind};
use crate::watcher::SubscriptionId;

use super::MappingWatcher;

/// The nested mapping watcher of a catalog and its hub subscription.
pub struct MappingBinding {
    pub(crate) watcher: Arc<MappingWatcher>,
    pub(crate) subscription: Option<SubscriptionId>,
}

impl MappingBinding {
    pub fn new(watcher: Arc<MappingWatcher>, subscription: Option<SubscriptionId>) -> Self {
        Self {
            watcher,
            subscription,
        }
    }

    pub fn watcher(&self) -> &Arc<MappingWatcher> {
        &self.watcher
    }
}

/// Everything derived from one catalog directory.
///
/// Holds at most one handle per kind. The mapping resource handle lives in
/// the nested [`MappingWatcher`], which replaces it on its own.
pub struct CatalogEntry {
    path: PathBuf,
    token: CorrelationToken,
    handles: HashMap<ResourceKind, ResourceHandle>,
    mapping: Option<MappingBinding>,
}

impl CatalogEntry {
    pub fn new(path: PathBuf, token: CorrelationToken) -> Self {
        Self {
            path,
            token,
            handles: HashMap::new(),
            mapping: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token(&self) -> &CorrelationToken {
        &self.token
    }

    /// Store a directly owned handle. Mapping resources go through
    /// [`CatalogEntry::set_mapping`] instead.
    pub fn set_handle(&mut self, handle: ResourceHandle) -> Option<ResourceHandle> {
        debug_assert_ne!(handle.kind(), ResourceKind::MappingResource);
        self.handles.insert(handle.kind(), handle)
    }

    pub fn set_mapping(&mut self, binding: MappingBinding) {
        self.mapping = Some(binding);
    }

    pub fn mapping(&self) -> Option<&MappingBinding> {
        self.mapping.as_ref()
    }

    /// Backend id of the live resource of `kind`, if any.
    pub fn handle_id(&self, kind: ResourceKind) -> Option<String> {
        match kind {
            ResourceKind::MappingResource => self
                .mapping
                .as_ref()
                .and_then(|binding| binding.watcher.current_id()),
            _ => self.handles.get(&kind).map(|h| h.id().to_string()),
        }
    }

    /// Kinds with a live handle, in provisioning order.
    pub fn live_kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| self.handle_id(*kind).is_some())
            .collect()
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            path: self.path.clone(),
            token: self.token.clone(),
            resources: ResourceKind::ALL
                .into_iter()
                .filter_map(|kind| self.handle_id(kind).map(|id| (kind, id)))
                .collect(),
        }
    }

    pub(crate) fn into_parts(self) -> (HashMap<ResourceKind, ResourceHandle>, Option<MappingBinding>) {
        (self.handles, self.mapping)
    }
}

/// Serializable view of a [`CatalogEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSnapshot {
    pub path: PathBuf,
    pub token: CorrelationToken,
    /// Backend id per live resource kind.
    pub resources: BTreeMap<ResourceKind, String>,
}
