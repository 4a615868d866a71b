//! In-memory configuration store implementing [`ResourceBackend`].
//!
//! Stores every live resource with its properties so selector filters can be
//! resolved, journals every call (including failed ones), and supports
//! failure injection per operation and kind.

use std::collections::HashSet;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;

use crate::correlation::Selector;

use super::{BackendError, BackendResult, Properties, ResourceBackend, ResourceHandle, ResourceKind};

/// Backend operation recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOp {
    Create,
    Update,
    Delete,
}

/// One journaled backend call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendCall {
    pub op: CallOp,
    pub kind: ResourceKind,
    pub id: String,
    /// Whether the call succeeded.
    pub ok: bool,
}

/// A live resource held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredResource {
    pub id: String,
    pub kind: ResourceKind,
    pub properties: Properties,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    resources: DashMap<String, StoredResource>,
    journal: Mutex<Vec<BackendCall>>,
    failures: Mutex<HashSet<(CallOp, ResourceKind)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` on resources of `kind` fail.
    pub fn fail_on(&self, op: CallOp, kind: ResourceKind) {
        self.failures.lock().insert((op, kind));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.journal.lock().clone()
    }

    /// Number of attempted calls of `op` on `kind`.
    pub fn count(&self, op: CallOp, kind: ResourceKind) -> usize {
        self.journal
            .lock()
            .iter()
            .filter(|c| c.op == op && c.kind == kind)
            .count()
    }

    pub fn clear_journal(&self) {
        self.journal.lock().clear();
    }

    pub fn get(&self, id: &str) -> Option<StoredResource> {
        self.resources.get(id).map(|r| r.value().clone())
    }

    /// Live resources of one kind, sorted by id.
    pub fn live(&self, kind: ResourceKind) -> Vec<StoredResource> {
        let mut live: Vec<StoredResource> = self
            .resources
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.value().clone())
            .collect();
        live.sort_by(|a, b| a.id.cmp(&b.id));
        live
    }

    pub fn live_count(&self) -> usize {
        self.resources.len()
    }

    /// Ids of live resources of `kind` whose properties satisfy `selector`.
    pub fn query(&self, kind: ResourceKind, selector: &Selector) -> Vec<String> {
        let mut ids: Vec<String> = self
            .resources
            .iter()
            .filter(|r| r.kind == kind && selector.matches(&r.properties))
            .map(|r| r.id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn record(&self, op: CallOp, kind: ResourceKind, id: &str, ok: bool) {
        self.journal.lock().push(BackendCall {
            op,
            kind,
            id: id.to_string(),
            ok,
        });
    }

    fn injected(&self, op: CallOp, kind: ResourceKind, id: &str) -> BackendResult<()> {
        if self.failures.lock().contains(&(op, kind)) {
            self.record(op, kind, id, false);
            return Err(BackendError::Unavailable {
                reason: format!("injected {op:?} failure for {kind}"),
            });
        }
        Ok(())
    }
}

impl ResourceBackend for MemoryBackend {
    fn create(
        &self,
        kind: ResourceKind,
        unique_id: &str,
        properties: Properties,
    ) -> BackendResult<ResourceHandle> {
        self.injected(CallOp::Create, kind, unique_id)?;

        if self.resources.contains_key(unique_id) {
            self.record(CallOp::Create, kind, unique_id, false);
            return Err(BackendError::Rejected {
                kind,
                id: unique_id.to_string(),
                reason: "id already in use".to_string(),
            });
        }

        self.resources.insert(
            unique_id.to_string(),
            StoredResource {
                id: unique_id.to_string(),
                kind,
                properties,
            },
        );
        self.record(CallOp::Create, kind, unique_id, true);
        crate::debug_event!("backend", "created", "{kind} {unique_id} via {}", kind.factory());

        Ok(ResourceHandle::new(kind, unique_id))
    }

    fn update(&self, handle: &ResourceHandle, properties: Properties) -> BackendResult<()> {
        self.injected(CallOp::Update, handle.kind(), handle.id())?;

        match self.resources.get_mut(handle.id()) {
            Some(mut resource) => {
                resource.properties = properties;
                self.record(CallOp::Update, handle.kind(), handle.id(), true);
                Ok(())
            }
            None => {
                self.record(CallOp::Update, handle.kind(), handle.id(), false);
                Err(BackendError::NotFound {
                    id: handle.id().to_string(),
                })
            }
        }
    }

    fn delete(&self, handle: ResourceHandle) -> BackendResult<()> {
        self.injected(CallOp::Delete, handle.kind(), handle.id())?;

        if self.resources.remove(handle.id()).is_none() {
            self.record(CallOp::Delete, handle.kind(), handle.id(), false);
            return Err(BackendError::NotFound {
                id: handle.id().to_string(),
            });
        }

        self.record(CallOp::Delete, handle.kind(), handle.id(), true);
        crate::debug_event!("backend", "deleted", "{handle}");
        Ok(())
    }
}
