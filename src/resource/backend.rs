//! The backend contract consumed by the reconcilers.

use thiserror::Error;

use super::{Properties, ResourceHandle, ResourceKind};

/// Errors reported by a resource backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend rejected {kind} resource '{id}': {reason}")]
    Rejected {
        kind: ResourceKind,
        id: String,
        reason: String,
    },

    #[error("Resource not found: {id}")]
    NotFound { id: String },

    #[error("Backend unavailable: {reason}")]
    Unavailable { reason: String },
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Creates, updates and deletes resources on behalf of the reconcilers.
///
/// Calls may block on I/O; callers accept that latency. Timeouts are the
/// backend's concern.
pub trait ResourceBackend: Send + Sync {
    /// Create a resource of `kind` under a caller-chosen unique id.
    fn create(
        &self,
        kind: ResourceKind,
        unique_id: &str,
        properties: Properties,
    ) -> BackendResult<ResourceHandle>;

    /// Replace the property set of an existing resource.
    fn update(&self, handle: &ResourceHandle, properties: Properties) -> BackendResult<()>;

    /// Delete a resource. The handle is consumed whether or not this succeeds.
    fn delete(&self, handle: ResourceHandle) -> BackendResult<()>;
}
