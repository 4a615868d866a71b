//! Resource backend contract and the in-memory configuration store.
//!
//! The reconcilers only ever create, update and delete resources through
//! [`ResourceBackend`]; they never read backend state back.

mod backend;
mod handle;
mod kind;
mod memory;
mod properties;
pub mod recipe;

pub use backend::{BackendError, BackendResult, ResourceBackend};
pub use handle::ResourceHandle;
pub use kind::ResourceKind;
pub use memory::{BackendCall, CallOp, MemoryBackend, StoredResource};
pub use properties::{Properties, PropertyValue};
