//! Catalog directory reconciler.
//!
//! Every direct subdirectory of a base directory is a catalog. For each one
//! the [`CatalogOrchestrator`] provisions a data source, an importer, a
//! mapping resource and a context on a [`ResourceBackend`], all tagged with
//! one [`CorrelationToken`] so they find each other through selector
//! filters instead of backend ids. Filesystem events keep the resources in
//! step with the directory tree.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod correlation;
pub mod logging;
pub mod resource;
pub mod watcher;

pub use catalog::{CatalogOrchestrator, CatalogRegistry, CatalogSnapshot, MappingWatcher};
pub use config::Settings;
pub use correlation::{CorrelationToken, Selector};
pub use resource::{MemoryBackend, ResourceBackend, ResourceHandle, ResourceKind};
pub use watcher::{FsWatcher, PathEventKind, WatchHub, WatchListener, WatchSpec};
