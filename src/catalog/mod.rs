//! Catalog reconciliation.
//!
//! [`CatalogOrchestrator`] turns every catalog directory under the base
//! directory into four correlated resources and tears them down again when
//! the directory goes away. [`MappingWatcher`] owns the mapping resource of
//! one catalog and replaces it whenever the mapping directory changes.
//!
//! A catalog directory looks like:
//!
//! ```text
//! <base>/sales/
//!   data/           -> importer source
//!   mapping/
//!     catalog.xmi   -> mapping resource
//! ```

mod entry;
mod mapping;
mod orchestrator;
mod registry;

pub use entry::{CatalogEntry, CatalogSnapshot, MappingBinding};
pub use mapping::MappingWatcher;
pub use orchestrator::{CatalogOrchestrator, CatalogOrchestratorBuilder};
pub use registry::CatalogRegistry;

/// Subdirectory holding the importer's source data.
pub const DATA_DIR: &str = "data";
/// Subdirectory watched by the catalog's [`MappingWatcher`].
pub const MAPPING_DIR: &str = "mapping";
