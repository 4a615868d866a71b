//! Filesystem watch delivery for the reconcilers.
//!
//! Listeners subscribe to a [`WatchSpec`] on the [`WatchHub`] and receive an
//! initial scan followed by a stream of created/modified/deleted events.
//!
//! # Architecture
//!
//! ```text
//! FsWatcher (notify + debouncer, tokio task)
//!         |
//!      WatchHub  -- subscriptions keyed by id
//!         |
//!    +----+-------------------+
//!    |                        |
//! CatalogOrchestrator   MappingWatcher (one per catalog)
//! (base dir, flat)      (<catalog>/mapping, recursive, *.xmi)
//! ```
//!
//! Hosts with their own delivery mechanism can skip [`FsWatcher`] and feed
//! events into a plain [`WatchHub`] with [`WatchHub::dispatch`].

mod debouncer;
mod error;
mod fs;
mod hub;
mod listener;
mod spec;

pub use debouncer::Debouncer;
pub use error::WatchError;
pub use fs::{FsWatcher, FsWatcherBuilder};
pub use hub::{SubscriptionId, WatchHub};
pub use listener::{PathEventKind, WatchListener};
pub use spec::WatchSpec;
