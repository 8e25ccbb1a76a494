//! Offline-first replication of the local stores with a remote document
//! store.
//!
//! All synchronizable data travels as one [`Bundle`]; conflicts are resolved
//! by comparing bundle clocks (last write wins). Per-entity dirty tracking is
//! derived from the [`SyncRegistry`], which records when each entity was
//! last confirmed synced.
//!
//! # Usage
//!
//! ```
//! use shoplist::stores::{NewList, Stores};
//! use shoplist::sync::{build_bundle, ItemSyncStatus, SyncRegistry};
//!
//! let stores = Stores::in_memory();
//! let list = stores.lists().create(NewList::named("Weekly")).unwrap();
//!
//! let bundle = build_bundle(&stores).unwrap();
//! assert_eq!(bundle.lists.as_ref().map(Vec::len), Some(1));
//!
//! let registry = SyncRegistry::load(&stores).unwrap();
//! assert_eq!(registry.status_of(&list), ItemSyncStatus::Never);
//! ```

pub mod bundle;
pub mod engine;
pub mod error;
pub mod http;
pub mod registry;
pub mod remote;
pub mod scheduler;
pub mod session;
pub mod shared;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use bundle::{apply_bundle, build_bundle, Bundle, BUNDLE_VERSION};
pub use engine::{PullOutcome, SyncEngine, SyncState};
pub use error::SyncError;
pub use http::HttpRemote;
pub use registry::{item_sync_status, ItemSyncStatus, SyncRegistry, Tracked};
pub use remote::{AuthToken, DocumentMeta, Grant, RemoteError, RemoteStore, SharedDocument};
pub use scheduler::DebounceScheduler;
pub use session::SyncSession;
pub use state::{SyncMeta, SyncSettings};
