//! Shoplist core library.
//!
//! Offline-first shopping lists: entity stores over a local key-value
//! store, cross-device sync through a remote document store, and link
//! sharing with an import merge engine.

pub mod import;
pub mod models;
pub mod share;
pub mod storage;
pub mod stores;
pub mod sync;

pub use import::{ImportError, ImportMode, ImportOutcome};
pub use models::{
    CategoryId, CustomCategory, DefaultItem, DefaultList, Item, ListStatus, ShoppingList,
    Supermarket,
};
pub use share::{ShareKind, SharePayload};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use stores::{EntityKind, Mutation, StoreError, Stores};
pub use sync::{AuthToken, HttpRemote, SyncEngine, SyncError, SyncSession};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
