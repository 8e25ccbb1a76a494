//! Local persistent key-value storage.
//!
//! The engine only needs get/set/remove of named string values. Each
//! collection, the sync metadata, the sync settings and the sync registry
//! live under their own key (see [`keys`]).

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::io;
use std::path::PathBuf;

/// Well-known key names.
pub mod keys {
    pub const LISTS: &str = "shoplist_lists";
    pub const DEFAULT_LISTS: &str = "shoplist_default_lists";
    /// Single default item array written by older versions.
    pub const LEGACY_DEFAULT_ITEMS: &str = "shoplist_default_list";
    pub const SUPERMARKETS: &str = "shoplist_supermarkets";
    pub const CUSTOM_CATEGORIES: &str = "shoplist_custom_categories";
    pub const SYNC_META: &str = "shoplist_sync_meta";
    pub const SYNC_SETTINGS: &str = "shoplist_sync_settings";
    pub const SYNC_REGISTRY: &str = "shoplist_sync_registry";
}

/// A synchronous, immediately durable key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value for `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Errors that can occur reading or writing the local store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}
