//! Per-entity sync tracking.
//!
//! The registry maps `list:<id>`, `dl:<id>`, `sm:<id>` and `custom` to the
//! time the entity last matched the remote. It is rebuilt wholesale after
//! every successful push or pull. Whether an entity is dirty is computed on
//! read from its own modification time; nothing is flagged on the entity.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bundle::Bundle;
use crate::models::{DefaultList, ShoppingList, Supermarket};
use crate::storage::keys;
use crate::stores::{EntityKind, StoreError, Stores};

/// Derived sync status of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSyncStatus {
    /// Unchanged since the last sync.
    Synced,
    /// Modified after the last sync.
    Dirty,
    /// Never synced from this device.
    Never,
}

impl fmt::Display for ItemSyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemSyncStatus::Synced => write!(f, "synced"),
            ItemSyncStatus::Dirty => write!(f, "dirty"),
            ItemSyncStatus::Never => write!(f, "never"),
        }
    }
}

/// Classifies an entity from its last sync time and modification time.
///
/// An entity without a modification time is presumed synced once it has
/// been synced at all.
pub fn item_sync_status(
    synced_at: Option<DateTime<Utc>>,
    last_modified: Option<DateTime<Utc>>,
) -> ItemSyncStatus {
    match (synced_at, last_modified) {
        (None, _) => ItemSyncStatus::Never,
        (Some(synced), Some(modified)) if modified > synced => ItemSyncStatus::Dirty,
        _ => ItemSyncStatus::Synced,
    }
}

/// An entity whose sync status can be tracked.
pub trait Tracked {
    const KIND: EntityKind;

    fn tracking_id(&self) -> &str;
    fn last_modified(&self) -> Option<DateTime<Utc>>;
}

impl Tracked for ShoppingList {
    const KIND: EntityKind = EntityKind::List;

    fn tracking_id(&self) -> &str {
        &self.id
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Tracked for DefaultList {
    const KIND: EntityKind = EntityKind::DefaultList;

    fn tracking_id(&self) -> &str {
        &self.id
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Tracked for Supermarket {
    const KIND: EntityKind = EntityKind::Supermarket;

    fn tracking_id(&self) -> &str {
        &self.id
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncRegistry(BTreeMap<String, DateTime<Utc>>);

impl SyncRegistry {
    /// Registry key for an entity. Custom categories share one key.
    pub fn key(kind: EntityKind, id: &str) -> String {
        match kind {
            EntityKind::CustomCategories => kind.prefix().to_string(),
            _ => format!("{}:{}", kind.prefix(), id),
        }
    }

    /// Marks every entity in the bundle, plus the category set, synced at `at`.
    pub fn from_bundle(bundle: &Bundle, at: DateTime<Utc>) -> Self {
        let mut entries = BTreeMap::new();
        let mut mark = |kind: EntityKind, id: &str| {
            entries.insert(Self::key(kind, id), at);
        };
        for list in bundle.lists.iter().flatten() {
            mark(EntityKind::List, &list.id);
        }
        for list in bundle.default_lists.iter().flatten() {
            mark(EntityKind::DefaultList, &list.id);
        }
        for sm in bundle.supermarkets.iter().flatten() {
            mark(EntityKind::Supermarket, &sm.id);
        }
        mark(EntityKind::CustomCategories, "");
        Self(entries)
    }

    /// Loads the registry; a corrupted one reads as empty.
    pub fn load(stores: &Stores) -> Result<Self, StoreError> {
        Ok(stores.read_value(keys::SYNC_REGISTRY)?.unwrap_or_default())
    }

    pub fn save(&self, stores: &Stores) -> Result<(), StoreError> {
        stores.write_value(keys::SYNC_REGISTRY, self)
    }

    pub fn synced_at(&self, kind: EntityKind, id: &str) -> Option<DateTime<Utc>> {
        self.0.get(&Self::key(kind, id)).copied()
    }

    pub fn status(
        &self,
        kind: EntityKind,
        id: &str,
        last_modified: Option<DateTime<Utc>>,
    ) -> ItemSyncStatus {
        item_sync_status(self.synced_at(kind, id), last_modified)
    }

    pub fn status_of<T: Tracked>(&self, entity: &T) -> ItemSyncStatus {
        self.status(T::KIND, entity.tracking_id(), entity.last_modified())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
