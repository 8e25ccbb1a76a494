//! Entity stores over the local key-value store.
//!
//! Four independent collections (lists, default lists, supermarkets, custom
//! categories), each persisted as a JSON array under its own key. Every
//! write is synchronous and durable before the call returns, and emits a
//! [`Mutation`] on the shared channel so a sync scheduler can react.
//!
//! Reads migrate legacy record shapes on the fly; stored data is only
//! rewritten on the next explicit save.

mod categories;
mod default_lists;
mod lists;
pub mod migrate;
mod supermarkets;

pub use categories::{CategoryStore, CategoryUpdate};
pub use default_lists::{DefaultListStore, DefaultListUpdate, NewDefaultList};
pub use lists::{ItemUpdate, ListStore, ListUpdate, NewList};
pub use supermarkets::{NewSupermarket, SupermarketStore, SupermarketUpdate};

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::storage::{KeyValueStore, MemoryStore, StorageError};

/// Capacity of the mutation channel. Slow receivers see `Lagged`, which
/// still means "something changed".
const EVENT_CAPACITY: usize = 64;

/// The four synchronizable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    List,
    DefaultList,
    Supermarket,
    CustomCategories,
}

impl EntityKind {
    /// Registry key prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::List => "list",
            EntityKind::DefaultList => "dl",
            EntityKind::Supermarket => "sm",
            EntityKind::CustomCategories => "custom",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::List => write!(f, "list"),
            EntityKind::DefaultList => write!(f, "default list"),
            EntityKind::Supermarket => write!(f, "supermarket"),
            EntityKind::CustomCategories => write!(f, "custom categories"),
        }
    }
}

/// Emitted after every successful entity store write.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub kind: EntityKind,
    /// The affected entity, when a single one was touched.
    pub id: Option<String>,
}

/// Errors from entity store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode records: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// A record persisted in one of the entity collections.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Storage key of the collection.
    const KEY: &'static str;
    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Upgrades a raw stored record to the current shape.
    fn migrate(value: Value) -> Value {
        value
    }
}

/// Decodes records from a raw JSON array, migrating each one.
///
/// Records that still fail to decode are skipped with a warning; a value
/// that is not an array yields nothing. [`Collection::save`] writes the
/// skipped records back untouched.
pub fn decode_records<T: Record>(value: Value) -> Vec<T> {
    let Value::Array(raw) = value else {
        tracing::warn!("Ignoring malformed {} collection: not an array", T::KEY);
        return Vec::new();
    };

    raw.into_iter()
        .filter_map(|v| match serde_json::from_value(T::migrate(v)) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping unreadable record in {}: {}", T::KEY, e);
                None
            }
        })
        .collect()
}

/// Typed access to one collection.
pub(crate) struct Collection<T> {
    kv: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<Mutation>,
    _record: PhantomData<T>,
}

impl<T: Record> Collection<T> {
    /// Loads the collection, or `None` if it was never written.
    pub fn load_opt(&self) -> Result<Option<Vec<T>>, StoreError> {
        let Some(raw) = self.kv.get(T::KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Ok(Some(decode_records(value))),
            Err(e) => {
                tracing::warn!("Corrupted local value for {}: {}", T::KEY, e);
                Ok(Some(Vec::new()))
            }
        }
    }

    pub fn load(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.load_opt()?.unwrap_or_default())
    }

    /// Persists the collection and announces the change.
    ///
    /// Stored records that cannot be read are kept after the given ones.
    pub fn save(&self, records: &[T], id: Option<&str>) -> Result<(), StoreError> {
        let mut values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        values.extend(self.unreadable()?);
        self.kv.set(T::KEY, &serde_json::to_string(&values)?)?;
        // No receivers is fine: nobody is syncing.
        let _ = self.events.send(Mutation {
            kind: T::KIND,
            id: id.map(str::to_string),
        });
        Ok(())
    }

    /// Raw stored records that do not decode.
    ///
    /// A stored value that is not a JSON array is copied to
    /// `<key>_corrupt` before it gets overwritten.
    fn unreadable(&self) -> Result<Vec<Value>, StoreError> {
        let Some(raw) = self.kv.get(T::KEY)? else {
            return Ok(Vec::new());
        };
        let Ok(Value::Array(values)) = serde_json::from_str::<Value>(&raw) else {
            let backup = format!("{}_corrupt", T::KEY);
            tracing::warn!("Moving unreadable {} to {}", T::KEY, backup);
            self.kv.set(&backup, &raw)?;
            return Ok(Vec::new());
        };
        let kept: Vec<Value> = values
            .into_iter()
            .filter(|v| serde_json::from_value::<T>(T::migrate(v.clone())).is_err())
            .collect();
        if !kept.is_empty() {
            tracing::warn!("Keeping {} unreadable record(s) in {}", kept.len(), T::KEY);
        }
        Ok(kept)
    }

    /// Persists the collection as given, without announcing it. Unreadable
    /// stored records are dropped.
    pub fn replace(&self, records: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_string(records)?;
        self.kv.set(T::KEY, &json)?;
        Ok(())
    }

    /// Loads, applies `f` to the record with `id`, saves. Returns the
    /// updated record, or `None` if no record has that ID.
    pub fn modify<F>(&self, id: &str, f: F) -> Result<Option<T>, StoreError>
    where
        F: FnOnce(&mut T),
    {
        self.try_modify(id, |record| {
            f(record);
            Ok(())
        })
    }

    /// Like [`modify`](Self::modify), but `f` may reject the change. Nothing
    /// is saved or announced then, and its error is returned.
    pub fn try_modify<F>(&self, id: &str, f: F) -> Result<Option<T>, StoreError>
    where
        F: FnOnce(&mut T) -> Result<(), StoreError>,
    {
        let mut records = self.load()?;
        let Some(record) = records.iter_mut().find(|r| r.id() == id) else {
            return Ok(None);
        };
        f(record)?;
        let updated = record.clone();
        self.save(&records, Some(id))?;
        Ok(Some(updated))
    }

    /// Removes the record with `id`. Returns false if absent.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save(&records, Some(id))?;
        Ok(true)
    }

    /// Inserts or replaces a record by ID.
    pub fn upsert(&self, record: T) -> Result<T, StoreError> {
        let mut records = self.load()?;
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.save(&records, Some(record.id()))?;
        Ok(record)
    }
}

/// Handle to all entity stores sharing one key-value store and one
/// mutation channel.
#[derive(Clone)]
pub struct Stores {
    kv: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<Mutation>,
}

impl Stores {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { kv, events }
    }

    /// Stores backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The underlying key-value store.
    pub fn kv(&self) -> &dyn KeyValueStore {
        self.kv.as_ref()
    }

    /// Subscribes to mutation events from all entity stores.
    pub fn subscribe(&self) -> broadcast::Receiver<Mutation> {
        self.events.subscribe()
    }

    pub fn lists(&self) -> ListStore {
        ListStore::new(self.collection())
    }

    pub fn default_lists(&self) -> DefaultListStore {
        DefaultListStore::new(self.collection(), self.kv.clone())
    }

    pub fn supermarkets(&self) -> SupermarketStore {
        SupermarketStore::new(self.collection())
    }

    pub fn categories(&self) -> CategoryStore {
        CategoryStore::new(self.collection())
    }

    pub(crate) fn collection<T: Record>(&self) -> Collection<T> {
        Collection {
            kv: self.kv.clone(),
            events: self.events.clone(),
            _record: PhantomData,
        }
    }

    /// Reads a JSON value that is not an entity collection.
    ///
    /// A corrupted value is logged and treated as absent.
    pub(crate) fn read_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!("Corrupted local value for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Writes a JSON value that is not an entity collection. No event.
    pub(crate) fn write_value<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.kv.set(key, &json)?;
        Ok(())
    }

    pub(crate) fn remove_value(&self, key: &str) -> Result<(), StoreError> {
        self.kv.remove(key)?;
        Ok(())
    }
}

impl fmt::Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stores")
            .field("receivers", &self.events.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShoppingList;
    use crate::storage::keys;
    use serde_json::json;

    #[test]
    fn test_decode_skips_bad_records() {
        let value = json!([
            {"id": "a", "name": "Ok", "createdAt": "2024-01-01T00:00:00Z", "items": []},
            {"id": "b"},
        ]);
        let lists: Vec<ShoppingList> = decode_records(value);
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, "a");
    }

    #[test]
    fn test_save_keeps_unreadable_records() {
        let stores = Stores::in_memory();
        let raw = json!([
            {"id": "a", "name": "Ok", "createdAt": "2024-01-01T00:00:00Z", "items": []},
            {"id": "b", "name": 42},
        ]);
        stores.kv().set(keys::LISTS, &raw.to_string()).unwrap();

        let lists = stores.lists();
        assert_eq!(lists.get_all().unwrap().len(), 1);
        lists.create(NewList::named("Weekly")).unwrap();
        lists.delete("a").unwrap();

        let stored: Value = serde_json::from_str(&stores.kv().get(keys::LISTS).unwrap().unwrap()).unwrap();
        let stored = stored.as_array().unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.contains(&json!({"id": "b", "name": 42})));
        assert_eq!(lists.get_all().unwrap()[0].name, "Weekly");
    }

    #[test]
    fn test_save_backs_up_corrupted_collection() {
        let stores = Stores::in_memory();
        stores.kv().set(keys::LISTS, "{not json").unwrap();

        stores.lists().create(NewList::named("Weekly")).unwrap();

        let backup = format!("{}_corrupt", keys::LISTS);
        assert_eq!(stores.kv().get(&backup).unwrap().as_deref(), Some("{not json"));
        assert_eq!(stores.lists().get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_replace_drops_unreadable_records() {
        let stores = Stores::in_memory();
        stores.kv().set(keys::LISTS, r#"[{"id": "b"}]"#).unwrap();

        stores
            .collection::<ShoppingList>()
            .replace(&[ShoppingList::new("Remote")])
            .unwrap();

        let stored = stores.kv().get(keys::LISTS).unwrap().unwrap();
        assert!(!stored.contains(r#""id":"b""#));
    }

    #[test]
    fn test_decode_non_array_is_empty() {
        let lists: Vec<ShoppingList> = decode_records(json!({"not": "an array"}));
        assert!(lists.is_empty());
    }

    #[test]
    fn test_corrupted_collection_reads_empty() {
        let stores = Stores::in_memory();
        stores.kv().set(keys::LISTS, "{not json").unwrap();
        assert!(stores.lists().get_all().unwrap().is_empty());
    }

    #[test]
    fn test_writes_emit_mutations() {
        let stores = Stores::in_memory();
        let mut events = stores.subscribe();

        let list = stores.lists().create(NewList::named("Weekly")).unwrap();

        let event = events.try_recv().unwrap();
        assert_eq!(event.kind, EntityKind::List);
        assert_eq!(event.id.as_deref(), Some(list.id.as_str()));
    }

    #[test]
    fn test_replace_is_silent() {
        let stores = Stores::in_memory();
        let mut events = stores.subscribe();

        stores
            .collection::<ShoppingList>()
            .replace(&[ShoppingList::new("Quiet")])
            .unwrap();

        assert!(events.try_recv().is_err());
        assert_eq!(stores.lists().get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_read_value_corrupted_is_none() {
        let stores = Stores::in_memory();
        stores.kv().set("k", "garbage").unwrap();
        let value: Option<serde_json::Value> = stores.read_value("k").unwrap();
        assert!(value.is_none());
    }
}
