//! The replication unit: a snapshot of all four collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::registry::SyncRegistry;
use super::state::SyncMeta;
use crate::models::{CustomCategory, DefaultList, ShoppingList, Supermarket};
use crate::stores::{decode_records, Record, StoreError, Stores};

pub const BUNDLE_VERSION: u32 = 1;

/// Snapshot of all synchronizable collections.
///
/// `updated_at` is the bundle's logical clock, stamped when it is built. A
/// collection that is `None` was absent from a received bundle and leaves
/// the local collection untouched when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lists: Option<Vec<ShoppingList>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_lists: Option<Vec<DefaultList>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supermarkets: Option<Vec<Supermarket>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_categories: Option<Vec<CustomCategory>>,
}

/// Bundle as received, before records are migrated.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBundle {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    lists: Option<Value>,
    #[serde(default)]
    default_lists: Option<Value>,
    #[serde(default)]
    supermarkets: Option<Value>,
    #[serde(default)]
    custom_categories: Option<Value>,
}

fn records<T: Record>(raw: Option<Value>) -> Option<Vec<T>> {
    raw.map(decode_records)
}

impl Bundle {
    /// Decodes a bundle read from the remote store.
    ///
    /// Records are migrated like local reads; unreadable records are
    /// skipped. A missing `updatedAt` counts as the epoch, so such a bundle
    /// never wins a pull.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let raw: RawBundle = serde_json::from_value(value)?;
        Ok(Self {
            version: raw.version.unwrap_or(BUNDLE_VERSION),
            updated_at: raw.updated_at.unwrap_or_default(),
            lists: records(raw.lists),
            default_lists: records(raw.default_lists),
            supermarkets: records(raw.supermarkets),
            custom_categories: records(raw.custom_categories),
        })
    }
}

/// Snapshots the four stores, stamped now.
pub fn build_bundle(stores: &Stores) -> Result<Bundle, StoreError> {
    Ok(Bundle {
        version: BUNDLE_VERSION,
        updated_at: Utc::now(),
        lists: Some(stores.lists().get_all()?),
        default_lists: Some(stores.default_lists().get_all()?),
        supermarkets: Some(stores.supermarkets().get_all()?),
        custom_categories: Some(stores.categories().get_all()?),
    })
}

/// Replaces every collection present in `bundle`, then marks everything
/// in it synced as of now and records the bundle's clock.
///
/// Writes here do not emit mutation events.
pub fn apply_bundle(stores: &Stores, bundle: &Bundle) -> Result<(), StoreError> {
    if let Some(lists) = &bundle.lists {
        stores.collection::<ShoppingList>().replace(lists)?;
    }
    if let Some(default_lists) = &bundle.default_lists {
        stores.collection::<DefaultList>().replace(default_lists)?;
    }
    if let Some(supermarkets) = &bundle.supermarkets {
        stores.collection::<Supermarket>().replace(supermarkets)?;
    }
    if let Some(categories) = &bundle.custom_categories {
        stores.collection::<CustomCategory>().replace(categories)?;
    }

    let now = Utc::now();
    SyncRegistry::from_bundle(bundle, now).save(stores)?;
    SyncMeta {
        last_sync: Some(now),
        updated_at: Some(bundle.updated_at),
    }
    .save(stores)?;
    Ok(())
}
