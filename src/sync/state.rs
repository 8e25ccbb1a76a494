//! Persisted sync metadata and user sync settings.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::keys;
use crate::stores::{StoreError, Stores};

pub const DEFAULT_DELAY_MS: u64 = 3000;
pub const MIN_DELAY_MS: u64 = 500;
pub const MAX_DELAY_MS: u64 = 300_000;

/// When this device last synced, and the clock of the bundle it holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMeta {
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SyncMeta {
    pub fn load(stores: &Stores) -> Result<Self, StoreError> {
        Ok(stores.read_value(keys::SYNC_META)?.unwrap_or_default())
    }

    pub fn save(&self, stores: &Stores) -> Result<(), StoreError> {
        stores.write_value(keys::SYNC_META, self)
    }

    pub fn clear(stores: &Stores) -> Result<(), StoreError> {
        stores.remove_value(keys::SYNC_META)
    }
}

/// Auto-sync preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    #[serde(default = "default_auto_sync")]
    pub auto_sync: bool,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_auto_sync() -> bool {
    true
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto_sync: true,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl SyncSettings {
    /// Loads settings; missing fields take their defaults.
    pub fn load(stores: &Stores) -> Result<Self, StoreError> {
        let settings: Self = stores.read_value(keys::SYNC_SETTINGS)?.unwrap_or_default();
        Ok(settings.clamped())
    }

    pub fn save(&self, stores: &Stores) -> Result<(), StoreError> {
        stores.write_value(keys::SYNC_SETTINGS, &self.clamped())
    }

    pub fn clamped(self) -> Self {
        Self {
            delay_ms: self.delay_ms.clamp(MIN_DELAY_MS, MAX_DELAY_MS),
            ..self
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
