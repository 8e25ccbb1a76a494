//! Custom category store. The whole set is one sync unit.

use super::{Collection, EntityKind, Record, StoreError};
use crate::models::CustomCategory;
use crate::storage::keys;

/// Emoji used when none is given.
pub const DEFAULT_EMOJI: &str = "📦";

impl Record for CustomCategory {
    const KEY: &'static str = keys::CUSTOM_CATEGORIES;
    const KIND: EntityKind = EntityKind::CustomCategories;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub emoji: Option<String>,
}

pub struct CategoryStore {
    collection: Collection<CustomCategory>,
}

impl CategoryStore {
    pub(crate) fn new(collection: Collection<CustomCategory>) -> Self {
        Self { collection }
    }

    pub fn get_all(&self) -> Result<Vec<CustomCategory>, StoreError> {
        self.collection.load()
    }

    pub fn create(&self, name: &str, emoji: Option<&str>) -> Result<CustomCategory, StoreError> {
        self.collection
            .upsert(CustomCategory::new(name, emoji.unwrap_or(DEFAULT_EMOJI)))
    }

    pub fn update(&self, id: &str, update: CategoryUpdate) -> Result<Option<CustomCategory>, StoreError> {
        self.collection.modify(id, |cat| {
            if let Some(name) = update.name {
                cat.name = name.trim().to_string();
            }
            if let Some(emoji) = update.emoji {
                cat.emoji = emoji;
            }
        })
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.collection.delete(id)
    }

    /// Replaces the entire collection.
    pub fn replace_all(&self, categories: &[CustomCategory]) -> Result<(), StoreError> {
        self.collection.save(categories, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::Stores;

    #[test]
    fn test_create_update_delete() {
        let stores = Stores::in_memory();
        let store = stores.categories();

        let cat = store.create("Pets", None).unwrap();
        assert_eq!(cat.emoji, DEFAULT_EMOJI);

        let cat = store
            .update(
                &cat.id,
                CategoryUpdate {
                    emoji: Some("🐶".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(cat.emoji, "🐶");

        assert!(store.delete(&cat.id).unwrap());
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_replace_all() {
        let stores = Stores::in_memory();
        let store = stores.categories();
        store.create("Old", None).unwrap();

        let fresh = vec![CustomCategory::new("New", "🆕")];
        store.replace_all(&fresh).unwrap();

        assert_eq!(store.get_all().unwrap(), fresh);
    }
}
