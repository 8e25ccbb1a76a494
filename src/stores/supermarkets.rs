//! Supermarket store.

use serde_json::Value;

use super::{migrate, Collection, EntityKind, Record, StoreError};
use crate::models::{CategoryId, Supermarket};
use crate::storage::keys;

impl Record for Supermarket {
    const KEY: &'static str = keys::SUPERMARKETS;
    const KIND: EntityKind = EntityKind::Supermarket;

    fn id(&self) -> &str {
        &self.id
    }

    fn migrate(value: Value) -> Value {
        migrate::migrate_supermarket(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSupermarket {
    pub name: String,
    pub category_order: Vec<CategoryId>,
}

#[derive(Debug, Clone, Default)]
pub struct SupermarketUpdate {
    pub name: Option<String>,
    pub category_order: Option<Vec<CategoryId>>,
}

pub struct SupermarketStore {
    collection: Collection<Supermarket>,
}

impl SupermarketStore {
    pub(crate) fn new(collection: Collection<Supermarket>) -> Self {
        Self { collection }
    }

    pub fn get_all(&self) -> Result<Vec<Supermarket>, StoreError> {
        self.collection.load()
    }

    pub fn get(&self, id: &str) -> Result<Option<Supermarket>, StoreError> {
        Ok(self.get_all()?.into_iter().find(|s| s.id == id))
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Supermarket>, StoreError> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .get_all()?
            .into_iter()
            .find(|s| s.name.to_lowercase() == name_lower))
    }

    pub fn create(&self, new: NewSupermarket) -> Result<Supermarket, StoreError> {
        self.collection
            .upsert(Supermarket::new(new.name, new.category_order))
    }

    pub fn update(&self, id: &str, update: SupermarketUpdate) -> Result<Option<Supermarket>, StoreError> {
        self.collection.modify(id, |sm| {
            if let Some(name) = update.name {
                sm.name = name.trim().to_string();
            }
            if let Some(order) = update.category_order {
                sm.category_order = order;
            }
            sm.touch();
        })
    }

    pub fn save(&self, mut supermarket: Supermarket) -> Result<Supermarket, StoreError> {
        supermarket.touch();
        self.collection.upsert(supermarket)
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.collection.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::Stores;

    #[test]
    fn test_crud() {
        let stores = Stores::in_memory();
        let store = stores.supermarkets();

        let sm = store
            .create(NewSupermarket {
                name: " Corner ".into(),
                category_order: vec![CategoryId::Builtin(1), CategoryId::Builtin(5)],
            })
            .unwrap();
        assert_eq!(sm.name, "Corner");

        let updated = store
            .update(
                &sm.id,
                SupermarketUpdate {
                    category_order: Some(vec![CategoryId::Builtin(5)]),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.category_order, vec![CategoryId::Builtin(5)]);
        assert!(updated.updated_at >= sm.updated_at);

        assert!(store.find_by_name("CORNER").unwrap().is_some());
        assert!(store.delete(&sm.id).unwrap());
        assert!(store.get(&sm.id).unwrap().is_none());
    }
}
