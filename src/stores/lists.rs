//! Shopping list store.

use serde_json::Value;

use super::{migrate, Collection, EntityKind, Record, StoreError};
use crate::import::combine_items;
use crate::models::{CategoryId, DefaultList, Item, ListStatus, ShoppingList};
use crate::storage::keys;

impl Record for ShoppingList {
    const KEY: &'static str = keys::LISTS;
    const KIND: EntityKind = EntityKind::List;

    fn id(&self) -> &str {
        &self.id
    }

    fn migrate(value: Value) -> Value {
        migrate::migrate_list(value)
    }
}

/// Fields for a new list.
#[derive(Debug, Clone, Default)]
pub struct NewList {
    pub name: String,
    pub items: Vec<Item>,
    pub supermarket_id: Option<String>,
}

impl NewList {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Seeds the list with the combined items of the given default lists.
    pub fn from_defaults(name: impl Into<String>, defaults: &[DefaultList]) -> Self {
        let items = combine_items(defaults).iter().map(|d| d.to_item()).collect();
        Self {
            name: name.into(),
            items,
            supermarket_id: None,
        }
    }
}

/// Partial update of a list. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ListUpdate {
    pub name: Option<String>,
    pub status: Option<ListStatus>,
    /// `Some(None)` clears the supermarket.
    pub supermarket_id: Option<Option<String>>,
    pub items: Option<Vec<Item>>,
}

/// Partial update of a list item.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub quantity: Option<String>,
    pub checked: Option<bool>,
}

/// CRUD over the shopping list collection.
pub struct ListStore {
    collection: Collection<ShoppingList>,
}

impl ListStore {
    pub(crate) fn new(collection: Collection<ShoppingList>) -> Self {
        Self { collection }
    }

    pub fn get_all(&self) -> Result<Vec<ShoppingList>, StoreError> {
        self.collection.load()
    }

    pub fn get(&self, id: &str) -> Result<Option<ShoppingList>, StoreError> {
        Ok(self.get_all()?.into_iter().find(|l| l.id == id))
    }

    /// Finds a list by name (case-insensitive, first match).
    pub fn find_by_name(&self, name: &str) -> Result<Option<ShoppingList>, StoreError> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .get_all()?
            .into_iter()
            .find(|l| l.name.to_lowercase() == name_lower))
    }

    pub fn create(&self, new: NewList) -> Result<ShoppingList, StoreError> {
        let mut list = ShoppingList::new(new.name).with_items(new.items);
        list.supermarket_id = new.supermarket_id;
        tracing::debug!("Creating list {} ({})", list.name, list.id);
        self.collection.upsert(list)
    }

    pub fn update(&self, id: &str, update: ListUpdate) -> Result<Option<ShoppingList>, StoreError> {
        self.collection.modify(id, |list| {
            if let Some(name) = update.name {
                list.name = name.trim().to_string();
            }
            if let Some(status) = update.status {
                list.status = status;
            }
            if let Some(supermarket_id) = update.supermarket_id {
                list.supermarket_id = supermarket_id;
            }
            if let Some(items) = update.items {
                list.items = items;
            }
            list.touch();
        })
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.collection.delete(id)
    }

    /// Replaces a whole list (by ID), refreshing its modification time.
    pub fn save(&self, mut list: ShoppingList) -> Result<ShoppingList, StoreError> {
        list.touch();
        self.collection.upsert(list)
    }

    /// Appends an item. The item is always stored unchecked.
    pub fn add_item(&self, list_id: &str, mut item: Item) -> Result<Option<ShoppingList>, StoreError> {
        item.checked = false;
        self.collection.modify(list_id, |list| {
            list.items.push(item);
            list.touch();
        })
    }

    /// Item operations return `Ok(None)` for a missing list and
    /// [`StoreError::NotFound`] for a missing item; the list is left untouched.
    pub fn remove_item(&self, list_id: &str, item_id: &str) -> Result<Option<ShoppingList>, StoreError> {
        self.collection.try_modify(list_id, |list| {
            let before = list.items.len();
            list.items.retain(|i| i.id != item_id);
            if list.items.len() == before {
                return Err(item_not_found(item_id));
            }
            list.touch();
            Ok(())
        })
    }

    pub fn toggle_item(&self, list_id: &str, item_id: &str) -> Result<Option<ShoppingList>, StoreError> {
        self.collection.try_modify(list_id, |list| {
            let item = find_item(list, item_id)?;
            item.checked = !item.checked;
            list.touch();
            Ok(())
        })
    }

    pub fn update_item(
        &self,
        list_id: &str,
        item_id: &str,
        update: ItemUpdate,
    ) -> Result<Option<ShoppingList>, StoreError> {
        self.collection.try_modify(list_id, |list| {
            let item = find_item(list, item_id)?;
            if let Some(name) = update.name {
                item.name = name.trim().to_string();
            }
            if let Some(category_id) = update.category_id {
                item.category_id = category_id;
            }
            if let Some(quantity) = update.quantity {
                item.quantity = quantity.trim().to_string();
            }
            if let Some(checked) = update.checked {
                item.checked = checked;
            }
            list.touch();
            Ok(())
        })
    }

    pub fn set_status(&self, list_id: &str, status: ListStatus) -> Result<Option<ShoppingList>, StoreError> {
        self.update(
            list_id,
            ListUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
    }
}

fn find_item<'a>(list: &'a mut ShoppingList, item_id: &str) -> Result<&'a mut Item, StoreError> {
    list.items
        .iter_mut()
        .find(|i| i.id == item_id)
        .ok_or_else(|| item_not_found(item_id))
}

fn item_not_found(item_id: &str) -> StoreError {
    StoreError::NotFound(format!("item {}", item_id))
}
