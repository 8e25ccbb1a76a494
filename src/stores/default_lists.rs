//! Default list store.
//!
//! At most one default list carries `is_default`. The first list created is
//! flagged; deleting the flagged list promotes the first remaining one.

use std::sync::Arc;

use serde_json::Value;

use super::{migrate, Collection, EntityKind, Record, StoreError};
use crate::models::{DefaultItem, DefaultList};
use crate::storage::{keys, KeyValueStore};

impl Record for DefaultList {
    const KEY: &'static str = keys::DEFAULT_LISTS;
    const KIND: EntityKind = EntityKind::DefaultList;

    fn id(&self) -> &str {
        &self.id
    }

    fn migrate(value: Value) -> Value {
        migrate::migrate_default_list(value)
    }
}

/// Fields for a new default list.
#[derive(Debug, Clone, Default)]
pub struct NewDefaultList {
    pub name: String,
    pub items: Vec<DefaultItem>,
    pub is_default: bool,
}

/// Partial update of a default list.
#[derive(Debug, Clone, Default)]
pub struct DefaultListUpdate {
    pub name: Option<String>,
    pub items: Option<Vec<DefaultItem>>,
}

pub struct DefaultListStore {
    collection: Collection<DefaultList>,
    kv: Arc<dyn KeyValueStore>,
}

impl DefaultListStore {
    pub(crate) fn new(collection: Collection<DefaultList>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self { collection, kv }
    }

    /// All default lists.
    ///
    /// When only the legacy single item array exists it is presented as one
    /// flagged list named "Default".
    pub fn get_all(&self) -> Result<Vec<DefaultList>, StoreError> {
        if let Some(lists) = self.collection.load_opt()? {
            return Ok(lists);
        }
        let Some(raw) = self.kv.get(keys::LEGACY_DEFAULT_ITEMS)? else {
            return Ok(Vec::new());
        };
        let legacy = serde_json::from_str::<Value>(&raw)
            .ok()
            .and_then(migrate::legacy_default_list);
        Ok(legacy.into_iter().collect())
    }

    pub fn get(&self, id: &str) -> Result<Option<DefaultList>, StoreError> {
        Ok(self.get_all()?.into_iter().find(|l| l.id == id))
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<DefaultList>, StoreError> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .get_all()?
            .into_iter()
            .find(|l| l.name.to_lowercase() == name_lower))
    }

    /// The flagged default list, or the first one.
    pub fn default_list(&self) -> Result<Option<DefaultList>, StoreError> {
        let all = self.get_all()?;
        let flagged = all.iter().position(|l| l.is_default);
        Ok(all.into_iter().nth(flagged.unwrap_or(0)))
    }

    pub fn create(&self, new: NewDefaultList) -> Result<DefaultList, StoreError> {
        let mut all = self.get_all()?;
        let mut list = DefaultList::new(new.name);
        list.items = new.items;
        list.is_default = new.is_default || all.is_empty();
        if list.is_default {
            for other in &mut all {
                other.is_default = false;
            }
        }
        all.push(list.clone());
        self.collection.save(&all, Some(&list.id))?;
        Ok(list)
    }

    pub fn update(&self, id: &str, update: DefaultListUpdate) -> Result<Option<DefaultList>, StoreError> {
        self.modify(id, |list| {
            if let Some(name) = update.name {
                list.name = name.trim().to_string();
            }
            if let Some(items) = update.items {
                list.items = items;
            }
        })
    }

    /// Replaces a whole default list (by ID), keeping the single-flag rule.
    pub fn save(&self, mut list: DefaultList) -> Result<DefaultList, StoreError> {
        let mut all = self.get_all()?;
        list.touch();
        if list.is_default {
            for other in &mut all {
                other.is_default = false;
            }
        }
        match all.iter_mut().find(|l| l.id == list.id) {
            Some(existing) => *existing = list.clone(),
            None => all.push(list.clone()),
        }
        ensure_one_default(&mut all);
        self.collection.save(&all, Some(&list.id))?;
        Ok(list)
    }

    /// Deletes a list; promotes another if the flagged one was removed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut all = self.get_all()?;
        let before = all.len();
        all.retain(|l| l.id != id);
        if all.len() == before {
            return Ok(false);
        }
        ensure_one_default(&mut all);
        self.collection.save(&all, Some(id))?;
        Ok(true)
    }

    /// Flags `id` as the default list, clearing the flag elsewhere.
    pub fn set_default(&self, id: &str) -> Result<Option<DefaultList>, StoreError> {
        let mut all = self.get_all()?;
        if !all.iter().any(|l| l.id == id) {
            return Ok(None);
        }
        let mut flagged = None;
        for list in &mut all {
            let is_target = list.id == id;
            if list.is_default != is_target {
                list.is_default = is_target;
                list.touch();
            }
            if is_target {
                flagged = Some(list.clone());
            }
        }
        self.collection.save(&all, Some(id))?;
        Ok(flagged)
    }

    pub fn add_item(&self, id: &str, item: DefaultItem) -> Result<Option<DefaultList>, StoreError> {
        self.modify(id, |list| list.items.push(item))
    }

    /// Removes the item at `index`. Out-of-range indexes are ignored.
    pub fn remove_item(&self, id: &str, index: usize) -> Result<Option<DefaultList>, StoreError> {
        self.modify(id, |list| {
            if index < list.items.len() {
                list.items.remove(index);
            }
        })
    }

    fn modify<F>(&self, id: &str, f: F) -> Result<Option<DefaultList>, StoreError>
    where
        F: FnOnce(&mut DefaultList),
    {
        let Some(mut list) = self.get(id)? else {
            return Ok(None);
        };
        f(&mut list);
        self.save(list).map(Some)
    }
}

/// Keeps exactly one flagged list in a non-empty collection.
fn ensure_one_default(lists: &mut [DefaultList]) {
    let mut seen = false;
    for list in lists.iter_mut() {
        if list.is_default {
            if seen {
                list.is_default = false;
            }
            seen = true;
        }
    }
    if !seen {
        if let Some(first) = lists.first_mut() {
            first.is_default = true;
            first.touch();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryId;
    use crate::stores::Stores;
    use serde_json::json;

    fn named(name: &str) -> NewDefaultList {
        NewDefaultList {
            name: name.into(),
            ..Default::default()
        }
    }

    fn flagged(store: &DefaultListStore) -> Vec<String> {
        store
            .get_all()
            .unwrap()
            .into_iter()
            .filter(|l| l.is_default)
            .map(|l| l.name)
            .collect()
    }

    #[test]
    fn test_first_created_is_default() {
        let stores = Stores::in_memory();
        let store = stores.default_lists();

        let first = store.create(named("Basics")).unwrap();
        let second = store.create(named("Party")).unwrap();

        assert!(first.is_default);
        assert!(!second.is_default);
        assert_eq!(flagged(&store), vec!["Basics"]);
    }

    #[test]
    fn test_create_flagged_clears_others() {
        let stores = Stores::in_memory();
        let store = stores.default_lists();
        store.create(named("Basics")).unwrap();
        store
            .create(NewDefaultList {
                name: "Party".into(),
                is_default: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(flagged(&store), vec!["Party"]);
    }

    #[test]
    fn test_set_default() {
        let stores = Stores::in_memory();
        let store = stores.default_lists();
        store.create(named("Basics")).unwrap();
        let party = store.create(named("Party")).unwrap();

        store.set_default(&party.id).unwrap().unwrap();

        assert_eq!(flagged(&store), vec!["Party"]);
        assert!(store.set_default("missing").unwrap().is_none());
    }

    #[test]
    fn test_deleting_flagged_promotes_remaining() {
        let stores = Stores::in_memory();
        let store = stores.default_lists();
        let basics = store.create(named("Basics")).unwrap();
        store.create(named("Party")).unwrap();

        assert!(store.delete(&basics.id).unwrap());

        assert_eq!(flagged(&store), vec!["Party"]);
    }

    #[test]
    fn test_delete_last_leaves_empty() {
        let stores = Stores::in_memory();
        let store = stores.default_lists();
        let only = store.create(named("Basics")).unwrap();
        assert!(store.delete(&only.id).unwrap());
        assert!(store.get_all().unwrap().is_empty());
        assert!(store.default_list().unwrap().is_none());
    }

    #[test]
    fn test_item_operations() {
        let stores = Stores::in_memory();
        let store = stores.default_lists();
        let list = store.create(named("Basics")).unwrap();

        let list = store
            .add_item(&list.id, DefaultItem::new("Milk", CategoryId::Builtin(2), "1 L"))
            .unwrap()
            .unwrap();
        assert_eq!(list.items.len(), 1);

        let list = store.remove_item(&list.id, 5).unwrap().unwrap();
        assert_eq!(list.items.len(), 1);
        let list = store.remove_item(&list.id, 0).unwrap().unwrap();
        assert!(list.items.is_empty());
    }

    #[test]
    fn test_legacy_items_presented_as_default_list() {
        let stores = Stores::in_memory();
        let legacy = json!([{"name": "Yogurt", "categoryId": "dairy", "quantity": "4"}]);
        stores
            .kv()
            .set(keys::LEGACY_DEFAULT_ITEMS, &legacy.to_string())
            .unwrap();

        let store = stores.default_lists();
        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_default);
        assert_eq!(all[0].items[0].category_id, CategoryId::Builtin(2));

        // Saving writes the new key; the legacy key is no longer consulted.
        store.create(named("Party")).unwrap();
        assert_eq!(store.get_all().unwrap().len(), 2);
        assert_eq!(flagged(&store), vec!["Default"]);
    }
}
