//! Applying a [`SharePayload`] to the entity stores.

use std::fmt;

use super::{merge_quantity, ImportError, ImportMode};
use crate::models::{CategoryId, CustomCategory, DefaultItem, DefaultList, Item, Supermarket};
use crate::share::{ShareKind, SharePayload};
use crate::stores::{NewDefaultList, NewList, NewSupermarket, Stores};

/// Name used when an incoming list carries none.
pub const IMPORTED_NAME: &str = "Imported list";

/// What an import did.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Created { kind: ShareKind, id: String, name: String },
    Replaced { kind: ShareKind, id: String, name: String },
    Merged {
        kind: ShareKind,
        id: String,
        name: String,
        added: usize,
        combined: usize,
    },
    Categories { added: usize, total: usize },
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportOutcome::Created { kind, name, .. } => write!(f, "Created {} '{}'", kind, name),
            ImportOutcome::Replaced { kind, name, .. } => write!(f, "Replaced {} '{}'", kind, name),
            ImportOutcome::Merged {
                kind,
                name,
                added,
                combined,
                ..
            } => write!(
                f,
                "Merged into {} '{}': {} added, {} combined",
                kind, name, added, combined
            ),
            ImportOutcome::Categories { added, total } => {
                write!(f, "Categories: {} added, {} total", added, total)
            }
        }
    }
}

/// Items that can be matched by name and have their quantities combined.
pub trait Mergeable {
    fn name(&self) -> &str;
    fn quantity_mut(&mut self) -> &mut String;
    fn from_incoming(item: &DefaultItem) -> Self;
}

impl Mergeable for Item {
    fn name(&self) -> &str {
        &self.name
    }

    fn quantity_mut(&mut self) -> &mut String {
        &mut self.quantity
    }

    fn from_incoming(item: &DefaultItem) -> Self {
        item.to_item()
    }
}

impl Mergeable for DefaultItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn quantity_mut(&mut self) -> &mut String {
        &mut self.quantity
    }

    fn from_incoming(item: &DefaultItem) -> Self {
        item.clone()
    }
}

/// Merges incoming items into `existing` by case-insensitive name.
///
/// Matches keep their identity and get their quantity combined; the rest
/// are appended. Returns `(added, combined)`.
pub fn merge_items<T: Mergeable>(existing: &mut Vec<T>, incoming: &[DefaultItem]) -> (usize, usize) {
    let (mut added, mut combined) = (0, 0);
    for item in incoming {
        let name_lower = item.name.to_lowercase();
        match existing
            .iter_mut()
            .find(|e| e.name().to_lowercase() == name_lower)
        {
            Some(found) => {
                let merged = merge_quantity(found.quantity_mut(), &item.quantity);
                *found.quantity_mut() = merged;
                combined += 1;
            }
            None => {
                existing.push(T::from_incoming(item));
                added += 1;
            }
        }
    }
    (added, combined)
}

/// Imports a payload into the stores according to `mode`.
pub fn import_payload(
    stores: &Stores,
    payload: SharePayload,
    mode: ImportMode,
) -> Result<ImportOutcome, ImportError> {
    tracing::debug!("Importing {} with mode {}", payload.kind(), mode);
    match payload {
        SharePayload::List { name, items } => import_list(stores, name, items, mode),
        SharePayload::DefaultList { name, items } => import_default_list(stores, name, items, mode),
        SharePayload::Supermarket {
            name,
            category_order,
            custom_categories,
        } => import_supermarket(stores, name, category_order, custom_categories, mode),
        SharePayload::Categories(categories) => import_categories(stores, categories, mode),
    }
}

fn display_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        IMPORTED_NAME.to_string()
    } else {
        name.to_string()
    }
}

fn import_list(
    stores: &Stores,
    name: String,
    items: Vec<DefaultItem>,
    mode: ImportMode,
) -> Result<ImportOutcome, ImportError> {
    let store = stores.lists();
    let name = display_name(&name);
    let existing = match mode {
        ImportMode::New => None,
        ImportMode::Overwrite | ImportMode::Merge => store.find_by_name(&name)?,
    };

    let Some(mut list) = existing else {
        let list = store.create(NewList {
            name,
            items: items.iter().map(DefaultItem::to_item).collect(),
            supermarket_id: None,
        })?;
        return Ok(ImportOutcome::Created {
            kind: ShareKind::List,
            id: list.id,
            name: list.name,
        });
    };

    if mode == ImportMode::Overwrite {
        list.items = items.iter().map(DefaultItem::to_item).collect();
        let list = store.save(list)?;
        return Ok(ImportOutcome::Replaced {
            kind: ShareKind::List,
            id: list.id,
            name: list.name,
        });
    }

    let (added, combined) = merge_items(&mut list.items, &items);
    let list = store.save(list)?;
    Ok(ImportOutcome::Merged {
        kind: ShareKind::List,
        id: list.id,
        name: list.name,
        added,
        combined,
    })
}

fn import_default_list(
    stores: &Stores,
    name: Option<String>,
    items: Vec<DefaultItem>,
    mode: ImportMode,
) -> Result<ImportOutcome, ImportError> {
    let store = stores.default_lists();
    // A nameless default list targets the flagged one.
    let existing: Option<DefaultList> = match (mode, &name) {
        (ImportMode::New, _) => None,
        (_, Some(name)) => store.find_by_name(name)?,
        (_, None) => store.default_list()?,
    };

    let Some(mut list) = existing else {
        let list = store.create(NewDefaultList {
            name: display_name(name.as_deref().unwrap_or_default()),
            items,
            is_default: false,
        })?;
        return Ok(ImportOutcome::Created {
            kind: ShareKind::DefaultList,
            id: list.id,
            name: list.name,
        });
    };

    if mode == ImportMode::Overwrite {
        list.items = items;
        let list = store.save(list)?;
        return Ok(ImportOutcome::Replaced {
            kind: ShareKind::DefaultList,
            id: list.id,
            name: list.name,
        });
    }

    let (added, combined) = merge_items(&mut list.items, &items);
    let list = store.save(list)?;
    Ok(ImportOutcome::Merged {
        kind: ShareKind::DefaultList,
        id: list.id,
        name: list.name,
        added,
        combined,
    })
}

fn import_supermarket(
    stores: &Stores,
    name: String,
    category_order: Vec<CategoryId>,
    custom_categories: Vec<CustomCategory>,
    mode: ImportMode,
) -> Result<ImportOutcome, ImportError> {
    if mode == ImportMode::Merge {
        return Err(ImportError::UnsupportedMode {
            mode,
            kind: ShareKind::Supermarket,
        });
    }

    // Embedded categories the order refers to but this device lacks.
    let categories = stores.categories();
    let mut local = categories.get_all()?;
    let before = local.len();
    for category in custom_categories {
        if !local.iter().any(|c| c.id == category.id) {
            local.push(category);
        }
    }
    if local.len() > before {
        categories.replace_all(&local)?;
    }

    let store = stores.supermarkets();
    let name = display_name(&name);
    let existing: Option<Supermarket> = match mode {
        ImportMode::Overwrite => store.find_by_name(&name)?,
        _ => None,
    };

    match existing {
        Some(mut sm) => {
            sm.category_order = category_order;
            let sm = store.save(sm)?;
            Ok(ImportOutcome::Replaced {
                kind: ShareKind::Supermarket,
                id: sm.id,
                name: sm.name,
            })
        }
        None => {
            let sm = store.create(NewSupermarket {
                name,
                category_order,
            })?;
            Ok(ImportOutcome::Created {
                kind: ShareKind::Supermarket,
                id: sm.id,
                name: sm.name,
            })
        }
    }
}

fn import_categories(
    stores: &Stores,
    incoming: Vec<CustomCategory>,
    mode: ImportMode,
) -> Result<ImportOutcome, ImportError> {
    let store = stores.categories();

    if mode == ImportMode::Overwrite {
        let total = incoming.len();
        store.replace_all(&incoming)?;
        return Ok(ImportOutcome::Categories {
            added: total,
            total,
        });
    }

    let mut local = store.get_all()?;
    let mut added = 0;
    for category in incoming {
        let name_lower = category.name.to_lowercase();
        if !local.iter().any(|c| c.name.to_lowercase() == name_lower) {
            local.push(category);
            added += 1;
        }
    }
    if added > 0 {
        store.replace_all(&local)?;
    }
    Ok(ImportOutcome::Categories {
        added,
        total: local.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, quantity: &str) -> DefaultItem {
        DefaultItem::new(name, CategoryId::Builtin(2), quantity)
    }

    fn list_payload(name: &str, items: Vec<DefaultItem>) -> SharePayload {
        SharePayload::List {
            name: name.into(),
            items,
        }
    }

    #[test]
    fn test_new_mode_duplicates_on_collision() {
        let stores = Stores::in_memory();
        import_payload(&stores, list_payload("Weekly", vec![item("Latte", "1 L")]), ImportMode::New)
            .unwrap();
        import_payload(&stores, list_payload("weekly", vec![item("Latte", "1 L")]), ImportMode::New)
            .unwrap();

        let lists = stores.lists().get_all().unwrap();
        assert_eq!(lists.len(), 2);
        assert_ne!(lists[0].id, lists[1].id);
    }

    #[test]
    fn test_imported_items_are_fresh_and_unchecked() {
        let stores = Stores::in_memory();
        import_payload(
            &stores,
            list_payload("Weekly", vec![item("Latte", "1 L"), item("Pane", "")]),
            ImportMode::New,
        )
        .unwrap();

        let list = &stores.lists().get_all().unwrap()[0];
        assert!(list.items.iter().all(|i| !i.checked && !i.id.is_empty()));
        assert_ne!(list.items[0].id, list.items[1].id);
    }

    #[test]
    fn test_overwrite_replaces_matching_list() {
        let stores = Stores::in_memory();
        let existing = stores
            .lists()
            .create(NewList {
                name: "Weekly".into(),
                items: vec![item("Old", "1").to_item()],
                supermarket_id: None,
            })
            .unwrap();

        let outcome = import_payload(
            &stores,
            list_payload("WEEKLY", vec![item("New", "2")]),
            ImportMode::Overwrite,
        )
        .unwrap();

        assert!(matches!(outcome, ImportOutcome::Replaced { ref id, .. } if id == &existing.id));
        let lists = stores.lists().get_all().unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].items.len(), 1);
        assert_eq!(lists[0].items[0].name, "New");
    }

    #[test]
    fn test_overwrite_without_match_creates() {
        let stores = Stores::in_memory();
        let outcome =
            import_payload(&stores, list_payload("Weekly", vec![]), ImportMode::Overwrite).unwrap();
        assert!(matches!(outcome, ImportOutcome::Created { .. }));
    }

    #[test]
    fn test_merge_default_list_quantities() {
        let stores = Stores::in_memory();
        stores
            .default_lists()
            .create(NewDefaultList {
                name: "Basics".into(),
                items: vec![item("Latte", "1 L")],
                is_default: true,
            })
            .unwrap();

        let payload = SharePayload::DefaultList {
            name: Some("Basics".into()),
            items: vec![item("latte", "500 ml")],
        };
        import_payload(&stores, payload, ImportMode::Merge).unwrap();
        let dl = stores.default_lists().default_list().unwrap().unwrap();
        assert_eq!(dl.items.len(), 1);
        assert_eq!(dl.items[0].quantity, "1 L + 500 ml");

        let payload = SharePayload::DefaultList {
            name: None,
            items: vec![item("Latte", "1 L"), item("Uova", "6")],
        };
        let outcome = import_payload(&stores, payload, ImportMode::Merge).unwrap();
        assert!(matches!(outcome, ImportOutcome::Merged { added: 1, combined: 1, .. }));
        let dl = stores.default_lists().default_list().unwrap().unwrap();
        assert_eq!(dl.items[0].name, "Latte");
        assert_eq!(dl.items[0].quantity, "1 L + 500 ml + 1 L");
        assert_eq!(dl.items[1].name, "Uova");
    }

    #[test]
    fn test_merge_list_keeps_item_identity() {
        let stores = Stores::in_memory();
        let existing = stores
            .lists()
            .create(NewList {
                name: "Weekly".into(),
                items: vec![item("Latte", "1 L").to_item()],
                supermarket_id: None,
            })
            .unwrap();
        let item_id = existing.items[0].id.clone();

        import_payload(
            &stores,
            list_payload("Weekly", vec![item("Latte", "1 L")]),
            ImportMode::Merge,
        )
        .unwrap();

        let list = stores.lists().get(&existing.id).unwrap().unwrap();
        assert_eq!(list.items[0].id, item_id);
        assert_eq!(list.items[0].quantity, "2 L");
    }

    #[test]
    fn test_supermarket_merge_is_rejected() {
        let stores = Stores::in_memory();
        let payload = SharePayload::Supermarket {
            name: "Corner".into(),
            category_order: vec![],
            custom_categories: vec![],
        };
        let err = import_payload(&stores, payload, ImportMode::Merge).unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedMode { .. }));
    }

    #[test]
    fn test_supermarket_brings_missing_categories() {
        let stores = Stores::in_memory();
        let pets = CustomCategory::new("Pets", "🐶");
        let payload = SharePayload::Supermarket {
            name: "Corner".into(),
            category_order: vec![CategoryId::Builtin(1), pets.category_id()],
            custom_categories: vec![pets.clone()],
        };

        import_payload(&stores, payload.clone(), ImportMode::New).unwrap();
        import_payload(&stores, payload, ImportMode::Overwrite).unwrap();

        assert_eq!(stores.categories().get_all().unwrap(), vec![pets]);
        assert_eq!(stores.supermarkets().get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_categories_add_skips_known_names() {
        let stores = Stores::in_memory();
        stores.categories().create("Pets", None).unwrap();

        let payload = SharePayload::Categories(vec![
            CustomCategory::new("pets", "🐱"),
            CustomCategory::new("Garden", "🌱"),
        ]);
        let outcome = import_payload(&stores, payload, ImportMode::New).unwrap();

        assert_eq!(outcome, ImportOutcome::Categories { added: 1, total: 2 });
    }

    #[test]
    fn test_categories_overwrite_replaces_all() {
        let stores = Stores::in_memory();
        stores.categories().create("Pets", None).unwrap();

        let garden = CustomCategory::new("Garden", "🌱");
        import_payload(
            &stores,
            SharePayload::Categories(vec![garden.clone()]),
            ImportMode::Overwrite,
        )
        .unwrap();

        assert_eq!(stores.categories().get_all().unwrap(), vec![garden]);
    }
}
