//! Pure, idempotent upgrades of legacy record shapes.
//!
//! These operate on raw JSON so records that no longer match the current
//! types can still be read. Nothing here touches storage.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::{resolve_legacy_category_id, CategoryId, DefaultItem, DefaultList};

/// Name given to a default list synthesized from the legacy item array.
pub const LEGACY_DEFAULT_NAME: &str = "Default";
/// ID given to a default list synthesized from the legacy item array.
pub const LEGACY_DEFAULT_ID: &str = "legacy-default";

/// Upgrades a list or default-list item.
///
/// - `department` keyword (old format) becomes `categoryId`
/// - legacy keyword `categoryId` values become built-in integer IDs
/// - numeric quantities become strings, a missing quantity becomes `""`
pub fn migrate_item(value: Value) -> Value {
    let Value::Object(mut item) = value else {
        return value;
    };

    let raw_category = match item.get("categoryId") {
        Some(v) if !v.is_null() => Some(v.clone()),
        _ => item.get("department").cloned(),
    };
    item.remove("department");
    let category = raw_category
        .map(|v| resolve_legacy_category_id(&v))
        .unwrap_or_else(CategoryId::other);
    item.insert("categoryId".to_string(), Value::from(&category));

    let quantity = match item.get("quantity") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    item.insert("quantity".to_string(), Value::String(quantity));

    Value::Object(item)
}

/// Upgrades a shopping list record.
pub fn migrate_list(value: Value) -> Value {
    migrate_items_field(value)
}

/// Upgrades a default list record.
pub fn migrate_default_list(value: Value) -> Value {
    migrate_items_field(value)
}

/// Upgrades a supermarket record: legacy keywords in `categoryOrder`.
pub fn migrate_supermarket(value: Value) -> Value {
    let Value::Object(mut sm) = value else {
        return value;
    };
    if let Some(Value::Array(order)) = sm.remove("categoryOrder") {
        let resolved = order
            .iter()
            .map(|id| Value::from(&resolve_legacy_category_id(id)))
            .collect();
        sm.insert("categoryOrder".to_string(), Value::Array(resolved));
    }
    Value::Object(sm)
}

/// Builds a default list from the legacy single item array.
pub fn legacy_default_list(items: Value) -> Option<DefaultList> {
    let Value::Array(raw) = items else {
        return None;
    };
    let items: Vec<DefaultItem> = raw
        .into_iter()
        .filter_map(|v| serde_json::from_value(migrate_item(v)).ok())
        .collect();

    Some(DefaultList {
        id: LEGACY_DEFAULT_ID.to_string(),
        name: LEGACY_DEFAULT_NAME.to_string(),
        items,
        is_default: true,
        created_at: DateTime::<Utc>::default(),
        updated_at: None,
    })
}

fn migrate_items_field(value: Value) -> Value {
    let Value::Object(mut record) = value else {
        return value;
    };
    if let Some(Value::Array(items)) = record.remove("items") {
        let migrated = items.into_iter().map(migrate_item).collect();
        record.insert("items".to_string(), Value::Array(migrated));
    }
    Value::Object(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_department_becomes_category_id() {
        let item = migrate_item(json!({"id": "1", "name": "Milk", "department": "dairy"}));
        assert_eq!(item["categoryId"], json!(2));
        assert!(item.get("department").is_none());
        assert_eq!(item["quantity"], json!(""));
    }

    #[test]
    fn test_legacy_category_keyword_resolved() {
        let item = migrate_item(json!({"name": "Cod", "categoryId": "fish", "quantity": 2}));
        assert_eq!(item["categoryId"], json!(4));
        assert_eq!(item["quantity"], json!("2"));
    }

    #[test]
    fn test_current_shape_untouched() {
        let current = json!({"id": "1", "name": "Kibble", "categoryId": "cat-abc", "quantity": "1 kg", "checked": true});
        assert_eq!(migrate_item(current.clone()), current);
    }

    #[test]
    fn test_migration_is_idempotent() {
        let legacy = json!({
            "id": "l1", "name": "Old", "createdAt": "2023-05-01T10:00:00Z",
            "items": [{"id": "i1", "name": "Bread", "department": "bakery", "quantity": "1", "checked": false, "fromDiet": true}]
        });
        let once = migrate_list(legacy);
        let twice = migrate_list(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once["items"][0]["categoryId"], json!(5));
    }

    #[test]
    fn test_supermarket_order_resolved() {
        let sm = migrate_supermarket(json!({"id": "sm-1", "categoryOrder": ["produce", 3, "cat-x"]}));
        assert_eq!(sm["categoryOrder"], json!([1, 3, "cat-x"]));
    }

    #[test]
    fn test_legacy_default_list() {
        let dl = legacy_default_list(json!([
            {"name": "Pasta", "categoryId": 6, "quantity": "500 g"},
            {"name": "Soap", "department": "household"}
        ]))
        .unwrap();
        assert!(dl.is_default);
        assert_eq!(dl.id, LEGACY_DEFAULT_ID);
        assert_eq!(dl.items.len(), 2);
        assert_eq!(dl.items[1].category_id, CategoryId::Builtin(13));
    }

    #[test]
    fn test_legacy_default_list_requires_array() {
        assert!(legacy_default_list(json!({"items": []})).is_none());
    }
}
