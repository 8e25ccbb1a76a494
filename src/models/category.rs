//! Category identifiers and the built-in department catalog.
//!
//! Built-in categories have small stable integer IDs. Custom categories
//! created by the user have opaque string IDs (`cat-xxxxxxx`). Older data
//! used keyword IDs such as `"dairy"`; those are resolved to the integer ID
//! whenever a category ID is read.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of generated custom category IDs.
pub const CUSTOM_PREFIX: &str = "cat-";

/// ID of the "Other" catch-all category.
pub const OTHER: u32 = 17;

/// A category identifier: built-in integer or custom string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryId {
    Builtin(u32),
    Custom(String),
}

impl CategoryId {
    /// The "Other" built-in category.
    pub fn other() -> Self {
        CategoryId::Builtin(OTHER)
    }

    /// Returns true if this refers to a user-created category.
    pub fn is_custom(&self) -> bool {
        matches!(self, CategoryId::Custom(id) if id.starts_with(CUSTOM_PREFIX))
    }

    /// Resolves a legacy keyword ID to its built-in integer ID.
    ///
    /// Anything that is not a known keyword is returned unchanged.
    pub fn resolve_legacy(self) -> Self {
        match self {
            CategoryId::Custom(keyword) => match legacy_builtin_id(&keyword) {
                Some(id) => CategoryId::Builtin(id),
                None => CategoryId::Custom(keyword),
            },
            builtin => builtin,
        }
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::other()
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryId::Builtin(id) => write!(f, "{}", id),
            CategoryId::Custom(id) => write!(f, "{}", id),
        }
    }
}

impl From<u32> for CategoryId {
    fn from(id: u32) -> Self {
        CategoryId::Builtin(id)
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        match id.trim().parse::<u32>() {
            Ok(n) => CategoryId::Builtin(n),
            Err(_) => CategoryId::Custom(id.trim().to_string()),
        }
    }
}

impl From<&CategoryId> for serde_json::Value {
    fn from(id: &CategoryId) -> Self {
        match id {
            CategoryId::Builtin(n) => serde_json::Value::from(*n),
            CategoryId::Custom(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Resolves a raw JSON category value (number or string) to a category ID.
///
/// Legacy keywords become their integer ID; numeric strings become built-in
/// IDs; anything unusable becomes "Other".
pub fn resolve_legacy_category_id(value: &serde_json::Value) -> CategoryId {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(CategoryId::Builtin)
            .unwrap_or_default(),
        serde_json::Value::String(s) if !s.trim().is_empty() => {
            CategoryId::from(s.as_str()).resolve_legacy()
        }
        _ => CategoryId::other(),
    }
}

/// A built-in category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinCategory {
    pub id: u32,
    pub emoji: &'static str,
    pub name: &'static str,
    /// Keyword used by the pre-integer data format.
    pub legacy_key: &'static str,
}

/// The fixed built-in catalog, in default display order.
pub const BUILTIN_CATEGORIES: [BuiltinCategory; 17] = [
    BuiltinCategory { id: 1, emoji: "🥦", name: "Produce", legacy_key: "produce" },
    BuiltinCategory { id: 2, emoji: "🥓", name: "Dairy & Deli", legacy_key: "dairy" },
    BuiltinCategory { id: 3, emoji: "🥩", name: "Meat & Butcher", legacy_key: "meat" },
    BuiltinCategory { id: 4, emoji: "🐟", name: "Fish", legacy_key: "fish" },
    BuiltinCategory { id: 5, emoji: "🍞", name: "Bakery & Cereals", legacy_key: "bakery" },
    BuiltinCategory { id: 6, emoji: "🍝", name: "Pasta, Rice & Legumes", legacy_key: "pasta" },
    BuiltinCategory { id: 7, emoji: "🥜", name: "Nuts, Seeds & Butters", legacy_key: "nuts" },
    BuiltinCategory { id: 8, emoji: "🫒", name: "Condiments & Preserves", legacy_key: "condiments" },
    BuiltinCategory { id: 9, emoji: "🍪", name: "Breakfast & Sweets", legacy_key: "snacks" },
    BuiltinCategory { id: 10, emoji: "☕", name: "Beverages", legacy_key: "beverages" },
    BuiltinCategory { id: 11, emoji: "🥫", name: "Canned & Preserved", legacy_key: "canned" },
    BuiltinCategory { id: 12, emoji: "❄️", name: "Frozen", legacy_key: "frozen" },
    BuiltinCategory { id: 13, emoji: "🧼", name: "Household & Cleaning", legacy_key: "household" },
    BuiltinCategory { id: 14, emoji: "🧴", name: "Personal Care", legacy_key: "personal_care" },
    BuiltinCategory { id: 15, emoji: "👕", name: "Clothing", legacy_key: "clothing" },
    BuiltinCategory { id: 16, emoji: "📱", name: "Electronics", legacy_key: "electronics" },
    BuiltinCategory { id: 17, emoji: "📦", name: "Other", legacy_key: "other" },
];

/// Looks up the built-in ID for a legacy keyword.
pub fn legacy_builtin_id(keyword: &str) -> Option<u32> {
    BUILTIN_CATEGORIES
        .iter()
        .find(|c| c.legacy_key == keyword)
        .map(|c| c.id)
}

/// Looks up a built-in category by ID.
pub fn builtin(id: u32) -> Option<&'static BuiltinCategory> {
    BUILTIN_CATEGORIES.iter().find(|c| c.id == id)
}

/// A user-created category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomCategory {
    pub id: String,
    pub name: String,
    pub emoji: String,
}

impl CustomCategory {
    /// Creates a category with a freshly generated `cat-` ID.
    pub fn new(name: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            id: short_id(CUSTOM_PREFIX),
            name: name.into().trim().to_string(),
            emoji: emoji.into(),
        }
    }

    pub fn category_id(&self) -> CategoryId {
        CategoryId::Custom(self.id.clone())
    }
}

/// `prefix` followed by seven random lowercase alphanumerics.
pub(crate) fn short_id(prefix: &str) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    let suffix: String = (0..7)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    format!("{}{}", prefix, suffix)
}

/// Display label ("emoji name") for a category, falling back to "Other".
pub fn category_label(id: &CategoryId, custom: &[CustomCategory]) -> String {
    let resolved = id.clone().resolve_legacy();
    match &resolved {
        CategoryId::Builtin(n) => {
            if let Some(c) = builtin(*n) {
                return format!("{} {}", c.emoji, c.name);
            }
        }
        CategoryId::Custom(cid) => {
            if let Some(c) = custom.iter().find(|c| &c.id == cid) {
                return format!("{} {}", c.emoji, c.name);
            }
        }
    }
    "📦 Other".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_keyword_resolves_to_builtin() {
        assert_eq!(
            CategoryId::Custom("dairy".into()).resolve_legacy(),
            CategoryId::Builtin(2)
        );
        assert_eq!(
            CategoryId::Custom("personal_care".into()).resolve_legacy(),
            CategoryId::Builtin(14)
        );
    }

    #[test]
    fn test_custom_id_is_left_alone() {
        let id = CategoryId::Custom("cat-abc1234".into());
        assert_eq!(id.clone().resolve_legacy(), id);
        assert!(id.is_custom());
    }

    #[test]
    fn test_resolve_raw_values() {
        assert_eq!(resolve_legacy_category_id(&json!(5)), CategoryId::Builtin(5));
        assert_eq!(resolve_legacy_category_id(&json!("fish")), CategoryId::Builtin(4));
        assert_eq!(resolve_legacy_category_id(&json!("12")), CategoryId::Builtin(12));
        assert_eq!(resolve_legacy_category_id(&json!(null)), CategoryId::other());
        assert_eq!(resolve_legacy_category_id(&json!(-3)), CategoryId::other());
    }

    #[test]
    fn test_serde_untagged() {
        let ids: Vec<CategoryId> = serde_json::from_str(r#"[1, "cat-x"]"#).unwrap();
        assert_eq!(
            ids,
            vec![CategoryId::Builtin(1), CategoryId::Custom("cat-x".into())]
        );
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"[1,"cat-x"]"#);
    }

    #[test]
    fn test_custom_category_new() {
        let cat = CustomCategory::new("  Pet food ", "🐶");
        assert!(cat.id.starts_with(CUSTOM_PREFIX));
        assert_eq!(cat.id.len(), CUSTOM_PREFIX.len() + 7);
        assert_eq!(cat.name, "Pet food");
    }

    #[test]
    fn test_category_label() {
        let custom = vec![CustomCategory {
            id: "cat-1".into(),
            name: "Pets".into(),
            emoji: "🐶".into(),
        }];
        assert_eq!(category_label(&CategoryId::Builtin(4), &custom), "🐟 Fish");
        assert_eq!(
            category_label(&CategoryId::Custom("cat-1".into()), &custom),
            "🐶 Pets"
        );
        assert_eq!(
            category_label(&CategoryId::Custom("dairy".into()), &custom),
            "🥓 Dairy & Deli"
        );
        assert_eq!(
            category_label(&CategoryId::Custom("cat-missing".into()), &custom),
            "📦 Other"
        );
    }
}
