//! Default lists: reusable item templates used to seed new shopping lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shopping_list::new_id;
use super::{CategoryId, Item};

/// An item of a default list. Carries no ID and no checked state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultItem {
    pub name: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub quantity: String,
}

impl DefaultItem {
    pub fn new(name: impl Into<String>, category_id: CategoryId, quantity: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            category_id,
            quantity: quantity.into().trim().to_string(),
        }
    }

    /// Converts into a fresh, unchecked shopping list item.
    pub fn to_item(&self) -> Item {
        Item::new(self.name.clone(), self.category_id.clone(), self.quantity.clone())
    }
}

/// A named default list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<DefaultItem>,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DefaultList {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into().trim().to_string(),
            items: Vec::new(),
            is_default: false,
            created_at: now,
            updated_at: Some(now),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_item_is_fresh() {
        let item = DefaultItem::new("Milk", CategoryId::Builtin(2), "1 L").to_item();
        assert!(!item.checked);
        assert!(!item.id.is_empty());
        assert_eq!(item.quantity, "1 L");
    }
}
