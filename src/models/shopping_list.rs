//! Shopping lists and their items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::CategoryId;

/// Preparation state of a shopping list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListStatus {
    #[default]
    InPreparation,
    ReadyToPurchase,
}

impl fmt::Display for ListStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListStatus::InPreparation => write!(f, "in preparation"),
            ListStatus::ReadyToPurchase => write!(f, "ready to purchase"),
        }
    }
}

/// An item on a shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category_id: CategoryId,
    /// Free-form quantity ("200 g", "2", "a few").
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub checked: bool,
}

impl Item {
    /// Creates an unchecked item with a fresh ID.
    pub fn new(
        name: impl Into<String>,
        category_id: CategoryId,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into().trim().to_string(),
            category_id,
            quantity: quantity.into().trim().to_string(),
            checked: false,
        }
    }
}

/// A shopping list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Last local modification. Absent on lists written by old versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: ListStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supermarket_id: Option<String>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl ShoppingList {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into().trim().to_string(),
            created_at: now,
            updated_at: Some(now),
            status: ListStatus::InPreparation,
            supermarket_id: None,
            items: Vec::new(),
        }
    }

    pub fn with_items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }

    /// Finds an item by name (case-insensitive).
    pub fn find_item(&self, name: &str) -> Option<&Item> {
        let name_lower = name.trim().to_lowercase();
        self.items
            .iter()
            .find(|i| i.name.to_lowercase() == name_lower)
    }

    /// Percentage of checked items, rounded to the nearest integer.
    pub fn progress(&self) -> u32 {
        if self.items.is_empty() {
            return 0;
        }
        let checked = self.items.iter().filter(|i| i.checked).count();
        ((checked as f64 / self.items.len() as f64) * 100.0).round() as u32
    }

    /// Refreshes the modification timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// Generates a fresh entity ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
