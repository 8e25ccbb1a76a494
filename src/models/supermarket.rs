//! Supermarkets and their aisle (category) ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::short_id;
use super::{CategoryId, CustomCategory, Item};

/// A supermarket with a preferred category order.
///
/// Categories missing from `category_order` are not stocked there and are
/// excluded from supermarket-filtered views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supermarket {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category_order: Vec<CategoryId>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Supermarket {
    pub fn new(name: impl Into<String>, category_order: Vec<CategoryId>) -> Self {
        let now = Utc::now();
        Self {
            id: short_id("sm-"),
            name: name.into().trim().to_string(),
            category_order,
            created_at: now,
            updated_at: Some(now),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Position of a category in this supermarket, if stocked.
    pub fn position(&self, category: &CategoryId) -> Option<usize> {
        self.category_order.iter().position(|c| c == category)
    }

    /// Groups items by category in aisle order.
    ///
    /// Categories absent from the order are dropped, as are empty groups.
    pub fn arrange<'a>(&self, items: &'a [Item]) -> Vec<(CategoryId, Vec<&'a Item>)> {
        self.category_order
            .iter()
            .filter_map(|category| {
                let group: Vec<&Item> = items
                    .iter()
                    .filter(|i| &i.category_id == category)
                    .collect();
                (!group.is_empty()).then(|| (category.clone(), group))
            })
            .collect()
    }

    /// Custom categories referenced by this supermarket's order.
    pub fn referenced_custom<'a>(&self, custom: &'a [CustomCategory]) -> Vec<&'a CustomCategory> {
        custom
            .iter()
            .filter(|c| {
                self.category_order
                    .iter()
                    .any(|id| matches!(id, CategoryId::Custom(cid) if cid == &c.id))
            })
            .collect()
    }
}
