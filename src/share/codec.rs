//! Compact wire format for shared entities.
//!
//! Payloads are minimized JSON with one- or two-letter field names, then
//! URL-safe base64 without padding. Older links used the full record JSON
//! (long field names, `department` instead of `categoryId`) and the standard
//! base64 alphabet; both are still accepted on decode.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use super::{ShareKind, SharePayload};
use crate::models::{resolve_legacy_category_id, CategoryId, CustomCategory, DefaultItem};

#[derive(Debug, Deserialize)]
struct WireItem {
    #[serde(rename = "n", alias = "name")]
    name: String,
    #[serde(rename = "c", alias = "categoryId", default)]
    category: Option<Value>,
    #[serde(default)]
    department: Option<Value>,
    #[serde(rename = "q", alias = "quantity", default, deserialize_with = "lenient_quantity")]
    quantity: String,
}

impl WireItem {
    fn into_item(self) -> Option<DefaultItem> {
        let category = match self.category.or(self.department) {
            Some(raw) => resolve_legacy_category_id(&raw),
            None => CategoryId::other(),
        };
        let item = DefaultItem::new(self.name, category, self.quantity);
        (!item.name.is_empty()).then_some(item)
    }
}

#[derive(Debug, Deserialize)]
struct WireList {
    #[serde(rename = "n", alias = "name", default)]
    name: Option<String>,
    #[serde(rename = "i", alias = "items", default)]
    items: Vec<WireItem>,
}

impl WireList {
    fn items(self) -> (Option<String>, Vec<DefaultItem>) {
        let items = self.items.into_iter().filter_map(WireItem::into_item).collect();
        let name = self.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        (name, items)
    }
}

#[derive(Debug, Deserialize)]
struct WireCategory {
    #[serde(rename = "i", alias = "id")]
    id: String,
    #[serde(rename = "n", alias = "name")]
    name: String,
    #[serde(rename = "e", alias = "emoji", default)]
    emoji: String,
}

impl From<WireCategory> for CustomCategory {
    fn from(c: WireCategory) -> Self {
        CustomCategory {
            id: c.id,
            name: c.name,
            emoji: c.emoji,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSupermarket {
    #[serde(rename = "n", alias = "name")]
    name: String,
    #[serde(rename = "o", alias = "categoryOrder", default)]
    order: Vec<Value>,
    #[serde(rename = "c", alias = "customCategories", default)]
    categories: Vec<WireCategory>,
}

fn lenient_quantity<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn item_value(item: &DefaultItem) -> Value {
    json!({
        "n": item.name,
        "c": Value::from(&item.category_id),
        "q": item.quantity,
    })
}

fn category_value(category: &CustomCategory) -> Value {
    json!({"i": category.id, "n": category.name, "e": category.emoji})
}

/// The minimized JSON form of a payload.
pub(super) fn to_wire(payload: &SharePayload) -> Value {
    match payload {
        SharePayload::List { name, items } => json!({
            "n": name,
            "i": items.iter().map(item_value).collect::<Vec<_>>(),
        }),
        SharePayload::DefaultList { name, items } => {
            let mut value = json!({"i": items.iter().map(item_value).collect::<Vec<_>>()});
            if let Some(name) = name {
                value["n"] = Value::String(name.clone());
            }
            value
        }
        SharePayload::Supermarket {
            name,
            category_order,
            custom_categories,
        } => {
            let mut value = json!({
                "n": name,
                "o": category_order.iter().map(Value::from).collect::<Vec<_>>(),
            });
            if !custom_categories.is_empty() {
                value["c"] = custom_categories.iter().map(category_value).collect();
            }
            value
        }
        SharePayload::Categories(categories) => {
            categories.iter().map(category_value).collect()
        }
    }
}

/// Rebuilds a payload from its JSON form (compact or legacy).
pub(super) fn from_wire(kind: ShareKind, value: Value) -> Result<SharePayload, serde_json::Error> {
    Ok(match kind {
        ShareKind::List => {
            let (name, items) = serde_json::from_value::<WireList>(value)?.items();
            SharePayload::List {
                name: name.unwrap_or_default(),
                items,
            }
        }
        ShareKind::DefaultList => {
            let (name, items) = serde_json::from_value::<WireList>(value)?.items();
            SharePayload::DefaultList { name, items }
        }
        ShareKind::Supermarket => {
            let sm: WireSupermarket = serde_json::from_value(value)?;
            SharePayload::Supermarket {
                name: sm.name.trim().to_string(),
                category_order: sm.order.iter().map(resolve_legacy_category_id).collect(),
                custom_categories: sm.categories.into_iter().map(Into::into).collect(),
            }
        }
        ShareKind::Categories => {
            let categories: Vec<WireCategory> = serde_json::from_value(value)?;
            SharePayload::Categories(categories.into_iter().map(Into::into).collect())
        }
    })
}

pub(super) fn encode_text(json: &str) -> String {
    URL_SAFE_NO_PAD.encode(json.as_bytes())
}

/// Decodes either base64 alphabet, with or without padding.
pub(super) fn decode_text(text: &str) -> Option<String> {
    let normalized: String = text
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' | ' ' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD.decode(normalized.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}
