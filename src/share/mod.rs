//! Link sharing: entities encoded into a URL query parameter.
//!
//! Each entity kind travels under its own parameter (`share`, `dl`, `sm`,
//! `cats`). Decoding never fails loudly: anything malformed yields `None`
//! after a warning.

mod codec;

use std::fmt;

use crate::models::{CategoryId, CustomCategory, DefaultItem, DefaultList, ShoppingList, Supermarket};

/// Kind of a shared entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareKind {
    List,
    DefaultList,
    Supermarket,
    Categories,
}

impl ShareKind {
    pub const ALL: [ShareKind; 4] = [
        ShareKind::List,
        ShareKind::DefaultList,
        ShareKind::Supermarket,
        ShareKind::Categories,
    ];

    /// URL query parameter carrying this kind.
    pub fn param(&self) -> &'static str {
        match self {
            ShareKind::List => "share",
            ShareKind::DefaultList => "dl",
            ShareKind::Supermarket => "sm",
            ShareKind::Categories => "cats",
        }
    }

    pub fn from_param(param: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.param() == param)
    }

    /// `type` discriminator of a shared remote document.
    pub fn document_type(&self) -> &'static str {
        match self {
            ShareKind::List => "list",
            ShareKind::DefaultList => "defaultList",
            ShareKind::Supermarket => "supermarket",
            ShareKind::Categories => "categories",
        }
    }

    pub fn from_document_type(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.document_type() == kind)
    }
}

impl fmt::Display for ShareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareKind::List => write!(f, "list"),
            ShareKind::DefaultList => write!(f, "default list"),
            ShareKind::Supermarket => write!(f, "supermarket"),
            ShareKind::Categories => write!(f, "categories"),
        }
    }
}

/// A shareable entity, stripped to what a recipient needs.
///
/// Items carry no IDs or checked state; the importer assigns fresh ones.
#[derive(Debug, Clone, PartialEq)]
pub enum SharePayload {
    List {
        name: String,
        items: Vec<DefaultItem>,
    },
    DefaultList {
        name: Option<String>,
        items: Vec<DefaultItem>,
    },
    Supermarket {
        name: String,
        category_order: Vec<CategoryId>,
        /// Custom categories referenced by `category_order`.
        custom_categories: Vec<CustomCategory>,
    },
    Categories(Vec<CustomCategory>),
}

impl SharePayload {
    pub fn from_list(list: &ShoppingList) -> Self {
        SharePayload::List {
            name: list.name.clone(),
            items: list
                .items
                .iter()
                .map(|i| DefaultItem::new(i.name.clone(), i.category_id.clone(), i.quantity.clone()))
                .collect(),
        }
    }

    pub fn from_default_list(list: &DefaultList) -> Self {
        SharePayload::DefaultList {
            name: Some(list.name.clone()),
            items: list.items.clone(),
        }
    }

    /// Embeds only the custom categories the supermarket's order refers to.
    pub fn from_supermarket(supermarket: &Supermarket, custom: &[CustomCategory]) -> Self {
        SharePayload::Supermarket {
            name: supermarket.name.clone(),
            category_order: supermarket.category_order.clone(),
            custom_categories: supermarket
                .referenced_custom(custom)
                .into_iter()
                .cloned()
                .collect(),
        }
    }

    pub fn from_categories(categories: &[CustomCategory]) -> Self {
        SharePayload::Categories(categories.to_vec())
    }

    pub fn kind(&self) -> ShareKind {
        match self {
            SharePayload::List { .. } => ShareKind::List,
            SharePayload::DefaultList { .. } => ShareKind::DefaultList,
            SharePayload::Supermarket { .. } => ShareKind::Supermarket,
            SharePayload::Categories(_) => ShareKind::Categories,
        }
    }

    /// Display name, if the payload carries one.
    pub fn name(&self) -> Option<&str> {
        match self {
            SharePayload::List { name, .. } | SharePayload::Supermarket { name, .. } => {
                Some(name.as_str())
            }
            SharePayload::DefaultList { name, .. } => name.as_deref(),
            SharePayload::Categories(_) => None,
        }
    }

    /// Minimized JSON form, as embedded in links and shared documents.
    pub fn to_json(&self) -> serde_json::Value {
        codec::to_wire(self)
    }

    /// Rebuilds a payload from JSON (compact or full field names).
    pub fn from_json(kind: ShareKind, value: serde_json::Value) -> Option<Self> {
        match codec::from_wire(kind, value) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!("Malformed shared {}: {}", kind, e);
                None
            }
        }
    }

    /// Opaque URL-safe text for this payload.
    pub fn encode(&self) -> String {
        codec::encode_text(&self.to_json().to_string())
    }

    /// Decodes opaque text produced by [`SharePayload::encode`] or an older
    /// link format. Returns `None` for anything malformed.
    pub fn decode(kind: ShareKind, text: &str) -> Option<Self> {
        let Some(json) = codec::decode_text(text) else {
            tracing::warn!("Ignoring shared {}: not valid base64 text", kind);
            return None;
        };
        match serde_json::from_str(&json) {
            Ok(value) => Self::from_json(kind, value),
            Err(e) => {
                tracing::warn!("Ignoring shared {}: {}", kind, e);
                None
            }
        }
    }

    /// Full share link: `base` plus this payload's query parameter.
    pub fn share_url(&self, base: &str) -> String {
        let separator = if base.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}={}",
            base,
            separator,
            self.kind().param(),
            self.encode()
        )
    }

    /// Extracts the first decodable payload from a link or bare query
    /// string (`https://host/?sm=...`, `?dl=...`, `cats=...`).
    pub fn from_url(url: &str) -> Option<Self> {
        let query = match url.split_once('?') {
            Some((_, query)) => query,
            None => url,
        };
        let query = query.split('#').next().unwrap_or_default();

        query.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let kind = ShareKind::from_param(key)?;
            let value = urlencoding::decode(value).ok()?;
            Self::decode(kind, &value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Item;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::json;

    fn sample_list() -> ShoppingList {
        let mut list = ShoppingList::new("Spesa sabato");
        list.items = vec![
            Item::new("Latte", CategoryId::Builtin(2), "1 L"),
            Item::new("Crocchette", CategoryId::Custom("cat-pets123".into()), "2 kg"),
        ];
        list.items[0].checked = true;
        list
    }

    #[test]
    fn test_list_link_round_trip() {
        let list = sample_list();
        let encoded = SharePayload::from_list(&list).encode();

        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let decoded = SharePayload::decode(ShareKind::List, &encoded).unwrap();
        let SharePayload::List { name, items } = decoded else {
            panic!("expected a list");
        };
        assert_eq!(name, list.name);
        assert_eq!(items.len(), 2);
        for (item, original) in items.iter().zip(&list.items) {
            assert_eq!(item.name, original.name);
            assert_eq!(item.category_id, original.category_id);
            assert_eq!(item.quantity, original.quantity);
        }
    }

    #[test]
    fn test_unicode_names_survive() {
        let payload = SharePayload::DefaultList {
            name: Some("Caffè ☕".into()),
            items: vec![DefaultItem::new("Pâté", CategoryId::Builtin(3), "1")],
        };
        let decoded = SharePayload::decode(ShareKind::DefaultList, &payload.encode()).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_supermarket_embeds_referenced_categories() {
        let pets = CustomCategory::new("Pets", "🐶");
        let garden = CustomCategory::new("Garden", "🌱");
        let sm = Supermarket::new("Corner", vec![CategoryId::Builtin(1), pets.category_id()]);

        let payload = SharePayload::from_supermarket(&sm, &[pets.clone(), garden]);
        let decoded = SharePayload::decode(ShareKind::Supermarket, &payload.encode()).unwrap();

        let SharePayload::Supermarket {
            category_order,
            custom_categories,
            ..
        } = decoded
        else {
            panic!("expected a supermarket");
        };
        assert_eq!(category_order, sm.category_order);
        assert_eq!(custom_categories, vec![pets]);
    }

    #[test]
    fn test_categories_round_trip() {
        let payload = SharePayload::from_categories(&[CustomCategory::new("Pets", "🐶")]);
        assert_eq!(
            SharePayload::decode(ShareKind::Categories, &payload.encode()),
            Some(payload)
        );
    }

    #[test]
    fn test_legacy_list_link() {
        let legacy = json!({
            "id": "old",
            "name": "Vecchia lista",
            "status": "inPreparation",
            "items": [{"id": "1", "name": "Yogurt", "department": "dairy", "quantity": "4", "checked": true}]
        });
        let text = STANDARD.encode(legacy.to_string());

        let decoded = SharePayload::decode(ShareKind::List, &text).unwrap();
        let SharePayload::List { name, items } = decoded else {
            panic!("expected a list");
        };
        assert_eq!(name, "Vecchia lista");
        assert_eq!(items[0].category_id, CategoryId::Builtin(2));
    }

    #[test]
    fn test_legacy_category_keyword_in_compact_link() {
        let text = codec::encode_text(r#"{"n":"Corner","o":["produce","dairy",17]}"#);
        let decoded = SharePayload::decode(ShareKind::Supermarket, &text).unwrap();
        let SharePayload::Supermarket { category_order, .. } = decoded else {
            panic!("expected a supermarket");
        };
        assert_eq!(
            category_order,
            vec![CategoryId::Builtin(1), CategoryId::Builtin(2), CategoryId::Builtin(17)]
        );
    }

    #[test]
    fn test_malformed_input_is_none() {
        assert!(SharePayload::decode(ShareKind::List, "not base64 at all!").is_none());
        assert!(SharePayload::decode(ShareKind::List, &codec::encode_text("{broken")).is_none());
        assert!(SharePayload::decode(ShareKind::Categories, &codec::encode_text(r#"{"n":1}"#)).is_none());
    }

    #[test]
    fn test_share_url_and_back() {
        let payload = SharePayload::from_list(&sample_list());
        let url = payload.share_url("https://shoplist.app/");
        assert!(url.starts_with("https://shoplist.app/?share="));

        assert_eq!(SharePayload::from_url(&url), Some(payload.clone()));
        assert_eq!(
            SharePayload::from_url(&format!("{}#top", url)),
            Some(payload)
        );
    }

    #[test]
    fn test_from_url_picks_known_param() {
        let cats = SharePayload::from_categories(&[CustomCategory::new("Pets", "🐶")]);
        let url = format!("https://x.test/?utm=1&cats={}", cats.encode());
        assert_eq!(SharePayload::from_url(&url), Some(cats));
        assert!(SharePayload::from_url("https://x.test/?utm=1").is_none());
    }

    #[test]
    fn test_kind_params() {
        for kind in ShareKind::ALL {
            assert_eq!(ShareKind::from_param(kind.param()), Some(kind));
            assert_eq!(ShareKind::from_document_type(kind.document_type()), Some(kind));
        }
    }
}
