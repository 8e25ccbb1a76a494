//! The remote document store.
//!
//! One private document per user holds the sync [`Bundle`]. Any number of
//! shared documents can be created, listed, granted to other users by
//! email, and deleted.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::bundle::Bundle;
use crate::share::{ShareKind, SharePayload};

/// Version tag written into every shared document.
pub const SHARED_DOCUMENT_VERSION: &str = "1";

/// Bearer token for the remote store. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response, with the server's message when it sent one.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Listing entry for a shared document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub id: String,
    pub name: String,
    /// Shared document type (`list`, `defaultList`, ...).
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Email of the owner, for documents shared with me.
    #[serde(default)]
    pub owner: Option<String>,
}

/// A non-owner access grant on a shared document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub id: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_role() -> String {
    "reader".to_string()
}

/// Content of a shared document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedDocument {
    pub shoplist_version: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub name: String,
    pub shared_at: DateTime<Utc>,
    pub data: Value,
}

impl SharedDocument {
    /// Wraps a payload for publishing.
    pub fn new(payload: &SharePayload) -> Self {
        let kind = payload.kind();
        let name = payload
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| "Custom categories".to_string());
        Self {
            shoplist_version: SHARED_DOCUMENT_VERSION.to_string(),
            doc_type: kind.document_type().to_string(),
            name,
            shared_at: Utc::now(),
            data: payload.to_json(),
        }
    }

    pub fn kind(&self) -> Option<ShareKind> {
        ShareKind::from_document_type(&self.doc_type)
    }

    /// Decodes the embedded payload.
    ///
    /// Accepts compact data as well as full records; category sets may be
    /// wrapped as `{categories: [...]}`. A missing name falls back to the
    /// document name.
    pub fn payload(&self) -> Option<SharePayload> {
        let kind = self.kind()?;
        let data = match (kind, &self.data) {
            (ShareKind::Categories, Value::Object(obj)) => obj.get("categories")?.clone(),
            (_, data) => data.clone(),
        };
        let payload = SharePayload::from_json(kind, data)?;
        Some(match payload {
            SharePayload::List { name, items } if name.is_empty() => SharePayload::List {
                name: self.name.clone(),
                items,
            },
            SharePayload::DefaultList { name: None, items } => SharePayload::DefaultList {
                name: Some(self.name.clone()),
                items,
            },
            other => other,
        })
    }
}

/// Authenticated access to the remote document store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads the private sync document. `None` if it was never written.
    async fn read_bundle(&self, token: &AuthToken) -> Result<Option<Value>, RemoteError>;

    /// Creates or replaces the private sync document.
    async fn write_bundle(&self, token: &AuthToken, bundle: &Bundle) -> Result<(), RemoteError>;

    /// Creates a shared document and returns its ID.
    async fn create_shared(
        &self,
        token: &AuthToken,
        document: &SharedDocument,
    ) -> Result<String, RemoteError>;

    async fn list_owned(&self, token: &AuthToken) -> Result<Vec<DocumentMeta>, RemoteError>;

    async fn list_shared_with_me(&self, token: &AuthToken) -> Result<Vec<DocumentMeta>, RemoteError>;

    /// Reads a shared document's content. `None` if missing or unreadable.
    async fn read_shared(&self, token: &AuthToken, id: &str) -> Result<Option<Value>, RemoteError>;

    /// Grants read access to `email`.
    async fn grant_access(&self, token: &AuthToken, id: &str, email: &str) -> Result<(), RemoteError>;

    async fn revoke_access(&self, token: &AuthToken, id: &str, grant_id: &str) -> Result<(), RemoteError>;

    /// Non-owner grants on a document.
    async fn list_access(&self, token: &AuthToken, id: &str) -> Result<Vec<Grant>, RemoteError>;

    /// Deletes a shared document for everyone.
    async fn delete_document(&self, token: &AuthToken, id: &str) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, CustomCategory, DefaultItem};
    use serde_json::json;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = AuthToken::new("secret-value");
        assert!(!format!("{:?}", token).contains("secret"));
    }

    #[test]
    fn test_shared_document_round_trip() {
        let payload = SharePayload::List {
            name: "Weekly".into(),
            items: vec![DefaultItem::new("Latte", CategoryId::Builtin(2), "1 L")],
        };
        let doc = SharedDocument::new(&payload);
        assert_eq!(doc.doc_type, "list");

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["shoplistVersion"], json!("1"));
        assert_eq!(value["type"], json!("list"));

        let parsed: SharedDocument = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.payload(), Some(payload));
    }

    #[test]
    fn test_full_record_document() {
        let doc: SharedDocument = serde_json::from_value(json!({
            "shoplistVersion": "1",
            "type": "list",
            "name": "Sabato",
            "sharedAt": "2024-03-01T09:00:00Z",
            "data": {"items": [{"id": "x", "name": "Pane", "categoryId": "bakery", "quantity": "1", "checked": true}]}
        }))
        .unwrap();

        let Some(SharePayload::List { name, items }) = doc.payload() else {
            panic!("expected a list");
        };
        assert_eq!(name, "Sabato");
        assert_eq!(items[0].category_id, CategoryId::Builtin(5));
    }

    #[test]
    fn test_wrapped_categories_document() {
        let cat = CustomCategory::new("Pets", "🐶");
        let doc = SharedDocument {
            shoplist_version: "1".into(),
            doc_type: "categories".into(),
            name: "Custom categories".into(),
            shared_at: Utc::now(),
            data: json!({"categories": [cat]}),
        };
        assert_eq!(doc.payload(), Some(SharePayload::Categories(vec![cat])));
    }

    #[test]
    fn test_unknown_document_type() {
        let doc = SharedDocument {
            shoplist_version: "1".into(),
            doc_type: "recipe".into(),
            name: "x".into(),
            shared_at: Utc::now(),
            data: json!({}),
        };
        assert!(doc.payload().is_none());
    }
}
