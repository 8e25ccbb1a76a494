//! In-memory remote used by sync tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::bundle::Bundle;
use super::remote::{AuthToken, DocumentMeta, Grant, RemoteError, RemoteStore, SharedDocument};

#[derive(Default)]
struct MockState {
    bundle: Option<Value>,
    last_token: Option<String>,
    failure: Option<String>,
    fail_grants: bool,
    documents: BTreeMap<String, SharedDocument>,
    grants: BTreeMap<String, Vec<Grant>>,
    next_id: usize,
}

#[derive(Default)]
pub(crate) struct MockRemote {
    state: Mutex<MockState>,
    writes: AtomicUsize,
}

impl MockRemote {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Number of confirmed bundle writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn last_token(&self) -> Option<String> {
        self.lock().last_token.clone()
    }

    pub fn bundle(&self) -> Option<Value> {
        self.lock().bundle.clone()
    }

    pub fn set_bundle(&self, value: Value) {
        self.lock().bundle = Some(value);
    }

    /// Makes every call fail with a 500 carrying `message`.
    pub fn fail_with(&self, message: &str) {
        self.lock().failure = Some(message.to_string());
    }

    pub fn recover(&self) {
        self.lock().failure = None;
    }

    pub fn fail_grants(&self) {
        self.lock().fail_grants = true;
    }

    /// Number of shared documents stored.
    pub fn documents(&self) -> usize {
        self.lock().documents.len()
    }

    fn begin(&self, token: &AuthToken) -> Result<MutexGuard<'_, MockState>, RemoteError> {
        let mut state = self.lock();
        state.last_token = Some(token.as_str().to_string());
        match &state.failure {
            Some(message) => Err(RemoteError::Status {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(state),
        }
    }
}

fn meta(id: &str, document: &SharedDocument) -> DocumentMeta {
    DocumentMeta {
        id: id.to_string(),
        name: document.name.clone(),
        doc_type: Some(document.doc_type.clone()),
        created_at: Some(document.shared_at),
        owner: Some("me@example.com".to_string()),
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn read_bundle(&self, token: &AuthToken) -> Result<Option<Value>, RemoteError> {
        Ok(self.begin(token)?.bundle.clone())
    }

    async fn write_bundle(&self, token: &AuthToken, bundle: &Bundle) -> Result<(), RemoteError> {
        let value = serde_json::to_value(bundle).map_err(|e| RemoteError::Decode(e.to_string()))?;
        self.begin(token)?.bundle = Some(value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_shared(
        &self,
        token: &AuthToken,
        document: &SharedDocument,
    ) -> Result<String, RemoteError> {
        let mut state = self.begin(token)?;
        state.next_id += 1;
        let id = format!("doc-{}", state.next_id);
        state.documents.insert(id.clone(), document.clone());
        Ok(id)
    }

    async fn list_owned(&self, token: &AuthToken) -> Result<Vec<DocumentMeta>, RemoteError> {
        let state = self.begin(token)?;
        Ok(state.documents.iter().map(|(id, d)| meta(id, d)).collect())
    }

    async fn list_shared_with_me(&self, token: &AuthToken) -> Result<Vec<DocumentMeta>, RemoteError> {
        self.list_owned(token).await
    }

    async fn read_shared(&self, token: &AuthToken, id: &str) -> Result<Option<Value>, RemoteError> {
        let state = self.begin(token)?;
        state
            .documents
            .get(id)
            .map(|d| serde_json::to_value(d).map_err(|e| RemoteError::Decode(e.to_string())))
            .transpose()
    }

    async fn grant_access(&self, token: &AuthToken, id: &str, email: &str) -> Result<(), RemoteError> {
        let mut state = self.begin(token)?;
        if state.fail_grants {
            return Err(RemoteError::Status {
                status: 400,
                message: "Unknown user".to_string(),
            });
        }
        let grants = state.grants.entry(id.to_string()).or_default();
        grants.push(Grant {
            id: format!("grant-{}", grants.len() + 1),
            email: email.to_string(),
            role: "reader".to_string(),
            display_name: None,
        });
        Ok(())
    }

    async fn revoke_access(&self, token: &AuthToken, id: &str, grant_id: &str) -> Result<(), RemoteError> {
        let mut state = self.begin(token)?;
        if let Some(grants) = state.grants.get_mut(id) {
            grants.retain(|g| g.id != grant_id);
        }
        Ok(())
    }

    async fn list_access(&self, token: &AuthToken, id: &str) -> Result<Vec<Grant>, RemoteError> {
        let state = self.begin(token)?;
        Ok(state.grants.get(id).cloned().unwrap_or_default())
    }

    async fn delete_document(&self, token: &AuthToken, id: &str) -> Result<(), RemoteError> {
        let mut state = self.begin(token)?;
        state.documents.remove(id);
        state.grants.remove(id);
        Ok(())
    }
}
