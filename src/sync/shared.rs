//! Explicit sharing through remote shared documents.

use super::engine::SyncEngine;
use super::remote::{AuthToken, DocumentMeta, Grant, SharedDocument};
use super::SyncError;
use crate::import::{import_payload, ImportMode, ImportOutcome};
use crate::share::SharePayload;

impl SyncEngine {
    /// Creates a shared document for `payload` and, if given, grants read
    /// access to `email`.
    ///
    /// A failed grant does not remove the created document; it is reported
    /// as [`SyncError::GrantFailed`] with the new document's ID so the grant
    /// can be retried.
    pub async fn publish(
        &self,
        token: &AuthToken,
        payload: &SharePayload,
        email: Option<&str>,
    ) -> Result<String, SyncError> {
        self.tracked(self.create_and_grant(token, payload, email)).await
    }

    /// Shared documents created by this user.
    pub async fn owned(&self, token: &AuthToken) -> Result<Vec<DocumentMeta>, SyncError> {
        self.tracked(async { self.remote().list_owned(token).await.map_err(SyncError::from) })
            .await
    }

    /// Shopping documents other users shared with this user.
    pub async fn received(&self, token: &AuthToken) -> Result<Vec<DocumentMeta>, SyncError> {
        let docs = self
            .tracked(async { self.remote().list_shared_with_me(token).await.map_err(SyncError::from) })
            .await?;
        Ok(docs.into_iter().filter(|d| d.doc_type.is_some()).collect())
    }

    pub async fn grants(&self, token: &AuthToken, id: &str) -> Result<Vec<Grant>, SyncError> {
        self.tracked(async { self.remote().list_access(token, id).await.map_err(SyncError::from) })
            .await
    }

    pub async fn grant(&self, token: &AuthToken, id: &str, email: &str) -> Result<(), SyncError> {
        self.tracked(async {
            self.remote()
                .grant_access(token, id, email.trim())
                .await
                .map_err(SyncError::from)
        })
        .await
    }

    pub async fn revoke(&self, token: &AuthToken, id: &str, grant_id: &str) -> Result<(), SyncError> {
        self.tracked(async {
            self.remote()
                .revoke_access(token, id, grant_id)
                .await
                .map_err(SyncError::from)
        })
        .await
    }

    /// Deletes a shared document for everyone it was shared with.
    pub async fn delete_shared(&self, token: &AuthToken, id: &str) -> Result<(), SyncError> {
        self.tracked(async { self.remote().delete_document(token, id).await.map_err(SyncError::from) })
            .await
    }

    /// Reads a shared document and imports it locally.
    pub async fn import_shared(
        &self,
        token: &AuthToken,
        id: &str,
        mode: ImportMode,
    ) -> Result<ImportOutcome, SyncError> {
        self.tracked(self.read_and_import(token, id, mode)).await
    }

    async fn create_and_grant(
        &self,
        token: &AuthToken,
        payload: &SharePayload,
        email: Option<&str>,
    ) -> Result<String, SyncError> {
        let document = SharedDocument::new(payload);
        let id = self.remote().create_shared(token, &document).await?;
        tracing::info!("Created shared {} document {}", payload.kind(), id);

        if let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) {
            if let Err(source) = self.remote().grant_access(token, &id, email).await {
                return Err(SyncError::GrantFailed {
                    document_id: id,
                    source,
                });
            }
            tracing::info!("Granted {} access to {}", email, id);
        }
        Ok(id)
    }

    async fn read_and_import(
        &self,
        token: &AuthToken,
        id: &str,
        mode: ImportMode,
    ) -> Result<ImportOutcome, SyncError> {
        let Some(value) = self.remote().read_shared(token, id).await? else {
            return Err(SyncError::DocumentNotFound(id.to_string()));
        };
        let document: SharedDocument =
            serde_json::from_value(value).map_err(|e| SyncError::Malformed(e.to_string()))?;
        let payload = document.payload().ok_or_else(|| {
            SyncError::Malformed(format!(
                "unsupported shared document type '{}'",
                document.doc_type
            ))
        })?;
        Ok(import_payload(self.stores(), payload, mode)?)
    }
}
