//! Sync error types.

use super::remote::RemoteError;
use crate::import::ImportError;
use crate::stores::StoreError;

/// Errors that can occur during sync and sharing operations.
#[derive(Debug)]
pub enum SyncError {
    /// No remote server configured
    NotConfigured,
    /// No token available for an authenticated call
    NotAuthenticated,
    /// Remote store call failed
    Remote(RemoteError),
    /// Local store failed
    Store(StoreError),
    /// Remote returned something that is not a bundle or shared document
    Malformed(String),
    /// Shared document not found (or not readable)
    DocumentNotFound(String),
    /// The document was created but granting access failed
    GrantFailed {
        document_id: String,
        source: RemoteError,
    },
    /// Importing a shared document failed
    Import(ImportError),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::NotConfigured => {
                write!(f, "Sync not configured. Add remote.server_url to config.")
            }
            SyncError::NotAuthenticated => {
                write!(f, "No token configured. Set remote.token or SHOPLIST_TOKEN.")
            }
            SyncError::Remote(e) => write!(f, "{}", e),
            SyncError::Store(e) => write!(f, "{}", e),
            SyncError::Malformed(e) => write!(f, "Malformed remote data: {}", e),
            SyncError::DocumentNotFound(id) => write!(f, "Shared document not found: {}", id),
            SyncError::GrantFailed {
                document_id,
                source,
            } => write!(
                f,
                "Document {} was created but sharing it failed: {}",
                document_id, source
            ),
            SyncError::Import(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Remote(e) => Some(e),
            SyncError::Store(e) => Some(e),
            SyncError::GrantFailed { source, .. } => Some(source),
            SyncError::Import(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        SyncError::Remote(e)
    }
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        SyncError::Store(e)
    }
}

impl From<ImportError> for SyncError {
    fn from(e: ImportError) -> Self {
        SyncError::Import(e)
    }
}
