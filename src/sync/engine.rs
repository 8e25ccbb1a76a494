//! Push/pull protocol against the remote store.
//!
//! Conflict resolution is bundle-level last-write-wins: a pulled bundle is
//! applied only if its clock is strictly newer than the one recorded
//! locally. The observable [`SyncState`] moves `Idle -> Syncing -> Ok|Error`
//! around every remote operation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::bundle::{apply_bundle, build_bundle, Bundle};
use super::registry::{ItemSyncStatus, SyncRegistry, Tracked};
use super::remote::{AuthToken, RemoteStore};
use super::state::SyncMeta;
use super::SyncError;
use crate::stores::Stores;

/// Observable state of the sync protocol.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Ok,
    Error(String),
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Idle => write!(f, "idle"),
            SyncState::Syncing => write!(f, "syncing"),
            SyncState::Ok => write!(f, "ok"),
            SyncState::Error(e) => write!(f, "error: {}", e),
        }
    }
}

/// Result of a pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Nothing stored remotely yet.
    NoRemote,
    /// The remote bundle was newer and has been applied.
    Pulled,
    /// Local data is as new or newer; nothing changed.
    LocalNewer,
}

impl fmt::Display for PullOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullOutcome::NoRemote => write!(f, "no remote data"),
            PullOutcome::Pulled => write!(f, "pulled"),
            PullOutcome::LocalNewer => write!(f, "local-newer"),
        }
    }
}

/// Sync protocol over a set of stores and a remote.
#[derive(Clone)]
pub struct SyncEngine {
    stores: Stores,
    remote: Arc<dyn RemoteStore>,
    state: Arc<watch::Sender<SyncState>>,
}

impl SyncEngine {
    pub fn new(stores: Stores, remote: Arc<dyn RemoteStore>) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self {
            stores,
            remote,
            state: Arc::new(state),
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub(crate) fn remote(&self) -> &dyn RemoteStore {
        self.remote.as_ref()
    }

    /// Current protocol state.
    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Watches protocol state changes.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    pub(crate) fn reset_state(&self) {
        self.state.send_replace(SyncState::Idle);
    }

    /// Runs a remote operation, reflecting it in the observable state.
    pub(crate) async fn tracked<T, F>(&self, operation: F) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, SyncError>>,
    {
        self.state.send_replace(SyncState::Syncing);
        let result = operation.await;
        match &result {
            Ok(_) => self.state.send_replace(SyncState::Ok),
            Err(e) => {
                tracing::warn!("Sync failed: {}", e);
                self.state.send_replace(SyncState::Error(e.to_string()))
            }
        };
        result
    }

    /// Writes the current local bundle to the remote.
    ///
    /// The registry and sync metadata are only updated once the remote write
    /// is confirmed. Returns the pushed bundle's clock.
    pub async fn push(&self, token: &AuthToken) -> Result<DateTime<Utc>, SyncError> {
        self.tracked(self.push_bundle(token)).await
    }

    /// Reads the remote bundle and applies it if strictly newer than the
    /// local one.
    pub async fn pull(&self, token: &AuthToken) -> Result<PullOutcome, SyncError> {
        self.tracked(self.pull_bundle(token)).await
    }

    async fn push_bundle(&self, token: &AuthToken) -> Result<DateTime<Utc>, SyncError> {
        let bundle = build_bundle(&self.stores)?;
        self.remote.write_bundle(token, &bundle).await?;

        let now = Utc::now();
        SyncRegistry::from_bundle(&bundle, now).save(&self.stores)?;
        SyncMeta {
            last_sync: Some(now),
            updated_at: Some(bundle.updated_at),
        }
        .save(&self.stores)?;

        tracing::info!("Pushed bundle {}", bundle.updated_at);
        Ok(bundle.updated_at)
    }

    async fn pull_bundle(&self, token: &AuthToken) -> Result<PullOutcome, SyncError> {
        let Some(value) = self.remote.read_bundle(token).await? else {
            tracing::info!("No remote bundle yet");
            return Ok(PullOutcome::NoRemote);
        };
        let remote = Bundle::from_value(value).map_err(|e| SyncError::Malformed(e.to_string()))?;

        let local = SyncMeta::load(&self.stores)?.updated_at.unwrap_or_default();
        if remote.updated_at > local {
            apply_bundle(&self.stores, &remote)?;
            tracing::info!("Pulled bundle {} (local was {})", remote.updated_at, local);
            Ok(PullOutcome::Pulled)
        } else {
            tracing::info!("Local data is newer than remote bundle {}", remote.updated_at);
            Ok(PullOutcome::LocalNewer)
        }
    }

    /// Pull, then push unconditionally.
    ///
    /// The push carries offline edits made before login even when the pull
    /// did not apply anything; pulling first keeps a stale push from
    /// clobbering newer remote data.
    pub async fn login(&self, token: &AuthToken) -> Result<PullOutcome, SyncError> {
        let outcome = self.pull(token).await?;
        self.push(token).await?;
        Ok(outcome)
    }

    /// Derived sync status of an entity.
    pub fn status_of<T: Tracked>(&self, entity: &T) -> Result<ItemSyncStatus, SyncError> {
        Ok(SyncRegistry::load(&self.stores)?.status_of(entity))
    }

    pub fn meta(&self) -> Result<SyncMeta, SyncError> {
        Ok(SyncMeta::load(&self.stores)?)
    }
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{ListUpdate, NewList};
    use crate::sync::testing::MockRemote;
    use serde_json::json;

    fn engine() -> (SyncEngine, Arc<MockRemote>) {
        let remote = Arc::new(MockRemote::default());
        (SyncEngine::new(Stores::in_memory(), remote.clone()), remote)
    }

    fn token() -> AuthToken {
        AuthToken::new("token")
    }

    fn remote_bundle(updated_at: &str, list_name: &str) -> serde_json::Value {
        json!({
            "version": 1,
            "updatedAt": updated_at,
            "lists": [{"id": "remote", "name": list_name, "createdAt": "2024-01-01T00:00:00Z", "items": []}]
        })
    }

    #[tokio::test]
    async fn test_push_writes_bundle_and_meta() {
        let (engine, remote) = engine();
        engine.stores().lists().create(NewList::named("Weekly")).unwrap();

        let updated_at = engine.push(&token()).await.unwrap();

        assert_eq!(remote.writes(), 1);
        let stored = remote.bundle().unwrap();
        assert_eq!(stored["lists"][0]["name"], json!("Weekly"));
        assert_eq!(engine.meta().unwrap().updated_at, Some(updated_at));
        assert_eq!(engine.state(), SyncState::Ok);
    }

    #[tokio::test]
    async fn test_push_failure_keeps_registry() {
        let (engine, remote) = engine();
        let list = engine.stores().lists().create(NewList::named("Weekly")).unwrap();
        remote.fail_with("quota exceeded");

        let err = engine.push(&token()).await.unwrap_err();

        assert!(err.to_string().contains("quota exceeded"));
        assert_eq!(engine.state(), SyncState::Error("quota exceeded".into()));
        assert_eq!(engine.status_of(&list).unwrap(), ItemSyncStatus::Never);
        assert_eq!(engine.meta().unwrap(), SyncMeta::default());

        // A later success returns to Ok.
        remote.recover();
        engine.push(&token()).await.unwrap();
        assert_eq!(engine.state(), SyncState::Ok);
    }

    #[tokio::test]
    async fn test_pull_no_remote() {
        let (engine, _) = engine();
        assert_eq!(engine.pull(&token()).await.unwrap(), PullOutcome::NoRemote);
    }

    #[tokio::test]
    async fn test_pull_applies_strictly_newer() {
        let (engine, remote) = engine();
        SyncMeta {
            last_sync: None,
            updated_at: Some("2024-06-01T00:00:00Z".parse().unwrap()),
        }
        .save(engine.stores())
        .unwrap();

        remote.set_bundle(remote_bundle("2024-06-01T00:00:01Z", "Remote"));
        assert_eq!(engine.pull(&token()).await.unwrap(), PullOutcome::Pulled);
        assert_eq!(engine.stores().lists().get_all().unwrap()[0].name, "Remote");
    }

    #[tokio::test]
    async fn test_pull_tie_or_older_keeps_local() {
        let (engine, remote) = engine();
        engine.stores().lists().create(NewList::named("Local")).unwrap();
        SyncMeta {
            last_sync: None,
            updated_at: Some("2024-06-01T00:00:00Z".parse().unwrap()),
        }
        .save(engine.stores())
        .unwrap();

        for stamp in ["2024-06-01T00:00:00Z", "2024-05-01T00:00:00Z"] {
            remote.set_bundle(remote_bundle(stamp, "Remote"));
            assert_eq!(engine.pull(&token()).await.unwrap(), PullOutcome::LocalNewer);
            assert_eq!(engine.stores().lists().get_all().unwrap()[0].name, "Local");
        }
    }

    #[tokio::test]
    async fn test_pull_without_local_meta_takes_remote() {
        let (engine, remote) = engine();
        remote.set_bundle(remote_bundle("2020-01-01T00:00:00Z", "Remote"));
        assert_eq!(engine.pull(&token()).await.unwrap(), PullOutcome::Pulled);
    }

    #[tokio::test]
    async fn test_pull_malformed_remote() {
        let (engine, remote) = engine();
        remote.set_bundle(json!("not a bundle"));
        let err = engine.pull(&token()).await.unwrap_err();
        assert!(matches!(err, SyncError::Malformed(_)));
        assert!(matches!(engine.state(), SyncState::Error(_)));
    }

    #[tokio::test]
    async fn test_login_pulls_then_pushes() {
        let (engine, remote) = engine();
        remote.set_bundle(remote_bundle("2030-01-01T00:00:00Z", "Remote"));

        let outcome = engine.login(&token()).await.unwrap();

        assert_eq!(outcome, PullOutcome::Pulled);
        assert_eq!(remote.writes(), 1);
        assert_eq!(remote.bundle().unwrap()["lists"][0]["name"], json!("Remote"));
    }

    #[tokio::test]
    async fn test_sync_status_derivation() {
        let (engine, _) = engine();
        let lists = engine.stores().lists();
        let list = lists.create(NewList::named("Weekly")).unwrap();
        assert_eq!(engine.status_of(&list).unwrap(), ItemSyncStatus::Never);

        engine.push(&token()).await.unwrap();
        let list = lists.get(&list.id).unwrap().unwrap();
        assert_eq!(engine.status_of(&list).unwrap(), ItemSyncStatus::Synced);

        std::thread::sleep(std::time::Duration::from_millis(5));
        let list = lists
            .update(
                &list.id,
                ListUpdate {
                    name: Some("Renamed".into()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(engine.status_of(&list).unwrap(), ItemSyncStatus::Dirty);
    }

    #[tokio::test]
    async fn test_state_is_observable() {
        let (engine, _) = engine();
        let mut rx = engine.subscribe();
        assert_eq!(*rx.borrow(), SyncState::Idle);

        engine.push(&token()).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SyncState::Ok);
    }
}
