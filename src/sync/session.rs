//! An authenticated sync session.
//!
//! A session owns the token for its lifetime: it is created on login and
//! consumed by [`SyncSession::logout`]. While alive it watches the store's
//! mutation channel and schedules a debounced push for every local write
//! when auto-sync is on.

use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::task::JoinHandle;

use super::engine::{PullOutcome, SyncEngine};
use super::remote::AuthToken;
use super::scheduler::DebounceScheduler;
use super::state::{SyncMeta, SyncSettings};
use super::SyncError;
use crate::stores::Mutation;

pub struct SyncSession {
    engine: SyncEngine,
    scheduler: DebounceScheduler,
    token: AuthToken,
    watcher: JoinHandle<()>,
}

impl SyncSession {
    /// Starts watching local writes. Must be called within a tokio runtime.
    ///
    /// The subscription is taken before this returns, so writes made right
    /// after starting are never missed.
    pub fn start(engine: SyncEngine, token: AuthToken) -> Self {
        let scheduler = DebounceScheduler::new(engine.clone());
        let events = engine.stores().subscribe();
        let watcher = tokio::spawn(watch_mutations(
            engine.clone(),
            scheduler.clone(),
            token.clone(),
            events,
        ));
        Self {
            engine,
            scheduler,
            token,
            watcher,
        }
    }

    /// Starts a session and runs the login sequence (pull, then push).
    pub async fn login(engine: SyncEngine, token: AuthToken) -> Result<(Self, PullOutcome), SyncError> {
        let outcome = engine.login(&token).await?;
        Ok((Self::start(engine, token), outcome))
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Pushes immediately, dropping any pending debounced push.
    pub async fn sync_now(&self) -> Result<DateTime<Utc>, SyncError> {
        self.scheduler.cancel();
        self.engine.push(&self.token).await
    }

    pub async fn pull(&self) -> Result<PullOutcome, SyncError> {
        self.engine.pull(&self.token).await
    }

    /// Runs the pending debounced push now, if any.
    pub async fn flush(&self) -> Option<Result<DateTime<Utc>, SyncError>> {
        self.scheduler.flush().await
    }

    pub fn is_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Runs a local command between a pull and a push.
    ///
    /// The pull completes before the command starts, so its writes land on
    /// top of the newest remote bundle. Writes are then pushed at once
    /// instead of after the debounce delay. If the pull fails, the command
    /// still runs but nothing is pushed. Sync failures are logged; the
    /// command's own result is returned.
    pub async fn run_local<T, E, F>(&self, command: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let pulled = match self.pull().await {
            Ok(outcome) => {
                tracing::debug!("Auto-sync pull: {:?}", outcome);
                true
            }
            Err(e) => {
                tracing::warn!("Auto-sync pull failed: {}", e);
                false
            }
        };

        let result = command.await;

        // Let the watcher see this command's writes.
        tokio::task::yield_now().await;
        if pulled {
            if let Some(Err(e)) = self.flush().await {
                tracing::warn!("Auto-sync push failed: {}", e);
            }
        } else if self.is_pending() {
            self.scheduler.cancel();
            tracing::warn!("Local changes not pushed: the pull before them failed");
        }
        result
    }

    /// Ends the session: the pending push is dropped, the sync metadata is
    /// cleared and the observable state returns to idle.
    pub fn logout(self) -> Result<(), SyncError> {
        self.scheduler.cancel();
        self.watcher.abort();
        SyncMeta::clear(self.engine.stores())?;
        self.engine.reset_state();
        tracing::info!("Logged out");
        Ok(())
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        self.scheduler.cancel();
        self.watcher.abort();
    }
}

async fn watch_mutations(
    engine: SyncEngine,
    scheduler: DebounceScheduler,
    token: AuthToken,
    mut events: Receiver<Mutation>,
) {
    loop {
        match events.recv().await {
            Ok(mutation) => tracing::debug!("Local {} changed", mutation.kind),
            Err(RecvError::Lagged(missed)) => tracing::debug!("Missed {} change events", missed),
            Err(RecvError::Closed) => break,
        }
        match SyncSettings::load(engine.stores()) {
            Ok(settings) if settings.auto_sync => scheduler.schedule(token.clone(), settings.delay()),
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not read sync settings: {}", e),
        }
    }
}
