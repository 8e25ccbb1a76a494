//! Debounced push.
//!
//! Every [`DebounceScheduler::schedule`] call restarts the timer; only the
//! latest call's token and delay are honored, so a burst of local writes
//! becomes a single remote write.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::engine::SyncEngine;
use super::remote::AuthToken;
use super::SyncError;

struct Pending {
    generation: u64,
    token: AuthToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    pending: Option<Pending>,
}

impl Inner {
    /// Takes the pending push if it is still the one scheduled as `generation`.
    fn take_if_current(&mut self, generation: u64) -> Option<AuthToken> {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.generation == generation);
        if current {
            self.pending.take().map(|p| p.token)
        } else {
            None
        }
    }

    fn cancel(&mut self) -> Option<AuthToken> {
        self.pending.take().map(|p| {
            p.handle.abort();
            p.token
        })
    }
}

#[derive(Clone)]
pub struct DebounceScheduler {
    engine: SyncEngine,
    inner: Arc<Mutex<Inner>>,
}

impl DebounceScheduler {
    pub fn new(engine: SyncEngine) -> Self {
        Self {
            engine,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Schedules a push after `delay`, replacing any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, token: AuthToken, delay: Duration) {
        let mut inner = self.lock();
        if let Some(previous) = inner.pending.take() {
            previous.handle.abort();
        }
        inner.generation += 1;
        let generation = inner.generation;

        let engine = self.engine.clone();
        let shared = self.inner.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let token = shared
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take_if_current(generation);
            if let Some(token) = token {
                // Failures are reflected in the engine state.
                let _ = engine.push(&token).await;
            }
        });

        tracing::debug!("Push scheduled in {:?}", delay);
        inner.pending = Some(Pending {
            generation,
            token,
            handle,
        });
    }

    /// Runs the pending push now, if any.
    pub async fn flush(&self) -> Option<Result<chrono::DateTime<chrono::Utc>, SyncError>> {
        let token = self.lock().cancel()?;
        Some(self.engine.push(&token).await)
    }

    /// Drops the pending push without running it.
    pub fn cancel(&self) {
        if self.lock().cancel().is_some() {
            tracing::debug!("Pending push cancelled");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::Stores;
    use crate::sync::testing::MockRemote;

    fn scheduler() -> (DebounceScheduler, Arc<MockRemote>) {
        let remote = Arc::new(MockRemote::default());
        let engine = SyncEngine::new(Stores::in_memory(), remote.clone());
        (DebounceScheduler::new(engine), remote)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_push() {
        let (scheduler, remote) = scheduler();
        let delay = Duration::from_millis(3000);

        for i in 1..=5 {
            scheduler.schedule(AuthToken::new(format!("token-{}", i)), delay);
            tokio::time::sleep(Duration::from_millis(1000)).await;
        }
        assert_eq!(remote.writes(), 0);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(remote.writes(), 1);
        assert_eq!(remote.last_token().as_deref(), Some("token-5"));
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_push_separately() {
        let (scheduler, remote) = scheduler();
        let delay = Duration::from_millis(500);

        scheduler.schedule(AuthToken::new("a"), delay);
        tokio::time::sleep(Duration::from_millis(600)).await;
        scheduler.schedule(AuthToken::new("b"), delay);
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(remote.writes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_push() {
        let (scheduler, remote) = scheduler();
        scheduler.schedule(AuthToken::new("a"), Duration::from_millis(500));
        assert!(scheduler.is_pending());

        scheduler.cancel();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(remote.writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_pushes_immediately() {
        let (scheduler, remote) = scheduler();
        assert!(scheduler.flush().await.is_none());

        scheduler.schedule(AuthToken::new("a"), Duration::from_secs(60));
        assert!(scheduler.flush().await.unwrap().is_ok());
        assert_eq!(remote.writes(), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(remote.writes(), 1);
    }
}
