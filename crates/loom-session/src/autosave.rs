//! Periodic background persistence
//!
//! A tokio task ticks at a fixed interval and saves the session when it has
//! unsaved changes. A save may land between two completions of a
//! multi-branch generation; the next tick picks up the rest.

use crate::error::StoreError;
use crate::session::LoomSession;
use crate::store::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Shortest tick the loop accepts
pub const MIN_AUTOSAVE_INTERVAL: Duration = Duration::from_millis(1);

/// Running auto-save task
#[derive(Debug)]
pub struct AutosaveHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<usize>,
}

impl AutosaveHandle {
    /// Stop ticking, flush unsaved changes, and return the number of saves
    ///
    /// # Errors
    /// Returns [`StoreError::Task`] if the task panicked
    pub async fn shutdown(self) -> Result<usize, StoreError> {
        // Receiver gone means the task already ended.
        let _ = self.stop.send(true);
        self.task
            .await
            .map_err(|e| StoreError::Task(e.to_string()))
    }

    /// Stop without a final flush
    pub fn abort(self) {
        self.task.abort();
    }
}

/// Spawn the auto-save loop on the current tokio runtime
///
/// `interval` is floored at [`MIN_AUTOSAVE_INTERVAL`].
#[must_use]
pub fn spawn_autosave(
    session: Arc<LoomSession>,
    store: Arc<dyn RecordStore>,
    interval: Duration,
) -> AutosaveHandle {
    let interval = interval.max(MIN_AUTOSAVE_INTERVAL);
    let (stop, mut stopped) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut saves = 0;

        loop {
            let last = tokio::select! {
                _ = ticker.tick() => false,
                _ = stopped.changed() => true,
            };
            match session.save_if_dirty(store.as_ref()).await {
                Ok(true) => saves += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(error = %e, "auto-save failed"),
            }
            if last {
                break;
            }
        }
        tracing::debug!(saves, "auto-save stopped");
        saves
    });

    let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
    tracing::info!(interval_ms, "auto-save started");
    AutosaveHandle { stop, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ScriptedGenerator;
    use crate::store::MemoryStore;
    use loom_core::LoomTree;

    #[tokio::test]
    async fn saves_only_when_dirty_and_flushes_on_shutdown() {
        let session = Arc::new(LoomSession::new(
            LoomTree::new(),
            Arc::new(ScriptedGenerator::new()),
        ));
        let store = Arc::new(MemoryStore::new());
        let handle = spawn_autosave(session.clone(), store.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.save_count(), 0);

        session.commit_edit("first", "").unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.save_count(), 1);

        session.commit_edit("first, revised", "").unwrap();
        let saves = handle.shutdown().await.unwrap();
        assert_eq!(saves, 2);
        assert!(!session.is_dirty());
        assert_eq!(store.latest().unwrap().focus.id, session.focus());
    }

    #[tokio::test]
    async fn zero_interval_is_floored() {
        let session = Arc::new(LoomSession::new(
            LoomTree::new(),
            Arc::new(ScriptedGenerator::new()),
        ));
        let store = Arc::new(MemoryStore::new());
        let handle = spawn_autosave(session.clone(), store.clone(), Duration::ZERO);

        session.commit_edit("tick", "").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.save_count(), 1);
        assert_eq!(handle.shutdown().await.unwrap(), 1);
    }
}
