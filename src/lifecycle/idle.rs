//! Idle checker
//!
//! A single periodic task per manager. It outlives idle stops so the maps
//! can be loaded again lazily; only [`RuntimeManager::shutdown`] cancels it.

use super::manager::{ManagerState, WeakRuntimeManager};
use super::{MapStore, RuntimeManager};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub(super) fn spawn<S: MapStore>(
    manager: WeakRuntimeManager<S>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!("Idle checker started, period={:?}", period);

        loop {
            interval.tick().await;
            let Some(manager) = manager.upgrade() else {
                tracing::debug!("Runtime manager dropped, idle checker exiting");
                break;
            };
            manager.check_idle().await;
        }
    })
}

impl<S: MapStore> RuntimeManager<S> {
    /// Stop every map if nobody touched them for longer than the idle timeout.
    /// Returns true when maps were released.
    pub(super) async fn check_idle(&self) -> bool {
        let threshold = self.config().idle_timeout;
        if self.idle_for() <= threshold {
            return false;
        }

        let mut inner = self.lock_inner().await;
        // Activity may have landed while we waited for the lock
        let idle_for = self.idle_for();
        if self.state() != ManagerState::Running || idle_for <= threshold {
            return false;
        }

        tracing::info!(
            "Idle for {} ms, stopping maps (count={})",
            idle_for.as_millis(),
            inner.registry.len()
        );
        let failures = self.release_all(&mut inner.registry).await;
        if failures > 0 {
            tracing::warn!("{} map(s) failed to release during idle stop", failures);
        }
        self.set_state(ManagerState::Stopped);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeStore, manager_with};
    use std::sync::Arc;

    // Test config: idle timeout 20s, check period 30s

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_idle_maps_are_released() {
        let store = Arc::new(FakeStore::default());
        let manager = manager_with(&store, &["office", "lobby"]);
        manager.note_activity();
        manager.ensure_started().await.unwrap();

        time::sleep(Duration::from_secs(31)).await;

        assert_eq!(manager.state(), ManagerState::Stopped);
        assert!(manager.list_names().await.is_empty());
        assert!(manager.get("office").await.unwrap_err().is_not_found());
        assert_eq!(store.torn_down().len(), 2);
        assert_eq!(store.live_count(), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_activity_keeps_maps_warm() {
        let store = Arc::new(FakeStore::default());
        let manager = manager_with(&store, &["office"]);
        manager.ensure_started().await.unwrap();

        for _ in 0..6 {
            time::sleep(Duration::from_secs(15)).await;
            manager.note_activity();
        }

        assert!(manager.is_running());
        assert!(store.torn_down().is_empty());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_restart_after_idle_stop_reuses_checker() {
        let store = Arc::new(FakeStore::default());
        let manager = manager_with(&store, &["office"]);
        manager.ensure_started().await.unwrap();

        time::sleep(Duration::from_secs(31)).await;
        assert!(!manager.is_running());

        manager.note_activity();
        let outcome = manager.ensure_started().await.unwrap();
        assert!(matches!(outcome, crate::lifecycle::StartOutcome::Started { .. }));
        assert!(manager.get("office").await.is_ok());
        assert_eq!(store.construct_calls(), 2);

        // The same checker evicts the second generation too
        time::sleep(Duration::from_secs(60)).await;
        assert!(!manager.is_running());
        assert_eq!(store.torn_down().len(), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_check_idle_skips_when_stopped() {
        let store = Arc::new(FakeStore::default());
        let manager = manager_with(&store, &["office"]);

        time::advance(Duration::from_secs(120)).await;
        assert!(!manager.check_idle().await);
        assert!(store.torn_down().is_empty());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_check_idle_respects_threshold() {
        let store = Arc::new(FakeStore::default());
        let manager = manager_with(&store, &["office"]);
        manager.ensure_started().await.unwrap();

        time::advance(Duration::from_secs(20)).await;
        assert!(!manager.check_idle().await);

        time::advance(Duration::from_secs(1)).await;
        assert!(manager.check_idle().await);
        assert!(!manager.is_running());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_activity_while_waiting_for_lock_cancels_eviction() {
        let store = Arc::new(FakeStore::default());
        let manager = manager_with(&store, &["office"]);
        manager.ensure_started().await.unwrap();
        time::advance(Duration::from_secs(21)).await;

        let guard = manager.lock_inner().await;
        let checker = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.check_idle().await })
        };
        tokio::task::yield_now().await;
        assert!(!checker.is_finished());

        manager.note_activity();
        drop(guard);

        assert!(!checker.await.unwrap());
        assert!(manager.is_running());
        assert!(store.torn_down().is_empty());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_shutdown_stops_checker() {
        let store = Arc::new(FakeStore::default());
        let manager = manager_with(&store, &["office"]);
        manager.ensure_started().await.unwrap();
        manager.shutdown().await;

        assert!(manager.lock_inner().await.idle_task.is_none());
        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(store.torn_down().len(), 1);
    }
}
