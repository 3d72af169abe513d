//! Long-lived tasks that run next to the HTTP server.

use crate::AppState;
use pastebin_core::changes::{self, ChangeFeed};
use pastebin_core::ShutdownTrigger;
use tokio::task::JoinHandle;

/// Handles for the spawned background tasks.
pub struct BackgroundTasks {
    /// Producer side of the change feed; objects sent here are persisted.
    pub feed: ChangeFeed,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl BackgroundTasks {
    /// Number of running tasks.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every task to exit. Call after triggering shutdown.
    pub async fn join(self) {
        drop(self.feed);
        for (name, handle) in self.handles {
            if let Err(err) = handle.await {
                tracing::error!("Background task {} failed: {}", name, err);
            }
        }
    }
}

/// Start the expired-paste sweep, the change poller, the change-feed sink,
/// and, when configured, the demo generator.
///
/// Every task exits once `shutdown` fires.
pub fn spawn_background_tasks(state: &AppState, shutdown: &ShutdownTrigger) -> BackgroundTasks {
    let config = &state.config;
    let (feed, rx) = changes::change_feed();
    let mut handles = vec![
        (
            "expiry-sweep",
            tokio::spawn(
                state
                    .services
                    .pastes
                    .clone()
                    .run_expiry_sweep(config.expired_sweep_interval, shutdown.subscribe()),
            ),
        ),
        (
            "change-poller",
            tokio::spawn(changes::log_changes(
                state.storage.clone(),
                config.change_poll_interval,
                shutdown.subscribe(),
            )),
        ),
        (
            "change-sink",
            tokio::spawn(changes::store_from_channel(
                rx,
                state.storage.clone(),
                shutdown.subscribe(),
            )),
        ),
    ];

    if let Some(interval) = config.demo_feed_interval {
        tracing::info!("Demo object generator enabled every {:?}", interval);
        handles.push((
            "demo-generator",
            tokio::spawn(changes::generate_demo_objects(
                feed.clone(),
                interval,
                shutdown.subscribe(),
            )),
        ));
    }

    BackgroundTasks { feed, handles }
}

#[cfg(test)]
mod tests {
    use super::spawn_background_tasks;
    use crate::{AppState, Config, Storage};
    use pastebin_core::models::Stats;
    use pastebin_core::shutdown_channel;
    use std::time::Duration;

    fn memory_config() -> Config {
        let mut config = Config::from_lookup(|_| None);
        config.backend = pastebin_core::StorageBackend::Memory;
        config.change_poll_interval = Duration::from_millis(20);
        config
    }

    #[tokio::test]
    async fn feed_objects_are_persisted_and_tasks_stop() {
        let state = AppState::new(memory_config(), Storage::in_memory());
        let (trigger, _signal) = shutdown_channel();
        let tasks = spawn_background_tasks(&state, &trigger);
        assert_eq!(tasks.len(), 3);

        tasks.feed.send(Stats::new("fed").into()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), async {
            while state.storage.stats.get("fed").is_err() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("object persisted from the feed");

        trigger.trigger();
        tokio::time::timeout(Duration::from_secs(2), tasks.join())
            .await
            .expect("tasks exit after shutdown");
    }

    #[tokio::test]
    async fn demo_generator_is_opt_in() {
        let mut config = memory_config();
        config.demo_feed_interval = Some(Duration::from_secs(60));
        let state = AppState::new(config, Storage::in_memory());
        let (trigger, _signal) = shutdown_channel();
        let tasks = spawn_background_tasks(&state, &trigger);
        assert_eq!(tasks.len(), 4);
        trigger.trigger();
        tokio::time::timeout(Duration::from_secs(2), tasks.join())
            .await
            .expect("tasks exit after shutdown");
    }
}
