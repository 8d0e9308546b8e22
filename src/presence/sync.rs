//! PresenceSyncer: periodic refresh of the presence coordinator
//!
//! Runs in a background tokio task. Refreshes are strictly sequential; a
//! failed cycle is logged and the next tick tries again. No retry happens
//! inside a cycle.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

use crate::presence::coordinator::PresenceCoordinator;

pub struct PresenceSyncer {
    coordinator: Arc<PresenceCoordinator>,
    interval: Duration,
}

impl PresenceSyncer {
    pub fn new(coordinator: Arc<PresenceCoordinator>, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
        }
    }

    /// Spawn the sync loop. Aborting the handle drops any in-flight refresh unpublished.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.start().await })
    }

    /// Start the background sync loop (runs forever)
    pub async fn start(self: Arc<Self>) {
        tracing::info!(
            "[PresenceSync] Starting background sync for {} (interval: {}s)",
            self.coordinator.describe(),
            self.interval.as_secs()
        );

        let mut interval_timer = time::interval(self.interval);
        interval_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; the startup refresh already covered it
        interval_timer.tick().await;

        loop {
            interval_timer.tick().await;
            self.sync_once().await;
        }
    }

    /// One refresh with availability-transition logging. Returns whether it succeeded.
    pub async fn sync_once(&self) -> bool {
        let was_available = self.coordinator.status().await.last_update_success;

        match self.coordinator.refresh().await {
            Ok(snapshot) => {
                if !was_available {
                    tracing::info!(
                        "[PresenceSync] {} available, tracking {} devices",
                        self.coordinator.describe(),
                        snapshot.len()
                    );
                }
                true
            }
            Err(e) => {
                if was_available {
                    tracing::warn!(
                        "[PresenceSync] {} unavailable: {}",
                        self.coordinator.describe(),
                        e
                    );
                } else {
                    tracing::debug!(
                        "[PresenceSync] {} still unavailable: {}",
                        self.coordinator.describe(),
                        e
                    );
                }
                false
            }
        }
    }
}
