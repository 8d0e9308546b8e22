//! PresenceCoordinator: owns the published snapshot for one Pi-hole
//!
//! A refresh fetches both record sets, merges them and swaps the snapshot in
//! one write. On failure nothing is published and the previous snapshot stays
//! visible to readers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::RefreshError;
use crate::pihole::{merge, PresenceSource, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinatorState {
    Idle,
    Refreshing,
}

/// Outcome of the most recent refresh cycles
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshStatus {
    pub last_update_success: bool,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub device_count: usize,
}

/// Snapshot and the status describing it, swapped together
#[derive(Debug, Clone, Default)]
pub struct Published {
    pub snapshot: Arc<Snapshot>,
    pub status: RefreshStatus,
}

pub struct PresenceCoordinator {
    source: Arc<dyn PresenceSource>,
    published: RwLock<Published>,
    refreshing: AtomicBool,
}

/// Clears the refreshing flag even when the refresh future is dropped mid-flight
struct RefreshingGuard<'a>(&'a AtomicBool);

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PresenceCoordinator {
    pub fn new(source: Arc<dyn PresenceSource>) -> Self {
        Self {
            source,
            published: RwLock::new(Published::default()),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Run one fetch + merge cycle and publish the result.
    ///
    /// Callers are expected to serialize invocations.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, RefreshError> {
        self.refreshing.store(true, Ordering::SeqCst);
        let _guard = RefreshingGuard(&self.refreshing);

        let fetched = tokio::try_join!(self.source.fetch_leases(), self.source.fetch_devices());

        match fetched {
            Ok((leases, devices)) => {
                let snapshot = Arc::new(merge(&leases, &devices));
                let device_count = snapshot.len();

                *self.published.write().await = Published {
                    snapshot: snapshot.clone(),
                    status: RefreshStatus {
                        last_update_success: true,
                        last_refreshed: Some(Utc::now()),
                        last_error: None,
                        device_count,
                    },
                };

                tracing::debug!(
                    "[Presence] {} merged {} leases + {} device records into {} entries",
                    self.source.describe(),
                    leases.len(),
                    devices.len(),
                    device_count
                );
                Ok(snapshot)
            }
            Err(e) => {
                let mut published = self.published.write().await;
                published.status.last_update_success = false;
                published.status.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Snapshot and status from one consistent read
    pub async fn published(&self) -> Published {
        self.published.read().await.clone()
    }

    pub async fn status(&self) -> RefreshStatus {
        self.published.read().await.status.clone()
    }

    pub fn state(&self) -> CoordinatorState {
        if self.refreshing.load(Ordering::SeqCst) {
            CoordinatorState::Refreshing
        } else {
            CoordinatorState::Idle
        }
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }
}
