//! Pi-hole API integration
//!
//! - `models`: Wire types for the lease and device endpoints
//! - `client`: HTTP client against one Pi-hole instance
//! - `merge`: Folding both payloads into a per-MAC snapshot

pub mod client;
pub mod merge;
pub mod models;

pub use client::PiholeClient;
pub use merge::{merge, normalize_mac, DeviceEntry, Snapshot};

use async_trait::async_trait;

use crate::error::RefreshError;
use models::{DeviceRecord, LeaseRecord};

/// Source of the two record sets a refresh cycle needs
#[async_trait]
pub trait PresenceSource: Send + Sync {
    async fn fetch_leases(&self) -> Result<Vec<LeaseRecord>, RefreshError>;

    async fn fetch_devices(&self) -> Result<Vec<DeviceRecord>, RefreshError>;

    /// Human-readable target, used in logs
    fn describe(&self) -> String;
}
