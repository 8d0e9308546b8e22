//! API module - read-only HTTP surface over the presence snapshot

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::presence::PresenceCoordinator;

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub coordinator: Arc<PresenceCoordinator>,
    pub away_time: u64,
    pub scan_interval: u64,
}

pub fn routes() -> Router<ApiState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/api/health", get(handlers::health_check))
        // Coordinator
        .route("/api/status", get(handlers::get_status))
        .route("/api/snapshot", get(handlers::get_snapshot))
        // Devices
        .route("/api/devices", get(handlers::list_devices))
        .route("/api/devices/:mac", get(handlers::get_device))
}
