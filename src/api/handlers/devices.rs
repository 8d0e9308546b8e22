//! Presence API handlers

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::ApiState;
use crate::error::AppError;
use crate::pihole::{normalize_mac, Snapshot};
use crate::presence::coordinator::{CoordinatorState, RefreshStatus};
use crate::presence::projection::{DeviceView, ProjectionContext, TimestampStyle};

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub timestamps: TimestampStyle,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub target: String,
    pub state: CoordinatorState,
    #[serde(flatten)]
    pub refresh: RefreshStatus,
    pub scan_interval: u64,
    pub away_time: u64,
}

/// Snapshot plus projection inputs taken from a single coordinator read
async fn published_view(
    state: &ApiState,
    timestamps: TimestampStyle,
) -> Result<(Arc<Snapshot>, ProjectionContext), AppError> {
    let published = state.coordinator.published().await;
    if published.status.last_refreshed.is_none() {
        return Err(AppError::Unavailable(format!(
            "No data from {} yet: {}",
            state.coordinator.describe(),
            published
                .status
                .last_error
                .as_deref()
                .unwrap_or("first refresh pending")
        )));
    }

    let ctx = ProjectionContext {
        now: Utc::now(),
        away_timeout: state.away_time,
        available: published.status.last_update_success,
        timestamps,
    };
    Ok((published.snapshot, ctx))
}

/// GET /api/status - Coordinator state and last refresh outcome
pub async fn get_status(State(state): State<ApiState>) -> impl IntoResponse {
    Json(StatusResponse {
        target: state.coordinator.describe(),
        state: state.coordinator.state(),
        refresh: state.coordinator.status().await,
        scan_interval: state.scan_interval,
        away_time: state.away_time,
    })
}

/// GET /api/snapshot - Raw merged entries keyed by MAC
pub async fn get_snapshot(State(state): State<ApiState>) -> Result<impl IntoResponse, AppError> {
    let (snapshot, _) = published_view(&state, TimestampStyle::Epoch).await?;
    Ok(Json(snapshot.as_ref().clone()))
}

/// GET /api/devices - Projected view of every known device
pub async fn list_devices(
    State(state): State<ApiState>,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (snapshot, ctx) = published_view(&state, query.timestamps).await?;

    let views: Vec<DeviceView> = snapshot
        .iter()
        .map(|(mac, entry)| DeviceView::new(mac, entry, &ctx))
        .collect();

    Ok(Json(views))
}

/// GET /api/devices/:mac - Projected view of one device (any MAC notation)
pub async fn get_device(
    State(state): State<ApiState>,
    Path(mac): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (snapshot, ctx) = published_view(&state, query.timestamps).await?;
    let key = normalize_mac(&mac).ok_or_else(|| AppError::NotFound(mac.clone()))?;

    let entry = snapshot
        .get(&key)
        .ok_or_else(|| AppError::NotFound(format!("Device {} not found", key)))?;

    Ok(Json(DeviceView::new(&key, entry, &ctx)))
}
