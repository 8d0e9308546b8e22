//! pihole-presence - Network presence from Pi-hole
//!
//! Polls a Pi-hole's DHCP lease and network device endpoints, merges them per
//! hardware address, and serves presence views over a read-only HTTP API.

mod api;
mod config;
mod error;
mod pihole;
mod presence;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::ApiState;
use crate::pihole::PiholeClient;
use crate::presence::{PresenceCoordinator, PresenceSyncer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pihole_presence=info,tower_http=debug".into()),
        )
        .init();

    tracing::info!("Starting pihole-presence...");

    // Load configuration
    let config = config::Config::load()?;
    tracing::info!(
        "Configuration loaded: host={}, scan_interval={}s, away_time={}s",
        config.pihole.base_url(),
        config.pihole.scan_interval,
        config.pihole.away_time
    );

    // One client + coordinator per configured Pi-hole
    let client = PiholeClient::new(
        &config.pihole.base_url(),
        Duration::from_secs(config.pihole.request_timeout),
    )?;
    let coordinator = Arc::new(PresenceCoordinator::new(Arc::new(client)));

    // First refresh before serving; failure is not fatal, the syncer keeps trying
    match coordinator.refresh().await {
        Ok(snapshot) => tracing::info!("Initial refresh found {} devices", snapshot.len()),
        Err(e) => tracing::warn!("Initial refresh failed (will retry): {}", e),
    }

    let syncer = Arc::new(PresenceSyncer::new(
        coordinator.clone(),
        Duration::from_secs(config.pihole.scan_interval),
    ));
    let sync_task = syncer.spawn();

    let state = ApiState {
        coordinator: coordinator.clone(),
        away_time: config.pihole.away_time,
        scan_interval: config.pihole.scan_interval,
    };

    let app = api::routes().with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    // Start server
    let ip: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(ip, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Teardown: stop polling; an in-flight refresh is dropped without publishing
    sync_task.abort();
    let _ = sync_task.await;
    drop(coordinator);
    tracing::info!("Shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
