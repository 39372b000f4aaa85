// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::application::connections::ConnectionRegistry;
use crate::application::ingestion_service::IngestionService;
use crate::application::snapshot_publisher::{NoopPublisher, SnapshotPublisher};
use crate::application::telemetry_store::TelemetryStore;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::file_publisher::FileSnapshotPublisher;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    current_snapshot, health_check, raw_data, service_status, snapshot_history, stream_snapshots,
};
use crate::presentation::websocket::ingest_socket;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fusion_telemetry=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create store and publisher
    let store = Arc::new(TelemetryStore::new(
        config.telemetry.history_capacity,
        config.thresholds.clone(),
    ));
    let publisher: Arc<dyn SnapshotPublisher> = if config.publisher.enabled {
        let publisher = FileSnapshotPublisher::new(config.publisher.path.clone());
        tracing::info!("Publishing snapshots to {}", publisher.path().display());
        Arc::new(publisher)
    } else {
        tracing::info!("Snapshot publishing disabled");
        Arc::new(NoopPublisher)
    };

    // Create application state
    let state = Arc::new(AppState {
        ingestion_service: IngestionService::new(store, publisher, ConnectionRegistry::new()),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/", get(ingest_socket))
        .route("/healthz", get(health_check))
        .route("/api/status", get(service_status))
        .route("/api/snapshot", get(current_snapshot))
        .route(
            "/api/history",
            get(snapshot_history).layer(CompressionLayer::new()),
        )
        .route("/api/raw", get(raw_data))
        .route("/api/stream", get(stream_snapshots))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.socket_addr();
    tracing::info!(
        "Starting fusion-telemetry on {} (history capacity {})",
        addr,
        config.telemetry.history_capacity
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
