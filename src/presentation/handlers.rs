// HTTP request handlers - read-only views of the telemetry store
use crate::domain::snapshot::{Snapshot, Status};
use crate::infrastructure::wire::RawDataPayload;
use crate::presentation::app_state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub status: Status,
    pub revision: u64,
    pub active_connections: usize,
    pub peers: Vec<String>,
    pub history_len: usize,
    pub history_capacity: usize,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn service_status(State(state): State<Arc<AppState>>) -> Json<StatusView> {
    let service = &state.ingestion_service;
    let snapshot = service.store().current_snapshot();
    Json(StatusView {
        status: snapshot.status,
        revision: snapshot.revision,
        active_connections: service.connections().active(),
        peers: service.connections().peers(),
        history_len: service.store().history_len(),
        history_capacity: service.store().history_capacity(),
    })
}

pub async fn current_snapshot(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.ingestion_service.store().current_snapshot().as_ref().clone())
}

/// Rolling history, oldest first
pub async fn snapshot_history(State(state): State<Arc<AppState>>) -> Json<Vec<Snapshot>> {
    Json(state.ingestion_service.store().history())
}

pub async fn raw_data(State(state): State<Arc<AppState>>) -> Json<RawDataPayload> {
    Json(state.ingestion_service.raw_payload())
}

/// Newline-delimited JSON stream of committed snapshots, current one first
pub async fn stream_snapshots(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut rx = state.ingestion_service.store().subscribe();

    let stream = async_stream::stream! {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            match serde_json::to_vec(snapshot.as_ref()) {
                Ok(mut line) => {
                    line.push(b'\n');
                    yield Ok::<Bytes, std::io::Error>(Bytes::from(line));
                }
                Err(err) => {
                    tracing::warn!("Failed to encode revision {}: {}", snapshot.revision, err);
                }
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    };

    let response: Result<Response<Body>, StatusCode> = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(Body::from_stream(stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR);

    match response {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
