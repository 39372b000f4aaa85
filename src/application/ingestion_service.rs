// Ingestion service - per-connection protocol and message dispatch
use crate::application::connections::{ConnectionGuard, ConnectionRegistry};
use crate::application::snapshot_publisher::SnapshotPublisher;
use crate::application::telemetry_store::TelemetryStore;
use crate::domain::raw::{RawSample, Source};
use crate::infrastructure::wire::{
    unix_seconds, ClientMessage, ConnectionAck, RawDataPayload, ServerMessage,
};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Streaming,
    Closed,
}

/// Protocol state of one client connection. Holds the connection's slot in
/// the registry; closing or dropping the session releases it.
pub struct Session {
    state: SessionState,
    peer: String,
    registration: Option<ConnectionGuard>,
}

impl Session {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn id(&self) -> Option<u64> {
        self.registration.as_ref().map(ConnectionGuard::id)
    }

    /// Produce the connection acknowledgement and start streaming.
    pub fn greet(&mut self) -> Option<ConnectionAck> {
        match self.state {
            SessionState::Connected => {
                self.state = SessionState::Streaming;
                Some(ConnectionAck::new(Utc::now()))
            }
            _ => None,
        }
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
        self.registration = None;
    }
}

#[derive(Clone)]
pub struct IngestionService {
    store: Arc<TelemetryStore>,
    publisher: Arc<dyn SnapshotPublisher>,
    connections: ConnectionRegistry,
}

impl IngestionService {
    pub fn new(
        store: Arc<TelemetryStore>,
        publisher: Arc<dyn SnapshotPublisher>,
        connections: ConnectionRegistry,
    ) -> Self {
        Self {
            store,
            publisher,
            connections,
        }
    }

    pub fn store(&self) -> &Arc<TelemetryStore> {
        &self.store
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    pub fn open_session(&self, peer: impl Into<String>) -> Session {
        let peer = peer.into();
        let registration = self.connections.register(peer.clone());
        tracing::info!(
            "Client {} connected ({} active)",
            peer,
            self.connections.active()
        );
        Session {
            state: SessionState::Connected,
            peer,
            registration: Some(registration),
        }
    }

    /// Handle one inbound text frame. Every frame gets exactly one reply;
    /// bad frames are answered with `erro` and never touch the store.
    pub async fn handle_text(&self, session: &Session, text: &str) -> ServerMessage {
        match ClientMessage::decode(text) {
            Ok(message) => self.dispatch(session, message).await,
            Err(err) => {
                tracing::warn!("Rejected message from {}: {}", session.peer(), err);
                ServerMessage::error(&err)
            }
        }
    }

    async fn dispatch(&self, session: &Session, message: ClientMessage) -> ServerMessage {
        let now = Utc::now();
        match message {
            ClientMessage::ReactorData(fields) => {
                tracing::debug!("Reactor data from {} ({} fields)", session.peer(), fields.len());
                self.ingest(Source::Reactor, RawSample::new(fields, now)).await;
                ServerMessage::reactor_received(now)
            }
            ClientMessage::TurbineData(fields) => {
                tracing::debug!("Turbine data from {} ({} fields)", session.peer(), fields.len());
                self.ingest(Source::Turbine, RawSample::new(fields, now)).await;
                ServerMessage::turbine_received(now)
            }
            ClientMessage::RawDataRequest => ServerMessage::RawData {
                dados: self.raw_payload(),
                timestamp: unix_seconds(now),
            },
            ClientMessage::Ping(timestamp) => ServerMessage::Pong { timestamp },
        }
    }

    async fn ingest(&self, source: Source, sample: RawSample) {
        let commit = self.store.merge(source, sample);
        tracing::debug!(
            "Merged {} sample into revision {} ({:?})",
            source,
            commit.snapshot.revision,
            commit.snapshot.status
        );
        if !commit.snapshot.anomalies.is_empty() {
            tracing::warn!(
                "Revision {} is {:?}: {}",
                commit.snapshot.revision,
                commit.snapshot.status,
                commit.snapshot.anomalies.join("; ")
            );
        }

        // Outside the store's critical section; failures never reach the client.
        if let Err(err) = self.publisher.publish(&commit.published).await {
            tracing::error!("Failed to publish revision {}: {}", commit.snapshot.revision, err);
        }
    }

    /// Current pre-normalization state of both sources.
    pub fn raw_payload(&self) -> RawDataPayload {
        let raw = self.store.current_raw();
        let fields = |sample: Option<RawSample>| -> Map<String, Value> {
            sample.map(|s| s.fields).unwrap_or_default()
        };
        RawDataPayload {
            reator: fields(raw.reactor),
            turbina: fields(raw.turbine),
            timestamp: unix_seconds(Utc::now()),
        }
    }
}
