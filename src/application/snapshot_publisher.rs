// Publisher trait for the durable snapshot artifact
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Document consumed by external visualization processes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedSnapshot {
    /// Commit revision; used to order concurrent publishes, not written out.
    #[serde(skip)]
    pub revision: u64,
    pub timestamp: String,
    pub reactor: Map<String, Value>,
    pub turbine: Map<String, Value>,
    pub status: PublishedStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublishedStatus {
    #[serde(rename = "ativo")]
    Active,
    #[serde(rename = "aguardando_dados")]
    AwaitingData,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write snapshot artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait SnapshotPublisher: Send + Sync {
    /// Persist the document so readers only ever see a complete artifact.
    async fn publish(&self, snapshot: &PublishedSnapshot) -> Result<(), PublishError>;
}

/// Publisher used when the artifact is disabled in configuration.
pub struct NoopPublisher;

#[async_trait]
impl SnapshotPublisher for NoopPublisher {
    async fn publish(&self, _snapshot: &PublishedSnapshot) -> Result<(), PublishError> {
        Ok(())
    }
}
