// File-backed snapshot publisher with atomic replace
use crate::application::snapshot_publisher::{PublishError, PublishedSnapshot, SnapshotPublisher};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

#[derive(Debug)]
pub struct FileSnapshotPublisher {
    path: PathBuf,
    /// Highest revision on disk. Held across write+rename so publishes are
    /// serialized and an older revision never replaces a newer one.
    last_revision: Mutex<Option<u64>>,
}

impl FileSnapshotPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_revision: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(path: &Path, source: std::io::Error) -> PublishError {
        PublishError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl SnapshotPublisher for FileSnapshotPublisher {
    async fn publish(&self, snapshot: &PublishedSnapshot) -> Result<(), PublishError> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;

        let mut last_revision = self.last_revision.lock().await;
        if last_revision.is_some_and(|last| last > snapshot.revision) {
            tracing::debug!(
                "Skipping stale revision {} (already published {:?})",
                snapshot.revision,
                *last_revision
            );
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| Self::io_error(parent, err))?;
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, &bytes)
            .await
            .map_err(|err| Self::io_error(&temp_path, err))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|err| Self::io_error(&self.path, err))?;

        *last_revision = Some(snapshot.revision);
        tracing::debug!(
            "Published revision {} to {}",
            snapshot.revision,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::snapshot_publisher::PublishedStatus;
    use serde_json::{json, Map, Value};
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!(
            "fusion-telemetry-{name}-{}-{nanos}",
            std::process::id()
        ))
    }

    fn document(revision: u64) -> PublishedSnapshot {
        let mut reactor = Map::new();
        reactor.insert("plasma_temperature".to_string(), json!(revision * 1000));
        // Pad the document so a torn write would be observable.
        reactor.insert("padding".to_string(), json!("x".repeat(16 * 1024)));
        PublishedSnapshot {
            revision,
            timestamp: format!("2026-10-16T12:00:{:02}.000+00:00", revision % 60),
            reactor,
            turbine: Map::new(),
            status: PublishedStatus::Active,
        }
    }

    #[tokio::test]
    async fn writes_document_and_removes_temp_file() {
        let dir = scratch_dir("write");
        let publisher = FileSnapshotPublisher::new(dir.join("nested").join("fusion_data.json"));

        publisher.publish(&document(1)).await.expect("publish");

        let body: Value =
            serde_json::from_slice(&fs::read(publisher.path()).await.expect("read")).expect("json");
        assert_eq!(body["status"], "ativo");
        assert_eq!(body["reactor"]["plasma_temperature"], json!(1000));
        assert!(body.get("revision").is_none());
        assert!(!publisher.temp_path().exists());

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn stale_revision_does_not_overwrite() {
        let dir = scratch_dir("stale");
        let publisher = FileSnapshotPublisher::new(dir.join("fusion_data.json"));

        publisher.publish(&document(5)).await.expect("publish newer");
        publisher.publish(&document(3)).await.expect("skip older");

        let body: Value =
            serde_json::from_slice(&fs::read(publisher.path()).await.expect("read")).expect("json");
        assert_eq!(body["reactor"]["plasma_temperature"], json!(5000));

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn unwritable_location_reports_io_error() {
        let dir = scratch_dir("blocked");
        fs::create_dir_all(&dir).await.expect("mkdir");
        // A regular file where a directory is expected.
        let blocker = dir.join("blocker");
        fs::write(&blocker, b"x").await.expect("write blocker");

        let publisher = FileSnapshotPublisher::new(blocker.join("fusion_data.json"));
        let err = publisher.publish(&document(1)).await.unwrap_err();
        assert!(matches!(err, PublishError::Io { .. }));

        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_observe_partial_documents() {
        let dir = scratch_dir("race");
        let publisher = Arc::new(FileSnapshotPublisher::new(dir.join("fusion_data.json")));
        let path = publisher.path().to_path_buf();

        let mut writers = Vec::new();
        for writer in 0..8u64 {
            let publisher = publisher.clone();
            writers.push(tokio::spawn(async move {
                for round in 0..25u64 {
                    publisher
                        .publish(&document(round * 8 + writer + 1))
                        .await
                        .expect("publish");
                }
            }));
        }

        let mut readers = Vec::new();
        for _ in 0..4 {
            let path = path.clone();
            readers.push(tokio::spawn(async move {
                let mut parsed = 0usize;
                for _ in 0..200 {
                    match fs::read(&path).await {
                        Ok(bytes) => {
                            serde_json::from_slice::<Value>(&bytes)
                                .expect("complete JSON document");
                            parsed += 1;
                        }
                        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                        Err(err) => panic!("unexpected read error: {err}"),
                    }
                    tokio::task::yield_now().await;
                }
                parsed
            }));
        }

        for writer in writers {
            writer.await.expect("writer task");
        }
        for reader in readers {
            reader.await.expect("reader task");
        }

        let body: Value =
            serde_json::from_slice(&fs::read(&path).await.expect("read")).expect("json");
        assert_eq!(body["reactor"]["plasma_temperature"], json!(200 * 1000));

        let _ = fs::remove_dir_all(&dir).await;
    }
}
