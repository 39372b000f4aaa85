// Telemetry store - authoritative snapshot and rolling history
use crate::application::snapshot_publisher::{PublishedSnapshot, PublishedStatus};
use crate::domain::anomaly::{detect_anomalies, Thresholds};
use crate::domain::efficiency::calculate_efficiency;
use crate::domain::normalizer::{normalize_reactor, normalize_turbine};
use crate::domain::raw::{RawSample, Source};
use crate::domain::snapshot::{HistoryBuffer, Snapshot, Status};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Pre-normalization field sets of both sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawState {
    pub reactor: Option<RawSample>,
    pub turbine: Option<RawSample>,
}

impl RawState {
    fn get_mut(&mut self, source: Source) -> &mut Option<RawSample> {
        match source {
            Source::Reactor => &mut self.reactor,
            Source::Turbine => &mut self.turbine,
        }
    }

    pub fn has_data(&self) -> bool {
        self.reactor.is_some() || self.turbine.is_some()
    }
}

/// Result of a merge, handed back so I/O can happen outside the lock.
#[derive(Debug, Clone)]
pub struct Commit {
    pub snapshot: Arc<Snapshot>,
    pub published: PublishedSnapshot,
}

struct StoreState {
    raw: RawState,
    snapshot: Arc<Snapshot>,
    history: HistoryBuffer,
    revision: u64,
}

/// Single shared mutable resource. Every merge recomputes and commits a
/// complete snapshot inside one critical section; readers take copies.
pub struct TelemetryStore {
    state: Mutex<StoreState>,
    thresholds: Thresholds,
    updates: watch::Sender<Arc<Snapshot>>,
}

impl TelemetryStore {
    pub fn new(history_capacity: usize, thresholds: Thresholds) -> Self {
        let initial = Arc::new(Snapshot::offline(Utc::now()));
        let (updates, _) = watch::channel(initial.clone());
        Self {
            state: Mutex::new(StoreState {
                raw: RawState::default(),
                snapshot: initial,
                history: HistoryBuffer::new(history_capacity),
                revision: 0,
            }),
            thresholds,
            updates,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // The critical section only assigns fully computed values, so a
        // poisoned guard still holds consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace one source's raw field set, recompute, commit the new
    /// snapshot and append it to the history.
    pub fn merge(&self, source: Source, sample: RawSample) -> Commit {
        let mut state = self.lock();
        *state.raw.get_mut(source) = Some(sample);
        state.revision += 1;

        let snapshot = Arc::new(self.recompute(&state.raw, state.revision, Utc::now()));
        state.snapshot = snapshot.clone();
        state.history.push(snapshot.as_ref().clone());
        let published = published_document(&state.raw, &snapshot);
        self.updates.send_replace(snapshot.clone());

        Commit {
            snapshot,
            published,
        }
    }

    fn recompute(&self, raw: &RawState, revision: u64, now: DateTime<Utc>) -> Snapshot {
        let reactor = raw.reactor.as_ref().map(normalize_reactor);
        let turbine = raw.turbine.as_ref().map(normalize_turbine);

        let efficiency = match (&reactor, &turbine) {
            (Some(r), Some(t)) => Some(calculate_efficiency(r, t)),
            _ => None,
        };
        let anomalies = detect_anomalies(reactor.as_ref(), turbine.as_ref(), &self.thresholds);
        let status = Status::derive(raw.has_data(), &anomalies);

        Snapshot {
            revision,
            timestamp: now,
            status,
            reactor,
            turbine,
            efficiency,
            anomalies,
            reactor_updated_at: raw.reactor.as_ref().map(|s| s.received_at),
            turbine_updated_at: raw.turbine.as_ref().map(|s| s.received_at),
        }
    }

    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.lock().snapshot.clone()
    }

    pub fn current_raw(&self) -> RawState {
        self.lock().raw.clone()
    }

    pub fn history(&self) -> Vec<Snapshot> {
        self.lock().history.to_vec()
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    pub fn history_capacity(&self) -> usize {
        self.lock().history.capacity()
    }

    /// Receiver that observes every committed snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.updates.subscribe()
    }
}

fn published_document(raw: &RawState, snapshot: &Snapshot) -> PublishedSnapshot {
    // The document carries a single top-level timestamp.
    let fields = |sample: &Option<RawSample>| {
        let mut fields = sample
            .as_ref()
            .map(|s| s.fields.clone())
            .unwrap_or_default();
        fields.remove("timestamp");
        fields
    };

    PublishedSnapshot {
        revision: snapshot.revision,
        timestamp: snapshot.timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
        reactor: fields(&raw.reactor),
        turbine: fields(&raw.turbine),
        status: if raw.has_data() {
            PublishedStatus::Active
        } else {
            PublishedStatus::AwaitingData
        },
    }
}
