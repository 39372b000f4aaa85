// Snapshot and rolling history domain models
use super::efficiency::EfficiencyMetrics;
use super::normalizer::{NormalizedReactorMetrics, NormalizedTurbineMetrics};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Normal,
    Critical,
    Offline,
}

impl Status {
    /// `Offline` until any data has arrived, then driven by the anomaly list.
    pub fn derive(has_data: bool, anomalies: &[String]) -> Self {
        if !has_data {
            Status::Offline
        } else if anomalies.is_empty() {
            Status::Normal
        } else {
            Status::Critical
        }
    }
}

/// One consistent, fully recomputed view of the plant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub revision: u64,
    pub timestamp: DateTime<Utc>,
    pub status: Status,
    pub reactor: Option<NormalizedReactorMetrics>,
    pub turbine: Option<NormalizedTurbineMetrics>,
    pub efficiency: Option<EfficiencyMetrics>,
    pub anomalies: Vec<String>,
    /// Receive time of the raw sample each side was computed from.
    pub reactor_updated_at: Option<DateTime<Utc>>,
    pub turbine_updated_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn offline(timestamp: DateTime<Utc>) -> Self {
        Self {
            revision: 0,
            timestamp,
            status: Status::Offline,
            reactor: None,
            turbine: None,
            efficiency: None,
            anomalies: Vec::new(),
            reactor_updated_at: None,
            turbine_updated_at: None,
        }
    }
}

/// Bounded FIFO of past snapshots. Overflow silently drops the oldest entry.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    capacity: usize,
    entries: VecDeque<Snapshot>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn to_vec(&self) -> Vec<Snapshot> {
        self.entries.iter().cloned().collect()
    }
}
