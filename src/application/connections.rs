// Active connection registry
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    active: Arc<Mutex<HashMap<u64, String>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection; it stays registered until the guard is dropped.
    pub fn register(&self, peer: impl Into<String>) -> ConnectionGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, peer.into());
        ConnectionGuard {
            id,
            registry: self.clone(),
        }
    }

    pub fn active(&self) -> usize {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn peers(&self) -> Vec<String> {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let mut peers: Vec<(u64, String)> =
            active.iter().map(|(id, peer)| (*id, peer.clone())).collect();
        peers.sort_by_key(|(id, _)| *id);
        peers.into_iter().map(|(_, peer)| peer).collect()
    }

    fn unregister(&self, id: u64) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

pub struct ConnectionGuard {
    id: u64,
    registry: ConnectionRegistry,
}

impl ConnectionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_track_membership() {
        let registry = ConnectionRegistry::new();
        let first = registry.register("10.0.0.1:5000");
        let second = registry.register("10.0.0.2:5000");
        assert_ne!(first.id(), second.id());
        assert_eq!(registry.active(), 2);
        assert_eq!(registry.peers(), vec!["10.0.0.1:5000", "10.0.0.2:5000"]);

        drop(first);
        assert_eq!(registry.active(), 1);
        assert_eq!(registry.peers(), vec!["10.0.0.2:5000"]);

        drop(second);
        assert_eq!(registry.active(), 0);
    }
}
