//! Shared slot channel abstraction.
//!
//! The only synchronization substrate between contexts is a pair of shared
//! key-value slots. The trait models exactly what the host platform
//! guarantees: totally-replacing writes, reads of the latest value, and a
//! best-effort change notification. Delivery of notifications is neither
//! reliable nor ordered — a lagging subscriber silently loses them — which
//! is why every consumer also runs a fixed-interval poll.

use crate::error::SyncResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Well-known key for the mirrored full rule snapshot.
pub const MASTER_SLOT: &str = "reword/master";

/// Well-known key for the per-origin active-rule publication.
pub const ACTIVE_SLOT: &str = "reword/active";

/// A shared, globally readable/writable key-value slot store.
///
/// There is no locking discipline across contexts: writes are
/// read-modify-write races by design, and the merge layer's
/// last-writer-wins/union semantics exist to absorb that.
#[async_trait]
pub trait SlotChannel: Send + Sync {
    /// Replaces the value under `key`. Idempotent and total.
    async fn write(&self, key: &str, payload: String) -> SyncResult<()>;

    /// Reads the latest value under `key`, if any.
    async fn read(&self, key: &str) -> SyncResult<Option<String>>;

    /// Subscribes to change notifications. Each received value is the key
    /// that changed. Best-effort only.
    fn subscribe(&self) -> broadcast::Receiver<String>;
}

/// In-memory slot store shared by `Arc` between simulated contexts.
///
/// This is both the test double and the reference implementation of the
/// channel contract; a host adapter wrapping real extension storage has the
/// same observable behavior.
pub struct MemorySlots {
    slots: Mutex<HashMap<String, String>>,
    changes: broadcast::Sender<String>,
}

impl MemorySlots {
    /// Creates an empty slot store.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let (changes, _) = broadcast::channel(64);
        Arc::new(Self {
            slots: Mutex::new(HashMap::new()),
            changes,
        })
    }

    /// Drops the value under `key` (host cleared its storage).
    pub fn clear(&self, key: &str) {
        self.slots.lock().unwrap().remove(key);
        let _ = self.changes.send(key.to_string());
    }
}

#[async_trait]
impl SlotChannel for MemorySlots {
    async fn write(&self, key: &str, payload: String) -> SyncResult<()> {
        self.slots.lock().unwrap().insert(key.to_string(), payload);
        // No receivers is fine; notification is best-effort.
        let _ = self.changes.send(key.to_string());
        Ok(())
    }

    async fn read(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.slots.lock().unwrap().get(key).cloned())
    }

    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }
}
