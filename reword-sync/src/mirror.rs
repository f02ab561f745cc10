//! Debounced MASTER-slot broadcasting and the polling fallback.
//!
//! A burst of local edits coalesces into a single snapshot write after a
//! quiet interval. The writer remembers the stamp of its own last write so
//! the notification handler and poller can tell an echo of their own
//! broadcast from a genuine remote change — without that, two contexts
//! re-merging each other's re-broadcasts would cycle writes indefinitely.

use crate::channel::{SlotChannel, MASTER_SLOT};
use crate::error::{SyncError, SyncResult};
use crate::merge::{MergeEngine, MergeOutcome};
use crate::protocol::Snapshot;
use reword_types::Stamp;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Debounced writer of the MASTER slot.
pub struct MirrorWriter {
    channel: Arc<dyn SlotChannel>,
    debounce: Duration,
    tombstone_ttl: Duration,
    last_written: Mutex<Option<Stamp>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl MirrorWriter {
    /// Creates a writer over the given channel.
    pub fn new(channel: Arc<dyn SlotChannel>, debounce: Duration, tombstone_ttl: Duration) -> Self {
        Self {
            channel,
            debounce,
            tombstone_ttl,
            last_written: Mutex::new(None),
            pending: Mutex::new(None),
        }
    }

    /// Schedules a broadcast after the quiet interval.
    ///
    /// A new request while one is pending resets the timer; only the last
    /// request in a burst actually writes. No cancellation beyond that —
    /// a scheduled write eventually happens.
    pub fn schedule(self: &Arc<Self>, engine: &Arc<MergeEngine>) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        let writer = Arc::clone(self);
        let engine = Arc::clone(engine);
        let delay = self.debounce;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = writer.flush(&engine).await {
                // Background sync never surfaces errors to the page.
                warn!("mirror broadcast failed: {e}");
            }
        }));
    }

    /// Writes the current local snapshot immediately.
    pub async fn flush(&self, engine: &MergeEngine) -> SyncResult<()> {
        let snapshot = engine.local_snapshot(self.tombstone_ttl)?;
        let payload = snapshot.encode()?;
        *self.last_written.lock().unwrap() = Some(snapshot.timestamp);
        self.channel.write(MASTER_SLOT, payload).await?;
        debug!(
            rules = snapshot.rules.len(),
            stamp = %snapshot.timestamp,
            "mirrored snapshot"
        );
        Ok(())
    }

    /// True if `stamp` matches this writer's own last broadcast.
    #[must_use]
    pub fn is_own_write(&self, stamp: Stamp) -> bool {
        *self.last_written.lock().unwrap() == Some(stamp)
    }
}

/// Reads the MASTER slot once and merges it if it is a genuine remote
/// snapshot.
///
/// Returns `Ok(None)` when the slot is empty, holds this context's own
/// write, or holds a payload that does not parse (discarded; the next poll
/// gets another chance). Duplicate or out-of-order delivery is harmless
/// because merge is idempotent and last-writer-wins.
pub async fn poll_master(
    channel: &Arc<dyn SlotChannel>,
    writer: &MirrorWriter,
    engine: &MergeEngine,
) -> SyncResult<Option<MergeOutcome>> {
    let Some(raw) = channel.read(MASTER_SLOT).await? else {
        return Ok(None);
    };

    let snapshot = match Snapshot::decode(&raw) {
        Ok(s) => s,
        Err(SyncError::MalformedPayload(reason)) => {
            warn!("discarding malformed MASTER payload: {reason}");
            return Ok(None);
        }
        Err(other) => return Err(other),
    };

    if writer.is_own_write(snapshot.timestamp) {
        return Ok(None);
    }

    let outcome = engine.merge(&snapshot)?;
    Ok(Some(outcome))
}
