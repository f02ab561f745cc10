//! Snapshot reconciliation against the local rule store.
//!
//! Merge is the only code path that writes remote state into the local
//! store. It is idempotent (re-applying a snapshot is a no-op) and
//! commutative over snapshot application, which is what lets every context
//! apply MASTER writes in whatever order and multiplicity the channel
//! happens to deliver them.

use crate::blocklist::BlockList;
use crate::error::SyncResult;
use crate::protocol::Snapshot;
use reword_store::RuleStore;
use reword_types::{Rule, RuleId, Signature, Stamp};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Store metadata key holding the serialized blocklist.
const BLOCKLIST_META_KEY: &str = "blocklist";

/// What a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Rules inserted that the local store had never seen.
    pub added: usize,
    /// Local rules overwritten by a newer remote version.
    pub updated: usize,
    /// Local rules removed by a remote tombstone.
    pub removed: usize,
    /// Whether the blocklist gained or lost anything.
    pub blocklist_changed: bool,
}

impl MergeOutcome {
    /// True if the merge modified any local state.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.added > 0 || self.updated > 0 || self.removed > 0 || self.blocklist_changed
    }
}

/// Reconciles incoming snapshots into the local store.
pub struct MergeEngine {
    store: Arc<dyn RuleStore>,
}

impl MergeEngine {
    /// Creates a merge engine over the given store.
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    /// Loads the persisted blocklist, defaulting to empty.
    pub fn blocklist(&self) -> SyncResult<BlockList> {
        match self.store.get_meta(BLOCKLIST_META_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_default()),
            None => Ok(BlockList::new()),
        }
    }

    /// Persists the blocklist.
    pub fn save_blocklist(&self, blocklist: &BlockList) -> SyncResult<()> {
        let raw = serde_json::to_string(blocklist)?;
        self.store.set_meta(BLOCKLIST_META_KEY, &raw)?;
        Ok(())
    }

    /// Applies one snapshot to the local store.
    ///
    /// For each incoming rule: an id match adopts the incoming fields only
    /// if the remote `updated_at` is strictly newer; a signature match
    /// (same policy created independently elsewhere) does the same but
    /// keeps the local id; otherwise the rule is inserted. Tombstones
    /// remove local rules whose last edit is older than the deletion.
    /// Rules merely absent from the snapshot are never deleted.
    pub fn merge(&self, snapshot: &Snapshot) -> SyncResult<MergeOutcome> {
        let mut outcome = MergeOutcome::default();

        // Tombstones first, so a deleted rule arriving in the same snapshot
        // (a writer that has not pruned yet) is not re-inserted.
        let mut tomb_index: HashMap<RuleId, Stamp> = self
            .store
            .tombstones()?
            .into_iter()
            .map(|t| (t.id, t.deleted_at))
            .collect();

        for tombstone in &snapshot.tombstones {
            let known = tomb_index.get(&tombstone.id).copied().unwrap_or(Stamp::ZERO);
            if tombstone.deleted_at > known {
                self.store.record_tombstone(tombstone)?;
                tomb_index.insert(tombstone.id, tombstone.deleted_at);
            }
            if let Some(local) = self.store.get(&tombstone.id)? {
                if tombstone.overrides(local.updated_at) {
                    self.store.delete(&tombstone.id)?;
                    outcome.removed += 1;
                    debug!("tombstone removed rule {}", tombstone.id);
                }
            }
        }

        let local = self.store.get_all()?;
        let mut by_id: HashMap<RuleId, Rule> =
            local.iter().map(|r| (r.id, r.clone())).collect();
        let mut by_sig: HashMap<Signature, RuleId> =
            local.iter().map(|r| (r.signature(), r.id)).collect();

        for incoming in &snapshot.rules {
            let incoming = incoming.clone().normalized();

            // An unexpired deletion newer than the incoming copy wins.
            if let Some(deleted_at) = tomb_index.get(&incoming.id) {
                if *deleted_at > incoming.updated_at {
                    continue;
                }
            }

            if let Some(existing) = by_id.get(&incoming.id) {
                if incoming.updated_at > existing.updated_at {
                    self.store.put(&incoming)?;
                    by_sig.remove(&existing.signature());
                    by_sig.insert(incoming.signature(), incoming.id);
                    by_id.insert(incoming.id, incoming);
                    outcome.updated += 1;
                }
            } else if let Some(local_id) = by_sig.get(&incoming.signature()).copied() {
                // Same policy under a different id: same logical rule,
                // keep the id the local store already hands out.
                let existing = &by_id[&local_id];
                if incoming.updated_at > existing.updated_at {
                    let mut adopted = incoming;
                    adopted.id = local_id;
                    self.store.put(&adopted)?;
                    by_id.insert(local_id, adopted);
                    outcome.updated += 1;
                }
            } else {
                self.store.put(&incoming)?;
                by_sig.insert(incoming.signature(), incoming.id);
                by_id.insert(incoming.id, incoming);
                outcome.added += 1;
            }
        }

        let local_blocklist = self.blocklist()?;
        let merged_blocklist = local_blocklist.merged(&snapshot.blocklist);
        if merged_blocklist != local_blocklist {
            self.save_blocklist(&merged_blocklist)?;
            outcome.blocklist_changed = true;
        }

        if outcome.changed() {
            info!(
                added = outcome.added,
                updated = outcome.updated,
                removed = outcome.removed,
                "merged remote snapshot"
            );
        }
        Ok(outcome)
    }

    /// Builds the snapshot of local state to broadcast, pruning tombstones
    /// older than `tombstone_ttl`.
    pub fn local_snapshot(&self, tombstone_ttl: Duration) -> SyncResult<Snapshot> {
        let cutoff = Stamp::now().saturating_sub(tombstone_ttl.as_millis() as u64);
        self.store.prune_tombstones(cutoff)?;
        Ok(Snapshot::new(
            self.store.get_all()?,
            self.store.tombstones()?,
            self.blocklist()?,
        ))
    }
}
