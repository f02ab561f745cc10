//! Slot payloads and their validated decode boundary.
//!
//! Both shared slots carry full replace-by-value payloads, never diffs.
//! Anything read back from a slot is untrusted: another context, an older
//! version, or a corrupted write may have produced it. Decoding validates
//! shape and produces [`SyncError::MalformedPayload`]; callers discard the
//! payload and continue on the next poll.

use crate::blocklist::BlockList;
use crate::error::{SyncError, SyncResult};
use reword_types::{Rule, RuleSummary, RuleTombstone, Stamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Full mirror of one context's rule state, written to the MASTER slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// When this snapshot was written. Required: a payload without a stamp
    /// cannot participate in self-write suppression.
    pub timestamp: Stamp,
    /// Every rule the writer holds.
    #[serde(default)]
    pub rules: Vec<Rule>,
    /// Unexpired deletion records.
    #[serde(default)]
    pub tombstones: Vec<RuleTombstone>,
    /// Shared origin blocklist.
    #[serde(default)]
    pub blocklist: BlockList,
}

impl Snapshot {
    /// Creates a snapshot stamped now.
    #[must_use]
    pub fn new(rules: Vec<Rule>, tombstones: Vec<RuleTombstone>, blocklist: BlockList) -> Self {
        Self {
            timestamp: Stamp::now(),
            rules,
            tombstones,
            blocklist,
        }
    }

    /// Encodes for a slot write.
    pub fn encode(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes and validates a slot payload.
    pub fn decode(raw: &str) -> SyncResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(raw)
            .map_err(|e| SyncError::MalformedPayload(format!("snapshot: {e}")))?;
        if snapshot.timestamp == Stamp::ZERO {
            return Err(SyncError::MalformedPayload(
                "snapshot: zero timestamp".to_string(),
            ));
        }
        Ok(snapshot)
    }
}

/// Per-origin cache of detected active rules, written to the ACTIVE slot.
///
/// Other same-origin contexts consume this instead of re-scanning; they
/// still run their own substitution pass locally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivePublication {
    /// When the publication was last modified.
    #[serde(default)]
    pub timestamp: Stamp,
    /// Map from origin to the summaries of its active rules.
    #[serde(default)]
    pub hosts: HashMap<String, Vec<RuleSummary>>,
}

impl ActivePublication {
    /// Creates an empty publication.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entry for `origin`, removing it when the detected set
    /// is empty, and bumps the stamp.
    pub fn set_host(&mut self, origin: &str, active: Vec<RuleSummary>) {
        if active.is_empty() {
            self.hosts.remove(origin);
        } else {
            self.hosts.insert(origin.to_string(), active);
        }
        self.timestamp = self.timestamp.tick();
    }

    /// Returns the cached active set for `origin`, if published.
    #[must_use]
    pub fn host(&self, origin: &str) -> Option<&[RuleSummary]> {
        self.hosts.get(origin).map(|v| v.as_slice())
    }

    /// Encodes for a slot write.
    pub fn encode(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes and validates a slot payload.
    pub fn decode(raw: &str) -> SyncResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| SyncError::MalformedPayload(format!("active publication: {e}")))
    }
}

/// Serialized rule collection for the import/export boundary.
///
/// Export is a snapshot of `get_all()`; import runs the standard
/// id/signature merge against the live store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCollection {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub blocklist: BlockList,
}
