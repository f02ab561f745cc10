//! Shared blocklist of origins, as an observed-remove set.
//!
//! Blocking and unblocking happen from independent contexts that only ever
//! exchange full snapshots, so a plain set would lose whichever write landed
//! second. Each block creates a unique tag; unblock tombstones the tags it
//! observed. An origin is blocked while it has at least one live tag, and a
//! concurrent block survives a concurrent unblock (add-wins).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// A unique tag identifying one block operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockTag(Uuid);

impl BlockTag {
    /// Creates a new unique tag.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BlockTag {
    fn default() -> Self {
        Self::new()
    }
}

/// Set of origins on which the whole subsystem is inert.
///
/// Mirrored inside every snapshot and merged with add-wins semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockList {
    /// Map from origin to its live block tags.
    #[serde(default)]
    hosts: HashMap<String, HashSet<BlockTag>>,
    /// Tags removed by unblock operations.
    #[serde(default)]
    tombstones: HashSet<BlockTag>,
}

impl BlockList {
    /// Creates an empty blocklist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the origin is currently blocked.
    #[must_use]
    pub fn contains(&self, origin: &str) -> bool {
        self.hosts
            .get(origin)
            .map(|tags| !tags.is_empty())
            .unwrap_or(false)
    }

    /// Returns the blocked origins.
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.hosts
            .iter()
            .filter(|(_, tags)| !tags.is_empty())
            .map(|(origin, _)| origin.as_str())
    }

    /// Number of blocked origins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.values().filter(|tags| !tags.is_empty()).count()
    }

    /// True if nothing is blocked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Blocks an origin, returning the tag created for this operation.
    pub fn block(&mut self, origin: impl Into<String>) -> BlockTag {
        let tag = BlockTag::new();
        self.hosts.entry(origin.into()).or_default().insert(tag);
        tag
    }

    /// Unblocks an origin by tombstoning all tags observed for it.
    ///
    /// A concurrent block in another context carries a tag this context has
    /// not observed, so that block survives the merge.
    pub fn unblock(&mut self, origin: &str) {
        if let Some(tags) = self.hosts.get_mut(origin) {
            for tag in tags.drain() {
                self.tombstones.insert(tag);
            }
        }
    }

    /// Merges another blocklist into this one.
    pub fn merge(&mut self, other: &Self) {
        self.tombstones.extend(&other.tombstones);

        for (origin, other_tags) in &other.hosts {
            let entry = self.hosts.entry(origin.clone()).or_default();
            for tag in other_tags {
                if !self.tombstones.contains(tag) {
                    entry.insert(*tag);
                }
            }
        }

        for tags in self.hosts.values_mut() {
            tags.retain(|tag| !self.tombstones.contains(tag));
        }
    }

    /// Returns the merge of this and another blocklist.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }
}

impl FromIterator<String> for BlockList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut list = Self::new();
        for origin in iter {
            list.block(origin);
        }
        list
    }
}
