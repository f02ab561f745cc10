//! Deletion records for mirrored rule removal.

use crate::{RuleId, Stamp};
use serde::{Deserialize, Serialize};

/// A durable record that a rule was deleted.
///
/// Carried in every mirrored snapshot so that remote contexts holding an
/// older copy of the rule remove it instead of resurrecting it. A rule
/// edited after `deleted_at` survives the tombstone (edit wins).
/// Tombstones are pruned from outgoing snapshots after a TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTombstone {
    /// Id of the deleted rule.
    pub id: RuleId,
    /// When the delete happened, on the same clock as `Rule::updated_at`.
    pub deleted_at: Stamp,
}

impl RuleTombstone {
    /// Creates a tombstone stamped now.
    #[must_use]
    pub fn new(id: RuleId) -> Self {
        Self {
            id,
            deleted_at: Stamp::now(),
        }
    }

    /// Creates a tombstone with an explicit stamp.
    #[must_use]
    pub const fn at(id: RuleId, deleted_at: Stamp) -> Self {
        Self { id, deleted_at }
    }

    /// Whether this tombstone overrides a rule last updated at `updated_at`.
    #[must_use]
    pub fn overrides(&self, updated_at: Stamp) -> bool {
        self.deleted_at > updated_at
    }
}
