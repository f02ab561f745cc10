//! Durable rule storage for Reword.
//!
//! Each execution context owns one store, scoped to its local storage
//! partition. The store is deliberately simple — rule CRUD plus the small
//! amount of auxiliary durable state the sync layer needs (deletion
//! tombstones and an opaque metadata map) — and has no knowledge of the
//! mirroring protocol built on top of it.
//!
//! Two implementations:
//! - [`SqliteRuleStore`]: the durable store, one SQLite file per partition
//! - [`MemoryRuleStore`]: degraded mode when SQLite is unavailable, and tests

mod error;
mod memory;
mod sqlite;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryRuleStore;
pub use sqlite::SqliteRuleStore;

use reword_types::{Rule, RuleId, RuleTombstone, Stamp};

/// Durable rule CRUD plus the auxiliary state the sync layer persists.
///
/// All operations survive context restart (for the SQLite implementation)
/// and are scoped to the local partition. `put` overwrites by id; no
/// transaction spans multiple rules.
pub trait RuleStore: Send + Sync {
    /// Inserts or overwrites a rule by id.
    fn put(&self, rule: &Rule) -> StoreResult<()>;

    /// Removes a rule, returning it if it existed.
    fn delete(&self, id: &RuleId) -> StoreResult<Option<Rule>>;

    /// Fetches a single rule by id.
    fn get(&self, id: &RuleId) -> StoreResult<Option<Rule>>;

    /// Returns all stored rules.
    fn get_all(&self) -> StoreResult<Vec<Rule>>;

    /// Records a deletion tombstone (overwrites by id, keeping the newer
    /// stamp).
    fn record_tombstone(&self, tombstone: &RuleTombstone) -> StoreResult<()>;

    /// Returns all recorded tombstones.
    fn tombstones(&self) -> StoreResult<Vec<RuleTombstone>>;

    /// Drops tombstones older than `cutoff`, returning how many went.
    fn prune_tombstones(&self, cutoff: Stamp) -> StoreResult<usize>;

    /// Reads an opaque metadata value (blocklist, sync bookkeeping).
    fn get_meta(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes an opaque metadata value.
    fn set_meta(&self, key: &str, value: &str) -> StoreResult<()>;
}
