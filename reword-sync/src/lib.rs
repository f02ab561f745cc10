//! Cross-context rule mirroring and merge for Reword.
//!
//! Many independent execution contexts (one per open tab) each hold a local
//! rule store and interact only through two shared key-value slots:
//!
//! - **MASTER**: a timestamped full snapshot of all rules, tombstones and
//!   the blocklist, written debounced after local edits
//! - **ACTIVE**: a per-origin cache of which rules were detected active
//!
//! There is no ordering or delivery guarantee on either slot. Convergence
//! comes from the merge algorithm instead: snapshots are merged with
//! last-writer-wins per rule id, signature-based dedup of independently
//! created equivalents, tombstoned deletions, and an add-wins blocklist.
//! Repeated exchange of snapshots between any two contexts drives both
//! stores to the same deduplicated union.
//!
//! ## Components
//!
//! - [`SlotChannel`]: the injected host substrate (plus [`MemorySlots`])
//! - [`Snapshot`] / [`ActivePublication`]: validated slot payloads
//! - [`MergeEngine`]: snapshot reconciliation into the local store
//! - [`MirrorWriter`] / [`poll_master`]: debounced broadcast, polling
//!   fallback, self-write suppression
//! - [`publish_active`] / [`read_active`]: the ACTIVE slot boundary
//! - [`export_rules`] / [`import_rules`]: the file import/export boundary

mod blocklist;
mod channel;
mod error;
mod exchange;
mod merge;
mod mirror;
mod protocol;
mod publisher;

pub use blocklist::{BlockList, BlockTag};
pub use channel::{MemorySlots, SlotChannel, ACTIVE_SLOT, MASTER_SLOT};
pub use error::{SyncError, SyncResult};
pub use exchange::{export_rules, import_rules};
pub use merge::{MergeEngine, MergeOutcome};
pub use mirror::{poll_master, MirrorWriter};
pub use protocol::{ActivePublication, RuleCollection, Snapshot};
pub use publisher::{publish_active, read_active};
