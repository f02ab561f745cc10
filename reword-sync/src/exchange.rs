//! Import/export boundary for rule collections.
//!
//! Export is a plain serialization of the store; import runs the standard
//! id/signature merge so pulling in a file behaves exactly like receiving
//! a remote snapshot (duplicates collapse, newer copies win, local-only
//! rules survive).

use crate::error::{SyncError, SyncResult};
use crate::merge::{MergeEngine, MergeOutcome};
use crate::protocol::{RuleCollection, Snapshot};
use reword_types::Stamp;

/// Serializes all rules and the blocklist as pretty JSON.
pub fn export_rules(engine: &MergeEngine) -> SyncResult<String> {
    let collection = RuleCollection {
        rules: engine.store().get_all()?,
        blocklist: engine.blocklist()?,
    };
    Ok(serde_json::to_string_pretty(&collection)?)
}

/// Parses an exported collection and merges it into the live store.
pub fn import_rules(engine: &MergeEngine, raw: &str) -> SyncResult<MergeOutcome> {
    let collection: RuleCollection = serde_json::from_str(raw)
        .map_err(|e| SyncError::MalformedPayload(format!("rule collection: {e}")))?;
    let snapshot = Snapshot {
        timestamp: Stamp::now(),
        rules: collection.rules,
        tombstones: Vec::new(),
        blocklist: collection.blocklist,
    };
    engine.merge(&snapshot)
}
