//! Core type definitions for the Reword rule-synchronization system.
//!
//! This crate holds the data model shared by every other crate:
//! - [`RuleId`]: stable, globally unique rule identifier
//! - [`Stamp`]: last-writer-wins logical clock (wall-clock milliseconds)
//! - [`Rule`]: the unit of substitution policy
//! - [`Signature`]: semantic dedup key over a rule's policy fields
//! - [`RuleSummary`]: reduced projection published to the ACTIVE slot
//! - [`RuleTombstone`]: deletion record mirrored alongside rules

mod ids;
mod rule;
mod stamp;
mod tombstone;

pub use ids::RuleId;
pub use rule::{Rule, RuleSummary, Signature};
pub use stamp::Stamp;
pub use tombstone::RuleTombstone;
