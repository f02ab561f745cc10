//! Active-rule detection and live-tree text substitution for Reword.
//!
//! The host page is modeled by [`DocumentTree`]: an arena of element, text
//! and marker nodes with change notification. The [`detector`] decides
//! which rules apply on the current page; [`substitute`] rewrites matching
//! spans into marker nodes that retain the original text, so every
//! substitution can be inspected, edited and reverted.
//!
//! Matching policy in one place: priority-flagged rules first, then
//! longest `old_text` first, one composite case-insensitive alternation,
//! word boundaries around plain word tokens, and per-rule case-sensitivity
//! honored during match attribution.

pub mod detector;
pub mod document;
pub mod pattern;
pub mod substitute;

mod error;

pub use document::{DocumentTree, MarkerData, NodeId, NodeKind, Segment, OWN_UI_TAG, SKIPPED_TAGS};
pub use error::{EngineError, EngineResult};
pub use pattern::{is_word_token, sort_for_matching, CompiledRuleSet};
