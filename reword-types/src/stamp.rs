//! Last-writer-wins clock for rule timestamps.
//!
//! A [`Stamp`] is milliseconds since the Unix epoch. It is the only clock
//! the merge protocol compares, so it must be monotonic within one context:
//! two successive local edits must never carry the same stamp, even if the
//! system clock stalls or steps backwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A logical timestamp: wall-clock milliseconds since the Unix epoch.
///
/// Serialized as a bare integer, which is the wire shape every snapshot
/// and publication carries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Stamp(u64);

impl Stamp {
    /// The zero stamp, older than any real write.
    pub const ZERO: Stamp = Stamp(0);

    /// Creates a stamp at the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }

    /// Creates a stamp from raw milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the raw milliseconds.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Returns a stamp strictly greater than `self`, at the current wall
    /// time if the clock has advanced past it.
    ///
    /// Call this when bumping `updated_at` on a local edit.
    #[must_use]
    pub fn tick(&self) -> Self {
        let now = Self::now();
        if now.0 > self.0 {
            now
        } else {
            Self(self.0.saturating_add(1))
        }
    }

    /// Returns the stamp `millis` earlier, saturating at zero.
    ///
    /// Used to compute tombstone expiry cutoffs.
    #[must_use]
    pub const fn saturating_sub(&self, millis: u64) -> Self {
        Self(self.0.saturating_sub(millis))
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
