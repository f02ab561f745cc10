//! The substitution rule data model.

use crate::{RuleId, Stamp};
use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

/// The unit of substitution policy.
///
/// A rule says "replace `old_text` with `new_text`". Where it applies is
/// governed by `force_global` (always active) or by text-presence detection
/// on each document; `site` records the origin the rule was created on but
/// does not gate application.
///
/// `updated_at` is the last-writer-wins clock: when two contexts hold
/// divergent copies of the same rule, merge keeps the one with the greater
/// stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable unique identifier, assigned at creation.
    pub id: RuleId,
    /// Source token or phrase to match.
    pub old_text: String,
    /// Replacement text.
    pub new_text: String,
    /// Whether matching folds case.
    #[serde(default)]
    pub case_sensitive: bool,
    /// Active on every document regardless of page content.
    #[serde(default)]
    pub force_global: bool,
    /// Smart priority: preferred over shorter matches at the same position.
    #[serde(default)]
    pub priority: bool,
    /// Disabled rules are retained but never applied.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Origin the rule was created on (informational scoping only).
    #[serde(default)]
    pub site: String,
    /// Creation stamp.
    #[serde(default)]
    pub created_at: Stamp,
    /// Last-writer-wins stamp, bumped on every edit.
    #[serde(default)]
    pub updated_at: Stamp,
}

impl Rule {
    /// Creates a new rule with a fresh id and current timestamps.
    pub fn new(
        old_text: impl Into<String>,
        new_text: impl Into<String>,
        site: impl Into<String>,
    ) -> Self {
        let now = Stamp::now();
        Self {
            id: RuleId::new(),
            old_text: old_text.into(),
            new_text: new_text.into(),
            case_sensitive: false,
            force_global: false,
            priority: false,
            enabled: true,
            site: site.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets case-sensitive matching.
    #[must_use]
    pub fn with_case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    /// Marks the rule as always active.
    #[must_use]
    pub fn with_force_global(mut self, yes: bool) -> Self {
        self.force_global = yes;
        self
    }

    /// Sets the smart-priority flag.
    #[must_use]
    pub fn with_priority(mut self, yes: bool) -> Self {
        self.priority = yes;
        self
    }

    /// Enables or disables the rule.
    #[must_use]
    pub fn with_enabled(mut self, yes: bool) -> Self {
        self.enabled = yes;
        self
    }

    /// Returns the semantic dedup key for this rule.
    #[must_use]
    pub fn signature(&self) -> Signature {
        Signature {
            old_text: self.old_text.clone(),
            new_text: self.new_text.clone(),
            case_sensitive: self.case_sensitive,
            force_global: self.force_global,
            priority: self.priority,
        }
    }

    /// Returns the reduced projection published to the ACTIVE slot.
    #[must_use]
    pub fn summary(&self) -> RuleSummary {
        RuleSummary {
            id: self.id,
            old_text: self.old_text.clone(),
            new_text: self.new_text.clone(),
            case_sensitive: self.case_sensitive,
            priority: self.priority,
        }
    }

    /// Fills in safe defaults for fields a remote payload may have omitted.
    ///
    /// Zero stamps become the current time, so a rule that arrives without
    /// timestamps can still participate in last-writer-wins comparison.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let now = Stamp::now();
        if self.created_at == Stamp::ZERO {
            self.created_at = now;
        }
        if self.updated_at == Stamp::ZERO {
            self.updated_at = now;
        }
        self
    }
}

/// Semantic identity of a rule's policy, independent of its id.
///
/// Two rules created independently on different devices with the same
/// signature are the same logical rule; merge collapses them onto one id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub old_text: String,
    pub new_text: String,
    pub case_sensitive: bool,
    pub force_global: bool,
    pub priority: bool,
}

/// Reduced rule projection sufficient to apply substitution without a
/// local re-scan. This is what the ACTIVE slot carries per origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub id: RuleId,
    pub old_text: String,
    pub new_text: String,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub priority: bool,
}
