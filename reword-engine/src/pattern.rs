//! Rule pattern compilation.
//!
//! Each rule compiles to a regex fragment independently, so one malformed
//! rule can only ever disable itself, never the whole pass. Fragments are
//! joined into a single case-insensitive alternation; the per-match rule
//! attribution re-applies each candidate's own case sensitivity.

use regex::Regex;
use reword_types::RuleSummary;
use tracing::warn;

/// True if `text` is a plain word token that takes word-boundary matching.
/// Phrases and anything with punctuation fall back to literal matching.
#[must_use]
pub fn is_word_token(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Builds the regex fragment for one rule's `old_text`.
fn fragment(old_text: &str) -> String {
    let escaped = regex::escape(old_text);
    if is_word_token(old_text) {
        format!(r"\b{escaped}\b")
    } else {
        escaped
    }
}

/// Orders rules for matching: priority-flagged first, then longest
/// `old_text` first, so multi-word phrases win over their constituent
/// words at the same position.
pub fn sort_for_matching(rules: &mut [RuleSummary]) {
    rules.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(b.old_text.len().cmp(&a.old_text.len()))
    });
}

/// An active rule set compiled into one composite pattern.
pub struct CompiledRuleSet {
    rules: Vec<RuleSummary>,
    composite: Option<Regex>,
}

impl CompiledRuleSet {
    /// Compiles the active set.
    ///
    /// Rules with empty `old_text` are ignored. A rule whose fragment does
    /// not compile alone is dropped with a warning; if the composite
    /// itself fails to build the whole set is inert.
    #[must_use]
    pub fn compile(active: &[RuleSummary]) -> Self {
        let mut rules: Vec<RuleSummary> = active
            .iter()
            .filter(|r| !r.old_text.is_empty())
            .cloned()
            .collect();
        sort_for_matching(&mut rules);

        let mut fragments = Vec::new();
        rules.retain(|rule| {
            let frag = fragment(&rule.old_text);
            match Regex::new(&frag) {
                Ok(_) => {
                    fragments.push(frag);
                    true
                }
                Err(e) => {
                    warn!(rule = %rule.id, "pattern construction failed, rule inert: {e}");
                    false
                }
            }
        });

        let composite = if fragments.is_empty() {
            None
        } else {
            // Alternation preference is leftmost-first at equal start
            // positions, so the sort above is the whole priority policy.
            match Regex::new(&format!("(?i){}", fragments.join("|"))) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("composite pattern failed, substitution pass inert: {e}");
                    None
                }
            }
        };

        Self { rules, composite }
    }

    /// The composite pattern, if any rule survived compilation.
    #[must_use]
    pub fn composite(&self) -> Option<&Regex> {
        self.composite.as_ref()
    }

    /// The compiled rules in matching order.
    #[must_use]
    pub fn rules(&self) -> &[RuleSummary] {
        &self.rules
    }

    /// True when there is nothing to match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.composite.is_none()
    }

    /// Finds which rule owns a matched span.
    ///
    /// The composite matches case-insensitively; candidates are re-tested
    /// in priority order against the exact matched text, honoring each
    /// rule's own case sensitivity. Returns `None` when only
    /// case-sensitive rules matched with the wrong case — the span is
    /// then left untouched.
    #[must_use]
    pub fn attribute(&self, matched: &str) -> Option<&RuleSummary> {
        self.rules.iter().find(|rule| {
            if rule.case_sensitive {
                rule.old_text == matched
            } else {
                rule.old_text.to_lowercase() == matched.to_lowercase()
            }
        })
    }
}
