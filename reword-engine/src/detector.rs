//! Active-rule detection against a document's text.
//!
//! Decides which rules apply on the current page: force-global rules
//! always do; everything else needs its `old_text` present in the page.

use crate::pattern::is_word_token;
use regex::Regex;
use reword_types::Rule;
use tracing::warn;

/// Returns the subset of `rules` active on a document with the given
/// detection text.
///
/// Disabled rules and rules with empty `old_text` never apply. Word
/// tokens use a word-boundary probe ("cat" is not present in
/// "concatenate"); phrases use a substring probe. Case folding follows
/// each rule's `case_sensitive` flag.
#[must_use]
pub fn detect(text: &str, rules: &[Rule]) -> Vec<Rule> {
    rules
        .iter()
        .filter(|rule| rule.enabled && !rule.old_text.is_empty())
        .filter(|rule| rule.force_global || is_present(text, rule))
        .cloned()
        .collect()
}

fn is_present(text: &str, rule: &Rule) -> bool {
    if is_word_token(&rule.old_text) {
        let flags = if rule.case_sensitive { "" } else { "(?i)" };
        let probe = format!(r"{flags}\b{}\b", regex::escape(&rule.old_text));
        match Regex::new(&probe) {
            Ok(re) => re.is_match(text),
            Err(e) => {
                // A rule that cannot form a probe is treated as absent.
                warn!(rule = %rule.id, "detection probe failed: {e}");
                false
            }
        }
    } else if rule.case_sensitive {
        text.contains(&rule.old_text)
    } else {
        text.to_lowercase().contains(&rule.old_text.to_lowercase())
    }
}
