//! The substitution pass over a live document tree.

use crate::document::{DocumentTree, Segment};
use crate::pattern::CompiledRuleSet;
use reword_types::RuleSummary;
use tracing::debug;

/// Rewrites every eligible text node against the active rule set.
///
/// Matched spans become marker nodes carrying the original text and the
/// owning rule's id; literal spans are left untouched. The walk and the
/// splices run synchronously within one call so the tree is never observed
/// mid-rewrite, and the document is muted for the duration so the engine's
/// own edits do not re-trigger the mutation debounce.
///
/// Returns the number of substitutions made.
pub fn apply(doc: &mut DocumentTree, active: &[RuleSummary]) -> usize {
    let set = CompiledRuleSet::compile(active);
    let Some(composite) = set.composite() else {
        return 0;
    };

    let targets = doc.visible_text_nodes();
    let mut substituted = 0;

    doc.set_muted(true);
    for node in targets {
        let Ok(text) = doc.text_of(node) else {
            continue;
        };
        if !composite.is_match(text) {
            continue;
        }

        let text = text.to_string();
        let mut segments = Vec::new();
        let mut cursor = 0;
        for found in composite.find_iter(&text) {
            if found.start() > cursor {
                segments.push(Segment::Literal(text[cursor..found.start()].to_string()));
            }
            match set.attribute(found.as_str()) {
                Some(rule) => {
                    segments.push(Segment::Match {
                        rule_id: rule.id,
                        original: found.as_str().to_string(),
                        replacement: rule.new_text.clone(),
                    });
                    substituted += 1;
                }
                // Only case-sensitive rules matched, with the wrong case.
                None => segments.push(Segment::Literal(found.as_str().to_string())),
            }
            cursor = found.end();
        }
        if cursor < text.len() {
            segments.push(Segment::Literal(text[cursor..].to_string()));
        }

        // node came from the walk above, so the splice cannot fail.
        let _ = doc.splice_text(node, segments);
    }
    doc.set_muted(false);

    if substituted > 0 {
        debug!(substituted, "substitution pass complete");
    }
    substituted
}

/// Reverts all markers to their original text, then re-applies the active
/// set. This is the re-render path after any rule change.
pub fn refresh(doc: &mut DocumentTree, active: &[RuleSummary]) -> usize {
    doc.set_muted(true);
    doc.revert_all();
    doc.set_muted(false);
    apply(doc, active)
}

/// Reverts all markers, restoring the pre-substitution text.
pub fn revert(doc: &mut DocumentTree) -> usize {
    doc.set_muted(true);
    let reverted = doc.revert_all();
    doc.set_muted(false);
    reverted
}
