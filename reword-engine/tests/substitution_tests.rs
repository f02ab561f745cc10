use pretty_assertions::assert_eq;
use reword_engine::document::{DocumentTree, NodeKind};
use reword_engine::substitute::{apply, refresh, revert};
use reword_types::{Rule, RuleSummary};

fn summary(old: &str, new: &str) -> RuleSummary {
    Rule::new(old, new, "").summary()
}

/// One paragraph of text under the root.
fn page(text: &str) -> DocumentTree {
    let mut doc = DocumentTree::new();
    let para = doc.append_element(doc.root(), "p").unwrap();
    doc.append_text(para, text).unwrap();
    doc
}

#[test]
fn forced_global_greeting() {
    let mut doc = page("Hello there, General Kenobi.");
    let active = vec![summary("Hello there", "Hi there")];

    let n = apply(&mut doc, &active);

    assert_eq!(n, 1);
    assert_eq!(doc.rendered_text(), "Hi there, General Kenobi.");
}

#[test]
fn longest_match_wins_over_constituent_word() {
    let mut doc = page("a b c");
    let active = vec![summary("a", "X"), summary("a b", "Y")];

    apply(&mut doc, &active);

    assert_eq!(doc.rendered_text(), "Y c");
}

#[test]
fn priority_flag_beats_length() {
    let mut doc = page("a b c");
    let active = vec![
        Rule::new("a", "X", "").with_priority(true).summary(),
        summary("a b", "Y"),
    ];

    apply(&mut doc, &active);

    assert_eq!(doc.rendered_text(), "X b c");
}

#[test]
fn word_boundaries_protect_larger_words() {
    let mut doc = page("concatenate the cat, then Cat!");
    let active = vec![summary("cat", "dog")];

    let n = apply(&mut doc, &active);

    assert_eq!(n, 2);
    assert_eq!(doc.rendered_text(), "concatenate the dog, then dog!");
}

#[test]
fn case_sensitive_rule_leaves_wrong_case_untouched() {
    let mut doc = page("the cat and the Cat");
    let active = vec![
        Rule::new("Cat", "dog", "").with_case_sensitive(true).summary(),
    ];

    let n = apply(&mut doc, &active);

    assert_eq!(n, 1);
    assert_eq!(doc.rendered_text(), "the cat and the dog");
}

#[test]
fn markers_carry_rule_id_and_original() {
    let mut doc = page("Cat!");
    let rule = summary("cat", "dog");
    apply(&mut doc, &[rule.clone()]);

    let markers = doc.markers();
    assert_eq!(markers.len(), 1);
    let data = doc.marker(markers[0]).unwrap();
    assert_eq!(data.rule_id, rule.id);
    assert_eq!(data.original, "Cat");
    assert_eq!(data.replacement, "dog");
}

#[test]
fn revert_restores_byte_identical_text() {
    let before = "One cat, two cats, a CAT and a catalog.";
    let mut doc = page(before);
    apply(&mut doc, &[summary("cat", "dog")]);
    assert_ne!(doc.rendered_text(), before);

    let reverted = revert(&mut doc);

    assert_eq!(reverted, 2);
    assert_eq!(doc.rendered_text(), before);
    assert!(doc.markers().is_empty());
}

#[test]
fn detection_text_reads_originals_after_substitution() {
    let mut doc = page("my cat sleeps");
    apply(&mut doc, &[summary("cat", "dog")]);

    assert_eq!(doc.rendered_text(), "my dog sleeps");
    // Detection still sees the pre-substitution page.
    assert!(doc.detection_text().contains("cat"));
    assert!(!doc.detection_text().contains("dog"));
}

#[test]
fn refresh_rerenders_against_the_new_set() {
    let mut doc = page("the cat sat");
    apply(&mut doc, &[summary("cat", "dog")]);
    assert_eq!(doc.rendered_text(), "the dog sat");

    refresh(&mut doc, &[summary("cat", "bird")]);

    assert_eq!(doc.rendered_text(), "the bird sat");
    // No marker stacking: one marker per match after any number of passes.
    assert_eq!(doc.markers().len(), 1);
}

#[test]
fn refresh_with_empty_set_reverts() {
    let mut doc = page("the cat sat");
    apply(&mut doc, &[summary("cat", "dog")]);

    refresh(&mut doc, &[]);

    assert_eq!(doc.rendered_text(), "the cat sat");
    assert!(doc.markers().is_empty());
}

#[test]
fn skipped_and_editable_containers_stay_untouched() {
    let mut doc = DocumentTree::new();
    let para = doc.append_element(doc.root(), "p").unwrap();
    doc.append_text(para, "a cat here").unwrap();

    let script = doc.append_element(doc.root(), "script").unwrap();
    doc.append_text(script, "var cat = 1;").unwrap();

    let editor = doc.append_editable(doc.root(), "div").unwrap();
    doc.append_text(editor, "typing about my cat").unwrap();

    let own_ui = doc.append_element(doc.root(), "reword-ui").unwrap();
    doc.append_text(own_ui, "cat -> dog").unwrap();

    let n = apply(&mut doc, &[summary("cat", "dog")]);

    assert_eq!(n, 1);
    assert_eq!(doc.text_of(doc.children(script)[0]).unwrap(), "var cat = 1;");
    assert_eq!(
        doc.text_of(doc.children(editor)[0]).unwrap(),
        "typing about my cat"
    );
    assert_eq!(doc.text_of(doc.children(own_ui)[0]).unwrap(), "cat -> dog");
}

#[test]
fn splice_preserves_surrounding_literals() {
    let mut doc = page("before cat after");
    apply(&mut doc, &[summary("cat", "dog")]);

    let para = doc.children(doc.root())[0];
    let kinds: Vec<&NodeKind> = doc.children(para).iter().map(|c| doc.kind(*c)).collect();
    assert_eq!(kinds.len(), 3);
    assert!(matches!(kinds[0], NodeKind::Text(t) if t == "before "));
    assert!(matches!(kinds[1], NodeKind::Marker(_)));
    assert!(matches!(kinds[2], NodeKind::Text(t) if t == " after"));
}

#[test]
fn engine_edits_do_not_bump_the_revision() {
    let mut doc = page("the cat sat");
    let before = doc.revision();

    apply(&mut doc, &[summary("cat", "dog")]);
    revert(&mut doc);

    assert_eq!(doc.revision(), before);
}

#[test]
fn page_mutation_notifies_and_rescan_picks_it_up() {
    let mut doc = page("nothing yet");
    let mut rx = doc.watch_mutations();
    let active = vec![summary("cat", "dog")];
    assert_eq!(apply(&mut doc, &active), 0);

    let para = doc.children(doc.root())[0];
    let text = doc.children(para)[0];
    doc.set_text(text, "now a cat appears").unwrap();

    assert_eq!(rx.try_recv().unwrap(), para);
    apply(&mut doc, &active);
    assert_eq!(doc.rendered_text(), "now a dog appears");
}

#[test]
fn empty_active_set_is_inert() {
    let mut doc = page("the cat sat");
    assert_eq!(apply(&mut doc, &[]), 0);
    assert_eq!(doc.rendered_text(), "the cat sat");
}
