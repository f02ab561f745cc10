use reword_types::{Rule, RuleId, Stamp};

#[test]
fn new_rule_has_fresh_id_and_stamps() {
    let r = Rule::new("cat", "dog", "example.com");
    assert_eq!(r.old_text, "cat");
    assert_eq!(r.new_text, "dog");
    assert_eq!(r.site, "example.com");
    assert!(r.enabled);
    assert!(!r.force_global);
    assert!(r.created_at > Stamp::ZERO);
    assert_eq!(r.created_at, r.updated_at);
}

#[test]
fn ids_are_unique() {
    let a = Rule::new("x", "y", "");
    let b = Rule::new("x", "y", "");
    assert_ne!(a.id, b.id);
}

#[test]
fn signature_ignores_id_site_and_stamps() {
    let a = Rule::new("cat", "dog", "a.com");
    let mut b = Rule::new("cat", "dog", "b.com");
    b.updated_at = Stamp::from_millis(1);
    assert_ne!(a.id, b.id);
    assert_eq!(a.signature(), b.signature());
}

#[test]
fn signature_distinguishes_policy_fields() {
    let base = Rule::new("cat", "dog", "");
    assert_ne!(
        base.signature(),
        base.clone().with_case_sensitive(true).signature()
    );
    assert_ne!(
        base.signature(),
        base.clone().with_force_global(true).signature()
    );
    assert_ne!(
        base.signature(),
        base.clone().with_priority(true).signature()
    );
}

#[test]
fn summary_projects_application_fields() {
    let r = Rule::new("Hello", "Hi", "example.com")
        .with_case_sensitive(true)
        .with_priority(true);
    let s = r.summary();
    assert_eq!(s.id, r.id);
    assert_eq!(s.old_text, "Hello");
    assert_eq!(s.new_text, "Hi");
    assert!(s.case_sensitive);
    assert!(s.priority);
}

#[test]
fn deserialization_defaults_missing_fields() {
    // A minimal payload from an older or sloppier writer.
    let json = format!(
        r#"{{"id":"{}","old_text":"a","new_text":"b"}}"#,
        RuleId::new()
    );
    let r: Rule = serde_json::from_str(&json).unwrap();
    assert!(r.enabled, "enabled defaults to true");
    assert!(!r.case_sensitive);
    assert!(!r.force_global);
    assert!(!r.priority);
    assert_eq!(r.site, "");
    assert_eq!(r.updated_at, Stamp::ZERO);
}

#[test]
fn normalized_fills_zero_stamps() {
    let mut r = Rule::new("a", "b", "");
    r.created_at = Stamp::ZERO;
    r.updated_at = Stamp::ZERO;
    let n = r.normalized();
    assert!(n.created_at > Stamp::ZERO);
    assert!(n.updated_at > Stamp::ZERO);
}

#[test]
fn normalized_keeps_real_stamps() {
    let mut r = Rule::new("a", "b", "");
    r.updated_at = Stamp::from_millis(42);
    assert_eq!(r.normalized().updated_at, Stamp::from_millis(42));
}

#[test]
fn rule_round_trips_through_json() {
    let r = Rule::new("foo", "bar", "example.org").with_force_global(true);
    let json = serde_json::to_string(&r).unwrap();
    let back: Rule = serde_json::from_str(&json).unwrap();
    assert_eq!(back, r);
}
