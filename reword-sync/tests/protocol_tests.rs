use reword_sync::{ActivePublication, BlockList, Snapshot, SyncError};
use reword_types::{Rule, Stamp};

#[test]
fn snapshot_round_trips() {
    let snap = Snapshot::new(
        vec![Rule::new("cat", "dog", "example.com")],
        Vec::new(),
        BlockList::new(),
    );
    let raw = snap.encode().unwrap();
    let back = Snapshot::decode(&raw).unwrap();
    assert_eq!(back.timestamp, snap.timestamp);
    assert_eq!(back.rules, snap.rules);
}

#[test]
fn snapshot_decode_accepts_minimal_payload() {
    let snap = Snapshot::decode(r#"{"timestamp":123}"#).unwrap();
    assert_eq!(snap.timestamp, Stamp::from_millis(123));
    assert!(snap.rules.is_empty());
    assert!(snap.tombstones.is_empty());
    assert!(snap.blocklist.is_empty());
}

#[test]
fn snapshot_decode_rejects_garbage() {
    for raw in ["", "not json", "[1,2,3]", r#"{"rules":[]}"#, r#"{"timestamp":0}"#] {
        let err = Snapshot::decode(raw).unwrap_err();
        assert!(
            matches!(err, SyncError::MalformedPayload(_)),
            "expected MalformedPayload for {raw:?}"
        );
    }
}

#[test]
fn snapshot_decode_rejects_bad_rule_shape() {
    // A rule without old_text is not a rule.
    let raw = r#"{"timestamp":5,"rules":[{"id":"0192c7a0-0000-7000-8000-000000000000"}]}"#;
    assert!(matches!(
        Snapshot::decode(raw),
        Err(SyncError::MalformedPayload(_))
    ));
}

#[test]
fn publication_set_host_replaces_and_removes() {
    let rule = Rule::new("cat", "dog", "example.com");
    let mut publication = ActivePublication::new();

    publication.set_host("example.com", vec![rule.summary()]);
    assert_eq!(publication.host("example.com").unwrap().len(), 1);
    assert!(publication.host("other.org").is_none());

    let stamp_after_set = publication.timestamp;
    assert!(stamp_after_set > Stamp::ZERO);

    // Empty detected set removes the origin's entry entirely.
    publication.set_host("example.com", Vec::new());
    assert!(publication.host("example.com").is_none());
    assert!(publication.timestamp > stamp_after_set);
}

#[test]
fn publication_round_trips() {
    let rule = Rule::new("cat", "dog", "example.com");
    let mut publication = ActivePublication::new();
    publication.set_host("example.com", vec![rule.summary()]);

    let raw = publication.encode().unwrap();
    let back = ActivePublication::decode(&raw).unwrap();
    assert_eq!(back.host("example.com").unwrap()[0].old_text, "cat");
}

#[test]
fn publication_decode_rejects_garbage() {
    assert!(matches!(
        ActivePublication::decode("nope"),
        Err(SyncError::MalformedPayload(_))
    ));
}
