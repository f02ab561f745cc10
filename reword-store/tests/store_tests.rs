use reword_store::{MemoryRuleStore, RuleStore, SqliteRuleStore, StoreError};
use reword_types::{Rule, RuleId, RuleTombstone, Stamp};

fn stores() -> Vec<Box<dyn RuleStore>> {
    vec![
        Box::new(SqliteRuleStore::open_in_memory().unwrap()),
        Box::new(MemoryRuleStore::new()),
    ]
}

#[test]
fn put_get_delete() {
    for store in stores() {
        let rule = Rule::new("cat", "dog", "example.com");
        store.put(&rule).unwrap();
        assert_eq!(store.get(&rule.id).unwrap().as_ref(), Some(&rule));

        let deleted = store.delete(&rule.id).unwrap();
        assert_eq!(deleted, Some(rule.clone()));
        assert_eq!(store.get(&rule.id).unwrap(), None);
        assert_eq!(store.delete(&rule.id).unwrap(), None);
    }
}

#[test]
fn put_overwrites_by_id() {
    for store in stores() {
        let mut rule = Rule::new("cat", "dog", "");
        store.put(&rule).unwrap();

        rule.new_text = "ferret".to_string();
        rule.updated_at = rule.updated_at.tick();
        store.put(&rule).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].new_text, "ferret");
    }
}

#[test]
fn get_all_sorts_by_updated_at() {
    for store in stores() {
        let mut a = Rule::new("a", "1", "");
        let mut b = Rule::new("b", "2", "");
        a.updated_at = Stamp::from_millis(300);
        b.updated_at = Stamp::from_millis(100);
        store.put(&a).unwrap();
        store.put(&b).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all[0].id, b.id);
        assert_eq!(all[1].id, a.id);
    }
}

#[test]
fn tombstones_keep_newest_stamp() {
    for store in stores() {
        let id = RuleId::new();
        store
            .record_tombstone(&RuleTombstone::at(id, Stamp::from_millis(100)))
            .unwrap();
        store
            .record_tombstone(&RuleTombstone::at(id, Stamp::from_millis(50)))
            .unwrap();

        let ts = store.tombstones().unwrap();
        assert_eq!(ts.len(), 1);
        assert_eq!(ts[0].deleted_at, Stamp::from_millis(100));
    }
}

#[test]
fn prune_drops_only_expired_tombstones() {
    for store in stores() {
        store
            .record_tombstone(&RuleTombstone::at(RuleId::new(), Stamp::from_millis(10)))
            .unwrap();
        store
            .record_tombstone(&RuleTombstone::at(RuleId::new(), Stamp::from_millis(500)))
            .unwrap();

        let pruned = store.prune_tombstones(Stamp::from_millis(100)).unwrap();
        assert_eq!(pruned, 1);
        assert_eq!(store.tombstones().unwrap().len(), 1);
    }
}

#[test]
fn meta_round_trips() {
    for store in stores() {
        assert_eq!(store.get_meta("blocklist").unwrap(), None);
        store.set_meta("blocklist", "{\"hosts\":[]}").unwrap();
        assert_eq!(
            store.get_meta("blocklist").unwrap().as_deref(),
            Some("{\"hosts\":[]}")
        );
        store.set_meta("blocklist", "updated").unwrap();
        assert_eq!(store.get_meta("blocklist").unwrap().as_deref(), Some("updated"));
    }
}

#[test]
fn sqlite_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.db");

    let rule = Rule::new("Hello", "Hi", "example.com").with_force_global(true);
    {
        let store = SqliteRuleStore::open(&path).unwrap();
        store.put(&rule).unwrap();
        store.record_tombstone(&RuleTombstone::new(RuleId::new())).unwrap();
        store.set_meta("k", "v").unwrap();
    }

    let store = SqliteRuleStore::open(&path).unwrap();
    assert_eq!(store.get_all().unwrap(), vec![rule]);
    assert_eq!(store.tombstones().unwrap().len(), 1);
    assert_eq!(store.get_meta("k").unwrap().as_deref(), Some("v"));
}

#[test]
fn open_failure_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    // A directory at the database path makes the open fail.
    let err = SqliteRuleStore::open(dir.path()).unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}
