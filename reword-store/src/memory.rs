//! In-memory rule store.
//!
//! Used as the degraded fallback when the SQLite store cannot be opened
//! (rules re-sync from the MASTER slot on the next poll) and as the store
//! in unit tests.

use crate::error::StoreResult;
use crate::RuleStore;
use reword_types::{Rule, RuleId, RuleTombstone, Stamp};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    rules: HashMap<RuleId, Rule>,
    tombstones: HashMap<RuleId, Stamp>,
    meta: HashMap<String, String>,
}

/// Volatile rule store with the same contract as the durable one.
#[derive(Default)]
pub struct MemoryRuleStore {
    inner: Mutex<Inner>,
}

impl MemoryRuleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RuleStore for MemoryRuleStore {
    fn put(&self, rule: &Rule) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .rules
            .insert(rule.id, rule.clone());
        Ok(())
    }

    fn delete(&self, id: &RuleId) -> StoreResult<Option<Rule>> {
        Ok(self.inner.lock().unwrap().rules.remove(id))
    }

    fn get(&self, id: &RuleId) -> StoreResult<Option<Rule>> {
        Ok(self.inner.lock().unwrap().rules.get(id).cloned())
    }

    fn get_all(&self) -> StoreResult<Vec<Rule>> {
        let inner = self.inner.lock().unwrap();
        let mut rules: Vec<Rule> = inner.rules.values().cloned().collect();
        rules.sort_by_key(|r| r.updated_at);
        Ok(rules)
    }

    fn record_tombstone(&self, tombstone: &RuleTombstone) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.tombstones.entry(tombstone.id).or_insert(Stamp::ZERO);
        if tombstone.deleted_at > *entry {
            *entry = tombstone.deleted_at;
        }
        Ok(())
    }

    fn tombstones(&self) -> StoreResult<Vec<RuleTombstone>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .tombstones
            .iter()
            .map(|(id, at)| RuleTombstone::at(*id, *at))
            .collect())
    }

    fn prune_tombstones(&self, cutoff: Stamp) -> StoreResult<usize> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.tombstones.len();
        inner.tombstones.retain(|_, at| *at >= cutoff);
        Ok(before - inner.tombstones.len())
    }

    fn get_meta(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.inner.lock().unwrap().meta.get(key).cloned())
    }

    fn set_meta(&self, key: &str, value: &str) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .meta
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
