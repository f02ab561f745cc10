//! SQLite-backed rule store, one file per storage partition.

use crate::error::{StoreError, StoreResult};
use crate::RuleStore;
use reword_types::{Rule, RuleId, RuleTombstone, Stamp};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Durable rule store backed by SQLite.
///
/// Rules are stored as one JSON body per row; tombstones and metadata live
/// in their own tables so deletions and the blocklist survive restart.
#[derive(Debug)]
pub struct SqliteRuleStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRuleStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StoreError::Unavailable(format!("failed to open rule store: {e}")))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(format!("failed to open in-memory store: {e}")))?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS rules (
                id TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tombstones (
                id TEXT PRIMARY KEY,
                deleted_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }
}

impl RuleStore for SqliteRuleStore {
    fn put(&self, rule: &Rule) -> StoreResult<()> {
        let body = serde_json::to_string(rule)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO rules (id, body, updated_at) VALUES (?1, ?2, ?3)",
            params![rule.id.to_string(), body, rule.updated_at.as_millis() as i64],
        )?;
        Ok(())
    }

    fn delete(&self, id: &RuleId) -> StoreResult<Option<Rule>> {
        let existing = self.get(id)?;
        if existing.is_some() {
            let conn = self.conn.lock().unwrap();
            conn.execute("DELETE FROM rules WHERE id = ?1", params![id.to_string()])?;
        }
        Ok(existing)
    }

    fn get(&self, id: &RuleId) -> StoreResult<Option<Rule>> {
        let conn = self.conn.lock().unwrap();
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM rules WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        match body {
            Some(b) => Ok(Some(serde_json::from_str(&b)?)),
            None => Ok(None),
        }
    }

    fn get_all(&self) -> StoreResult<Vec<Rule>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, body FROM rules ORDER BY updated_at ASC")?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let body: String = row.get(1)?;
            Ok((id, body))
        })?;

        let mut rules = Vec::new();
        for row in rows {
            let (id, body) = row?;
            // A corrupt row degrades to a missing rule, never a dead store.
            match serde_json::from_str::<Rule>(&body) {
                Ok(rule) => rules.push(rule),
                Err(e) => warn!("skipping unreadable rule row {id}: {e}"),
            }
        }
        Ok(rules)
    }

    fn record_tombstone(&self, tombstone: &RuleTombstone) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO tombstones (id, deleted_at) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET deleted_at = MAX(deleted_at, excluded.deleted_at)",
            params![
                tombstone.id.to_string(),
                tombstone.deleted_at.as_millis() as i64
            ],
        )?;
        Ok(())
    }

    fn tombstones(&self) -> StoreResult<Vec<RuleTombstone>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, deleted_at FROM tombstones")?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let deleted_at: i64 = row.get(1)?;
            Ok((id, deleted_at))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (id_str, deleted_at) = row?;
            let id = RuleId::parse(&id_str)
                .map_err(|e| StoreError::InvalidData(format!("bad tombstone id: {e}")))?;
            result.push(RuleTombstone::at(id, Stamp::from_millis(deleted_at as u64)));
        }
        Ok(result)
    }

    fn prune_tombstones(&self, cutoff: Stamp) -> StoreResult<usize> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "DELETE FROM tombstones WHERE deleted_at < ?1",
            params![cutoff.as_millis() as i64],
        )?;
        Ok(n)
    }

    fn get_meta(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(StoreError::Database(other)),
        })
    }

    fn set_meta(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}
