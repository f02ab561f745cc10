//! The per-context session.
//!
//! One [`Session`] runs in every execution context (one per open tab). It
//! wires the durable store, the shared-slot mirror, active-rule detection
//! and live substitution together behind a small interactive API, and runs
//! the background loop that keeps the page and the other contexts in step.

use crate::error::{RuntimeError, RuntimeResult};
use reword_engine::document::DocumentTree;
use reword_engine::{detector, substitute};
use reword_store::{MemoryRuleStore, RuleStore, SqliteRuleStore};
use reword_sync::{
    export_rules, import_rules, poll_master, publish_active, read_active, MergeEngine,
    MergeOutcome, MirrorWriter, SlotChannel, MASTER_SLOT,
};
use reword_types::{Rule, RuleId, RuleSummary, RuleTombstone};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Session timing knobs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet interval before a local edit burst is broadcast.
    pub broadcast_debounce: Duration,
    /// Quiet interval before page mutations trigger a re-scan.
    pub mutation_debounce: Duration,
    /// Polling fallback period for the MASTER slot.
    pub master_poll: Duration,
    /// Periodic full re-scan period.
    pub rescan_interval: Duration,
    /// How long deletion tombstones are retained.
    pub tombstone_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            broadcast_debounce: Duration::from_millis(500),
            mutation_debounce: Duration::from_millis(300),
            master_poll: Duration::from_secs(5),
            rescan_interval: Duration::from_secs(30),
            tombstone_ttl: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

/// One execution context's view of the rule system.
pub struct Session {
    origin: String,
    config: SessionConfig,
    channel: Arc<dyn SlotChannel>,
    engine: Arc<MergeEngine>,
    mirror: Arc<MirrorWriter>,
    document: Mutex<DocumentTree>,
    active: Mutex<Vec<RuleSummary>>,
    /// Document revision and active set of the last re-render, used to
    /// skip no-op passes (each pass allocates fresh arena nodes, so an
    /// unconditional periodic refresh would grow the tree forever).
    last_render: Mutex<Option<(u64, Vec<RuleSummary>)>>,
    /// Set while a remote snapshot is being applied, so the poll path
    /// never overlaps itself.
    applying_remote: AtomicBool,
}

impl Session {
    /// Opens a session over the durable store at `db_path`.
    ///
    /// If SQLite cannot be opened the session degrades to an in-memory
    /// store: rules still work for the lifetime of the context and are
    /// recoverable from the next MASTER snapshot, they just do not
    /// survive a restart on their own.
    pub fn open(
        origin: impl Into<String>,
        db_path: &Path,
        channel: Arc<dyn SlotChannel>,
        config: SessionConfig,
    ) -> Arc<Self> {
        let store: Arc<dyn RuleStore> = match SqliteRuleStore::open(db_path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!("durable store unavailable, degrading to memory: {e}");
                Arc::new(MemoryRuleStore::new())
            }
        };
        Self::with_store(origin, store, channel, config)
    }

    /// Opens a session over an explicit store.
    pub fn with_store(
        origin: impl Into<String>,
        store: Arc<dyn RuleStore>,
        channel: Arc<dyn SlotChannel>,
        config: SessionConfig,
    ) -> Arc<Self> {
        let engine = Arc::new(MergeEngine::new(store));
        let mirror = Arc::new(MirrorWriter::new(
            Arc::clone(&channel),
            config.broadcast_debounce,
            config.tombstone_ttl,
        ));
        Arc::new(Self {
            origin: origin.into(),
            config,
            channel,
            engine,
            mirror,
            document: Mutex::new(DocumentTree::new()),
            active: Mutex::new(Vec::new()),
            last_render: Mutex::new(None),
            applying_remote: AtomicBool::new(false),
        })
    }

    /// The origin this session is scoped to.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Locks the live document. The host mutates the page through this
    /// handle; the session's own rewrites take the same lock.
    pub fn document(&self) -> MutexGuard<'_, DocumentTree> {
        self.document.lock().unwrap()
    }

    // ---- rule CRUD ----

    /// All stored rules.
    pub fn rules(&self) -> RuntimeResult<Vec<Rule>> {
        Ok(self.engine.store().get_all()?)
    }

    /// Fetches one rule.
    pub fn rule(&self, id: &RuleId) -> RuntimeResult<Option<Rule>> {
        Ok(self.engine.store().get(id)?)
    }

    /// The active set from the most recent scan (or adopted publication).
    #[must_use]
    pub fn active_rules(&self) -> Vec<RuleSummary> {
        self.active.lock().unwrap().clone()
    }

    /// Inserts or updates a rule, then re-scans and broadcasts.
    pub async fn put_rule(&self, rule: Rule) -> RuntimeResult<()> {
        self.engine.store().put(&rule.normalized())?;
        self.after_local_change().await
    }

    /// Deletes a rule, leaving a tombstone so the deletion propagates.
    pub async fn delete_rule(&self, id: &RuleId) -> RuntimeResult<Option<Rule>> {
        let removed = self.engine.store().delete(id)?;
        if removed.is_some() {
            self.engine.store().record_tombstone(&RuleTombstone::new(*id))?;
            self.after_local_change().await?;
        }
        Ok(removed)
    }

    /// Rewrites a rule's replacement text in place, bumping its stamp so
    /// the edit wins the next merge.
    pub async fn quick_edit(
        &self,
        id: &RuleId,
        new_text: impl Into<String>,
    ) -> RuntimeResult<()> {
        let mut rule = self
            .engine
            .store()
            .get(id)?
            .ok_or(RuntimeError::UnknownRule(*id))?;
        rule.new_text = new_text.into();
        rule.updated_at = rule.updated_at.tick();
        self.engine.store().put(&rule)?;
        self.after_local_change().await
    }

    // ---- blocklist ----

    /// True when this session's origin is blocked.
    pub fn is_blocked(&self) -> RuntimeResult<bool> {
        Ok(self.engine.blocklist()?.contains(&self.origin))
    }

    /// Blocks an origin; its pages stop detecting and substituting.
    pub async fn block_site(&self, origin: &str) -> RuntimeResult<()> {
        let mut blocklist = self.engine.blocklist()?;
        blocklist.block(origin);
        self.engine.save_blocklist(&blocklist)?;
        info!(origin, "origin blocked");
        self.after_local_change().await
    }

    /// Unblocks an origin.
    pub async fn unblock_site(&self, origin: &str) -> RuntimeResult<()> {
        let mut blocklist = self.engine.blocklist()?;
        blocklist.unblock(origin);
        self.engine.save_blocklist(&blocklist)?;
        info!(origin, "origin unblocked");
        self.after_local_change().await
    }

    // ---- import / export ----

    /// Serializes all rules and the blocklist for file export.
    pub fn export_rules(&self) -> RuntimeResult<String> {
        Ok(export_rules(&self.engine)?)
    }

    /// Imports a previously exported collection, merging it like a
    /// remote snapshot.
    pub async fn import_rules(&self, raw: &str) -> RuntimeResult<MergeOutcome> {
        let outcome = import_rules(&self.engine, raw)?;
        if outcome.changed() {
            self.after_local_change().await?;
        }
        Ok(outcome)
    }

    // ---- detection and substitution ----

    /// Re-detects the active set for the current page, publishes it, and
    /// re-renders the document against it.
    ///
    /// A blocked origin publishes an empty set and reverts any existing
    /// substitutions, leaving the page untouched until unblocked.
    pub async fn rescan(&self) -> RuntimeResult<Vec<RuleSummary>> {
        if self.is_blocked()? {
            {
                let mut doc = self.document();
                substitute::revert(&mut doc);
            }
            self.active.lock().unwrap().clear();
            *self.last_render.lock().unwrap() = None;
            publish_active(&self.channel, &self.origin, Vec::new()).await?;
            return Ok(Vec::new());
        }

        let rules = self.rules()?;
        let (doc_text, revision) = {
            let doc = self.document();
            (doc.detection_text(), doc.revision())
        };
        let active: Vec<RuleSummary> = detector::detect(&doc_text, &rules)
            .iter()
            .map(Rule::summary)
            .collect();

        // Unchanged page, unchanged active set: nothing to re-render.
        let unchanged = self
            .last_render
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|(rev, set)| *rev == revision && *set == active);
        if unchanged {
            return Ok(active);
        }

        *self.active.lock().unwrap() = active.clone();
        publish_active(&self.channel, &self.origin, active.clone()).await?;
        substitute::refresh(&mut self.document(), &active);
        *self.last_render.lock().unwrap() = Some((revision, active.clone()));
        debug!(active = active.len(), origin = %self.origin, "re-scan complete");
        Ok(active)
    }

    /// First render after injection.
    ///
    /// If a same-origin context already published an active set, uses it
    /// directly and skips the detection pass; still runs its own scan
    /// shortly after via the background loop.
    pub async fn initial_render(&self) -> RuntimeResult<Vec<RuleSummary>> {
        if self.is_blocked()? {
            return Ok(Vec::new());
        }
        match read_active(&self.channel, &self.origin).await? {
            Some(active) => {
                *self.active.lock().unwrap() = active.clone();
                substitute::apply(&mut self.document(), &active);
                Ok(active)
            }
            None => self.rescan().await,
        }
    }

    // ---- sync ----

    /// Reads the MASTER slot once, merging a genuine remote snapshot.
    ///
    /// After a merge that changed anything the page is re-scanned and the
    /// merged state is re-broadcast, so every context converges even when
    /// writes crossed in flight.
    pub async fn poll_once(&self) -> RuntimeResult<Option<MergeOutcome>> {
        if self
            .applying_remote
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(None);
        }
        let result = self.apply_remote().await;
        self.applying_remote.store(false, Ordering::Release);
        result
    }

    async fn apply_remote(&self) -> RuntimeResult<Option<MergeOutcome>> {
        let outcome = poll_master(&self.channel, &self.mirror, &self.engine).await?;
        if let Some(outcome) = &outcome {
            if outcome.changed() {
                debug!(
                    added = outcome.added,
                    updated = outcome.updated,
                    removed = outcome.removed,
                    "merged remote snapshot"
                );
                self.rescan().await?;
                self.mirror.schedule(&self.engine);
            }
        }
        Ok(outcome)
    }

    /// Handles a slot-change notification from the host substrate.
    ///
    /// Notifications are best-effort; the polling fallback catches
    /// anything missed here.
    pub async fn handle_remote_change(&self, key: &str) {
        if key != MASTER_SLOT {
            return;
        }
        if let Err(e) = self.poll_once().await {
            warn!("remote change handling failed: {e}");
        }
    }

    /// Broadcasts the local state immediately, bypassing the debounce.
    pub async fn flush(&self) -> RuntimeResult<()> {
        Ok(self.mirror.flush(&self.engine).await?)
    }

    async fn after_local_change(&self) -> RuntimeResult<()> {
        self.mirror.schedule(&self.engine);
        self.rescan().await?;
        Ok(())
    }

    /// Spawns the background loop: slot-change notifications, the MASTER
    /// polling fallback, debounced page-mutation re-scans, and the
    /// periodic full re-scan. Failures inside the loop are logged and the
    /// loop keeps running.
    pub fn spawn_background(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        let mut notifications = self.channel.subscribe();
        let mut mutations = self.document().watch_mutations();
        tokio::spawn(async move {
            let mut poll = tokio::time::interval(session.config.master_poll);
            let mut rescan = tokio::time::interval(session.config.rescan_interval);
            poll.tick().await;
            rescan.tick().await;
            let mut watching = true;
            loop {
                tokio::select! {
                    changed = notifications.recv() => {
                        if let Ok(key) = changed {
                            session.handle_remote_change(&key).await;
                        }
                    }
                    mutated = mutations.recv(), if watching => {
                        if mutated.is_none() {
                            // Watcher replaced by the host; periodic
                            // re-scans still cover page changes.
                            watching = false;
                            continue;
                        }
                        // Coalesce the burst, then re-scan once.
                        tokio::time::sleep(session.config.mutation_debounce).await;
                        while mutations.try_recv().is_ok() {}
                        if let Err(e) = session.rescan().await {
                            warn!("mutation re-scan failed: {e}");
                        }
                    }
                    _ = poll.tick() => {
                        if let Err(e) = session.poll_once().await {
                            warn!("master poll failed: {e}");
                        }
                    }
                    _ = rescan.tick() => {
                        if let Err(e) = session.rescan().await {
                            warn!("periodic re-scan failed: {e}");
                        }
                    }
                }
            }
        })
    }
}
