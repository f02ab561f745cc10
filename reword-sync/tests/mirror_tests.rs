use reword_store::{MemoryRuleStore, RuleStore};
use reword_sync::{
    poll_master, MemorySlots, MergeEngine, MirrorWriter, SlotChannel, Snapshot, MASTER_SLOT,
};
use reword_types::Rule;
use std::sync::Arc;
use std::time::Duration;

const DEBOUNCE: Duration = Duration::from_millis(500);
const TTL: Duration = Duration::from_secs(3600);

struct Context {
    engine: Arc<MergeEngine>,
    writer: Arc<MirrorWriter>,
}

fn context(slots: &Arc<MemorySlots>) -> Context {
    let channel: Arc<dyn SlotChannel> = slots.clone();
    Context {
        engine: Arc::new(MergeEngine::new(Arc::new(MemoryRuleStore::new()))),
        writer: Arc::new(MirrorWriter::new(channel, DEBOUNCE, TTL)),
    }
}

#[tokio::test(start_paused = true)]
async fn debounce_coalesces_bursts() {
    let slots = MemorySlots::new();
    let ctx = context(&slots);
    let channel: Arc<dyn SlotChannel> = slots.clone();

    for i in 0..3 {
        ctx.engine
            .store()
            .put(&Rule::new(format!("old{i}"), format!("new{i}"), ""))
            .unwrap();
        ctx.writer.schedule(&ctx.engine);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(
        channel.read(MASTER_SLOT).await.unwrap().is_none(),
        "nothing written while edits keep arriving"
    );

    tokio::time::sleep(DEBOUNCE + Duration::from_millis(50)).await;

    let raw = channel.read(MASTER_SLOT).await.unwrap().expect("one write");
    let snap = Snapshot::decode(&raw).unwrap();
    assert_eq!(snap.rules.len(), 3, "burst coalesced into one snapshot");
}

#[tokio::test]
async fn own_write_is_suppressed() {
    let slots = MemorySlots::new();
    let ctx = context(&slots);
    let channel: Arc<dyn SlotChannel> = slots.clone();

    ctx.engine.store().put(&Rule::new("a", "b", "")).unwrap();
    ctx.writer.flush(&ctx.engine).await.unwrap();

    let outcome = poll_master(&channel, &ctx.writer, &ctx.engine)
        .await
        .unwrap();
    assert!(outcome.is_none(), "a context never merges its own echo");
}

#[tokio::test]
async fn poll_merges_remote_snapshot() {
    let slots = MemorySlots::new();
    let a = context(&slots);
    let b = context(&slots);
    let channel: Arc<dyn SlotChannel> = slots.clone();

    let rule = Rule::new("cat", "dog", "example.com");
    a.engine.store().put(&rule).unwrap();
    a.writer.flush(&a.engine).await.unwrap();

    let outcome = poll_master(&channel, &b.writer, &b.engine)
        .await
        .unwrap()
        .expect("remote snapshot merged");
    assert_eq!(outcome.added, 1);
    assert_eq!(b.engine.store().get_all().unwrap(), vec![rule]);

    // Polling again is a no-op merge, not an error.
    let again = poll_master(&channel, &b.writer, &b.engine)
        .await
        .unwrap()
        .expect("same snapshot re-merged");
    assert!(!again.changed());
}

#[tokio::test]
async fn empty_slot_polls_clean() {
    let slots = MemorySlots::new();
    let ctx = context(&slots);
    let channel: Arc<dyn SlotChannel> = slots.clone();
    assert!(poll_master(&channel, &ctx.writer, &ctx.engine)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn malformed_payload_is_discarded() {
    let slots = MemorySlots::new();
    let ctx = context(&slots);
    let channel: Arc<dyn SlotChannel> = slots.clone();

    channel
        .write(MASTER_SLOT, "{definitely not json".to_string())
        .await
        .unwrap();

    let outcome = poll_master(&channel, &ctx.writer, &ctx.engine)
        .await
        .unwrap();
    assert!(outcome.is_none());
    assert!(ctx.engine.store().get_all().unwrap().is_empty());
}

#[tokio::test]
async fn subscribers_see_change_notifications() {
    let slots = MemorySlots::new();
    let mut rx = slots.subscribe();
    let channel: Arc<dyn SlotChannel> = slots.clone();

    channel
        .write(MASTER_SLOT, "{}".to_string())
        .await
        .unwrap();
    assert_eq!(rx.recv().await.unwrap(), MASTER_SLOT);
}

#[tokio::test]
async fn two_contexts_converge_via_mirror() {
    let slots = MemorySlots::new();
    let a = context(&slots);
    let b = context(&slots);
    let channel: Arc<dyn SlotChannel> = slots.clone();

    a.engine.store().put(&Rule::new("cat", "dog", "")).unwrap();
    b.engine.store().put(&Rule::new("up", "down", "")).unwrap();

    // a broadcasts; b merges and re-broadcasts the merged state; a merges.
    a.writer.flush(&a.engine).await.unwrap();
    poll_master(&channel, &b.writer, &b.engine).await.unwrap();
    b.writer.flush(&b.engine).await.unwrap();
    poll_master(&channel, &a.writer, &a.engine).await.unwrap();

    let mut a_rules: Vec<String> = a
        .engine
        .store()
        .get_all()
        .unwrap()
        .into_iter()
        .map(|r| r.old_text)
        .collect();
    let mut b_rules: Vec<String> = b
        .engine
        .store()
        .get_all()
        .unwrap()
        .into_iter()
        .map(|r| r.old_text)
        .collect();
    a_rules.sort();
    b_rules.sort();
    assert_eq!(a_rules, vec!["cat", "up"]);
    assert_eq!(a_rules, b_rules);
}
