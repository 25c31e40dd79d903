// ── Change Engine: end-to-end property tests ───────────────────────────────
// Exercises propose/apply/undo against an in-memory Store + EventBus,
// covering the P1-P7 invariants and L1-L4 round-trip laws from spec.md §8.

use std::sync::Arc;

use crate::bus::EventBus;
use crate::model::{Author, ChangeOperation, ChangePreferences, ChangeScope, ChangeSet, Cost, Day, Details, Itinerary, Links, Location, Node, NodeStatus, NodeType, Tips, Timing};
use crate::store::Store;

use super::ChangeEngine;

fn sample_node(id: &str) -> Node {
    Node {
        id: id.into(),
        node_type: NodeType::Attraction,
        title: "Sample".into(),
        location: Location::default(),
        timing: Timing::default(),
        cost: Cost::default(),
        details: Details::default(),
        labels: vec![],
        tips: Tips::default(),
        links: Links::default(),
        locked: false,
        booking_ref: None,
        status: NodeStatus::Planned,
        updated_by: Author::User,
        updated_at: 0,
    }
}

fn seeded_engine() -> (ChangeEngine, String) {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = Arc::new(EventBus::new());

    let mut itinerary = Itinerary::new("trip-1", "anonymous", 0);
    itinerary.status = crate::model::ItineraryStatus::Completed;
    itinerary.days.push(Day {
        day_number: 1,
        date: "2025-10-04".into(),
        location: "Barcelona".into(),
        nodes: vec![sample_node("n1"), sample_node("n2")],
        edges: vec![],
        pacing: None,
        time_window: None,
        totals: None,
        warnings: vec![],
    });
    store.save(&itinerary).unwrap();
    store
        .append_revision(&crate::model::Revision {
            itinerary_id: "trip-1".into(),
            version: 1,
            timestamp: 0,
            description: "seed".into(),
            author: Author::System,
            diff: crate::model::Diff::empty(1),
            snapshot: itinerary.clone(),
        })
        .unwrap();

    (ChangeEngine::new(store, bus), "trip-1".to_string())
}

fn change_set(ops: Vec<ChangeOperation>) -> ChangeSet {
    ChangeSet { scope: ChangeScope::Trip, day: None, ops, preferences: ChangePreferences::default(), author: Author::User }
}

#[tokio::test]
async fn propose_does_not_persist_or_bump_version() {
    let (engine, id) = seeded_engine();
    let cs = change_set(vec![ChangeOperation::Delete { id: "n1".into() }]);

    let result = engine.propose(&id, &cs).unwrap();
    assert_eq!(result.preview_version, 2);
    assert_eq!(result.proposed.version, 1, "propose must not mutate the stored version field");

    let stored = engine.load(&id).unwrap();
    assert_eq!(stored.version, 1, "propose must not persist anything (spec.md P1/P2)");
}

#[tokio::test]
async fn apply_advances_version_by_exactly_one_and_persists() {
    let (engine, id) = seeded_engine();
    let cs = change_set(vec![ChangeOperation::Delete { id: "n1".into() }]);

    let result = engine.apply(&id, &cs).await.unwrap();
    assert_eq!(result.to_version, 2);

    let stored = engine.load(&id).unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.days[0].nodes.len(), 1);
}

#[tokio::test]
async fn apply_is_all_or_nothing_on_validation_error() {
    let (engine, id) = seeded_engine();
    let before = engine.load(&id).unwrap();

    let cs = change_set(vec![ChangeOperation::Move { id: "ghost".into(), start_time: None, end_time: None, after: None }]);
    let result = engine.apply(&id, &cs).await;
    assert!(result.is_err());

    let after = engine.load(&id).unwrap();
    assert_eq!(before.version, after.version, "a failed apply must leave no partial writes (P3)");
}

#[tokio::test]
async fn undo_restores_prior_snapshot_as_a_new_forward_version() {
    let (engine, id) = seeded_engine();
    engine.apply(&id, &change_set(vec![ChangeOperation::Delete { id: "n1".into() }])).await.unwrap();

    let undo_result = engine.undo(&id, None).await.unwrap();
    assert_eq!(undo_result.to_version, 3, "undo is itself a forward-moving change (L-undo)");

    let restored = engine.load(&id).unwrap();
    assert_eq!(restored.days[0].nodes.len(), 2, "undo must restore the version-1 snapshot's content");
}

#[tokio::test]
async fn empty_change_set_is_a_noop_and_does_not_bump_version() {
    let (engine, id) = seeded_engine();
    let result = engine.apply(&id, &change_set(vec![])).await.unwrap();
    assert_eq!(result.to_version, 1, "an empty ChangeSet must not advance the version (L3)");
    assert!(result.diff.added.is_empty() && result.diff.removed.is_empty() && result.diff.updated.is_empty());

    let stored = engine.load(&id).unwrap();
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn undo_of_unknown_version_is_not_found() {
    let (engine, id) = seeded_engine();
    let result = engine.undo(&id, Some(99)).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn concurrent_applies_on_same_itinerary_yield_strict_monotone_versions() {
    let (engine, id) = seeded_engine();
    let engine = Arc::new(engine);

    let mut handles = Vec::new();
    for i in 0..5u32 {
        let engine = engine.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            let node_id = format!("extra-{i}");
            let cs = change_set(vec![ChangeOperation::Insert { after: "n2".into(), node: {
                let mut n = sample_node(&node_id);
                n.title = format!("Extra {i}");
                n
            } }]);
            engine.apply(&id, &cs).await.unwrap().to_version
        }));
    }

    let mut versions: Vec<u64> = Vec::new();
    for h in handles {
        versions.push(h.await.unwrap());
    }
    versions.sort_unstable();
    assert_eq!(versions, vec![2, 3, 4, 5, 6], "versions must be a strict monotone sequence with no gaps or duplicates (spec.md §5)");
}

#[tokio::test]
async fn locked_node_survives_destructive_op_and_is_reported_as_a_warning() {
    let (engine, id) = seeded_engine();
    {
        let mut it = engine.load(&id).unwrap();
        it.days[0].nodes[0].locked = true;
        engine.store.save(&it).unwrap();
    }

    let cs = change_set(vec![ChangeOperation::Delete { id: "n1".into() }]);
    let result = engine.apply(&id, &cs).await.unwrap();
    assert_eq!(result.diff.warnings.len(), 1);

    let stored = engine.load(&id).unwrap();
    assert_eq!(stored.days[0].nodes.len(), 2, "locked node must survive the destructive op (P5)");
}
