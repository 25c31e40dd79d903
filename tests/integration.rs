// ── End-to-end scenarios (spec.md §8) ───────────────────────────────────
// Exercises the public crate surface the way a caller (the API façade)
// would: Store + EventBus + ChangeEngine + agents + orchestrator wired
// together, no HTTP layer.

use std::sync::Arc;

use itinerary_engine::agents::{AgentContext, AgentKind, AgentRegistry};
use itinerary_engine::ai::ProviderChain;
use itinerary_engine::config::EngineConfig;
use itinerary_engine::model::{
    Author, ChangeOperation, ChangePreferences, ChangeScope, ChangeSet, Day, Details, Links, Location, Node, NodePatch, NodeStatus, NodeType, Tips, Timing,
};
use itinerary_engine::orchestrator::{ChatRequest, Orchestrator};
use itinerary_engine::{ChangeEngine, EventBus, Store};

fn node(id: &str, title: &str, node_type: NodeType) -> Node {
    Node {
        id: id.into(),
        node_type,
        title: title.into(),
        location: Location { name: title.into(), address: None, lat: Some(41.4), lng: Some(2.17) },
        timing: Timing::default(),
        cost: Default::default(),
        details: Details::default(),
        labels: vec![],
        tips: Tips::default(),
        links: Links::default(),
        locked: false,
        booking_ref: None,
        status: NodeStatus::Planned,
        updated_by: Author::Agent,
        updated_at: 0,
    }
}

struct Harness {
    store: Arc<Store>,
    bus: Arc<EventBus>,
    engine: Arc<ChangeEngine>,
    agents: Arc<AgentRegistry>,
    ai: Arc<ProviderChain>,
    orchestrator: Arc<Orchestrator>,
}

fn harness() -> Harness {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let bus = Arc::new(EventBus::new());
    let engine = Arc::new(ChangeEngine::new(store.clone(), bus.clone()));
    let agents = Arc::new(AgentRegistry::new());
    let config = EngineConfig { ai_provider: "noop".to_string(), ..EngineConfig::from_env() };
    let ai = Arc::new(ProviderChain::from_config(&config));
    let orchestrator = Arc::new(Orchestrator::new(engine.clone(), agents.clone(), ai.clone(), bus.clone()));
    Harness { store, bus, engine, agents, ai, orchestrator }
}

fn seed_itinerary(store: &Store, id: &str) {
    let mut it = itinerary_engine::model::Itinerary::new(id, "anonymous", 0);
    it.status = itinerary_engine::model::ItineraryStatus::Completed;
    it.days.push(Day {
        day_number: 1,
        date: "2025-10-04".into(),
        location: "Barcelona".into(),
        nodes: vec![node("n1", "Sagrada Familia", NodeType::Attraction), node("n2", "Park Guell", NodeType::Attraction)],
        edges: vec![itinerary_engine::model::Edge { from: "n1".into(), to: "n2".into(), transit_info: Default::default() }],
        pacing: None,
        time_window: None,
        totals: None,
        warnings: vec![],
    });
    store.save(&it).unwrap();
    store
        .append_revision(&itinerary_engine::model::Revision {
            itinerary_id: id.to_string(),
            version: 1,
            timestamp: 0,
            description: "seed".into(),
            author: Author::System,
            diff: itinerary_engine::model::Diff::empty(1),
            snapshot: it,
        })
        .unwrap();
}

#[tokio::test]
async fn s1_planner_initial_generation_produces_a_completed_document() {
    let h = harness();
    let it = itinerary_engine::model::Itinerary::new("trip-gen", "anonymous", 0);
    h.store.save(&it).unwrap();

    let ctx = AgentContext {
        run_id: "run-1".into(),
        itinerary_id: "trip-gen".into(),
        engine: h.engine.clone(),
        ai: h.ai.clone(),
        bus: h.bus.clone(),
        request_text: None,
        day: None,
        auto_apply: true,
    };
    let outcome = h.agents.run(AgentKind::Planner, ctx).await.unwrap();
    assert!(outcome.applied);
    assert_eq!(outcome.to_version, Some(2));

    let generated = h.store.get("trip-gen").unwrap().unwrap();
    assert!(!generated.days.is_empty());
    assert_eq!(generated.status, itinerary_engine::model::ItineraryStatus::Completed);
}

#[tokio::test]
async fn s2_apply_inserts_a_node_and_bumps_version() {
    let h = harness();
    seed_itinerary(&h.store, "trip-1");

    let change_set = ChangeSet {
        scope: ChangeScope::Day,
        day: Some(1),
        ops: vec![ChangeOperation::Insert { after: "n2".into(), node: node("n3", "Gothic Quarter", NodeType::Attraction) }],
        preferences: ChangePreferences::default(),
        author: Author::User,
    };

    let result = h.engine.apply("trip-1", &change_set).await.unwrap();
    assert_eq!(result.to_version, 2);
    assert_eq!(result.diff.added.len(), 1);

    let updated = h.store.get("trip-1").unwrap().unwrap();
    assert_eq!(updated.days[0].nodes.len(), 3);
}

#[tokio::test]
async fn s3_propose_previews_without_persisting() {
    let h = harness();
    seed_itinerary(&h.store, "trip-2");

    let change_set = ChangeSet {
        scope: ChangeScope::Trip,
        day: None,
        ops: vec![ChangeOperation::Delete { id: "n2".into() }],
        preferences: ChangePreferences::default(),
        author: Author::User,
    };

    let preview = h.engine.propose("trip-2", &change_set).unwrap();
    assert_eq!(preview.preview_version, 2);
    assert_eq!(preview.proposed.days[0].nodes.len(), 1);

    // The store is untouched: still at version 1 with both nodes.
    let unchanged = h.store.get("trip-2").unwrap().unwrap();
    assert_eq!(unchanged.version, 1);
    assert_eq!(unchanged.days[0].nodes.len(), 2);
}

#[tokio::test]
async fn s4_locked_node_survives_a_destructive_op_and_is_reported() {
    let h = harness();
    seed_itinerary(&h.store, "trip-3");

    let lock_set = ChangeSet {
        scope: ChangeScope::Trip,
        day: None,
        ops: vec![ChangeOperation::Update { id: "n1".into(), patch: NodePatch { locked: Some(true), ..Default::default() } }],
        preferences: ChangePreferences { respect_locks: false, ..Default::default() },
        author: Author::User,
    };
    h.engine.apply("trip-3", &lock_set).await.unwrap();

    let delete_set = ChangeSet {
        scope: ChangeScope::Trip,
        day: None,
        ops: vec![ChangeOperation::Delete { id: "n1".into() }],
        preferences: ChangePreferences::default(),
        author: Author::Agent,
    };
    let result = h.engine.apply("trip-3", &delete_set).await.unwrap();
    assert!(!result.diff.warnings.is_empty());

    let survived = h.store.get("trip-3").unwrap().unwrap();
    assert!(survived.find_node("n1").is_some());
}

#[tokio::test]
async fn s5_undo_restores_the_prior_snapshot_as_a_forward_version() {
    let h = harness();
    seed_itinerary(&h.store, "trip-4");

    let change_set = ChangeSet {
        scope: ChangeScope::Trip,
        day: None,
        ops: vec![ChangeOperation::Delete { id: "n2".into() }],
        preferences: ChangePreferences::default(),
        author: Author::User,
    };
    h.engine.apply("trip-4", &change_set).await.unwrap();
    assert_eq!(h.store.get("trip-4").unwrap().unwrap().days[0].nodes.len(), 1);

    let undone = h.engine.undo("trip-4", Some(1)).await.unwrap();
    assert_eq!(undone.to_version, 3);

    let restored = h.store.get("trip-4").unwrap().unwrap();
    assert_eq!(restored.days[0].nodes.len(), 2);
}

#[tokio::test]
async fn s6_chat_route_explain_does_not_mutate_the_document() {
    let h = harness();
    seed_itinerary(&h.store, "trip-5");

    let request = ChatRequest {
        itinerary_id: "trip-5".into(),
        scope: ChangeScope::Trip,
        day: None,
        selected_node_id: None,
        text: "What is planned for today?".into(),
        auto_apply: false,
        user_id: Some("u1".into()),
    };
    let response = h.orchestrator.route(request).await;
    assert!(!response.applied);
    assert!(!response.message.is_empty());

    let unchanged = h.store.get("trip-5").unwrap().unwrap();
    assert_eq!(unchanged.version, 1);
}

#[tokio::test]
async fn s7_chat_route_with_ambiguous_reference_requests_disambiguation() {
    let h = harness();
    let mut it = itinerary_engine::model::Itinerary::new("trip-6", "anonymous", 0);
    it.status = itinerary_engine::model::ItineraryStatus::Completed;
    it.days.push(Day {
        day_number: 1,
        date: "2025-10-04".into(),
        location: "Barcelona".into(),
        nodes: vec![node("n1", "Park Guell", NodeType::Attraction), node("n2", "Park Central", NodeType::Attraction)],
        edges: vec![],
        pacing: None,
        time_window: None,
        totals: None,
        warnings: vec![],
    });
    h.store.save(&it).unwrap();

    let request = ChatRequest {
        itinerary_id: "trip-6".into(),
        scope: ChangeScope::Trip,
        day: None,
        selected_node_id: None,
        text: "move park earlier".into(),
        auto_apply: true,
        user_id: None,
    };
    let response = h.orchestrator.route(request).await;
    assert!(response.needs_disambiguation);
    assert!(response.candidates.len() >= 2);
}
