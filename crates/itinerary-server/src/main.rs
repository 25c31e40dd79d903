// ── itinerary-server ─────────────────────────────────────────────────────
// Process entry point: wires Store, EventBus, ChangeEngine, AgentRegistry,
// ProviderChain, and Orchestrator into one `AppState`, then serves the
// itinerary-api router. A background sweep periodically runs the
// Enrichment agent over itineraries in the Completed status, mirroring the
// teacher's `main.rs` pattern of one or two long-lived background tasks
// spawned alongside the HTTP server rather than a separate worker binary.

use std::sync::Arc;
use std::time::Duration;

use itinerary_engine::agents::{AgentContext, AgentKind, AgentRegistry};
use itinerary_engine::ai::ProviderChain;
use itinerary_engine::model::ItineraryStatus;
use itinerary_engine::orchestrator::Orchestrator;
use itinerary_engine::{ChangeEngine, EngineConfig, EventBus, Store};

const ENRICHMENT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> itinerary_engine::EngineResult<()> {
    env_logger::init();

    let config = EngineConfig::from_env();
    let store = Arc::new(Store::open(&config.database_path)?);
    let bus = Arc::new(EventBus::new());
    let change_engine = Arc::new(ChangeEngine::new(store.clone(), bus.clone()));
    let agents = Arc::new(AgentRegistry::new());
    let ai = Arc::new(ProviderChain::from_config(&config));
    let orchestrator = Arc::new(Orchestrator::new(change_engine.clone(), agents.clone(), ai.clone(), bus.clone()));

    let state = itinerary_api::AppState {
        store: store.clone(),
        bus: bus.clone(),
        change_engine: change_engine.clone(),
        orchestrator,
        agents: agents.clone(),
        ai: ai.clone(),
    };

    spawn_enrichment_sweep(store, bus, change_engine, agents, ai);

    let listener = tokio::net::TcpListener::bind(&config.http_bind_addr).await?;
    log::info!("[server] listening on {}", config.http_bind_addr);
    axum::serve(listener, itinerary_api::router(state)).await?;

    Ok(())
}

/// Periodically runs the Enrichment agent over every `Completed` itinerary,
/// catching up any that were generated or edited since the last sweep
/// (spec.md §4.5 "Enrichment Agent" is otherwise only triggered inline by
/// the Planner's own generation/modification flow).
fn spawn_enrichment_sweep(store: Arc<Store>, bus: Arc<EventBus>, engine: Arc<ChangeEngine>, agents: Arc<AgentRegistry>, ai: Arc<ProviderChain>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ENRICHMENT_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let ids = match store.list_ids() {
                Ok(ids) => ids,
                Err(e) => {
                    log::warn!("[server] enrichment sweep could not list itineraries: {e}");
                    continue;
                }
            };
            for id in ids {
                let Ok(Some(itinerary)) = store.get(&id) else { continue };
                if !matches!(itinerary.status, ItineraryStatus::Completed) {
                    continue;
                }
                let ctx = AgentContext {
                    run_id: format!("sweep-{id}"),
                    itinerary_id: id.clone(),
                    engine: engine.clone(),
                    ai: ai.clone(),
                    bus: bus.clone(),
                    request_text: None,
                    day: None,
                    auto_apply: true,
                };
                if let Err(e) = agents.run(AgentKind::Enrichment, ctx).await {
                    log::warn!("[server] enrichment sweep failed for {id}: {e}");
                }
            }
        }
    });
}
