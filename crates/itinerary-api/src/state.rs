// Shared application state handed to every handler via axum's `State`
// extractor — the explicit-construction counterpart of the teacher's
// Tauri `AppHandle`-scoped `EngineState` (Design Notes: no service locator).

use std::sync::Arc;

use itinerary_engine::agents::AgentRegistry;
use itinerary_engine::ai::ProviderChain;
use itinerary_engine::orchestrator::Orchestrator;
use itinerary_engine::{ChangeEngine, EventBus, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub bus: Arc<EventBus>,
    pub change_engine: Arc<ChangeEngine>,
    pub orchestrator: Arc<Orchestrator>,
    pub agents: Arc<AgentRegistry>,
    pub ai: Arc<ProviderChain>,
}
