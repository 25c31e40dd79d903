//! Itinerary state engine, change pipeline, AI provider abstraction, agents,
//! orchestrator, and event bus for collaborative AI-assisted itinerary
//! construction. See `SPEC_FULL.md` for the full component breakdown.

pub mod agents;
pub mod ai;
pub mod atoms;
pub mod bus;
pub mod config;
pub mod engine;
pub mod model;
pub mod orchestrator;
pub mod store;

pub use atoms::error::{EngineError, EngineResult};
pub use bus::EventBus;
pub use config::EngineConfig;
pub use engine::{ApplyResult, ChangeEngine, ProposeResult};
pub use store::Store;

/// Top-level wiring: the library's dependency-injection root, constructed
/// once at process startup and handed to the API façade and the agent
/// scheduler. Mirrors the teacher's `EngineState` / explicit-construction
/// pattern (Design Notes: replace service locator with constructor
/// injection) rather than a global/static singleton.
pub struct Engine {
    pub store: std::sync::Arc<Store>,
    pub bus: std::sync::Arc<EventBus>,
    pub change_engine: std::sync::Arc<ChangeEngine>,
}

impl Engine {
    pub fn new(store: std::sync::Arc<Store>, bus: std::sync::Arc<EventBus>) -> Self {
        let change_engine = std::sync::Arc::new(ChangeEngine::new(store.clone(), bus.clone()));
        Self { store, bus, change_engine }
    }
}
