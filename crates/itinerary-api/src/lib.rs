// ── API Façade (C8) ─────────────────────────────────────────────────────
// Thin axum router over itinerary-engine. Peripheral to the spec's core
// (spec.md §6 External Interfaces) — the same "commands are a thin shell"
// convention the teacher follows for its Tauri command surface, here
// reimplemented as HTTP+WS handlers.

pub mod handlers;
pub mod state;
pub mod ws;

use axum::routing::{get, post, put};
use axum::Router;

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/itineraries", post(handlers::create_itinerary).get(handlers::list_itineraries))
        .route("/itineraries/:id", get(handlers::get_itinerary).delete(handlers::delete_itinerary))
        .route("/itineraries/:id/propose", post(handlers::propose))
        .route("/itineraries/:id/apply", post(handlers::apply))
        .route("/itineraries/:id/undo", post(handlers::undo))
        .route("/itineraries/:id/nodes/:node_id/lock", put(handlers::set_lock))
        .route("/itineraries/:id/revisions", get(handlers::list_revisions))
        .route("/itineraries/:id/revisions/:version/rollback", post(handlers::rollback))
        .route("/chat/route", post(handlers::chat_route))
        .route("/book", post(handlers::book))
        .route("/ws", get(ws::upgrade))
        .with_state(state)
}
