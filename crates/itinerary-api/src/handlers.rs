// Thin handlers: extract state, delegate to the engine, serialize the
// result. Mirrors the teacher's `commands/*.rs` convention of 1-5 line
// Tauri command wrappers (spec.md §6.1's HTTP surface).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use itinerary_engine::agents::{AgentContext, AgentKind};
use itinerary_engine::model::{ChangeSet, Itinerary};
use itinerary_engine::orchestrator::ChatRequest;

use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorBody>)>;

/// spec.md §7's standard error envelope. `path` is left to the transport
/// (reconstructing it per-handler would mean threading `OriginalUri`
/// through every call site for a peripheral, boundary-only concern) —
/// noted as a simplification in DESIGN.md.
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
    pub timestamp: i64,
}

fn map_err(e: itinerary_engine::EngineError) -> (StatusCode, Json<ErrorBody>) {
    use itinerary_engine::EngineError::*;
    let (status, code, hint) = match &e {
        Validation(_) => (StatusCode::BAD_REQUEST, "validation_error", None),
        NotFound(_) => (StatusCode::NOT_FOUND, "not_found", None),
        Conflict(_) => (StatusCode::CONFLICT, "conflict", None),
        Auth(_) => (StatusCode::UNAUTHORIZED, "auth_error", None),
        AgentFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "agent_failure", Some("the AI provider chain was exhausted or returned invalid output; retry later")),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None),
    };
    (status, Json(ErrorBody { code, message: e.to_string(), hint, timestamp: now_ms() }))
}

#[derive(Deserialize)]
pub struct CreateRequest {
    pub owner_id: String,
}

#[derive(Serialize)]
pub struct CreateResponse {
    pub itinerary: Itinerary,
    pub execution_id: String,
    pub status: &'static str,
}

pub async fn create_itinerary(State(state): State<AppState>, Json(body): Json<CreateRequest>) -> ApiResult<CreateResponse> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = now_ms();
    let itinerary = Itinerary::new(id.clone(), body.owner_id, now);
    state.store.save(&itinerary).map_err(map_err)?;
    state
        .store
        .append_revision(&itinerary_engine::model::Revision {
            itinerary_id: id.clone(),
            version: 1,
            timestamp: now,
            description: "created".into(),
            author: itinerary_engine::model::Author::System,
            diff: itinerary_engine::model::Diff::empty(1),
            snapshot: itinerary.clone(),
        })
        .map_err(map_err)?;

    let ctx = AgentContext {
        run_id: uuid::Uuid::new_v4().to_string(),
        itinerary_id: id.clone(),
        engine: state.change_engine.clone(),
        ai: state.ai.clone(),
        bus: state.bus.clone(),
        request_text: None,
        day: None,
        auto_apply: true,
    };
    let agents = state.agents.clone();
    tokio::spawn(async move {
        if let Err(e) = agents.run(AgentKind::Planner, ctx).await {
            log::warn!("[api] background planner run failed: {e}");
        }
    });

    Ok(Json(CreateResponse { itinerary, execution_id: id, status: "generating" }))
}

pub async fn get_itinerary(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Itinerary> {
    let itinerary = state.store.get(&id).map_err(map_err)?.ok_or_else(|| map_err(itinerary_engine::EngineError::not_found(&id)))?;
    Ok(Json(itinerary))
}

pub async fn list_itineraries(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(Json(state.store.list_ids().map_err(map_err)?))
}

pub async fn delete_itinerary(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    state.store.delete(&id).map_err(map_err)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct ProposeResponse {
    pub proposed: Itinerary,
    pub diff: itinerary_engine::model::Diff,
    pub preview_version: u64,
}

pub async fn propose(State(state): State<AppState>, Path(id): Path<String>, Json(change_set): Json<ChangeSet>) -> ApiResult<ProposeResponse> {
    let result = state.change_engine.propose(&id, &change_set).map_err(map_err)?;
    Ok(Json(ProposeResponse { proposed: result.proposed, diff: result.diff, preview_version: result.preview_version }))
}

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub change_set: ChangeSet,
}

#[derive(Serialize)]
pub struct ApplyResponse {
    pub to_version: u64,
    pub diff: itinerary_engine::model::Diff,
}

pub async fn apply(State(state): State<AppState>, Path(id): Path<String>, Json(body): Json<ApplyRequest>) -> ApiResult<ApplyResponse> {
    let result = state.change_engine.apply(&id, &body.change_set).await.map_err(map_err)?;
    Ok(Json(ApplyResponse { to_version: result.to_version, diff: result.diff }))
}

#[derive(Deserialize, Default)]
pub struct UndoRequest {
    pub to_version: Option<u64>,
}

pub async fn undo(State(state): State<AppState>, Path(id): Path<String>, body: Option<Json<UndoRequest>>) -> ApiResult<ApplyResponse> {
    let to_version = body.map(|b| b.0.to_version).unwrap_or(None);
    let result = state.change_engine.undo(&id, to_version).await.map_err(map_err)?;
    Ok(Json(ApplyResponse { to_version: result.to_version, diff: result.diff }))
}

#[derive(Deserialize)]
pub struct LockRequest {
    pub locked: bool,
}

#[derive(Serialize)]
pub struct LockResponse {
    pub success: bool,
    pub node_id: String,
    pub locked: bool,
}

pub async fn set_lock(State(state): State<AppState>, Path((id, node_id)): Path<(String, String)>, Json(body): Json<LockRequest>) -> ApiResult<LockResponse> {
    let change_set = ChangeSet {
        scope: itinerary_engine::model::ChangeScope::Trip,
        day: None,
        ops: vec![itinerary_engine::model::ChangeOperation::Update {
            id: node_id.clone(),
            patch: itinerary_engine::model::NodePatch { locked: Some(body.locked), ..Default::default() },
        }],
        preferences: itinerary_engine::model::ChangePreferences { respect_locks: false, ..Default::default() },
        author: itinerary_engine::model::Author::User,
    };
    state.change_engine.apply(&id, &change_set).await.map_err(map_err)?;
    Ok(Json(LockResponse { success: true, node_id, locked: body.locked }))
}

pub async fn list_revisions(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Vec<itinerary_engine::model::Revision>> {
    Ok(Json(state.store.list_revisions(&id).map_err(map_err)?))
}

pub async fn rollback(State(state): State<AppState>, Path((id, version)): Path<(String, u64)>) -> ApiResult<Itinerary> {
    let result = state.change_engine.undo(&id, Some(version)).await.map_err(map_err)?;
    let itinerary = state.store.get(&id).map_err(map_err)?.ok_or_else(|| map_err(itinerary_engine::EngineError::not_found(&id)))?;
    let _ = result;
    Ok(Json(itinerary))
}

pub async fn chat_route(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Json<itinerary_engine::orchestrator::ChatResponse> {
    Json(state.orchestrator.route(request).await)
}

#[derive(Deserialize)]
pub struct BookRequest {
    pub itinerary_id: String,
    pub node_id: String,
}

#[derive(Serialize)]
pub struct BookResponse {
    pub booking_ref: String,
    pub locked: bool,
}

/// Mock booking: stamps `booking_ref` and a "Booked" label, never flips
/// `locked` (spec.md §6.1, §3.5 — locking stays an explicit user choice).
pub async fn book(State(state): State<AppState>, Json(body): Json<BookRequest>) -> ApiResult<BookResponse> {
    let booking_ref = format!("BK-{}", uuid::Uuid::new_v4().simple());
    let mut patch = itinerary_engine::model::NodePatch { booking_ref: Some(booking_ref.clone()), ..Default::default() };
    let itinerary = state.store.get(&body.itinerary_id).map_err(map_err)?.ok_or_else(|| map_err(itinerary_engine::EngineError::not_found(&body.itinerary_id)))?;
    if let Some((node, _)) = itinerary.find_node(&body.node_id) {
        let mut labels = node.labels.clone();
        if !labels.iter().any(|l| l == "Booked") {
            labels.push("Booked".to_string());
        }
        patch.labels = Some(labels);
    }
    // Booking is the one legitimate caller of respect_locks=false (spec.md
    // §9): a locked node can still receive a bookingRef, since locking only
    // guards against destructive/position changes, not the booking flow.
    let change_set = ChangeSet {
        scope: itinerary_engine::model::ChangeScope::Trip,
        day: None,
        ops: vec![itinerary_engine::model::ChangeOperation::Update { id: body.node_id, patch }],
        preferences: itinerary_engine::model::ChangePreferences { respect_locks: false, ..Default::default() },
        author: itinerary_engine::model::Author::User,
    };
    state.change_engine.apply(&body.itinerary_id, &change_set).await.map_err(map_err)?;
    Ok(Json(BookResponse { booking_ref, locked: false }))
}

fn now_ms() -> i64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}
