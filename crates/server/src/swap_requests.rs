//! Swap request API endpoints

use api_types::swap::{
    SwapCounter, SwapCounterResponse, SwapDecision as ApiDecision, SwapKind as ApiKind, SwapNew,
    SwapRespond, SwapStatus as ApiStatus, SwapView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{Identity, ServerError, server::ServerState};

fn map_kind(kind: engine::SwapKind) -> ApiKind {
    match kind {
        engine::SwapKind::Swap => ApiKind::Swap,
        engine::SwapKind::OneWay => ApiKind::OneWay,
    }
}

fn map_kind_in(kind: ApiKind) -> engine::SwapKind {
    match kind {
        ApiKind::Swap => engine::SwapKind::Swap,
        ApiKind::OneWay => engine::SwapKind::OneWay,
    }
}

fn map_status(status: engine::SwapStatus) -> ApiStatus {
    match status {
        engine::SwapStatus::Pending => ApiStatus::Pending,
        engine::SwapStatus::Countered => ApiStatus::Countered,
        engine::SwapStatus::FinalPending => ApiStatus::FinalPending,
        engine::SwapStatus::Approved => ApiStatus::Approved,
        engine::SwapStatus::Rejected => ApiStatus::Rejected,
        engine::SwapStatus::Cancelled => ApiStatus::Cancelled,
    }
}

fn view(request: engine::SwapRequest) -> SwapView {
    SwapView {
        id: request.id,
        family_id: request.family_id,
        requester_id: request.requester_id,
        requester_name: request.requester_name,
        recipient_id: request.recipient_id,
        recipient_name: request.recipient_name,
        kind: map_kind(request.kind),
        status: map_status(request.status),
        original_date: request.original_date,
        proposed_date: request.proposed_date,
        reason: request.reason,
        previous_proposed_date: request.previous_proposed_date,
        counter_note: request.counter_note,
        countered_by: request.countered_by,
        countered_at: request.countered_at,
        requester_confirmed_at: request.requester_confirmed_at,
        counter_response_note: request.counter_response_note,
        counter_responded_at: request.counter_responded_at,
        response_note: request.response_note,
        responded_at: request.responded_at,
        created_at: request.created_at,
    }
}

fn emit_updated(state: &ServerState, request: &SwapView) {
    state
        .hub
        .emit(&request.family_id, "swap:updated", request);
}

pub async fn create(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
    Json(payload): Json<SwapNew>,
) -> Result<(StatusCode, Json<SwapView>), ServerError> {
    let request = state
        .engine
        .create_swap_request(engine::SwapCreate {
            family_id: family_id.clone(),
            kind: map_kind_in(payload.kind),
            original_date: payload.original_date,
            proposed_date: payload.proposed_date,
            reason: payload.reason,
            user_id: identity.user_id,
        })
        .await?;

    let request = view(request);
    state.hub.emit(&family_id, "swap:created", &request);

    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
) -> Result<Json<Vec<SwapView>>, ServerError> {
    let requests = state
        .engine
        .list_swap_requests(&family_id, &identity.user_id)
        .await?;

    Ok(Json(requests.into_iter().map(view).collect()))
}

pub async fn get(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SwapView>, ServerError> {
    let request = state.engine.swap_request(id, &identity.user_id).await?;

    Ok(Json(view(request)))
}

pub async fn counter(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SwapCounter>,
) -> Result<Json<SwapView>, ServerError> {
    let request = state
        .engine
        .counter_swap_request(id, payload.proposed_date, payload.note, &identity.user_id)
        .await?;

    let request = view(request);
    emit_updated(&state, &request);

    Ok(Json(request))
}

pub async fn accept_counter(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SwapCounterResponse>,
) -> Result<Json<SwapView>, ServerError> {
    let request = state
        .engine
        .accept_counter(id, payload.note, &identity.user_id)
        .await?;

    let request = view(request);
    emit_updated(&state, &request);

    Ok(Json(request))
}

pub async fn reject_counter(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SwapCounterResponse>,
) -> Result<Json<SwapView>, ServerError> {
    let request = state
        .engine
        .reject_counter(id, payload.note, &identity.user_id)
        .await?;

    let request = view(request);
    emit_updated(&state, &request);

    Ok(Json(request))
}

pub async fn respond(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SwapRespond>,
) -> Result<Json<SwapView>, ServerError> {
    let decision = match payload.decision {
        ApiDecision::Approved => engine::SwapDecision::Approved,
        ApiDecision::Rejected => engine::SwapDecision::Rejected,
    };
    let request = state
        .engine
        .respond_swap_request(id, decision, payload.note, &identity.user_id)
        .await?;

    let request = view(request);
    emit_updated(&state, &request);
    // Approval rewrites the calendar as well.
    if request.status == ApiStatus::Approved {
        state
            .hub
            .emit(&request.family_id, "custody:updated", &request.id);
    }

    Ok(Json(request))
}

pub async fn cancel(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SwapView>, ServerError> {
    let request = state.engine.cancel_swap_request(id, &identity.user_id).await?;

    let request = view(request);
    emit_updated(&state, &request);

    Ok(Json(request))
}
