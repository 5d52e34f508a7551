//! Calendar event API endpoints

use api_types::event::{EventNew, EventUpdate, EventView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{Identity, ServerError, server::ServerState};

fn view(event: engine::Event) -> EventView {
    EventView {
        id: event.id,
        family_id: event.family_id,
        title: event.title,
        start_at: event.start_at,
        end_at: event.end_at,
        all_day: event.all_day,
        category: event.category,
        assigned_to: event.assigned_to,
        swap_request_id: event.swap_request_id,
        reminder_minutes: event.reminder_minutes,
    }
}

pub async fn create(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
    Json(payload): Json<EventNew>,
) -> Result<(StatusCode, Json<EventView>), ServerError> {
    let event = state
        .engine
        .create_event(engine::EventCreate {
            family_id: family_id.clone(),
            title: payload.title,
            start_at: payload.start_at,
            end_at: payload.end_at,
            all_day: payload.all_day.unwrap_or(false),
            category: payload.category,
            assigned_to: payload.assigned_to,
            reminder_minutes: payload.reminder_minutes,
            user_id: identity.user_id,
        })
        .await?;

    let event = view(event);
    state.hub.emit(&family_id, "event:created", &event);

    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn list(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
) -> Result<Json<Vec<EventView>>, ServerError> {
    let events = state.engine.list_events(&family_id, &identity.user_id).await?;

    Ok(Json(events.into_iter().map(view).collect()))
}

pub async fn update(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EventUpdate>,
) -> Result<Json<EventView>, ServerError> {
    let event = state
        .engine
        .update_event(
            id,
            engine::EventPatch {
                title: payload.title,
                start_at: payload.start_at,
                end_at: payload.end_at,
                all_day: payload.all_day,
                category: payload.category,
                assigned_to: payload.assigned_to,
                reminder_minutes: payload.reminder_minutes,
            },
            &identity.user_id,
        )
        .await?;

    let event = view(event);
    state.hub.emit(&event.family_id, "event:updated", &event);

    Ok(Json(event))
}

pub async fn delete(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let event = state.engine.delete_event(id, &identity.user_id).await?;

    state.hub.emit(&event.family_id, "event:deleted", &event.id);

    Ok(StatusCode::NO_CONTENT)
}
