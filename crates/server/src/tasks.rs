//! Task API endpoints

use api_types::task::{TaskNew, TaskStatus as ApiStatus, TaskUpdate, TaskView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{Identity, ServerError, server::ServerState};

fn map_status(status: engine::TaskStatus) -> ApiStatus {
    match status {
        engine::TaskStatus::Open => ApiStatus::Open,
        engine::TaskStatus::Completed => ApiStatus::Completed,
        engine::TaskStatus::Cancelled => ApiStatus::Cancelled,
    }
}

fn map_status_in(status: ApiStatus) -> engine::TaskStatus {
    match status {
        ApiStatus::Open => engine::TaskStatus::Open,
        ApiStatus::Completed => engine::TaskStatus::Completed,
        ApiStatus::Cancelled => engine::TaskStatus::Cancelled,
    }
}

fn view(task: engine::Task) -> TaskView {
    TaskView {
        id: task.id,
        family_id: task.family_id,
        title: task.title,
        due_at: task.due_at,
        status: map_status(task.status),
        assigned_to: task.assigned_to,
        reminder_minutes: task.reminder_minutes,
    }
}

pub async fn create(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
    Json(payload): Json<TaskNew>,
) -> Result<(StatusCode, Json<TaskView>), ServerError> {
    let task = state
        .engine
        .create_task(engine::TaskCreate {
            family_id: family_id.clone(),
            title: payload.title,
            due_at: payload.due_at,
            assigned_to: payload.assigned_to,
            reminder_minutes: payload.reminder_minutes,
            user_id: identity.user_id,
        })
        .await?;

    let task = view(task);
    state.hub.emit(&family_id, "task:created", &task);

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
) -> Result<Json<Vec<TaskView>>, ServerError> {
    let tasks = state.engine.list_tasks(&family_id, &identity.user_id).await?;

    Ok(Json(tasks.into_iter().map(view).collect()))
}

pub async fn update(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TaskUpdate>,
) -> Result<Json<TaskView>, ServerError> {
    let task = state
        .engine
        .update_task(
            id,
            engine::TaskPatch {
                title: payload.title,
                due_at: payload.due_at,
                status: payload.status.map(map_status_in),
                assigned_to: payload.assigned_to,
                reminder_minutes: payload.reminder_minutes,
            },
            &identity.user_id,
        )
        .await?;

    let task = view(task);
    state.hub.emit(&task.family_id, "task:updated", &task);

    Ok(Json(task))
}

pub async fn delete(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    let task = state.engine.delete_task(id, &identity.user_id).await?;

    state.hub.emit(&task.family_id, "task:deleted", &task.id);

    Ok(StatusCode::NO_CONTENT)
}
