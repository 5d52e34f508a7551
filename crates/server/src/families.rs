//! Family API endpoints

use api_types::family::{FamilyNew, FamilyView, MemberAdd, MemberView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{Identity, ServerError, server::ServerState};

pub async fn create(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Json(payload): Json<FamilyNew>,
) -> Result<(StatusCode, Json<FamilyView>), ServerError> {
    let family = state
        .engine
        .create_family(&payload.name, &identity.user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FamilyView {
            id: family.id,
            name: family.name,
        }),
    ))
}

pub async fn get(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
) -> Result<Json<FamilyView>, ServerError> {
    let family = state.engine.family(&family_id, &identity.user_id).await?;

    Ok(Json(FamilyView {
        id: family.id,
        name: family.name,
    }))
}

pub async fn list_members(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
) -> Result<Json<Vec<MemberView>>, ServerError> {
    let members = state
        .engine
        .list_members(&family_id, &identity.user_id)
        .await?;

    Ok(Json(
        members
            .into_iter()
            .map(|(user_id, display_name, role)| MemberView {
                user_id,
                display_name,
                role,
            })
            .collect(),
    ))
}

pub async fn add_member(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
    Json(payload): Json<MemberAdd>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .add_member(&family_id, &payload.user_id, &identity.user_id)
        .await?;

    state.hub.emit(&family_id, "member:added", &payload.user_id);

    Ok(StatusCode::CREATED)
}
