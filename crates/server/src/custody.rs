//! Custody schedule API endpoints

use api_types::custody::{
    PatternKind as ApiPattern, PendingApprovalView, ScheduleDecision as ApiDecision,
    ScheduleRespond, ScheduleSave, ScheduleView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{Identity, ServerError, server::ServerState};

fn map_pattern(kind: engine::PatternKind) -> ApiPattern {
    match kind {
        engine::PatternKind::Weekly => ApiPattern::Weekly,
        engine::PatternKind::Biweekly => ApiPattern::Biweekly,
        engine::PatternKind::Custom => ApiPattern::Custom,
        engine::PatternKind::WeekOnWeekOff => ApiPattern::WeekOnWeekOff,
    }
}

fn map_pattern_in(kind: ApiPattern) -> engine::PatternKind {
    match kind {
        ApiPattern::Weekly => engine::PatternKind::Weekly,
        ApiPattern::Biweekly => engine::PatternKind::Biweekly,
        ApiPattern::Custom => engine::PatternKind::Custom,
        ApiPattern::WeekOnWeekOff => engine::PatternKind::WeekOnWeekOff,
    }
}

fn view(schedule: engine::CustodySchedule) -> ScheduleView {
    ScheduleView {
        family_id: schedule.family_id,
        pattern_kind: map_pattern(schedule.pattern_kind),
        parent_a_days: schedule.parent_a_days,
        parent_b_days: schedule.parent_b_days,
        is_active: schedule.is_active,
        pending_approval: schedule.pending_approval.map(|pending| PendingApprovalView {
            pattern_kind: map_pattern(pending.pattern_kind),
            parent_a_days: pending.parent_a_days,
            parent_b_days: pending.parent_b_days,
            requested_by: pending.requested_by,
            requested_at: pending.requested_at,
        }),
    }
}

pub async fn get(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
) -> Result<Json<ScheduleView>, ServerError> {
    let schedule = state
        .engine
        .custody_schedule(&family_id, &identity.user_id)
        .await?;

    Ok(Json(view(schedule)))
}

pub async fn save(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
    Json(payload): Json<ScheduleSave>,
) -> Result<Json<ScheduleView>, ServerError> {
    let schedule = state
        .engine
        .save_custody_schedule(engine::ScheduleSave {
            family_id: family_id.clone(),
            pattern_kind: map_pattern_in(payload.pattern_kind),
            parent_a_days: payload.parent_a_days,
            parent_b_days: payload.parent_b_days,
            request_approval: payload.request_approval,
            user_id: identity.user_id,
        })
        .await?;

    let schedule = view(schedule);
    let name = if schedule.pending_approval.is_some() {
        "custody:pending"
    } else {
        "custody:updated"
    };
    state.hub.emit(&family_id, name, &schedule);

    Ok(Json(schedule))
}

pub async fn respond(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
    Json(payload): Json<ScheduleRespond>,
) -> Result<Json<ScheduleView>, ServerError> {
    let decision = match payload.decision {
        ApiDecision::Approve => engine::ScheduleDecision::Approve,
        ApiDecision::Reject => engine::ScheduleDecision::Reject,
    };
    let schedule = state
        .engine
        .respond_custody_schedule(&family_id, decision, &identity.user_id)
        .await?;

    let schedule = view(schedule);
    state.hub.emit(&family_id, "custody:updated", &schedule);

    Ok(Json(schedule))
}

pub async fn cancel_pending(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    Path(family_id): Path<String>,
) -> Result<Json<ScheduleView>, ServerError> {
    let schedule = state
        .engine
        .cancel_custody_pending(&family_id, &identity.user_id)
        .await?;

    let schedule = view(schedule);
    state.hub.emit(&family_id, "custody:updated", &schedule);

    Ok(Json(schedule))
}
