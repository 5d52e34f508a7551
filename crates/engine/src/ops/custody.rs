//! Recurring custody schedule with a dual-consent approval flow.
//!
//! A family has at most one live schedule row. Saving with
//! `request_approval = false` applies the pattern immediately; saving with
//! `request_approval = true` stages it as a pending approval that only the
//! other parent can apply. A second staged save replaces the first.

use chrono::Utc;
use sea_orm::{ActiveValue, ModelTrait, QueryFilter, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    CustodySchedule, EngineError, PatternKind, PendingApproval, ResultEngine,
    custody_pending_approvals, custody_schedules,
    util::validate_weekdays,
};

use super::{Engine, with_tx};

pub struct ScheduleSave {
    pub family_id: String,
    pub pattern_kind: PatternKind,
    pub parent_a_days: Vec<u8>,
    pub parent_b_days: Vec<u8>,
    pub request_approval: bool,
    pub user_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleDecision {
    Approve,
    Reject,
}

impl Engine {
    /// Returns the family's schedule with any staged change attached.
    pub async fn custody_schedule(
        &self,
        family_id: &str,
        user_id: &str,
    ) -> ResultEngine<CustodySchedule> {
        with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, family_id, user_id).await?;
            self.load_schedule(&db_tx, family_id).await
        })
    }

    /// Saves the family's schedule, either applying it immediately or
    /// staging it for the other parent's consent.
    pub async fn save_custody_schedule(&self, cmd: ScheduleSave) -> ResultEngine<CustodySchedule> {
        validate_weekdays(&cmd.parent_a_days, "parent_a_days")?;
        validate_weekdays(&cmd.parent_b_days, "parent_b_days")?;
        let now = Utc::now();

        let schedule = with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, &cmd.family_id, &cmd.user_id)
                .await?;

            let existing = custody_schedules::Entity::find()
                .filter(custody_schedules::Column::FamilyId.eq(cmd.family_id.clone()))
                .one(&db_tx)
                .await?;

            if cmd.request_approval {
                // Stage only. The live row (if any) stays untouched; a
                // placeholder row is created for a family that has never
                // had a schedule so the pending change has an anchor.
                let mut schedule = match existing {
                    Some(model) => CustodySchedule::try_from(model)?,
                    None => {
                        let schedule = CustodySchedule {
                            id: Uuid::new_v4(),
                            family_id: cmd.family_id.clone(),
                            pattern_kind: cmd.pattern_kind,
                            parent_a_days: cmd.parent_a_days.clone(),
                            parent_b_days: cmd.parent_b_days.clone(),
                            is_active: false,
                            updated_by: cmd.user_id.clone(),
                            pending_approval: None,
                        };
                        custody_schedules::ActiveModel::from(&schedule)
                            .insert(&db_tx)
                            .await?;
                        schedule
                    }
                };

                // Replace any previously staged change.
                custody_pending_approvals::Entity::delete_many()
                    .filter(
                        custody_pending_approvals::Column::ScheduleId
                            .eq(schedule.id.to_string()),
                    )
                    .exec(&db_tx)
                    .await?;

                let pending = PendingApproval {
                    id: Uuid::new_v4(),
                    schedule_id: schedule.id,
                    pattern_kind: cmd.pattern_kind,
                    parent_a_days: cmd.parent_a_days.clone(),
                    parent_b_days: cmd.parent_b_days.clone(),
                    requested_by: cmd.user_id.clone(),
                    requested_at: now,
                };
                custody_pending_approvals::ActiveModel::from(&pending)
                    .insert(&db_tx)
                    .await?;
                schedule.pending_approval = Some(pending);
                Ok(schedule)
            } else {
                let schedule = CustodySchedule {
                    id: existing
                        .as_ref()
                        .map(|model| crate::util::parse_uuid(&model.id, "custody schedule"))
                        .transpose()?
                        .unwrap_or_else(Uuid::new_v4),
                    family_id: cmd.family_id.clone(),
                    pattern_kind: cmd.pattern_kind,
                    parent_a_days: cmd.parent_a_days.clone(),
                    parent_b_days: cmd.parent_b_days.clone(),
                    is_active: true,
                    updated_by: cmd.user_id.clone(),
                    pending_approval: None,
                };
                let mut active = custody_schedules::ActiveModel::from(&schedule);
                if existing.is_some() {
                    active.id = ActiveValue::Unchanged(schedule.id.to_string());
                    active.update(&db_tx).await?;
                } else {
                    active.insert(&db_tx).await?;
                }
                Ok(schedule)
            }
        })?;

        if let Some(pending) = &schedule.pending_approval {
            let other = self.family_co_parent(&schedule.family_id, &pending.requested_by).await;
            if let Some(other_id) = other {
                self.notify_users(
                    std::slice::from_ref(&other_id),
                    "Schedule change proposed",
                    "A custody schedule change is waiting for your approval",
                    serde_json::json!({ "type": "custody_pending", "family_id": schedule.family_id }),
                )
                .await;
            }
        }

        Ok(schedule)
    }

    /// The non-author parent approves or rejects the staged change.
    pub async fn respond_custody_schedule(
        &self,
        family_id: &str,
        decision: ScheduleDecision,
        user_id: &str,
    ) -> ResultEngine<CustodySchedule> {
        let (schedule, author) = with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, family_id, user_id).await?;

            let mut schedule = self.load_schedule(&db_tx, family_id).await?;
            let pending = schedule
                .pending_approval
                .take()
                .ok_or_else(|| EngineError::InvalidState("no pending approval".to_string()))?;
            if pending.requested_by == user_id {
                return Err(EngineError::Forbidden(
                    "cannot approve your own schedule change".to_string(),
                ));
            }

            match decision {
                ScheduleDecision::Approve => {
                    schedule.pattern_kind = pending.pattern_kind;
                    schedule.parent_a_days = pending.parent_a_days.clone();
                    schedule.parent_b_days = pending.parent_b_days.clone();
                    schedule.is_active = true;
                    schedule.updated_by = pending.requested_by.clone();

                    let mut active = custody_schedules::ActiveModel::from(&schedule);
                    active.id = ActiveValue::Unchanged(schedule.id.to_string());
                    active.update(&db_tx).await?;
                }
                ScheduleDecision::Reject => {}
            }

            custody_pending_approvals::Entity::delete_many()
                .filter(custody_pending_approvals::Column::Id.eq(pending.id.to_string()))
                .exec(&db_tx)
                .await?;

            Ok((schedule, pending.requested_by))
        })?;

        let (title, body) = match decision {
            ScheduleDecision::Approve => (
                "Schedule change approved",
                "Your custody schedule change is now active",
            ),
            ScheduleDecision::Reject => (
                "Schedule change rejected",
                "Your custody schedule change was declined",
            ),
        };
        self.notify_users(
            std::slice::from_ref(&author),
            title,
            body,
            serde_json::json!({ "type": "custody_settled", "family_id": schedule.family_id }),
        )
        .await;

        Ok(schedule)
    }

    /// The author withdraws their own staged change.
    pub async fn cancel_custody_pending(
        &self,
        family_id: &str,
        user_id: &str,
    ) -> ResultEngine<CustodySchedule> {
        with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, family_id, user_id).await?;

            let mut schedule = self.load_schedule(&db_tx, family_id).await?;
            let pending = schedule
                .pending_approval
                .take()
                .ok_or_else(|| EngineError::InvalidState("no pending approval".to_string()))?;
            if pending.requested_by != user_id {
                return Err(EngineError::Forbidden(
                    "only the author can withdraw a schedule change".to_string(),
                ));
            }

            custody_pending_approvals::Entity::delete_many()
                .filter(custody_pending_approvals::Column::Id.eq(pending.id.to_string()))
                .exec(&db_tx)
                .await?;

            Ok(schedule)
        })
    }

    async fn load_schedule(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        family_id: &str,
    ) -> ResultEngine<CustodySchedule> {
        let model = custody_schedules::Entity::find()
            .filter(custody_schedules::Column::FamilyId.eq(family_id.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("custody schedule".to_string()))?;

        let pending = model
            .find_related(custody_pending_approvals::Entity)
            .one(db_tx)
            .await?
            .map(PendingApproval::try_from)
            .transpose()?;

        let mut schedule = CustodySchedule::try_from(model)?;
        schedule.pending_approval = pending;
        Ok(schedule)
    }

    /// Looks up the other parent outside a transaction, for notifications.
    async fn family_co_parent(&self, family_id: &str, user_id: &str) -> Option<String> {
        use crate::family_members;

        family_members::Entity::find()
            .filter(family_members::Column::FamilyId.eq(family_id.to_string()))
            .filter(family_members::Column::UserId.ne(user_id.to_string()))
            .one(&self.database)
            .await
            .ok()
            .flatten()
            .map(|member| member.user_id)
    }
}
