//! Staged custody-schedule change awaiting the other parent's consent.
//!
//! At most one row per schedule. Approving copies the staged fields onto the
//! live schedule and deletes this row in the same transaction; rejecting or
//! cancelling only deletes it.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    custody_schedules::PatternKind,
    util::{decode_json_list, encode_json_list, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub pattern_kind: PatternKind,
    pub parent_a_days: Vec<u8>,
    pub parent_b_days: Vec<u8>,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "custody_pending_approvals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub schedule_id: String,
    pub pattern_kind: String,
    pub parent_a_days: String,
    pub parent_b_days: String,
    pub requested_by: String,
    pub requested_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::custody_schedules::Entity",
        from = "Column::ScheduleId",
        to = "super::custody_schedules::Column::Id"
    )]
    CustodySchedules,
}

impl Related<super::custody_schedules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustodySchedules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&PendingApproval> for ActiveModel {
    fn from(pending: &PendingApproval) -> Self {
        Self {
            id: ActiveValue::Set(pending.id.to_string()),
            schedule_id: ActiveValue::Set(pending.schedule_id.to_string()),
            pattern_kind: ActiveValue::Set(pending.pattern_kind.as_str().to_string()),
            parent_a_days: ActiveValue::Set(encode_json_list(&pending.parent_a_days)),
            parent_b_days: ActiveValue::Set(encode_json_list(&pending.parent_b_days)),
            requested_by: ActiveValue::Set(pending.requested_by.clone()),
            requested_at: ActiveValue::Set(pending.requested_at),
        }
    }
}

impl TryFrom<Model> for PendingApproval {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "pending approval")?,
            schedule_id: parse_uuid(&model.schedule_id, "custody schedule")?,
            pattern_kind: PatternKind::try_from(model.pattern_kind.as_str())?,
            parent_a_days: decode_json_list(&model.parent_a_days),
            parent_b_days: decode_json_list(&model.parent_b_days),
            requested_by: model.requested_by,
            requested_at: model.requested_at,
        })
    }
}
