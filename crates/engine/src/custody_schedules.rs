//! The family's single active recurring custody pattern (one row per family).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError,
    custody_pending_approvals::PendingApproval,
    util::{decode_json_list, encode_json_list, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Weekly,
    Biweekly,
    Custom,
    WeekOnWeekOff,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Custom => "custom",
            Self::WeekOnWeekOff => "week_on_week_off",
        }
    }
}

impl TryFrom<&str> for PatternKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "custom" => Ok(Self::Custom),
            "week_on_week_off" => Ok(Self::WeekOnWeekOff),
            other => Err(EngineError::Validation(format!(
                "invalid pattern kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustodySchedule {
    pub id: Uuid,
    pub family_id: String,
    pub pattern_kind: PatternKind,
    /// Weekday numbers (0 = Monday .. 6 = Sunday) per parent.
    pub parent_a_days: Vec<u8>,
    pub parent_b_days: Vec<u8>,
    pub is_active: bool,
    pub updated_by: String,
    /// Staged replacement pattern awaiting the other parent's consent.
    pub pending_approval: Option<PendingApproval>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "custody_schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub family_id: String,
    pub pattern_kind: String,
    pub parent_a_days: String,
    pub parent_b_days: String,
    pub is_active: bool,
    pub updated_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::custody_pending_approvals::Entity")]
    PendingApproval,
}

impl Related<super::custody_pending_approvals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PendingApproval.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CustodySchedule> for ActiveModel {
    fn from(schedule: &CustodySchedule) -> Self {
        Self {
            id: ActiveValue::Set(schedule.id.to_string()),
            family_id: ActiveValue::Set(schedule.family_id.clone()),
            pattern_kind: ActiveValue::Set(schedule.pattern_kind.as_str().to_string()),
            parent_a_days: ActiveValue::Set(encode_json_list(&schedule.parent_a_days)),
            parent_b_days: ActiveValue::Set(encode_json_list(&schedule.parent_b_days)),
            is_active: ActiveValue::Set(schedule.is_active),
            updated_by: ActiveValue::Set(schedule.updated_by.clone()),
        }
    }
}

impl TryFrom<Model> for CustodySchedule {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "custody schedule")?,
            family_id: model.family_id,
            pattern_kind: PatternKind::try_from(model.pattern_kind.as_str())?,
            parent_a_days: decode_json_list(&model.parent_a_days),
            parent_b_days: decode_json_list(&model.parent_b_days),
            is_active: model.is_active,
            updated_by: model.updated_by,
            pending_approval: None,
        })
    }
}
