//! Calendar event primitives.
//!
//! Events derived from an approved swap request carry `swap_request_id`, so
//! a re-approval can find and replace them idempotently.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// Category assigned to events derived from approved swap requests.
pub const CUSTODY_CATEGORY: &str = "custody";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub family_id: String,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub category: Option<String>,
    pub assigned_to: Option<String>,
    /// Set on events derived from an approved swap request.
    pub swap_request_id: Option<Uuid>,
    /// Minutes before `start_at` at which the reminder fires.
    pub reminder_minutes: Option<i64>,
    pub created_by: String,
}

impl Event {
    pub fn new(
        family_id: String,
        title: String,
        start_at: DateTime<Utc>,
        end_at: Option<DateTime<Utc>>,
        all_day: bool,
        category: Option<String>,
        assigned_to: Option<String>,
        reminder_minutes: Option<i64>,
        created_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            family_id,
            title,
            start_at,
            end_at,
            all_day,
            category,
            assigned_to,
            swap_request_id: None,
            reminder_minutes,
            created_by,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub start_at: DateTimeUtc,
    pub end_at: Option<DateTimeUtc>,
    pub all_day: bool,
    pub category: Option<String>,
    pub assigned_to: Option<String>,
    pub swap_request_id: Option<String>,
    pub reminder_minutes: Option<i64>,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Event> for ActiveModel {
    fn from(event: &Event) -> Self {
        Self {
            id: ActiveValue::Set(event.id.to_string()),
            family_id: ActiveValue::Set(event.family_id.clone()),
            title: ActiveValue::Set(event.title.clone()),
            start_at: ActiveValue::Set(event.start_at),
            end_at: ActiveValue::Set(event.end_at),
            all_day: ActiveValue::Set(event.all_day),
            category: ActiveValue::Set(event.category.clone()),
            assigned_to: ActiveValue::Set(event.assigned_to.clone()),
            swap_request_id: ActiveValue::Set(event.swap_request_id.map(|id| id.to_string())),
            reminder_minutes: ActiveValue::Set(event.reminder_minutes),
            created_by: ActiveValue::Set(event.created_by.clone()),
        }
    }
}

impl TryFrom<Model> for Event {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "event")?,
            family_id: model.family_id,
            title: model.title,
            start_at: model.start_at,
            end_at: model.end_at,
            all_day: model.all_day,
            category: model.category,
            assigned_to: model.assigned_to,
            swap_request_id: model
                .swap_request_id
                .and_then(|s| Uuid::parse_str(&s).ok()),
            reminder_minutes: model.reminder_minutes,
            created_by: model.created_by,
        })
    }
}
