use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Open,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal tasks keep no reminder and are skipped by the sweep.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(Self::Open),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::Validation(format!(
                "invalid task status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub family_id: String,
    pub title: String,
    pub due_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub assigned_to: Option<String>,
    pub reminder_minutes: Option<i64>,
    pub created_by: String,
}

impl Task {
    pub fn new(
        family_id: String,
        title: String,
        due_at: Option<DateTime<Utc>>,
        assigned_to: Option<String>,
        reminder_minutes: Option<i64>,
        created_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            family_id,
            title,
            due_at,
            status: TaskStatus::Open,
            assigned_to,
            reminder_minutes,
            created_by,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub due_at: Option<DateTimeUtc>,
    pub status: String,
    pub assigned_to: Option<String>,
    pub reminder_minutes: Option<i64>,
    pub created_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Task> for ActiveModel {
    fn from(task: &Task) -> Self {
        Self {
            id: ActiveValue::Set(task.id.to_string()),
            family_id: ActiveValue::Set(task.family_id.clone()),
            title: ActiveValue::Set(task.title.clone()),
            due_at: ActiveValue::Set(task.due_at),
            status: ActiveValue::Set(task.status.as_str().to_string()),
            assigned_to: ActiveValue::Set(task.assigned_to.clone()),
            reminder_minutes: ActiveValue::Set(task.reminder_minutes),
            created_by: ActiveValue::Set(task.created_by.clone()),
        }
    }
}

impl TryFrom<Model> for Task {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "task")?,
            family_id: model.family_id,
            title: model.title,
            due_at: model.due_at,
            status: TaskStatus::try_from(model.status.as_str())?,
            assigned_to: model.assigned_to,
            reminder_minutes: model.reminder_minutes,
            created_by: model.created_by,
        })
    }
}
