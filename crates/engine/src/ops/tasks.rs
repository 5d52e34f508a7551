use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Task, TaskStatus, tasks};

use super::{Engine, normalize_required_text, with_tx};

pub struct TaskCreate {
    pub family_id: String,
    pub title: String,
    pub due_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub reminder_minutes: Option<i64>,
    pub user_id: String,
}

/// Partial update; `None` keeps the stored value, `Some(None)` clears it.
#[derive(Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub due_at: Option<Option<DateTime<Utc>>>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Option<String>>,
    pub reminder_minutes: Option<Option<i64>>,
}

impl Engine {
    pub async fn create_task(&self, cmd: TaskCreate) -> ResultEngine<Task> {
        let title = normalize_required_text(&cmd.title, "task title")?;
        if let Some(minutes) = cmd.reminder_minutes
            && minutes < 0
        {
            return Err(EngineError::Validation(
                "reminder_minutes must be >= 0".to_string(),
            ));
        }
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, &cmd.family_id, &cmd.user_id)
                .await?;

            let task = Task::new(
                cmd.family_id.clone(),
                title.clone(),
                cmd.due_at,
                cmd.assigned_to.clone(),
                cmd.reminder_minutes,
                cmd.user_id.clone(),
            );
            tasks::ActiveModel::from(&task).insert(&db_tx).await?;

            let recipients = self.family_member_ids(&db_tx, &cmd.family_id).await?;
            self.sync_task_reminder(&db_tx, &task, &recipients, now)
                .await?;

            Ok(task)
        })
    }

    pub async fn list_tasks(&self, family_id: &str, user_id: &str) -> ResultEngine<Vec<Task>> {
        with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, family_id, user_id).await?;

            let models = tasks::Entity::find()
                .filter(tasks::Column::FamilyId.eq(family_id.to_string()))
                .order_by_asc(tasks::Column::DueAt)
                .all(&db_tx)
                .await?;

            models.into_iter().map(Task::try_from).collect()
        })
    }

    /// Updates a task. Reaching a terminal status drops the reminder.
    pub async fn update_task(
        &self,
        task_id: Uuid,
        patch: TaskPatch,
        user_id: &str,
    ) -> ResultEngine<Task> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let model = tasks::Entity::find_by_id(task_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("task".to_string()))?;
            self.require_family_member(&db_tx, &model.family_id, user_id)
                .await?;

            let mut task = Task::try_from(model.clone())?;
            if let Some(title) = patch.title {
                task.title = normalize_required_text(&title, "task title")?;
            }
            if let Some(due_at) = patch.due_at {
                task.due_at = due_at;
            }
            if let Some(status) = patch.status {
                task.status = status;
            }
            if let Some(assigned_to) = patch.assigned_to {
                task.assigned_to = assigned_to;
            }
            if let Some(reminder_minutes) = patch.reminder_minutes {
                if let Some(minutes) = reminder_minutes
                    && minutes < 0
                {
                    return Err(EngineError::Validation(
                        "reminder_minutes must be >= 0".to_string(),
                    ));
                }
                task.reminder_minutes = reminder_minutes;
            }

            let mut active = tasks::ActiveModel::from(&task);
            active.id = ActiveValue::Unchanged(model.id);
            active.update(&db_tx).await?;

            let recipients = self.family_member_ids(&db_tx, &task.family_id).await?;
            self.sync_task_reminder(&db_tx, &task, &recipients, now)
                .await?;

            Ok(task)
        })
    }

    pub async fn delete_task(&self, task_id: Uuid, user_id: &str) -> ResultEngine<Task> {
        with_tx!(self, |db_tx| {
            let model = tasks::Entity::find_by_id(task_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("task".to_string()))?;
            self.require_family_member(&db_tx, &model.family_id, user_id)
                .await?;

            self.delete_task_reminder(&db_tx, &model.id).await?;
            let task = Task::try_from(model.clone())?;
            model.into_active_model().delete(&db_tx).await?;

            Ok(task)
        })
    }
}
