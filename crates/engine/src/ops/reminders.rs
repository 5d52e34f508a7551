//! Reminder derivation and the periodic sweeps.
//!
//! The sweeps are plain async functions; the host drives them on a
//! one-minute cadence (and the cleanup daily) with no timer state in here.
//! Each reminder is processed independently: a failed push leaves the row
//! unsent so the next sweep retries it, and never blocks the rest of the
//! batch.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, prelude::*,
};
use uuid::Uuid;

use crate::{
    ResultEngine, TaskStatus, event_reminders, events, task_reminders, tasks,
    util::{decode_json_list, encode_json_list},
};

use super::Engine;

/// Upper bound of reminders handled per sweep tick.
const SWEEP_BATCH: u64 = 50;
/// Sent reminders are retired after this many days.
const RETENTION_DAYS: i64 = 7;

impl Engine {
    /// Recomputes the reminder row for an event after a create or update.
    ///
    /// No offset, no anchor, or a send time already in the past all mean the
    /// row is dropped rather than stored.
    pub(super) async fn sync_event_reminder(
        &self,
        db: &DatabaseTransaction,
        event: &crate::Event,
        recipients: &[String],
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let send_at = event
            .reminder_minutes
            .map(|minutes| event.start_at - Duration::minutes(minutes));

        let existing = event_reminders::Entity::find()
            .filter(event_reminders::Column::EventId.eq(event.id.to_string()))
            .one(db)
            .await?;

        let Some(send_at) = send_at.filter(|at| *at > now) else {
            if let Some(row) = existing {
                event_reminders::Entity::delete_by_id(row.id).exec(db).await?;
            }
            return Ok(());
        };

        match existing {
            Some(row) => {
                let active = event_reminders::ActiveModel {
                    id: ActiveValue::Set(row.id),
                    send_at: ActiveValue::Set(send_at),
                    sent: ActiveValue::Set(false),
                    sent_at: ActiveValue::Set(None),
                    recipient_ids: ActiveValue::Set(encode_json_list(recipients)),
                    ..Default::default()
                };
                active.update(db).await?;
            }
            None => {
                let active = event_reminders::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    event_id: ActiveValue::Set(event.id.to_string()),
                    family_id: ActiveValue::Set(event.family_id.clone()),
                    send_at: ActiveValue::Set(send_at),
                    sent: ActiveValue::Set(false),
                    sent_at: ActiveValue::Set(None),
                    recipient_ids: ActiveValue::Set(encode_json_list(recipients)),
                };
                active.insert(db).await?;
            }
        }
        Ok(())
    }

    /// Same as [`Self::sync_event_reminder`], anchored on the task's due time.
    pub(super) async fn sync_task_reminder(
        &self,
        db: &DatabaseTransaction,
        task: &crate::Task,
        recipients: &[String],
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let send_at = match (task.due_at, task.reminder_minutes) {
            (Some(due_at), Some(minutes)) if !task.status.is_terminal() => {
                Some(due_at - Duration::minutes(minutes))
            }
            _ => None,
        };

        let existing = task_reminders::Entity::find()
            .filter(task_reminders::Column::TaskId.eq(task.id.to_string()))
            .one(db)
            .await?;

        let Some(send_at) = send_at.filter(|at| *at > now) else {
            if let Some(row) = existing {
                task_reminders::Entity::delete_by_id(row.id).exec(db).await?;
            }
            return Ok(());
        };

        match existing {
            Some(row) => {
                let active = task_reminders::ActiveModel {
                    id: ActiveValue::Set(row.id),
                    send_at: ActiveValue::Set(send_at),
                    sent: ActiveValue::Set(false),
                    sent_at: ActiveValue::Set(None),
                    recipient_ids: ActiveValue::Set(encode_json_list(recipients)),
                    ..Default::default()
                };
                active.update(db).await?;
            }
            None => {
                let active = task_reminders::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4().to_string()),
                    task_id: ActiveValue::Set(task.id.to_string()),
                    family_id: ActiveValue::Set(task.family_id.clone()),
                    send_at: ActiveValue::Set(send_at),
                    sent: ActiveValue::Set(false),
                    sent_at: ActiveValue::Set(None),
                    recipient_ids: ActiveValue::Set(encode_json_list(recipients)),
                };
                active.insert(db).await?;
            }
        }
        Ok(())
    }

    pub(super) async fn delete_event_reminder(
        &self,
        db: &DatabaseTransaction,
        event_id: &str,
    ) -> ResultEngine<()> {
        event_reminders::Entity::delete_many()
            .filter(event_reminders::Column::EventId.eq(event_id.to_string()))
            .exec(db)
            .await?;
        Ok(())
    }

    pub(super) async fn delete_task_reminder(
        &self,
        db: &DatabaseTransaction,
        task_id: &str,
    ) -> ResultEngine<()> {
        task_reminders::Entity::delete_many()
            .filter(task_reminders::Column::TaskId.eq(task_id.to_string()))
            .exec(db)
            .await?;
        Ok(())
    }

    /// One sweep tick over due event reminders. Returns the delivered count.
    pub async fn sweep_event_reminders(&self, now: DateTime<Utc>) -> ResultEngine<u32> {
        let due = event_reminders::Entity::find()
            .filter(event_reminders::Column::Sent.eq(false))
            .filter(event_reminders::Column::SendAt.lte(now))
            .order_by_asc(event_reminders::Column::SendAt)
            .limit(SWEEP_BATCH)
            .all(&self.database)
            .await?;

        let mut delivered = 0;
        for reminder in due {
            let Some(event) = events::Entity::find_by_id(reminder.event_id.clone())
                .one(&self.database)
                .await?
            else {
                // Anchor is gone; the reminder has nothing left to announce.
                event_reminders::Entity::delete_by_id(reminder.id)
                    .exec(&self.database)
                    .await?;
                continue;
            };

            let recipients: Vec<String> = decode_json_list(&reminder.recipient_ids);
            let data = serde_json::json!({
                "type": "event_reminder",
                "event_id": event.id,
                "family_id": event.family_id,
            });
            if self
                .push_to_users(&recipients, "Upcoming event", &event.title, data)
                .await?
            {
                self.mark_event_reminder_sent(&reminder.id, now).await?;
                delivered += 1;
            } else {
                tracing::warn!(reminder = %reminder.id, "event reminder not delivered; retrying next sweep");
            }
        }
        Ok(delivered)
    }

    /// One sweep tick over due task reminders.
    ///
    /// Reminders whose task already reached a terminal state are marked sent
    /// without delivery.
    pub async fn sweep_task_reminders(&self, now: DateTime<Utc>) -> ResultEngine<u32> {
        let due = task_reminders::Entity::find()
            .filter(task_reminders::Column::Sent.eq(false))
            .filter(task_reminders::Column::SendAt.lte(now))
            .order_by_asc(task_reminders::Column::SendAt)
            .limit(SWEEP_BATCH)
            .all(&self.database)
            .await?;

        let mut delivered = 0;
        for reminder in due {
            let Some(task) = tasks::Entity::find_by_id(reminder.task_id.clone())
                .one(&self.database)
                .await?
            else {
                task_reminders::Entity::delete_by_id(reminder.id)
                    .exec(&self.database)
                    .await?;
                continue;
            };

            let status = TaskStatus::try_from(task.status.as_str())?;
            if status.is_terminal() {
                self.mark_task_reminder_sent(&reminder.id, now).await?;
                continue;
            }

            let recipients: Vec<String> = decode_json_list(&reminder.recipient_ids);
            let data = serde_json::json!({
                "type": "task_reminder",
                "task_id": task.id,
                "family_id": task.family_id,
            });
            if self
                .push_to_users(&recipients, "Task due soon", &task.title, data)
                .await?
            {
                self.mark_task_reminder_sent(&reminder.id, now).await?;
                delivered += 1;
            } else {
                tracing::warn!(reminder = %reminder.id, "task reminder not delivered; retrying next sweep");
            }
        }
        Ok(delivered)
    }

    /// Daily tick: retires sent reminders older than the retention window.
    pub async fn cleanup_sent_reminders(&self, now: DateTime<Utc>) -> ResultEngine<u64> {
        let cutoff = now - Duration::days(RETENTION_DAYS);

        let events_res = event_reminders::Entity::delete_many()
            .filter(event_reminders::Column::Sent.eq(true))
            .filter(event_reminders::Column::SentAt.lt(cutoff))
            .exec(&self.database)
            .await?;
        let tasks_res = task_reminders::Entity::delete_many()
            .filter(task_reminders::Column::Sent.eq(true))
            .filter(task_reminders::Column::SentAt.lt(cutoff))
            .exec(&self.database)
            .await?;

        Ok(events_res.rows_affected + tasks_res.rows_affected)
    }

    async fn mark_event_reminder_sent(&self, id: &str, now: DateTime<Utc>) -> ResultEngine<()> {
        let active = event_reminders::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            sent: ActiveValue::Set(true),
            sent_at: ActiveValue::Set(Some(now)),
            ..Default::default()
        };
        active.update(&self.database).await?;
        Ok(())
    }

    async fn mark_task_reminder_sent(&self, id: &str, now: DateTime<Utc>) -> ResultEngine<()> {
        let active = task_reminders::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            sent: ActiveValue::Set(true),
            sent_at: ActiveValue::Set(Some(now)),
            ..Default::default()
        };
        active.update(&self.database).await?;
        Ok(())
    }
}
