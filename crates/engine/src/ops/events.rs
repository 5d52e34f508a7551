use chrono::{DateTime, Utc};
use sea_orm::{IntoActiveModel, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use sea_orm::ActiveValue;
use uuid::Uuid;

use crate::{EngineError, Event, ResultEngine, events};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

pub struct EventCreate {
    pub family_id: String,
    pub title: String,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub category: Option<String>,
    pub assigned_to: Option<String>,
    pub reminder_minutes: Option<i64>,
    pub user_id: String,
}

/// Partial update; `None` keeps the stored value, `Some(None)` clears it.
#[derive(Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<Option<DateTime<Utc>>>,
    pub all_day: Option<bool>,
    pub category: Option<Option<String>>,
    pub assigned_to: Option<Option<String>>,
    pub reminder_minutes: Option<Option<i64>>,
}

impl Engine {
    /// Creates a calendar event and derives its reminder row.
    pub async fn create_event(&self, cmd: EventCreate) -> ResultEngine<Event> {
        let title = normalize_required_text(&cmd.title, "event title")?;
        validate_reminder_minutes(cmd.reminder_minutes)?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, &cmd.family_id, &cmd.user_id)
                .await?;

            let event = Event::new(
                cmd.family_id.clone(),
                title.clone(),
                cmd.start_at,
                cmd.end_at,
                cmd.all_day,
                normalize_optional_text(cmd.category.as_deref()),
                cmd.assigned_to.clone(),
                cmd.reminder_minutes,
                cmd.user_id.clone(),
            );
            events::ActiveModel::from(&event).insert(&db_tx).await?;

            let recipients = self.family_member_ids(&db_tx, &cmd.family_id).await?;
            self.sync_event_reminder(&db_tx, &event, &recipients, now)
                .await?;

            Ok(event)
        })
    }

    /// Lists a family's events ordered by start time.
    pub async fn list_events(&self, family_id: &str, user_id: &str) -> ResultEngine<Vec<Event>> {
        with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, family_id, user_id).await?;

            let models = events::Entity::find()
                .filter(events::Column::FamilyId.eq(family_id.to_string()))
                .order_by_asc(events::Column::StartAt)
                .all(&db_tx)
                .await?;

            models.into_iter().map(Event::try_from).collect()
        })
    }

    /// Updates an event and resyncs its reminder.
    pub async fn update_event(
        &self,
        event_id: Uuid,
        patch: EventPatch,
        user_id: &str,
    ) -> ResultEngine<Event> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let model = events::Entity::find_by_id(event_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("event".to_string()))?;
            self.require_family_member(&db_tx, &model.family_id, user_id)
                .await?;

            let mut event = Event::try_from(model.clone())?;
            if let Some(title) = patch.title {
                event.title = normalize_required_text(&title, "event title")?;
            }
            if let Some(start_at) = patch.start_at {
                event.start_at = start_at;
            }
            if let Some(end_at) = patch.end_at {
                event.end_at = end_at;
            }
            if let Some(all_day) = patch.all_day {
                event.all_day = all_day;
            }
            if let Some(category) = patch.category {
                event.category = category.as_deref().and_then(|c| normalize_optional_text(Some(c)));
            }
            if let Some(assigned_to) = patch.assigned_to {
                event.assigned_to = assigned_to;
            }
            if let Some(reminder_minutes) = patch.reminder_minutes {
                validate_reminder_minutes(reminder_minutes)?;
                event.reminder_minutes = reminder_minutes;
            }

            let mut active = events::ActiveModel::from(&event);
            active.id = ActiveValue::Unchanged(model.id);
            active.update(&db_tx).await?;

            let recipients = self.family_member_ids(&db_tx, &event.family_id).await?;
            self.sync_event_reminder(&db_tx, &event, &recipients, now)
                .await?;

            Ok(event)
        })
    }

    /// Deletes an event together with its reminder. Returns the deleted event.
    pub async fn delete_event(&self, event_id: Uuid, user_id: &str) -> ResultEngine<Event> {
        with_tx!(self, |db_tx| {
            let model = events::Entity::find_by_id(event_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("event".to_string()))?;
            self.require_family_member(&db_tx, &model.family_id, user_id)
                .await?;

            self.delete_event_reminder(&db_tx, &model.id).await?;
            let event = Event::try_from(model.clone())?;
            model.into_active_model().delete(&db_tx).await?;

            Ok(event)
        })
    }
}

fn validate_reminder_minutes(minutes: Option<i64>) -> ResultEngine<()> {
    if let Some(minutes) = minutes
        && minutes < 0
    {
        return Err(EngineError::Validation(
            "reminder_minutes must be >= 0".to_string(),
        ));
    }
    Ok(())
}
