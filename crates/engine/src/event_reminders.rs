//! One-shot reminder rows for calendar events.
//!
//! At most one row per event (upsert semantics). `send_at` is always
//! recomputed from the current anchor; a value already in the past is
//! discarded instead of stored. Sent rows are retired by the daily cleanup.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "event_reminders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub event_id: String,
    pub family_id: String,
    pub send_at: DateTimeUtc,
    pub sent: bool,
    pub sent_at: Option<DateTimeUtc>,
    /// JSON list of recipient user ids, denormalized for the sweep.
    pub recipient_ids: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
