//! One-shot reminder rows for tasks. Same lifecycle as event reminders,
//! anchored on the task's due time.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "task_reminders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub task_id: String,
    pub family_id: String,
    pub send_at: DateTimeUtc,
    pub sent: bool,
    pub sent_at: Option<DateTimeUtc>,
    pub recipient_ids: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
