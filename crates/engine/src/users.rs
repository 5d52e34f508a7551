//! User rows.
//!
//! Identity verification is delegated to an external provider; this table
//! only stores the stable id, profile basics, and the device push token.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub email: String,
    pub display_name: String,
    /// Bearer credential accepted by the token-table identity provider.
    pub auth_token: Option<String>,
    /// Device token for the push gateway; cleared when reported invalid.
    pub push_token: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
