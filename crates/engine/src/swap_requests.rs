//! Custody swap-request primitives.
//!
//! A swap request is a proposal between the two parents of a family to
//! exchange custody of `original_date` for `proposed_date` (kind `swap`) or
//! to hand the day over outright (kind `one_way`). Its lifecycle is a small
//! finite state machine; the edges live in `ops::swap_requests`.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapKind {
    Swap,
    OneWay,
}

impl SwapKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Swap => "swap",
            Self::OneWay => "one_way",
        }
    }
}

impl TryFrom<&str> for SwapKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "swap" => Ok(Self::Swap),
            "one_way" => Ok(Self::OneWay),
            other => Err(EngineError::Validation(format!(
                "invalid swap kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    Pending,
    Countered,
    FinalPending,
    Approved,
    Rejected,
    Cancelled,
}

impl SwapStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Countered => "countered",
            Self::FinalPending => "final_pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal requests are immutable.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Cancelled)
    }
}

impl TryFrom<&str> for SwapStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "countered" => Ok(Self::Countered),
            "final_pending" => Ok(Self::FinalPending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::Validation(format!(
                "invalid swap status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub id: Uuid,
    pub family_id: String,
    pub requester_id: String,
    pub requester_name: String,
    pub recipient_id: String,
    pub recipient_name: String,
    pub kind: SwapKind,
    pub status: SwapStatus,
    pub original_date: NaiveDate,
    /// Required for kind `swap`, absent for `one_way`.
    pub proposed_date: Option<NaiveDate>,
    pub reason: Option<String>,
    /// Counter-offer fields. `previous_proposed_date` keeps the value the
    /// counter replaced so a rejected counter can restore it.
    pub previous_proposed_date: Option<NaiveDate>,
    pub counter_note: Option<String>,
    pub countered_by: Option<String>,
    pub countered_at: Option<DateTime<Utc>>,
    /// Confirmation fields for the countered -> final_pending leg.
    pub requester_confirmed_at: Option<DateTime<Utc>>,
    pub counter_response_note: Option<String>,
    pub counter_responded_at: Option<DateTime<Utc>>,
    /// Terminal response fields.
    pub response_note: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SwapRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        family_id: String,
        requester_id: String,
        requester_name: String,
        recipient_id: String,
        recipient_name: String,
        kind: SwapKind,
        original_date: NaiveDate,
        proposed_date: Option<NaiveDate>,
        reason: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            family_id,
            requester_id,
            requester_name,
            recipient_id,
            recipient_name,
            kind,
            status: SwapStatus::Pending,
            original_date,
            proposed_date,
            reason,
            previous_proposed_date: None,
            counter_note: None,
            countered_by: None,
            countered_at: None,
            requester_confirmed_at: None,
            counter_response_note: None,
            counter_responded_at: None,
            response_note: None,
            responded_at: None,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "swap_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub family_id: String,
    pub requester_id: String,
    pub requester_name: String,
    pub recipient_id: String,
    pub recipient_name: String,
    pub kind: String,
    pub status: String,
    pub original_date: Date,
    pub proposed_date: Option<Date>,
    pub reason: Option<String>,
    pub previous_proposed_date: Option<Date>,
    pub counter_note: Option<String>,
    pub countered_by: Option<String>,
    pub countered_at: Option<DateTimeUtc>,
    pub requester_confirmed_at: Option<DateTimeUtc>,
    pub counter_response_note: Option<String>,
    pub counter_responded_at: Option<DateTimeUtc>,
    pub response_note: Option<String>,
    pub responded_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&SwapRequest> for ActiveModel {
    fn from(request: &SwapRequest) -> Self {
        Self {
            id: ActiveValue::Set(request.id.to_string()),
            family_id: ActiveValue::Set(request.family_id.clone()),
            requester_id: ActiveValue::Set(request.requester_id.clone()),
            requester_name: ActiveValue::Set(request.requester_name.clone()),
            recipient_id: ActiveValue::Set(request.recipient_id.clone()),
            recipient_name: ActiveValue::Set(request.recipient_name.clone()),
            kind: ActiveValue::Set(request.kind.as_str().to_string()),
            status: ActiveValue::Set(request.status.as_str().to_string()),
            original_date: ActiveValue::Set(request.original_date),
            proposed_date: ActiveValue::Set(request.proposed_date),
            reason: ActiveValue::Set(request.reason.clone()),
            previous_proposed_date: ActiveValue::Set(request.previous_proposed_date),
            counter_note: ActiveValue::Set(request.counter_note.clone()),
            countered_by: ActiveValue::Set(request.countered_by.clone()),
            countered_at: ActiveValue::Set(request.countered_at),
            requester_confirmed_at: ActiveValue::Set(request.requester_confirmed_at),
            counter_response_note: ActiveValue::Set(request.counter_response_note.clone()),
            counter_responded_at: ActiveValue::Set(request.counter_responded_at),
            response_note: ActiveValue::Set(request.response_note.clone()),
            responded_at: ActiveValue::Set(request.responded_at),
            created_at: ActiveValue::Set(request.created_at),
        }
    }
}

impl TryFrom<Model> for SwapRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "swap request")?,
            family_id: model.family_id,
            requester_id: model.requester_id,
            requester_name: model.requester_name,
            recipient_id: model.recipient_id,
            recipient_name: model.recipient_name,
            kind: SwapKind::try_from(model.kind.as_str())?,
            status: SwapStatus::try_from(model.status.as_str())?,
            original_date: model.original_date,
            proposed_date: model.proposed_date,
            reason: model.reason,
            previous_proposed_date: model.previous_proposed_date,
            counter_note: model.counter_note,
            countered_by: model.countered_by,
            countered_at: model.countered_at,
            requester_confirmed_at: model.requester_confirmed_at,
            counter_response_note: model.counter_response_note,
            counter_responded_at: model.counter_responded_at,
            response_note: model.response_note,
            responded_at: model.responded_at,
            created_at: model.created_at,
        })
    }
}
