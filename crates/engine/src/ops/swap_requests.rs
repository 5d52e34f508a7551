//! Custody swap-request state machine.
//!
//! Edges:
//! `pending -> {countered, approved, rejected, cancelled}`;
//! `countered -> {final_pending, pending, cancelled}` (rejecting a counter
//! reverts to `pending` with the original proposed date restored);
//! `final_pending -> {approved, rejected, cancelled}`.
//!
//! Every transition re-reads the row inside the write transaction and
//! rejects on a non-matching status, so two racing transitions cannot both
//! apply.

use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Event, ResultEngine, SwapKind, SwapRequest, SwapStatus,
    events::{self, CUSTODY_CATEGORY},
    swap_requests,
};

use super::{Engine, normalize_optional_text, with_tx};

pub struct SwapCreate {
    pub family_id: String,
    pub kind: SwapKind,
    pub original_date: NaiveDate,
    pub proposed_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub user_id: String,
}

/// Terminal decision taken by the recipient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDecision {
    Approved,
    Rejected,
}

impl Engine {
    /// Creates a swap request addressed to the family's other parent.
    pub async fn create_swap_request(&self, cmd: SwapCreate) -> ResultEngine<SwapRequest> {
        if cmd.kind == SwapKind::Swap && cmd.proposed_date.is_none() {
            return Err(EngineError::Validation(
                "proposed_date is required for swap requests".to_string(),
            ));
        }
        if cmd.proposed_date == Some(cmd.original_date) {
            return Err(EngineError::Validation(
                "proposed_date must differ from original_date".to_string(),
            ));
        }
        let proposed_date = match cmd.kind {
            SwapKind::Swap => cmd.proposed_date,
            SwapKind::OneWay => None,
        };
        let now = Utc::now();

        let request = with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, &cmd.family_id, &cmd.user_id)
                .await?;
            let recipient = self.other_member(&db_tx, &cmd.family_id, &cmd.user_id).await?;

            // One active negotiation per custody day.
            let active_statuses = [
                SwapStatus::Pending.as_str(),
                SwapStatus::Countered.as_str(),
                SwapStatus::FinalPending.as_str(),
            ];
            let open = swap_requests::Entity::find()
                .filter(swap_requests::Column::FamilyId.eq(cmd.family_id.clone()))
                .filter(swap_requests::Column::OriginalDate.eq(cmd.original_date))
                .filter(swap_requests::Column::Status.is_in(active_statuses))
                .one(&db_tx)
                .await?;
            if open.is_some() {
                return Err(EngineError::Conflict(format!(
                    "open swap request for {}",
                    cmd.original_date
                )));
            }

            let requester = self.require_user_exists(&db_tx, &cmd.user_id).await?;
            let recipient_user = self.require_user_exists(&db_tx, &recipient.user_id).await?;

            let request = SwapRequest::new(
                cmd.family_id.clone(),
                requester.id,
                requester.display_name,
                recipient_user.id,
                recipient_user.display_name,
                cmd.kind,
                cmd.original_date,
                proposed_date,
                normalize_optional_text(cmd.reason.as_deref()),
                now,
            );
            swap_requests::ActiveModel::from(&request)
                .insert(&db_tx)
                .await?;
            Ok(request)
        })?;

        self.notify_users(
            std::slice::from_ref(&request.recipient_id),
            "New swap request",
            &format!("{} proposed a custody change", request.requester_name),
            serde_json::json!({ "type": "swap_request", "swap_request_id": request.id }),
        )
        .await;

        Ok(request)
    }

    /// Recipient counters with an alternative date (`swap` kind only).
    pub async fn counter_swap_request(
        &self,
        swap_id: Uuid,
        proposed_date: NaiveDate,
        note: Option<String>,
        user_id: &str,
    ) -> ResultEngine<SwapRequest> {
        let now = Utc::now();
        let request = with_tx!(self, |db_tx| {
            let mut request = self.load_swap_request(&db_tx, swap_id).await?;
            if request.recipient_id != user_id {
                return Err(EngineError::Forbidden(
                    "only the recipient can counter".to_string(),
                ));
            }
            if request.status != SwapStatus::Pending {
                return Err(EngineError::InvalidState(format!(
                    "cannot counter a {} request",
                    request.status.as_str()
                )));
            }
            if request.kind != SwapKind::Swap {
                return Err(EngineError::Validation(
                    "one-way requests cannot be countered".to_string(),
                ));
            }

            request.previous_proposed_date = request.proposed_date;
            request.proposed_date = Some(proposed_date);
            request.counter_note = normalize_optional_text(note.as_deref());
            request.countered_by = Some(user_id.to_string());
            request.countered_at = Some(now);
            request.requester_confirmed_at = None;
            request.counter_response_note = None;
            request.counter_responded_at = None;
            request.response_note = None;
            request.responded_at = None;
            request.status = SwapStatus::Countered;

            self.persist_swap_request(&db_tx, &request).await?;
            Ok(request)
        })?;

        self.notify_users(
            std::slice::from_ref(&request.requester_id),
            "Counter-offer received",
            &format!("{} proposed a different date", request.recipient_name),
            serde_json::json!({ "type": "swap_counter", "swap_request_id": request.id }),
        )
        .await;

        Ok(request)
    }

    /// Original requester accepts the counter-offer; the recipient still has
    /// to give the final confirmation.
    pub async fn accept_counter(
        &self,
        swap_id: Uuid,
        note: Option<String>,
        user_id: &str,
    ) -> ResultEngine<SwapRequest> {
        let now = Utc::now();
        let request = with_tx!(self, |db_tx| {
            let mut request = self.load_swap_request(&db_tx, swap_id).await?;
            if request.requester_id != user_id {
                return Err(EngineError::Forbidden(
                    "only the requester can respond to a counter".to_string(),
                ));
            }
            if request.status != SwapStatus::Countered {
                return Err(EngineError::InvalidState(format!(
                    "no counter-offer to accept on a {} request",
                    request.status.as_str()
                )));
            }

            request.requester_confirmed_at = Some(now);
            request.counter_response_note = normalize_optional_text(note.as_deref());
            request.counter_responded_at = Some(now);
            request.status = SwapStatus::FinalPending;

            self.persist_swap_request(&db_tx, &request).await?;
            Ok(request)
        })?;

        self.notify_users(
            std::slice::from_ref(&request.recipient_id),
            "Counter-offer accepted",
            &format!("{} accepted your date, confirm to finalize", request.requester_name),
            serde_json::json!({ "type": "swap_final_pending", "swap_request_id": request.id }),
        )
        .await;

        Ok(request)
    }

    /// Original requester rejects the counter-offer: the original proposed
    /// date is restored and the request returns to `pending`.
    pub async fn reject_counter(
        &self,
        swap_id: Uuid,
        note: Option<String>,
        user_id: &str,
    ) -> ResultEngine<SwapRequest> {
        let now = Utc::now();
        let request = with_tx!(self, |db_tx| {
            let mut request = self.load_swap_request(&db_tx, swap_id).await?;
            if request.requester_id != user_id {
                return Err(EngineError::Forbidden(
                    "only the requester can respond to a counter".to_string(),
                ));
            }
            if request.status != SwapStatus::Countered {
                return Err(EngineError::InvalidState(format!(
                    "no counter-offer to reject on a {} request",
                    request.status.as_str()
                )));
            }

            request.proposed_date = request.previous_proposed_date.take();
            request.counter_note = None;
            request.countered_by = None;
            request.countered_at = None;
            request.counter_response_note = normalize_optional_text(note.as_deref());
            request.counter_responded_at = Some(now);
            request.status = SwapStatus::Pending;

            self.persist_swap_request(&db_tx, &request).await?;
            Ok(request)
        })?;

        self.notify_users(
            std::slice::from_ref(&request.recipient_id),
            "Counter-offer declined",
            &format!("{} kept the original date", request.requester_name),
            serde_json::json!({ "type": "swap_counter_rejected", "swap_request_id": request.id }),
        )
        .await;

        Ok(request)
    }

    /// Recipient settles the request. Approval derives the custody events.
    pub async fn respond_swap_request(
        &self,
        swap_id: Uuid,
        decision: SwapDecision,
        note: Option<String>,
        user_id: &str,
    ) -> ResultEngine<SwapRequest> {
        let now = Utc::now();
        let request = with_tx!(self, |db_tx| {
            let mut request = self.load_swap_request(&db_tx, swap_id).await?;
            if request.recipient_id != user_id {
                return Err(EngineError::Forbidden(
                    "only the recipient can settle a swap request".to_string(),
                ));
            }
            if !matches!(
                request.status,
                SwapStatus::Pending | SwapStatus::FinalPending
            ) {
                return Err(EngineError::InvalidState(format!(
                    "cannot settle a {} request",
                    request.status.as_str()
                )));
            }

            request.status = match decision {
                SwapDecision::Approved => SwapStatus::Approved,
                SwapDecision::Rejected => SwapStatus::Rejected,
            };
            request.response_note = normalize_optional_text(note.as_deref());
            request.responded_at = Some(now);

            self.persist_swap_request(&db_tx, &request).await?;
            if request.status == SwapStatus::Approved {
                self.derive_swap_events(&db_tx, &request, user_id).await?;
            }
            Ok(request)
        })?;

        let (title, body) = match decision {
            SwapDecision::Approved => (
                "Swap request approved",
                format!("{} approved the custody change", request.recipient_name),
            ),
            SwapDecision::Rejected => (
                "Swap request rejected",
                format!("{} declined the custody change", request.recipient_name),
            ),
        };
        self.notify_users(
            std::slice::from_ref(&request.requester_id),
            title,
            &body,
            serde_json::json!({ "type": "swap_settled", "swap_request_id": request.id }),
        )
        .await;

        Ok(request)
    }

    /// Requester withdraws a not-yet-settled request. No calendar side effect.
    pub async fn cancel_swap_request(
        &self,
        swap_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<SwapRequest> {
        let now = Utc::now();
        let request = with_tx!(self, |db_tx| {
            let mut request = self.load_swap_request(&db_tx, swap_id).await?;
            if request.requester_id != user_id {
                return Err(EngineError::Forbidden(
                    "only the requester can cancel".to_string(),
                ));
            }
            if request.status.is_terminal() {
                return Err(EngineError::InvalidState(format!(
                    "cannot cancel a {} request",
                    request.status.as_str()
                )));
            }

            request.status = SwapStatus::Cancelled;
            request.responded_at = Some(now);

            self.persist_swap_request(&db_tx, &request).await?;
            Ok(request)
        })?;

        self.notify_users(
            std::slice::from_ref(&request.recipient_id),
            "Swap request cancelled",
            &format!("{} withdrew the request", request.requester_name),
            serde_json::json!({ "type": "swap_cancelled", "swap_request_id": request.id }),
        )
        .await;

        Ok(request)
    }

    pub async fn list_swap_requests(
        &self,
        family_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<SwapRequest>> {
        with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, family_id, user_id).await?;

            let models = swap_requests::Entity::find()
                .filter(swap_requests::Column::FamilyId.eq(family_id.to_string()))
                .order_by_desc(swap_requests::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            models.into_iter().map(SwapRequest::try_from).collect()
        })
    }

    pub async fn swap_request(&self, swap_id: Uuid, user_id: &str) -> ResultEngine<SwapRequest> {
        with_tx!(self, |db_tx| {
            let request = self.load_swap_request(&db_tx, swap_id).await?;
            self.require_family_member(&db_tx, &request.family_id, user_id)
                .await?;
            Ok(request)
        })
    }

    async fn load_swap_request(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        swap_id: Uuid,
    ) -> ResultEngine<SwapRequest> {
        let model = swap_requests::Entity::find_by_id(swap_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("swap request".to_string()))?;
        SwapRequest::try_from(model)
    }

    async fn persist_swap_request(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        request: &SwapRequest,
    ) -> ResultEngine<()> {
        let mut active = swap_requests::ActiveModel::from(request);
        active.id = ActiveValue::Unchanged(request.id.to_string());
        active.update(db_tx).await?;
        Ok(())
    }

    /// Replaces the custody events derived from this request.
    ///
    /// The `original_date` day goes to the non-requesting parent; for `swap`
    /// kind the `proposed_date` day goes back to the requester. Both events
    /// reference the request so a later re-derivation stays idempotent.
    async fn derive_swap_events(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        request: &SwapRequest,
        user_id: &str,
    ) -> ResultEngine<()> {
        events::Entity::delete_many()
            .filter(events::Column::SwapRequestId.eq(request.id.to_string()))
            .exec(db_tx)
            .await?;

        let mut original_day = Event::new(
            request.family_id.clone(),
            format!("Custody: {}", request.recipient_name),
            all_day_start(request.original_date),
            None,
            true,
            Some(CUSTODY_CATEGORY.to_string()),
            Some(request.recipient_id.clone()),
            None,
            user_id.to_string(),
        );
        original_day.swap_request_id = Some(request.id);
        events::ActiveModel::from(&original_day).insert(db_tx).await?;

        if request.kind == SwapKind::Swap {
            let proposed_date = request.proposed_date.ok_or_else(|| {
                EngineError::InvalidState("swap request lost its proposed date".to_string())
            })?;
            let mut proposed_day = Event::new(
                request.family_id.clone(),
                format!("Custody: {}", request.requester_name),
                all_day_start(proposed_date),
                None,
                true,
                Some(CUSTODY_CATEGORY.to_string()),
                Some(request.requester_id.clone()),
                None,
                user_id.to_string(),
            );
            proposed_day.swap_request_id = Some(request.id);
            events::ActiveModel::from(&proposed_day).insert(db_tx).await?;
        }

        Ok(())
    }
}

fn all_day_start(date: NaiveDate) -> chrono::DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
