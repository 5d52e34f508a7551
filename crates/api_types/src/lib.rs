use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod family {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FamilyNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FamilyView {
        pub id: String,
        pub name: String,
    }

    /// A recorded family member.
    ///
    /// Affido families hold at most two members, both with role `parent`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub user_id: String,
        pub display_name: String,
        pub role: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberAdd {
        pub user_id: String,
    }
}

pub mod event {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EventNew {
        pub title: String,
        pub start_at: DateTime<Utc>,
        pub end_at: Option<DateTime<Utc>>,
        pub all_day: Option<bool>,
        pub category: Option<String>,
        pub assigned_to: Option<String>,
        /// Minutes before `start_at` at which a reminder should fire.
        pub reminder_minutes: Option<i64>,
    }

    /// Partial update; absent fields are left untouched.
    ///
    /// `reminder_minutes: Some(None)` clears the reminder, `None` keeps it.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct EventUpdate {
        pub title: Option<String>,
        pub start_at: Option<DateTime<Utc>>,
        #[serde(default, with = "super::double_option")]
        pub end_at: Option<Option<DateTime<Utc>>>,
        pub all_day: Option<bool>,
        #[serde(default, with = "super::double_option")]
        pub category: Option<Option<String>>,
        #[serde(default, with = "super::double_option")]
        pub assigned_to: Option<Option<String>>,
        #[serde(default, with = "super::double_option")]
        pub reminder_minutes: Option<Option<i64>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EventView {
        pub id: Uuid,
        pub family_id: String,
        pub title: String,
        pub start_at: DateTime<Utc>,
        pub end_at: Option<DateTime<Utc>>,
        pub all_day: bool,
        pub category: Option<String>,
        pub assigned_to: Option<String>,
        pub swap_request_id: Option<Uuid>,
        pub reminder_minutes: Option<i64>,
    }
}

pub mod task {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TaskStatus {
        Open,
        Completed,
        Cancelled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TaskNew {
        pub title: String,
        pub due_at: Option<DateTime<Utc>>,
        pub assigned_to: Option<String>,
        pub reminder_minutes: Option<i64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TaskUpdate {
        pub title: Option<String>,
        #[serde(default, with = "super::double_option")]
        pub due_at: Option<Option<DateTime<Utc>>>,
        pub status: Option<TaskStatus>,
        #[serde(default, with = "super::double_option")]
        pub assigned_to: Option<Option<String>>,
        #[serde(default, with = "super::double_option")]
        pub reminder_minutes: Option<Option<i64>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TaskView {
        pub id: Uuid,
        pub family_id: String,
        pub title: String,
        pub due_at: Option<DateTime<Utc>>,
        pub status: TaskStatus,
        pub assigned_to: Option<String>,
        pub reminder_minutes: Option<i64>,
    }
}

pub mod swap {
    use super::*;

    /// Kind of a custody swap request.
    ///
    /// - `swap`: exchange `original_date` for `proposed_date`.
    /// - `one_way`: hand over `original_date` with nothing in return.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SwapKind {
        Swap,
        OneWay,
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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SwapNew {
        pub kind: SwapKind,
        pub original_date: NaiveDate,
        pub proposed_date: Option<NaiveDate>,
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SwapCounter {
        pub proposed_date: NaiveDate,
        pub note: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SwapCounterResponse {
        pub note: Option<String>,
    }

    /// Terminal decision by the recipient.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SwapDecision {
        Approved,
        Rejected,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SwapRespond {
        pub decision: SwapDecision,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SwapView {
        pub id: Uuid,
        pub family_id: String,
        pub requester_id: String,
        pub requester_name: String,
        pub recipient_id: String,
        pub recipient_name: String,
        pub kind: SwapKind,
        pub status: SwapStatus,
        pub original_date: NaiveDate,
        pub proposed_date: Option<NaiveDate>,
        pub reason: Option<String>,
        pub previous_proposed_date: Option<NaiveDate>,
        pub counter_note: Option<String>,
        pub countered_by: Option<String>,
        pub countered_at: Option<DateTime<Utc>>,
        pub requester_confirmed_at: Option<DateTime<Utc>>,
        pub counter_response_note: Option<String>,
        pub counter_responded_at: Option<DateTime<Utc>>,
        pub response_note: Option<String>,
        pub responded_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod custody {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PatternKind {
        Weekly,
        Biweekly,
        Custom,
        WeekOnWeekOff,
    }

    /// Saves the schedule.
    ///
    /// With `request_approval = true` the pattern is staged for the other
    /// parent's consent instead of being applied.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ScheduleSave {
        pub pattern_kind: PatternKind,
        /// Weekday numbers (0 = Monday .. 6 = Sunday) assigned to parent A.
        pub parent_a_days: Vec<u8>,
        pub parent_b_days: Vec<u8>,
        #[serde(default)]
        pub request_approval: bool,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ScheduleDecision {
        Approve,
        Reject,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ScheduleRespond {
        pub decision: ScheduleDecision,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PendingApprovalView {
        pub pattern_kind: PatternKind,
        pub parent_a_days: Vec<u8>,
        pub parent_b_days: Vec<u8>,
        pub requested_by: String,
        pub requested_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ScheduleView {
        pub family_id: String,
        pub pattern_kind: PatternKind,
        pub parent_a_days: Vec<u8>,
        pub parent_b_days: Vec<u8>,
        pub is_active: bool,
        pub pending_approval: Option<PendingApprovalView>,
    }
}

/// Serde helper distinguishing "field absent" from "field set to null" in
/// PATCH bodies, so `Option<Option<T>>` round-trips as intended.
pub mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
