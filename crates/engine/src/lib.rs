//! Affido domain engine.
//!
//! Owns the sea-orm entities and every domain operation: families, calendar
//! events, tasks, the swap-request state machine, the custody-schedule
//! approval workflow, and the reminder sweeps. All writes go through a
//! database transaction; push delivery happens after the commit and is
//! best-effort.

pub use custody_pending_approvals::PendingApproval;
pub use custody_schedules::{CustodySchedule, PatternKind};
pub use error::EngineError;
pub use events::Event;
pub use notify::{DeliveryReport, LogGateway, NullGateway, PushError, PushGateway, PushMessage};
pub use ops::{
    Engine, EngineBuilder, EventCreate, EventPatch, ScheduleDecision, ScheduleSave, SwapCreate,
    SwapDecision, TaskCreate, TaskPatch,
};
pub use swap_requests::{SwapKind, SwapRequest, SwapStatus};
pub use tasks::{Task, TaskStatus};

pub mod custody_pending_approvals;
pub mod custody_schedules;
mod error;
pub mod event_reminders;
pub mod events;
pub mod families;
pub mod family_members;
pub mod notify;
mod ops;
pub mod swap_requests;
pub mod task_reminders;
pub mod tasks;
pub mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
