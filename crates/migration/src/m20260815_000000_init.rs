//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for Affido:
//!
//! - `users`: authentication and push tokens
//! - `families`: two-parent coordination spaces
//! - `family_members`: family access
//! - `events`: shared calendar entries
//! - `tasks`: shared to-dos
//! - `swap_requests`: custody swap negotiations
//! - `custody_schedules`: the recurring custody pattern per family
//! - `custody_pending_approvals`: staged schedule changes awaiting consent
//! - `event_reminders` / `task_reminders`: scheduled push reminders

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Email,
    DisplayName,
    AuthToken,
    PushToken,
}

#[derive(Iden)]
enum Families {
    Table,
    Id,
    Name,
    CreatedBy,
}

#[derive(Iden)]
enum FamilyMembers {
    Table,
    FamilyId,
    UserId,
    Role,
}

#[derive(Iden)]
enum Events {
    Table,
    Id,
    FamilyId,
    Title,
    StartAt,
    EndAt,
    AllDay,
    Category,
    AssignedTo,
    SwapRequestId,
    ReminderMinutes,
    CreatedBy,
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    FamilyId,
    Title,
    DueAt,
    Status,
    AssignedTo,
    ReminderMinutes,
    CreatedBy,
}

#[derive(Iden)]
enum SwapRequests {
    Table,
    Id,
    FamilyId,
    RequesterId,
    RequesterName,
    RecipientId,
    RecipientName,
    Kind,
    Status,
    OriginalDate,
    ProposedDate,
    Reason,
    PreviousProposedDate,
    CounterNote,
    CounteredBy,
    CounteredAt,
    RequesterConfirmedAt,
    CounterResponseNote,
    CounterRespondedAt,
    ResponseNote,
    RespondedAt,
    CreatedAt,
}

#[derive(Iden)]
enum CustodySchedules {
    Table,
    Id,
    FamilyId,
    PatternKind,
    ParentADays,
    ParentBDays,
    IsActive,
    UpdatedBy,
}

#[derive(Iden)]
enum CustodyPendingApprovals {
    Table,
    Id,
    ScheduleId,
    PatternKind,
    ParentADays,
    ParentBDays,
    RequestedBy,
    RequestedAt,
}

#[derive(Iden)]
enum EventReminders {
    Table,
    Id,
    EventId,
    FamilyId,
    SendAt,
    Sent,
    SentAt,
    RecipientIds,
}

#[derive(Iden)]
enum TaskReminders {
    Table,
    Id,
    TaskId,
    FamilyId,
    SendAt,
    Sent,
    SentAt,
    RecipientIds,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(ColumnDef::new(Users::AuthToken).string())
                    .col(ColumnDef::new(Users::PushToken).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-email-unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-auth_token")
                    .table(Users::Table)
                    .col(Users::AuthToken)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Families
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Families::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Families::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Families::Name).string().not_null())
                    .col(ColumnDef::new(Families::CreatedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-families-created_by")
                            .from(Families::Table, Families::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Family Members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(FamilyMembers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FamilyMembers::FamilyId).string().not_null())
                    .col(ColumnDef::new(FamilyMembers::UserId).string().not_null())
                    .col(ColumnDef::new(FamilyMembers::Role).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(FamilyMembers::FamilyId)
                            .col(FamilyMembers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-family_members-family_id")
                            .from(FamilyMembers::Table, FamilyMembers::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-family_members-user_id")
                            .from(FamilyMembers::Table, FamilyMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-family_members-user_id")
                    .table(FamilyMembers::Table)
                    .col(FamilyMembers::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Events
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Events::FamilyId).string().not_null())
                    .col(ColumnDef::new(Events::Title).string().not_null())
                    .col(ColumnDef::new(Events::StartAt).timestamp().not_null())
                    .col(ColumnDef::new(Events::EndAt).timestamp())
                    .col(ColumnDef::new(Events::AllDay).boolean().not_null())
                    .col(ColumnDef::new(Events::Category).string())
                    .col(ColumnDef::new(Events::AssignedTo).string())
                    .col(ColumnDef::new(Events::SwapRequestId).string())
                    .col(ColumnDef::new(Events::ReminderMinutes).big_integer())
                    .col(ColumnDef::new(Events::CreatedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-events-family_id")
                            .from(Events::Table, Events::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-events-family_id-start_at")
                    .table(Events::Table)
                    .col(Events::FamilyId)
                    .col(Events::StartAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-events-swap_request_id")
                    .table(Events::Table)
                    .col(Events::SwapRequestId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Tasks
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tasks::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Tasks::FamilyId).string().not_null())
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(ColumnDef::new(Tasks::DueAt).timestamp())
                    .col(ColumnDef::new(Tasks::Status).string().not_null())
                    .col(ColumnDef::new(Tasks::AssignedTo).string())
                    .col(ColumnDef::new(Tasks::ReminderMinutes).big_integer())
                    .col(ColumnDef::new(Tasks::CreatedBy).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tasks-family_id")
                            .from(Tasks::Table, Tasks::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tasks-family_id-status")
                    .table(Tasks::Table)
                    .col(Tasks::FamilyId)
                    .col(Tasks::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Swap Requests
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SwapRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SwapRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SwapRequests::FamilyId).string().not_null())
                    .col(
                        ColumnDef::new(SwapRequests::RequesterId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SwapRequests::RequesterName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SwapRequests::RecipientId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SwapRequests::RecipientName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SwapRequests::Kind).string().not_null())
                    .col(ColumnDef::new(SwapRequests::Status).string().not_null())
                    .col(
                        ColumnDef::new(SwapRequests::OriginalDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SwapRequests::ProposedDate).date())
                    .col(ColumnDef::new(SwapRequests::Reason).string())
                    .col(ColumnDef::new(SwapRequests::PreviousProposedDate).date())
                    .col(ColumnDef::new(SwapRequests::CounterNote).string())
                    .col(ColumnDef::new(SwapRequests::CounteredBy).string())
                    .col(ColumnDef::new(SwapRequests::CounteredAt).timestamp())
                    .col(ColumnDef::new(SwapRequests::RequesterConfirmedAt).timestamp())
                    .col(ColumnDef::new(SwapRequests::CounterResponseNote).string())
                    .col(ColumnDef::new(SwapRequests::CounterRespondedAt).timestamp())
                    .col(ColumnDef::new(SwapRequests::ResponseNote).string())
                    .col(ColumnDef::new(SwapRequests::RespondedAt).timestamp())
                    .col(
                        ColumnDef::new(SwapRequests::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-swap_requests-family_id")
                            .from(SwapRequests::Table, SwapRequests::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-swap_requests-family_id-created_at")
                    .table(SwapRequests::Table)
                    .col(SwapRequests::FamilyId)
                    .col(SwapRequests::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-swap_requests-family_id-status")
                    .table(SwapRequests::Table)
                    .col(SwapRequests::FamilyId)
                    .col(SwapRequests::Status)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Custody Schedules
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CustodySchedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustodySchedules::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CustodySchedules::FamilyId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustodySchedules::PatternKind)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustodySchedules::ParentADays)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustodySchedules::ParentBDays)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustodySchedules::IsActive)
                            .boolean()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustodySchedules::UpdatedBy)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-custody_schedules-family_id")
                            .from(CustodySchedules::Table, CustodySchedules::FamilyId)
                            .to(Families::Table, Families::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-custody_schedules-family_id-unique")
                    .table(CustodySchedules::Table)
                    .col(CustodySchedules::FamilyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Custody Pending Approvals
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(CustodyPendingApprovals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustodyPendingApprovals::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CustodyPendingApprovals::ScheduleId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustodyPendingApprovals::PatternKind)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustodyPendingApprovals::ParentADays)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustodyPendingApprovals::ParentBDays)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustodyPendingApprovals::RequestedBy)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustodyPendingApprovals::RequestedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-custody_pending_approvals-schedule_id")
                            .from(
                                CustodyPendingApprovals::Table,
                                CustodyPendingApprovals::ScheduleId,
                            )
                            .to(CustodySchedules::Table, CustodySchedules::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-custody_pending_approvals-schedule_id-unique")
                    .table(CustodyPendingApprovals::Table)
                    .col(CustodyPendingApprovals::ScheduleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 9. Event Reminders
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(EventReminders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventReminders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventReminders::EventId).string().not_null())
                    .col(
                        ColumnDef::new(EventReminders::FamilyId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventReminders::SendAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EventReminders::Sent).boolean().not_null())
                    .col(ColumnDef::new(EventReminders::SentAt).timestamp())
                    .col(
                        ColumnDef::new(EventReminders::RecipientIds)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-event_reminders-event_id")
                            .from(EventReminders::Table, EventReminders::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-event_reminders-event_id-unique")
                    .table(EventReminders::Table)
                    .col(EventReminders::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-event_reminders-sent-send_at")
                    .table(EventReminders::Table)
                    .col(EventReminders::Sent)
                    .col(EventReminders::SendAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 10. Task Reminders
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TaskReminders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TaskReminders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TaskReminders::TaskId).string().not_null())
                    .col(ColumnDef::new(TaskReminders::FamilyId).string().not_null())
                    .col(
                        ColumnDef::new(TaskReminders::SendAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TaskReminders::Sent).boolean().not_null())
                    .col(ColumnDef::new(TaskReminders::SentAt).timestamp())
                    .col(
                        ColumnDef::new(TaskReminders::RecipientIds)
                            .string()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-task_reminders-task_id")
                            .from(TaskReminders::Table, TaskReminders::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-task_reminders-task_id-unique")
                    .table(TaskReminders::Table)
                    .col(TaskReminders::TaskId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-task_reminders-sent-send_at")
                    .table(TaskReminders::Table)
                    .col(TaskReminders::Sent)
                    .col(TaskReminders::SendAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(TaskReminders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EventReminders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustodyPendingApprovals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustodySchedules::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SwapRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FamilyMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Families::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
