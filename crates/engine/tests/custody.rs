use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineError, PatternKind, ScheduleDecision, ScheduleSave};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (id, email, name) in [
        ("alice", "alice@example.com", "Alice"),
        ("ben", "ben@example.com", "Ben"),
    ] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (id, email, display_name) VALUES (?, ?, ?)",
            vec![id.into(), email.into(), name.into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    (engine, db)
}

async fn family_of_two(engine: &Engine) -> String {
    let family = engine.create_family("Rossi", "alice").await.unwrap();
    engine.add_member(&family.id, "ben", "alice").await.unwrap();
    family.id
}

fn save(family_id: &str, user: &str, staged: bool) -> ScheduleSave {
    ScheduleSave {
        family_id: family_id.to_string(),
        pattern_kind: PatternKind::Weekly,
        parent_a_days: vec![0, 1, 2],
        parent_b_days: vec![3, 4, 5, 6],
        request_approval: staged,
        user_id: user.to_string(),
    }
}

#[tokio::test]
async fn direct_save_is_applied_immediately() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let schedule = engine
        .save_custody_schedule(save(&family_id, "alice", false))
        .await
        .unwrap();

    assert!(schedule.is_active);
    assert_eq!(schedule.pattern_kind, PatternKind::Weekly);
    assert!(schedule.pending_approval.is_none());
}

#[tokio::test]
async fn weekday_numbers_are_validated() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let err = engine
        .save_custody_schedule(ScheduleSave {
            parent_a_days: vec![0, 7],
            ..save(&family_id, "alice", false)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .save_custody_schedule(ScheduleSave {
            parent_b_days: vec![3, 3],
            ..save(&family_id, "alice", false)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn staged_save_leaves_live_schedule_untouched() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    engine
        .save_custody_schedule(save(&family_id, "alice", false))
        .await
        .unwrap();

    let staged = engine
        .save_custody_schedule(ScheduleSave {
            pattern_kind: PatternKind::WeekOnWeekOff,
            ..save(&family_id, "ben", true)
        })
        .await
        .unwrap();

    // The live pattern is unchanged; the staged one rides along.
    assert_eq!(staged.pattern_kind, PatternKind::Weekly);
    let pending = staged.pending_approval.unwrap();
    assert_eq!(pending.pattern_kind, PatternKind::WeekOnWeekOff);
    assert_eq!(pending.requested_by, "ben");
}

#[tokio::test]
async fn second_staged_save_replaces_the_first() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    engine
        .save_custody_schedule(ScheduleSave {
            pattern_kind: PatternKind::Biweekly,
            ..save(&family_id, "alice", true)
        })
        .await
        .unwrap();
    let schedule = engine
        .save_custody_schedule(ScheduleSave {
            pattern_kind: PatternKind::Custom,
            ..save(&family_id, "alice", true)
        })
        .await
        .unwrap();

    let pending = schedule.pending_approval.unwrap();
    assert_eq!(pending.pattern_kind, PatternKind::Custom);
}

#[tokio::test]
async fn author_cannot_approve_own_change() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    engine
        .save_custody_schedule(save(&family_id, "alice", true))
        .await
        .unwrap();

    let err = engine
        .respond_custody_schedule(&family_id, ScheduleDecision::Approve, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // The staged change must survive the refused attempt.
    let schedule = engine.custody_schedule(&family_id, "alice").await.unwrap();
    assert!(schedule.pending_approval.is_some());
}

#[tokio::test]
async fn approval_applies_atomically_and_clears_pending() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    engine
        .save_custody_schedule(save(&family_id, "alice", false))
        .await
        .unwrap();
    engine
        .save_custody_schedule(ScheduleSave {
            pattern_kind: PatternKind::WeekOnWeekOff,
            parent_a_days: vec![5, 6],
            ..save(&family_id, "alice", true)
        })
        .await
        .unwrap();

    let schedule = engine
        .respond_custody_schedule(&family_id, ScheduleDecision::Approve, "ben")
        .await
        .unwrap();

    assert!(schedule.is_active);
    assert_eq!(schedule.pattern_kind, PatternKind::WeekOnWeekOff);
    assert_eq!(schedule.parent_a_days, vec![5, 6]);
    assert!(schedule.pending_approval.is_none());

    let reread = engine.custody_schedule(&family_id, "ben").await.unwrap();
    assert_eq!(reread.pattern_kind, PatternKind::WeekOnWeekOff);
    assert!(reread.pending_approval.is_none());
}

#[tokio::test]
async fn rejection_discards_the_staged_change_only() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    engine
        .save_custody_schedule(save(&family_id, "alice", false))
        .await
        .unwrap();
    engine
        .save_custody_schedule(ScheduleSave {
            pattern_kind: PatternKind::Custom,
            ..save(&family_id, "alice", true)
        })
        .await
        .unwrap();

    engine
        .respond_custody_schedule(&family_id, ScheduleDecision::Reject, "ben")
        .await
        .unwrap();

    let schedule = engine.custody_schedule(&family_id, "ben").await.unwrap();
    assert_eq!(schedule.pattern_kind, PatternKind::Weekly);
    assert!(schedule.pending_approval.is_none());
}

#[tokio::test]
async fn responding_without_pending_is_invalid() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    engine
        .save_custody_schedule(save(&family_id, "alice", false))
        .await
        .unwrap();

    let err = engine
        .respond_custody_schedule(&family_id, ScheduleDecision::Approve, "ben")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn only_the_author_withdraws_a_staged_change() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    engine
        .save_custody_schedule(save(&family_id, "alice", true))
        .await
        .unwrap();

    let err = engine.cancel_custody_pending(&family_id, "ben").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine.cancel_custody_pending(&family_id, "alice").await.unwrap();
    let schedule = engine.custody_schedule(&family_id, "alice").await.unwrap();
    assert!(schedule.pending_approval.is_none());
}

#[tokio::test]
async fn schedule_is_not_found_until_first_save() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let err = engine.custody_schedule(&family_id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}
