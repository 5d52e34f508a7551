use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineError, SwapCreate, SwapDecision, SwapKind, SwapStatus};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (id, email, name) in [
        ("alice", "alice@example.com", "Alice"),
        ("ben", "ben@example.com", "Ben"),
        ("carol", "carol@example.com", "Carol"),
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

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, day).unwrap()
}

fn swap_new(family_id: &str, original: u32, proposed: u32) -> SwapCreate {
    SwapCreate {
        family_id: family_id.to_string(),
        kind: SwapKind::Swap,
        original_date: date(original),
        proposed_date: Some(date(proposed)),
        reason: Some("dentist appointment".to_string()),
        user_id: "alice".to_string(),
    }
}

#[tokio::test]
async fn create_addresses_other_parent_as_recipient() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let request = engine
        .create_swap_request(swap_new(&family_id, 5, 12))
        .await
        .unwrap();

    assert_eq!(request.status, SwapStatus::Pending);
    assert_eq!(request.requester_id, "alice");
    assert_eq!(request.recipient_id, "ben");
    assert_eq!(request.proposed_date, Some(date(12)));
}

#[tokio::test]
async fn swap_kind_requires_proposed_date() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let err = engine
        .create_swap_request(SwapCreate {
            proposed_date: None,
            ..swap_new(&family_id, 5, 12)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn single_parent_family_cannot_open_requests() {
    let (engine, _db) = engine_with_db().await;
    let family = engine.create_family("Rossi", "alice").await.unwrap();

    let err = engine
        .create_swap_request(swap_new(&family.id, 5, 12))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn second_open_request_for_same_day_conflicts() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    engine
        .create_swap_request(swap_new(&family_id, 5, 12))
        .await
        .unwrap();
    let err = engine
        .create_swap_request(swap_new(&family_id, 5, 19))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn counter_then_accept_then_approve_derives_both_events() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let request = engine
        .create_swap_request(swap_new(&family_id, 5, 12))
        .await
        .unwrap();

    let request = engine
        .counter_swap_request(request.id, date(19), Some("prefer next week".to_string()), "ben")
        .await
        .unwrap();
    assert_eq!(request.status, SwapStatus::Countered);
    assert_eq!(request.proposed_date, Some(date(19)));
    assert_eq!(request.previous_proposed_date, Some(date(12)));

    let request = engine.accept_counter(request.id, None, "alice").await.unwrap();
    assert_eq!(request.status, SwapStatus::FinalPending);
    assert!(request.requester_confirmed_at.is_some());

    let request = engine
        .respond_swap_request(request.id, SwapDecision::Approved, None, "ben")
        .await
        .unwrap();
    assert_eq!(request.status, SwapStatus::Approved);

    let events = engine.list_events(&family_id, "alice").await.unwrap();
    let derived: Vec<_> = events
        .iter()
        .filter(|e| e.swap_request_id == Some(request.id))
        .collect();
    assert_eq!(derived.len(), 2);
    assert!(derived.iter().all(|e| e.all_day));
    assert!(derived.iter().all(|e| e.category.as_deref() == Some("custody")));

    let original_day = derived
        .iter()
        .find(|e| e.start_at.date_naive() == date(5))
        .unwrap();
    assert_eq!(original_day.assigned_to.as_deref(), Some("ben"));

    let proposed_day = derived
        .iter()
        .find(|e| e.start_at.date_naive() == date(19))
        .unwrap();
    assert_eq!(proposed_day.assigned_to.as_deref(), Some("alice"));
}

#[tokio::test]
async fn rejecting_counter_restores_original_proposal() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let request = engine
        .create_swap_request(swap_new(&family_id, 5, 12))
        .await
        .unwrap();
    let request = engine
        .counter_swap_request(request.id, date(19), None, "ben")
        .await
        .unwrap();

    let request = engine
        .reject_counter(request.id, Some("original works better".to_string()), "alice")
        .await
        .unwrap();

    assert_eq!(request.status, SwapStatus::Pending);
    assert_eq!(request.proposed_date, Some(date(12)));
    assert_eq!(request.previous_proposed_date, None);
    assert_eq!(request.counter_note, None);
    assert_eq!(request.countered_by, None);
    assert_eq!(request.countered_at, None);
}

#[tokio::test]
async fn one_way_approval_yields_single_event() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let request = engine
        .create_swap_request(SwapCreate {
            kind: SwapKind::OneWay,
            proposed_date: None,
            ..swap_new(&family_id, 5, 12)
        })
        .await
        .unwrap();

    let request = engine
        .respond_swap_request(request.id, SwapDecision::Approved, None, "ben")
        .await
        .unwrap();
    assert_eq!(request.status, SwapStatus::Approved);

    let events = engine.list_events(&family_id, "alice").await.unwrap();
    let derived: Vec<_> = events
        .iter()
        .filter(|e| e.swap_request_id == Some(request.id))
        .collect();
    assert_eq!(derived.len(), 1);
    assert_eq!(derived[0].assigned_to.as_deref(), Some("ben"));
}

#[tokio::test]
async fn one_way_requests_cannot_be_countered() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let request = engine
        .create_swap_request(SwapCreate {
            kind: SwapKind::OneWay,
            proposed_date: None,
            ..swap_new(&family_id, 5, 12)
        })
        .await
        .unwrap();

    let err = engine
        .counter_swap_request(request.id, date(19), None, "ben")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn only_the_recipient_settles_and_counters() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let request = engine
        .create_swap_request(swap_new(&family_id, 5, 12))
        .await
        .unwrap();

    let err = engine
        .counter_swap_request(request.id, date(19), None, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .respond_swap_request(request.id, SwapDecision::Approved, None, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn only_the_requester_answers_counters_and_cancels() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let request = engine
        .create_swap_request(swap_new(&family_id, 5, 12))
        .await
        .unwrap();
    let request = engine
        .counter_swap_request(request.id, date(19), None, "ben")
        .await
        .unwrap();

    let err = engine.accept_counter(request.id, None, "ben").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine.cancel_swap_request(request.id, "ben").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn terminal_requests_reject_every_transition() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let request = engine
        .create_swap_request(swap_new(&family_id, 5, 12))
        .await
        .unwrap();
    let request = engine
        .respond_swap_request(request.id, SwapDecision::Rejected, None, "ben")
        .await
        .unwrap();
    assert_eq!(request.status, SwapStatus::Rejected);

    let err = engine
        .counter_swap_request(request.id, date(19), None, "ben")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    let err = engine
        .respond_swap_request(request.id, SwapDecision::Approved, None, "ben")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    let err = engine.cancel_swap_request(request.id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn cancel_leaves_no_calendar_trace() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let request = engine
        .create_swap_request(swap_new(&family_id, 5, 12))
        .await
        .unwrap();
    let request = engine.cancel_swap_request(request.id, "alice").await.unwrap();
    assert_eq!(request.status, SwapStatus::Cancelled);

    let events = engine.list_events(&family_id, "alice").await.unwrap();
    assert!(events.iter().all(|e| e.swap_request_id.is_none()));
}

#[tokio::test]
async fn non_members_cannot_read_requests() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let request = engine
        .create_swap_request(swap_new(&family_id, 5, 12))
        .await
        .unwrap();

    let err = engine.swap_request(request.id, "carol").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine.list_swap_requests(&family_id, "carol").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}
