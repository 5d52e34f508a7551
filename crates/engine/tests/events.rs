use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineError, EventCreate, EventPatch, TaskCreate, TaskPatch, TaskStatus};
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

fn event_new(family_id: &str, title: &str, hours: i64) -> EventCreate {
    EventCreate {
        family_id: family_id.to_string(),
        title: title.to_string(),
        start_at: Utc::now() + Duration::hours(hours),
        end_at: None,
        all_day: false,
        category: Some("school".to_string()),
        assigned_to: None,
        reminder_minutes: None,
        user_id: "alice".to_string(),
    }
}

#[tokio::test]
async fn events_list_in_start_order() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    engine.create_event(event_new(&family_id, "Recital", 48)).await.unwrap();
    engine.create_event(event_new(&family_id, "Pickup", 2)).await.unwrap();
    engine.create_event(event_new(&family_id, "Practice", 24)).await.unwrap();

    let events = engine.list_events(&family_id, "ben").await.unwrap();
    let titles: Vec<_> = events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Pickup", "Practice", "Recital"]);
}

#[tokio::test]
async fn blank_titles_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let err = engine
        .create_event(event_new(&family_id, "  ", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .create_event(EventCreate {
            reminder_minutes: Some(-5),
            ..event_new(&family_id, "Pickup", 2)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn patch_distinguishes_absent_from_null() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let event = engine.create_event(event_new(&family_id, "Pickup", 2)).await.unwrap();
    assert_eq!(event.category.as_deref(), Some("school"));

    // Absent field: category untouched.
    let event = engine
        .update_event(
            event.id,
            EventPatch {
                title: Some("Late pickup".to_string()),
                ..EventPatch::default()
            },
            "ben",
        )
        .await
        .unwrap();
    assert_eq!(event.title, "Late pickup");
    assert_eq!(event.category.as_deref(), Some("school"));

    // Explicit null: category cleared.
    let event = engine
        .update_event(
            event.id,
            EventPatch {
                category: Some(None),
                ..EventPatch::default()
            },
            "ben",
        )
        .await
        .unwrap();
    assert_eq!(event.category, None);
}

#[tokio::test]
async fn outsiders_cannot_touch_events() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let event = engine.create_event(event_new(&family_id, "Pickup", 2)).await.unwrap();

    let err = engine.list_events(&family_id, "carol").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .update_event(
            event.id,
            EventPatch {
                title: Some("Hijacked".to_string()),
                ..EventPatch::default()
            },
            "carol",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine.delete_event(event.id, "carol").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn delete_returns_the_removed_event() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let event = engine.create_event(event_new(&family_id, "Pickup", 2)).await.unwrap();
    let removed = engine.delete_event(event.id, "alice").await.unwrap();
    assert_eq!(removed.id, event.id);

    let err = engine.delete_event(event.id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn tasks_move_through_their_statuses() {
    let (engine, _db) = engine_with_db().await;
    let family_id = family_of_two(&engine).await;

    let task = engine
        .create_task(TaskCreate {
            family_id: family_id.clone(),
            title: "Buy school supplies".to_string(),
            due_at: None,
            assigned_to: Some("ben".to_string()),
            reminder_minutes: None,
            user_id: "alice".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Open);

    let task = engine
        .update_task(
            task.id,
            TaskPatch {
                status: Some(TaskStatus::Completed),
                ..TaskPatch::default()
            },
            "ben",
        )
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Completed);

    let tasks = engine.list_tasks(&family_id, "alice").await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Completed);
}
