use std::future::Future;
use std::pin::Pin;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Statement};

use engine::{
    DeliveryReport, Engine, EventCreate, EventPatch, PushError, PushGateway, PushMessage,
    TaskCreate, TaskPatch, TaskStatus, event_reminders, task_reminders,
};
use migration::MigratorTrait;

/// Captures every push and can be switched into a failing mode.
#[derive(Default)]
struct RecordingGateway {
    sent: Mutex<Vec<PushMessage>>,
    fail: AtomicBool,
}

impl RecordingGateway {
    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl PushGateway for RecordingGateway {
    fn send(
        &self,
        message: PushMessage,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReport, PushError>> + Send + '_>> {
        Box::pin(async move {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PushError("simulated outage".to_string()));
            }
            self.sent.lock().unwrap().push(message);
            Ok(DeliveryReport {
                invalid_tokens: Vec::new(),
            })
        })
    }
}

async fn engine_with_gateway() -> (Engine, DatabaseConnection, Arc<RecordingGateway>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (id, email, name, token) in [
        ("alice", "alice@example.com", "Alice", "push-alice"),
        ("ben", "ben@example.com", "Ben", "push-ben"),
    ] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (id, email, display_name, push_token) VALUES (?, ?, ?, ?)",
            vec![id.into(), email.into(), name.into(), token.into()],
        ))
        .await
        .unwrap();
    }
    let gateway = Arc::new(RecordingGateway::default());
    let engine = Engine::builder()
        .database(db.clone())
        .push_gateway(gateway.clone())
        .build()
        .await
        .unwrap();
    (engine, db, gateway)
}

async fn family_of_two(engine: &Engine) -> String {
    let family = engine.create_family("Rossi", "alice").await.unwrap();
    engine.add_member(&family.id, "ben", "alice").await.unwrap();
    family.id
}

fn event_in(family_id: &str, hours: i64, reminder_minutes: Option<i64>) -> EventCreate {
    EventCreate {
        family_id: family_id.to_string(),
        title: "Pediatrician".to_string(),
        start_at: Utc::now() + Duration::hours(hours),
        end_at: None,
        all_day: false,
        category: None,
        assigned_to: None,
        reminder_minutes,
        user_id: "alice".to_string(),
    }
}

#[tokio::test]
async fn reminder_row_is_written_for_future_send_times() {
    let (engine, db, _gateway) = engine_with_gateway().await;
    let family_id = family_of_two(&engine).await;

    let event = engine.create_event(event_in(&family_id, 2, Some(60))).await.unwrap();

    let rows = event_reminders::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_id, event.id.to_string());
    assert!(!rows[0].sent);
    assert_eq!(rows[0].send_at, event.start_at - Duration::minutes(60));
}

#[tokio::test]
async fn past_send_times_are_never_persisted() {
    let (engine, db, _gateway) = engine_with_gateway().await;
    let family_id = family_of_two(&engine).await;

    // Ten minutes ahead with a sixty-minute lead puts send_at in the past.
    engine.create_event(event_in(&family_id, 0, Some(600))).await.unwrap();

    let rows = event_reminders::Entity::find().all(&db).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn updating_the_reminder_replaces_the_row() {
    let (engine, db, _gateway) = engine_with_gateway().await;
    let family_id = family_of_two(&engine).await;

    let event = engine.create_event(event_in(&family_id, 4, Some(60))).await.unwrap();
    let event = engine
        .update_event(
            event.id,
            EventPatch {
                reminder_minutes: Some(Some(30)),
                ..EventPatch::default()
            },
            "alice",
        )
        .await
        .unwrap();

    let rows = event_reminders::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].send_at, event.start_at - Duration::minutes(30));

    engine
        .update_event(
            event.id,
            EventPatch {
                reminder_minutes: Some(None),
                ..EventPatch::default()
            },
            "alice",
        )
        .await
        .unwrap();
    let rows = event_reminders::Entity::find().all(&db).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn deleting_the_event_removes_its_reminder() {
    let (engine, db, _gateway) = engine_with_gateway().await;
    let family_id = family_of_two(&engine).await;

    let event = engine.create_event(event_in(&family_id, 4, Some(60))).await.unwrap();
    engine.delete_event(event.id, "alice").await.unwrap();

    let rows = event_reminders::Entity::find().all(&db).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn sweep_delivers_due_reminders_once() {
    let (engine, db, gateway) = engine_with_gateway().await;
    let family_id = family_of_two(&engine).await;

    engine.create_event(event_in(&family_id, 2, Some(60))).await.unwrap();

    // Not yet due.
    let sent = engine.sweep_event_reminders(Utc::now()).await.unwrap();
    assert_eq!(sent, 0);
    assert_eq!(gateway.sent_count(), 0);

    let later = Utc::now() + Duration::hours(2);
    let sent = engine.sweep_event_reminders(later).await.unwrap();
    assert_eq!(sent, 1);
    assert_eq!(gateway.sent_count(), 1);

    let rows = event_reminders::Entity::find().all(&db).await.unwrap();
    assert!(rows[0].sent);
    assert!(rows[0].sent_at.is_some());

    // A second sweep finds nothing left.
    let sent = engine.sweep_event_reminders(later).await.unwrap();
    assert_eq!(sent, 0);
    assert_eq!(gateway.sent_count(), 1);
}

#[tokio::test]
async fn failed_delivery_leaves_the_reminder_unsent() {
    let (engine, db, gateway) = engine_with_gateway().await;
    let family_id = family_of_two(&engine).await;

    engine.create_event(event_in(&family_id, 2, Some(60))).await.unwrap();
    let later = Utc::now() + Duration::hours(2);

    gateway.fail.store(true, Ordering::SeqCst);
    let sent = engine.sweep_event_reminders(later).await.unwrap();
    assert_eq!(sent, 0);
    let rows = event_reminders::Entity::find().all(&db).await.unwrap();
    assert!(!rows[0].sent);

    // Retried on the next sweep once the gateway recovers.
    gateway.fail.store(false, Ordering::SeqCst);
    let sent = engine.sweep_event_reminders(later).await.unwrap();
    assert_eq!(sent, 1);
    assert_eq!(gateway.sent_count(), 1);
}

#[tokio::test]
async fn task_reminders_follow_the_due_date() {
    let (engine, db, gateway) = engine_with_gateway().await;
    let family_id = family_of_two(&engine).await;

    let task = engine
        .create_task(TaskCreate {
            family_id: family_id.clone(),
            title: "Buy school supplies".to_string(),
            due_at: Some(Utc::now() + Duration::hours(3)),
            assigned_to: Some("ben".to_string()),
            reminder_minutes: Some(30),
            user_id: "alice".to_string(),
        })
        .await
        .unwrap();

    let rows = task_reminders::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].task_id, task.id.to_string());

    let later = Utc::now() + Duration::hours(3);
    let sent = engine.sweep_task_reminders(later).await.unwrap();
    assert_eq!(sent, 1);
    assert_eq!(gateway.sent_count(), 1);
}

#[tokio::test]
async fn completing_a_task_drops_its_reminder() {
    let (engine, db, _gateway) = engine_with_gateway().await;
    let family_id = family_of_two(&engine).await;

    let task = engine
        .create_task(TaskCreate {
            family_id: family_id.clone(),
            title: "Sign permission slip".to_string(),
            due_at: Some(Utc::now() + Duration::hours(3)),
            assigned_to: None,
            reminder_minutes: Some(30),
            user_id: "alice".to_string(),
        })
        .await
        .unwrap();

    engine
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

    let rows = task_reminders::Entity::find().all(&db).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn terminal_task_rows_are_marked_sent_without_delivery() {
    let (engine, db, gateway) = engine_with_gateway().await;
    let family_id = family_of_two(&engine).await;

    let task = engine
        .create_task(TaskCreate {
            family_id: family_id.clone(),
            title: "Dentist form".to_string(),
            due_at: Some(Utc::now() + Duration::hours(3)),
            assigned_to: None,
            reminder_minutes: Some(30),
            user_id: "alice".to_string(),
        })
        .await
        .unwrap();

    // Flip the task terminal behind the engine's back; the stale reminder
    // row must be retired silently.
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE tasks SET status = 'cancelled' WHERE id = ?",
        vec![task.id.to_string().into()],
    ))
    .await
    .unwrap();

    let later = Utc::now() + Duration::hours(3);
    let sent = engine.sweep_task_reminders(later).await.unwrap();
    assert_eq!(sent, 0);
    assert_eq!(gateway.sent_count(), 0);

    let rows = task_reminders::Entity::find().all(&db).await.unwrap();
    assert!(rows[0].sent);
}

#[tokio::test]
async fn cleanup_retires_old_sent_rows_only() {
    let (engine, db, _gateway) = engine_with_gateway().await;
    let family_id = family_of_two(&engine).await;

    engine.create_event(event_in(&family_id, 2, Some(60))).await.unwrap();
    engine.create_event(EventCreate {
        title: "Recital".to_string(),
        ..event_in(&family_id, 400, Some(60))
    })
    .await
    .unwrap();

    let later = Utc::now() + Duration::hours(2);
    engine.sweep_event_reminders(later).await.unwrap();

    // Recent sent rows survive, week-old ones go.
    let removed = engine.cleanup_sent_reminders(later).await.unwrap();
    assert_eq!(removed, 0);

    let removed = engine
        .cleanup_sent_reminders(later + Duration::days(8))
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let rows = event_reminders::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].sent);
}
