use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineError};
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

#[tokio::test]
async fn creator_becomes_first_member() {
    let (engine, _db) = engine_with_db().await;

    let family = engine.create_family("Rossi", "alice").await.unwrap();
    let members = engine.list_members(&family.id, "alice").await.unwrap();

    assert_eq!(members.len(), 1);
    assert_eq!(members[0].0, "alice");
    assert_eq!(members[0].2, "parent");
}

#[tokio::test]
async fn family_name_must_not_be_blank() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.create_family("   ", "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn membership_is_capped_at_two_parents() {
    let (engine, _db) = engine_with_db().await;

    let family = engine.create_family("Rossi", "alice").await.unwrap();
    engine.add_member(&family.id, "ben", "alice").await.unwrap();

    let err = engine.add_member(&family.id, "carol", "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn adding_the_same_member_twice_conflicts() {
    let (engine, _db) = engine_with_db().await;

    let family = engine.create_family("Rossi", "alice").await.unwrap();
    engine.add_member(&family.id, "ben", "alice").await.unwrap();

    let err = engine.add_member(&family.id, "ben", "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn unknown_users_cannot_be_added() {
    let (engine, _db) = engine_with_db().await;

    let family = engine.create_family("Rossi", "alice").await.unwrap();
    let err = engine.add_member(&family.id, "nobody", "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn non_members_are_rejected_not_enrolled() {
    let (engine, _db) = engine_with_db().await;

    let family = engine.create_family("Rossi", "alice").await.unwrap();

    let err = engine.family(&family.id, "carol").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // The refused lookup must not have added carol as a member.
    let members = engine.list_members(&family.id, "alice").await.unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn unknown_family_is_not_found() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.family("missing", "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}
