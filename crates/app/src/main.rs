use std::sync::Arc;
use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use settings::{Database, PushMode};

mod settings;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "affido={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    if let Some(server) = settings.server {
        let db = match parse_database(&server.database).await {
            Ok(db) => db,
            Err(err) => {
                tracing::error!("failed to initialize database: {err}");
                return Ok(());
            }
        };
        let gateway: Arc<dyn engine::PushGateway> = match server.push {
            PushMode::Log => Arc::new(engine::LogGateway),
            PushMode::Off => Arc::new(engine::NullGateway),
        };

        let sweeper = engine::Engine::builder()
            .database(db.clone())
            .push_gateway(gateway.clone())
            .build()
            .await?;
        tasks.spawn(async move {
            run_reminder_loop(sweeper).await;
        });

        tasks.spawn(async move {
            tracing::info!("Found server settings...");
            let engine = match engine::Engine::builder()
                .database(db.clone())
                .push_gateway(gateway)
                .build()
                .await
            {
                Ok(engine) => engine,
                Err(err) => {
                    tracing::error!("failed to build engine from database: {err}");
                    return;
                }
            };
            let identity = Arc::new(server::TokenTable::new(db));
            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(engine, identity, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

/// Fires due reminders every minute and retires old sent rows once a day.
async fn run_reminder_loop(engine: engine::Engine) {
    let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
    let mut cleanup = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = sweep.tick() => {
                let now = chrono::Utc::now();
                match engine.sweep_event_reminders(now).await {
                    Ok(0) => {}
                    Ok(sent) => tracing::info!("delivered {sent} event reminders"),
                    Err(err) => tracing::error!("event reminder sweep failed: {err}"),
                }
                match engine.sweep_task_reminders(now).await {
                    Ok(0) => {}
                    Ok(sent) => tracing::info!("delivered {sent} task reminders"),
                    Err(err) => tracing::error!("task reminder sweep failed: {err}"),
                }
            }
            _ = cleanup.tick() => {
                match engine.cleanup_sent_reminders(chrono::Utc::now()).await {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!("retired {removed} sent reminders"),
                    Err(err) => tracing::error!("reminder cleanup failed: {err}"),
                }
            }
        }
    }
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
