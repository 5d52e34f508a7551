use std::sync::Arc;

use sea_orm::{DatabaseConnection, QueryFilter, prelude::*, sea_query::Expr};

use crate::{
    EngineError, ResultEngine,
    notify::{LogGateway, PushGateway, PushMessage},
    users,
};

mod access;
mod custody;
mod events;
mod families;
mod reminders;
mod swap_requests;
mod tasks;

pub use custody::{ScheduleDecision, ScheduleSave};
pub use events::{EventCreate, EventPatch};
pub use swap_requests::{SwapCreate, SwapDecision};
pub use tasks::{TaskCreate, TaskPatch};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result: Result<_, crate::EngineError> = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

pub struct Engine {
    database: DatabaseConnection,
    push: Arc<dyn PushGateway>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Pushes to every device token held by `user_ids`.
    ///
    /// Returns `Ok(true)` when delivery succeeded (or there was nothing to
    /// deliver), `Ok(false)` when the gateway failed. Tokens the gateway
    /// reports as invalid are pruned from the users table.
    pub(crate) async fn push_to_users(
        &self,
        user_ids: &[String],
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> ResultEngine<bool> {
        let tokens: Vec<String> = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids.iter().cloned()))
            .filter(users::Column::PushToken.is_not_null())
            .all(&self.database)
            .await?
            .into_iter()
            .filter_map(|user| user.push_token)
            .collect();

        if tokens.is_empty() {
            return Ok(true);
        }

        let message = PushMessage {
            tokens,
            title: title.to_string(),
            body: body.to_string(),
            data,
        };
        let report = match self.push.send(message).await {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!("push delivery failed: {err}");
                return Ok(false);
            }
        };

        if !report.invalid_tokens.is_empty() {
            users::Entity::update_many()
                .col_expr(users::Column::PushToken, Expr::value(Option::<String>::None))
                .filter(users::Column::PushToken.is_in(report.invalid_tokens))
                .exec(&self.database)
                .await?;
        }

        Ok(true)
    }

    /// Fire-and-forget variant used after a primary write commits. Failures
    /// are logged, never propagated.
    pub(crate) async fn notify_users(
        &self,
        user_ids: &[String],
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) {
        if let Err(err) = self.push_to_users(user_ids, title, body, data).await {
            tracing::warn!("push side-channel lookup failed: {err}");
        }
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    push: Arc<dyn PushGateway>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            push: Arc::new(LogGateway),
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Select the push gateway implementation. Defaults to [`LogGateway`].
    pub fn push_gateway(mut self, gateway: Arc<dyn PushGateway>) -> EngineBuilder {
        self.push = gateway;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            push: self.push,
        })
    }
}
