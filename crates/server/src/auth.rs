//! Bearer-token identity resolution.
//!
//! `IdentityProvider` is the seam between the HTTP layer and whatever holds
//! the credentials. `TokenTable` resolves tokens against the users table; a
//! different provider can be plugged in at startup without touching the
//! handlers.

use std::future::Future;
use std::pin::Pin;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use engine::users;

/// The authenticated caller, as inserted into request extensions.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
}

pub trait IdentityProvider: Send + Sync {
    /// Resolves a bearer token to an identity, `None` when the token is
    /// unknown or revoked.
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<Identity>> + Send + 'a>>;
}

/// Looks tokens up in the `users.auth_token` column.
pub struct TokenTable {
    db: DatabaseConnection,
}

impl TokenTable {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl IdentityProvider for TokenTable {
    fn verify<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<Identity>> + Send + 'a>> {
        Box::pin(async move {
            let user = users::Entity::find()
                .filter(users::Column::AuthToken.eq(token.to_string()))
                .one(&self.db)
                .await
                .ok()
                .flatten()?;

            Some(Identity {
                user_id: user.id,
                display_name: user.display_name,
            })
        })
    }
}
