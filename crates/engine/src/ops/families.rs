use sea_orm::{ActiveValue, PaginatorTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, families, family_members, users};

use super::{Engine, normalize_required_text, with_tx};

/// A family never holds more than two parents.
const MAX_MEMBERS: u64 = 2;

impl Engine {
    /// Creates a family; the creator becomes its first member.
    pub async fn create_family(&self, name: &str, user_id: &str) -> ResultEngine<families::Model> {
        let name = normalize_required_text(name, "family name")?;
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;

            let family = families::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                name: ActiveValue::Set(name.clone()),
                created_by: ActiveValue::Set(user_id.to_string()),
            };
            let family = family.insert(&db_tx).await?;

            let member = family_members::ActiveModel {
                family_id: ActiveValue::Set(family.id.clone()),
                user_id: ActiveValue::Set(user_id.to_string()),
                role: ActiveValue::Set(family_members::ROLE_PARENT.to_string()),
            };
            member.insert(&db_tx).await?;

            Ok(family)
        })
    }

    /// Returns a family, member-only.
    pub async fn family(&self, family_id: &str, user_id: &str) -> ResultEngine<families::Model> {
        with_tx!(self, |db_tx| {
            let family = self.require_family_member(&db_tx, family_id, user_id).await?;
            Ok(family)
        })
    }

    /// Lists the family roster as `(user_id, display_name, role)`.
    pub async fn list_members(
        &self,
        family_id: &str,
        user_id: &str,
    ) -> ResultEngine<Vec<(String, String, String)>> {
        with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, family_id, user_id).await?;

            let members = family_members::Entity::find()
                .filter(family_members::Column::FamilyId.eq(family_id.to_string()))
                .all(&db_tx)
                .await?;

            let mut out = Vec::with_capacity(members.len());
            for member in members {
                let display_name = users::Entity::find_by_id(member.user_id.clone())
                    .one(&db_tx)
                    .await?
                    .map(|u| u.display_name)
                    .unwrap_or_default();
                out.push((member.user_id, display_name, member.role));
            }
            Ok(out)
        })
    }

    /// Links the second parent to the family.
    pub async fn add_member(
        &self,
        family_id: &str,
        member_user_id: &str,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_family_member(&db_tx, family_id, user_id).await?;
            self.require_user_exists(&db_tx, member_user_id).await?;

            let existing = family_members::Entity::find_by_id((
                family_id.to_string(),
                member_user_id.to_string(),
            ))
            .one(&db_tx)
            .await?;
            if existing.is_some() {
                return Err(EngineError::Conflict(member_user_id.to_string()));
            }

            let count = family_members::Entity::find()
                .filter(family_members::Column::FamilyId.eq(family_id.to_string()))
                .count(&db_tx)
                .await?;
            if count >= MAX_MEMBERS {
                return Err(EngineError::InvalidState(
                    "family already has two parents".to_string(),
                ));
            }

            let member = family_members::ActiveModel {
                family_id: ActiveValue::Set(family_id.to_string()),
                user_id: ActiveValue::Set(member_user_id.to_string()),
                role: ActiveValue::Set(family_members::ROLE_PARENT.to_string()),
            };
            member.insert(&db_tx).await?;
            Ok(())
        })
    }
}
