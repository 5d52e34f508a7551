use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine, families, family_members, users};

use super::Engine;

impl Engine {
    pub(super) async fn find_family_by_id(
        &self,
        db: &DatabaseTransaction,
        family_id: &str,
    ) -> ResultEngine<Option<families::Model>> {
        families::Entity::find_by_id(family_id.to_string())
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Requires the family to exist and `user_id` to be a recorded member.
    ///
    /// Membership is never provisioned here: an authenticated caller who is
    /// not on the family roster gets `Forbidden`.
    pub(super) async fn require_family_member(
        &self,
        db: &DatabaseTransaction,
        family_id: &str,
        user_id: &str,
    ) -> ResultEngine<families::Model> {
        let family = self
            .find_family_by_id(db, family_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("family".to_string()))?;

        let member =
            family_members::Entity::find_by_id((family_id.to_string(), user_id.to_string()))
                .one(db)
                .await?;
        if member.is_none() {
            return Err(EngineError::Forbidden(
                "not a member of this family".to_string(),
            ));
        }
        Ok(family)
    }

    /// Resolves the family's other member, i.e. the co-parent of `user_id`.
    pub(super) async fn other_member(
        &self,
        db: &DatabaseTransaction,
        family_id: &str,
        user_id: &str,
    ) -> ResultEngine<family_members::Model> {
        family_members::Entity::find()
            .filter(family_members::Column::FamilyId.eq(family_id.to_string()))
            .filter(family_members::Column::UserId.ne(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| {
                EngineError::InvalidState("family has no second parent yet".to_string())
            })
    }

    pub(super) async fn family_member_ids(
        &self,
        db: &DatabaseTransaction,
        family_id: &str,
    ) -> ResultEngine<Vec<String>> {
        let members = family_members::Entity::find()
            .filter(family_members::Column::FamilyId.eq(family_id.to_string()))
            .all(db)
            .await?;
        Ok(members.into_iter().map(|m| m.user_id).collect())
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("user".to_string()))
    }
}
