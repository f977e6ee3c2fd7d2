use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::two_factor_codes;

pub struct TwoFactorRepository {
    conn: DatabaseConnection,
}

impl TwoFactorRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Remove every pending code for a user. Issuance calls this before
    /// inserting so at most one code is ever active.
    pub async fn delete_for_user(&self, user_id: i32) -> Result<u64> {
        let result = two_factor_codes::Entity::delete_many()
            .filter(two_factor_codes::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete pending codes")?;

        Ok(result.rows_affected)
    }

    pub async fn insert(
        &self,
        user_id: i32,
        code: &str,
        expires_at: &str,
        created_at: &str,
    ) -> Result<two_factor_codes::Model> {
        let active = two_factor_codes::ActiveModel {
            user_id: Set(user_id),
            code: Set(code.to_string()),
            expires_at: Set(expires_at.to_string()),
            created_at: Set(created_at.to_string()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert 2FA code")
    }

    /// Exact-match lookup; expiry is checked by the caller against its
    /// clock so the service stays testable.
    pub async fn find(&self, user_id: i32, code: &str) -> Result<Option<two_factor_codes::Model>> {
        two_factor_codes::Entity::find()
            .filter(two_factor_codes::Column::UserId.eq(user_id))
            .filter(two_factor_codes::Column::Code.eq(code))
            .one(&self.conn)
            .await
            .context("Failed to query 2FA code")
    }

    /// Consume a code row. The row is gone afterwards, so replaying the
    /// same code fails.
    pub async fn delete(&self, id: i32) -> Result<()> {
        two_factor_codes::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete consumed code")?;

        Ok(())
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<two_factor_codes::Model>> {
        two_factor_codes::Entity::find()
            .filter(two_factor_codes::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to list codes for user")
    }
}
