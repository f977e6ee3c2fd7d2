use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect, Set};

use crate::entities::notifications;

pub struct NotificationRepository {
    conn: DatabaseConnection,
}

impl NotificationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, limit: u64) -> Result<Vec<notifications::Model>> {
        notifications::Entity::find()
            .order_by_desc(notifications::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list notifications")
    }

    pub async fn create(&self, title: &str, message: &str) -> Result<notifications::Model> {
        let active = notifications::ActiveModel {
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert notification")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = notifications::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete notification")?;

        Ok(result.rows_affected > 0)
    }
}
