use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::entities::attendance_records;

pub struct AttendanceRepository {
    conn: DatabaseConnection,
}

impl AttendanceRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        &self,
        user_id: i32,
        location_id: i32,
        kind: &str,
        latitude: f64,
        longitude: f64,
        note: Option<&str>,
        recorded_at: &str,
    ) -> Result<attendance_records::Model> {
        let active = attendance_records::ActiveModel {
            user_id: Set(user_id),
            location_id: Set(location_id),
            kind: Set(kind.to_string()),
            recorded_at: Set(recorded_at.to_string()),
            latitude: Set(latitude),
            longitude: Set(longitude),
            status: Set(None),
            note: Set(note.map(ToString::to_string)),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert attendance record")
    }

    /// Newest-first history, optionally filtered to one user.
    pub async fn list(
        &self,
        user_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<attendance_records::Model>> {
        let mut query = attendance_records::Entity::find()
            .order_by_desc(attendance_records::Column::Id)
            .limit(limit);

        if let Some(user_id) = user_id {
            query = query.filter(attendance_records::Column::UserId.eq(user_id));
        }

        query
            .all(&self.conn)
            .await
            .context("Failed to list attendance records")
    }

    pub async fn count(&self) -> Result<u64> {
        attendance_records::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count attendance records")
    }
}
