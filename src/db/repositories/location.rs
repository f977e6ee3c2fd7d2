use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::entities::locations;

pub struct LocationRepository {
    conn: DatabaseConnection,
}

impl LocationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// The single configured office row (lowest id). `None` means the
    /// install is missing its seed data, which callers treat as a
    /// configuration error, not a validation failure.
    pub async fn get_office(&self) -> Result<Option<locations::Model>> {
        locations::Entity::find()
            .order_by_asc(locations::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query office location")
    }

    pub async fn update_office(
        &self,
        name: &str,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
    ) -> Result<Option<locations::Model>> {
        let Some(office) = self.get_office().await? else {
            return Ok(None);
        };

        let mut active: locations::ActiveModel = office.into();
        active.name = Set(name.to_string());
        active.latitude = Set(latitude);
        active.longitude = Set(longitude);
        active.radius_m = Set(radius_m);

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update office location")?;

        Ok(Some(model))
    }
}
