use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Office seeded for a fresh install; admins edit it via the API.
const DEFAULT_OFFICE_NAME: &str = "Head Office";
const DEFAULT_OFFICE_LAT: f64 = -6.97321;
const DEFAULT_OFFICE_LON: f64 = 107.63014;
const DEFAULT_OFFICE_RADIUS_M: f64 = 50.0;

/// Hash the default admin password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Locations)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(TwoFactorCodes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AttendanceRecords)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Notifications)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let now = chrono::Utc::now().to_rfc3339();

        // Seed the admin account
        let password_hash = hash_default_password();
        let insert_admin = sea_orm_migration::sea_query::Query::insert()
            .into_table(Users)
            .columns([
                crate::entities::users::Column::Name,
                crate::entities::users::Column::Email,
                crate::entities::users::Column::PasswordHash,
                crate::entities::users::Column::Role,
                crate::entities::users::Column::CreatedAt,
                crate::entities::users::Column::UpdatedAt,
            ])
            .values_panic([
                "Administrator".into(),
                "admin@hadir.local".into(),
                password_hash.into(),
                "developer".into(),
                now.clone().into(),
                now.clone().into(),
            ])
            .to_owned();

        manager.exec_stmt(insert_admin).await?;

        // Seed the office geofence reference point
        let insert_office = sea_orm_migration::sea_query::Query::insert()
            .into_table(Locations)
            .columns([
                crate::entities::locations::Column::Name,
                crate::entities::locations::Column::Latitude,
                crate::entities::locations::Column::Longitude,
                crate::entities::locations::Column::RadiusM,
                crate::entities::locations::Column::CreatedAt,
            ])
            .values_panic([
                DEFAULT_OFFICE_NAME.into(),
                DEFAULT_OFFICE_LAT.into(),
                DEFAULT_OFFICE_LON.into(),
                DEFAULT_OFFICE_RADIUS_M.into(),
                now.into(),
            ])
            .to_owned();

        manager.exec_stmt(insert_office).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AttendanceRecords).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TwoFactorCodes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Locations).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
