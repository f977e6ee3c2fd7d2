use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{attendance_records, locations, notifications, two_factor_codes};

pub mod migrator;
pub mod repositories;

pub use repositories::user::{User, UserUpdate};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn two_factor_repo(&self) -> repositories::two_factor::TwoFactorRepository {
        repositories::two_factor::TwoFactorRepository::new(self.conn.clone())
    }

    fn location_repo(&self) -> repositories::location::LocationRepository {
        repositories::location::LocationRepository::new(self.conn.clone())
    }

    fn attendance_repo(&self) -> repositories::attendance::AttendanceRepository {
        repositories::attendance::AttendanceRepository::new(self.conn.clone())
    }

    fn notification_repo(&self) -> repositories::notification::NotificationRepository {
        repositories::notification::NotificationRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: &str,
        external_ref: Option<&str>,
        config: Option<&crate::config::SecurityConfig>,
    ) -> Result<User> {
        self.user_repo()
            .create(name, email, password, role, external_ref, config)
            .await
    }

    pub async fn update_user(&self, id: i32, changes: UserUpdate) -> Result<Option<User>> {
        self.user_repo().update(id, changes).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        new_password: &str,
        config: Option<&crate::config::SecurityConfig>,
    ) -> Result<bool> {
        self.user_repo()
            .update_password(id, new_password, config)
            .await
    }

    // ========== 2FA codes ==========

    pub async fn delete_codes_for_user(&self, user_id: i32) -> Result<u64> {
        self.two_factor_repo().delete_for_user(user_id).await
    }

    pub async fn insert_code(
        &self,
        user_id: i32,
        code: &str,
        expires_at: &str,
        created_at: &str,
    ) -> Result<two_factor_codes::Model> {
        self.two_factor_repo()
            .insert(user_id, code, expires_at, created_at)
            .await
    }

    pub async fn find_code(
        &self,
        user_id: i32,
        code: &str,
    ) -> Result<Option<two_factor_codes::Model>> {
        self.two_factor_repo().find(user_id, code).await
    }

    pub async fn delete_code(&self, id: i32) -> Result<()> {
        self.two_factor_repo().delete(id).await
    }

    pub async fn list_codes_for_user(&self, user_id: i32) -> Result<Vec<two_factor_codes::Model>> {
        self.two_factor_repo().list_for_user(user_id).await
    }

    // ========== Office location ==========

    pub async fn get_office(&self) -> Result<Option<locations::Model>> {
        self.location_repo().get_office().await
    }

    pub async fn update_office(
        &self,
        name: &str,
        latitude: f64,
        longitude: f64,
        radius_m: f64,
    ) -> Result<Option<locations::Model>> {
        self.location_repo()
            .update_office(name, latitude, longitude, radius_m)
            .await
    }

    // ========== Attendance ==========

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_attendance(
        &self,
        user_id: i32,
        location_id: i32,
        kind: &str,
        latitude: f64,
        longitude: f64,
        note: Option<&str>,
        recorded_at: &str,
    ) -> Result<attendance_records::Model> {
        self.attendance_repo()
            .insert(
                user_id,
                location_id,
                kind,
                latitude,
                longitude,
                note,
                recorded_at,
            )
            .await
    }

    pub async fn list_attendance(
        &self,
        user_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<attendance_records::Model>> {
        self.attendance_repo().list(user_id, limit).await
    }

    pub async fn count_attendance(&self) -> Result<u64> {
        self.attendance_repo().count().await
    }

    // ========== Notifications ==========

    pub async fn list_notifications(&self, limit: u64) -> Result<Vec<notifications::Model>> {
        self.notification_repo().list(limit).await
    }

    pub async fn create_notification(
        &self,
        title: &str,
        message: &str,
    ) -> Result<notifications::Model> {
        self.notification_repo().create(title, message).await
    }

    pub async fn delete_notification(&self, id: i32) -> Result<bool> {
        self.notification_repo().delete(id).await
    }
}
