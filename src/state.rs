use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::Store;
use crate::mailer::{HttpRelayMailer, Mailer};
use crate::services::{
    AttendanceService, AuthService, SeaOrmAttendanceService, SeaOrmAuthService,
};

/// Explicitly constructed dependencies shared by every request handler.
/// Collaborators (store, mailer, clock) are passed in rather than kept
/// as globals so tests can swap them for fakes.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub mailer: Arc<dyn Mailer>,

    pub clock: Arc<dyn Clock>,

    pub auth_service: Arc<dyn AuthService>,

    pub attendance_service: Arc<dyn AttendanceService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer: Arc<dyn Mailer> = Arc::new(HttpRelayMailer::new(config.mail.clone())?);
        Self::with_mailer(config, mailer).await
    }

    /// Like [`Self::new`] but with an injected mailer; tests use this to
    /// capture delivered codes instead of hitting a relay.
    pub async fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            mailer.clone(),
            clock.clone(),
            config.two_factor.code_ttl_minutes,
        )) as Arc<dyn AuthService>;

        let attendance_service = Arc::new(SeaOrmAttendanceService::new(
            store.clone(),
            clock.clone(),
        )) as Arc<dyn AttendanceService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            mailer,
            clock,
            auth_service,
            attendance_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
