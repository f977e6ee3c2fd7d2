//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::sync::Arc;

use crate::clock::Clock;
use crate::db::{Store, User};
use crate::mailer::Mailer;
use crate::services::auth_service::{AuthError, AuthService, PendingLogin, VerifiedLogin};

pub struct SeaOrmAuthService {
    store: Store,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    code_ttl: Duration,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        code_ttl_minutes: i64,
    ) -> Self {
        Self {
            store,
            mailer,
            clock,
            code_ttl: Duration::minutes(code_ttl_minutes),
        }
    }

    /// Uniform random 6-digit code; leading zeros allowed.
    fn generate_code() -> String {
        let n: u32 = rand::rng().random_range(0..1_000_000);
        format!("{n:06}")
    }

    /// Delete-then-insert, then deliver. The delete guarantees at most
    /// one active code per user; a concurrent issuance resolves
    /// last-write-wins.
    async fn issue_and_deliver(&self, user: &User) -> Result<(), AuthError> {
        let code = Self::generate_code();
        let now = self.clock.now();
        let expires_at = now + self.code_ttl;

        self.store.delete_codes_for_user(user.id).await?;
        self.store
            .insert_code(user.id, &code, &expires_at.to_rfc3339(), &now.to_rfc3339())
            .await?;

        let ttl_minutes = self.code_ttl.num_minutes();
        let body = format!(
            "Hello {},\n\nYour verification code is {code}. It expires in {ttl_minutes} minutes.\n\nIf you did not request this, you can ignore this message.",
            user.name
        );

        // A code the user never receives is useless, so delivery failure
        // fails the whole login. The stored row just ages out.
        self.mailer
            .send(&user.email, "Your Hadir verification code", &body)
            .await
            .map_err(|e| {
                tracing::error!(user_id = user.id, error = %e, "2FA code delivery failed");
                AuthError::from(e)
            })?;

        metrics::counter!("twofactor_codes_issued_total").increment(1);
        tracing::info!(user_id = user.id, "2FA code issued");

        Ok(())
    }

    fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, AuthError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AuthError::Internal(format!("Stored code has malformed expiry: {e}")))
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<PendingLogin, AuthError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let is_valid = self.store.verify_user_password(email, password).await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_and_deliver(&user).await?;

        Ok(PendingLogin {
            user_id: user.id,
            email: user.email,
        })
    }

    async fn resend_code(&self, user_id: i32) -> Result<PendingLogin, AuthError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.issue_and_deliver(&user).await?;

        Ok(PendingLogin {
            user_id: user.id,
            email: user.email,
        })
    }

    async fn verify_code(&self, user_id: i32, code: &str) -> Result<VerifiedLogin, AuthError> {
        let Some(row) = self.store.find_code(user_id, code).await? else {
            metrics::counter!("twofactor_verifications_failed_total").increment(1);
            return Err(AuthError::InvalidOrExpiredCode);
        };

        let expires_at = Self::parse_expiry(&row.expires_at)?;
        if self.clock.now() >= expires_at {
            metrics::counter!("twofactor_verifications_failed_total").increment(1);
            return Err(AuthError::InvalidOrExpiredCode);
        }

        // Single use: consume before reporting success so a replay of
        // the same code cannot pass a second time.
        self.store.delete_code(row.id).await?;

        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            // The user vanished between issuance and verification; keep
            // the rejection uniform.
            .ok_or(AuthError::InvalidOrExpiredCode)?;

        tracing::info!(user_id = user.id, "2FA verification succeeded");

        Ok(VerifiedLogin {
            user_id: user.id,
            email: user.email,
            name: user.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::FixedClock;
    use crate::mailer::{MailError, MemoryMailer};

    const SEED_EMAIL: &str = "admin@hadir.local";
    const SEED_PASSWORD: &str = "password";

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), MailError> {
            Err(MailError::Delivery("relay returned 502 Bad Gateway".into()))
        }
    }

    struct UnconfiguredMailer;

    #[async_trait]
    impl Mailer for UnconfiguredMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), MailError> {
            Err(MailError::NotConfigured)
        }
    }

    async fn setup() -> (SeaOrmAuthService, Store, Arc<MemoryMailer>, Arc<FixedClock>) {
        let store = Store::new("sqlite::memory:").await.expect("store");
        let mailer = Arc::new(MemoryMailer::default());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service = SeaOrmAuthService::new(store.clone(), mailer.clone(), clock.clone(), 5);
        (service, store, mailer, clock)
    }

    fn delivered_code(mailer: &MemoryMailer) -> String {
        let body = mailer.last().expect("a mail was sent").body;
        let start = body.find("code is ").expect("code marker") + "code is ".len();
        body[start..start + 6].to_string()
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_not_found() {
        let (service, _, _, _) = setup().await;
        let err = service.login("nobody@example.com", "whatever").await;
        assert!(matches!(err, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_rejected() {
        let (service, _, mailer, _) = setup().await;
        let err = service.login(SEED_EMAIL, "not-the-password").await;
        assert!(matches!(err, Err(AuthError::InvalidCredentials)));
        assert!(mailer.sent().is_empty(), "no code may leave on rejection");
    }

    #[tokio::test]
    async fn test_login_delivers_six_digit_code() {
        let (service, store, mailer, _) = setup().await;

        let pending = service.login(SEED_EMAIL, SEED_PASSWORD).await.unwrap();
        assert_eq!(pending.email, SEED_EMAIL);

        let mail = mailer.last().unwrap();
        assert_eq!(mail.to, SEED_EMAIL);

        let code = delivered_code(&mailer);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let rows = store.list_codes_for_user(pending.user_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, code);
    }

    #[tokio::test]
    async fn test_second_login_supersedes_first_code() {
        let (service, store, mailer, _) = setup().await;

        let pending = service.login(SEED_EMAIL, SEED_PASSWORD).await.unwrap();
        let first_code = delivered_code(&mailer);

        service.login(SEED_EMAIL, SEED_PASSWORD).await.unwrap();
        let second_code = delivered_code(&mailer);

        // Regardless of which issuance won, exactly one code survives.
        let rows = store.list_codes_for_user(pending.user_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, second_code);

        if first_code != second_code {
            let err = service.verify_code(pending.user_id, &first_code).await;
            assert!(matches!(err, Err(AuthError::InvalidOrExpiredCode)));
        }
        service
            .verify_code(pending.user_id, &second_code)
            .await
            .expect("latest code verifies");
    }

    #[tokio::test]
    async fn test_verify_consumes_code() {
        let (service, _, mailer, _) = setup().await;

        let pending = service.login(SEED_EMAIL, SEED_PASSWORD).await.unwrap();
        let code = delivered_code(&mailer);

        let verified = service.verify_code(pending.user_id, &code).await.unwrap();
        assert_eq!(verified.email, SEED_EMAIL);

        // Replay must fail.
        let err = service.verify_code(pending.user_id, &code).await;
        assert!(matches!(err, Err(AuthError::InvalidOrExpiredCode)));
    }

    #[tokio::test]
    async fn test_expired_code_never_verifies() {
        let (service, _, mailer, clock) = setup().await;

        let pending = service.login(SEED_EMAIL, SEED_PASSWORD).await.unwrap();
        let code = delivered_code(&mailer);

        clock.advance(Duration::minutes(6));

        let err = service.verify_code(pending.user_id, &code).await;
        assert!(matches!(err, Err(AuthError::InvalidOrExpiredCode)));
    }

    #[tokio::test]
    async fn test_wrong_code_is_rejected_uniformly() {
        let (service, _, mailer, _) = setup().await;

        let pending = service.login(SEED_EMAIL, SEED_PASSWORD).await.unwrap();
        let code = delivered_code(&mailer);
        let wrong = if code == "000000" { "000001" } else { "000000" };

        let err = service.verify_code(pending.user_id, wrong).await;
        assert!(matches!(err, Err(AuthError::InvalidOrExpiredCode)));
    }

    #[tokio::test]
    async fn test_resend_reissues_without_credentials() {
        let (service, store, mailer, _) = setup().await;

        let pending = service.login(SEED_EMAIL, SEED_PASSWORD).await.unwrap();
        let resent = service.resend_code(pending.user_id).await.unwrap();
        assert_eq!(resent.user_id, pending.user_id);
        assert_eq!(mailer.sent().len(), 2);

        let rows = store.list_codes_for_user(pending.user_id).await.unwrap();
        assert_eq!(rows.len(), 1);

        let err = service.resend_code(99_999).await;
        assert!(matches!(err, Err(AuthError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_delivery_failure_fails_the_login() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service =
            SeaOrmAuthService::new(store.clone(), Arc::new(FailingMailer), clock, 5);

        let err = service.login(SEED_EMAIL, SEED_PASSWORD).await;
        assert!(matches!(err, Err(AuthError::DeliveryFailed(_))));
    }

    #[tokio::test]
    async fn test_missing_relay_is_a_configuration_error() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let service =
            SeaOrmAuthService::new(store.clone(), Arc::new(UnconfiguredMailer), clock, 5);

        let err = service.login(SEED_EMAIL, SEED_PASSWORD).await;
        assert!(matches!(err, Err(AuthError::MailerNotConfigured)));
    }
}
