//! Domain service for login, 2FA code issuance and verification.
//!
//! Login alone is only *partial* authentication: the caller holds a
//! session only after the emailed code has been verified.

use serde::Serialize;
use thiserror::Error;

use crate::mailer::MailError;

/// Errors specific to authentication operations.
///
/// Auth rejections (`InvalidCredentials`, `InvalidOrExpiredCode`) are
/// deliberately unspecific so callers cannot learn which part failed;
/// infrastructure faults (`MailerNotConfigured`, `DeliveryFailed`) are
/// kept distinct because they are never the caller's fault.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired code")]
    InvalidOrExpiredCode,

    #[error("Mail relay is not configured")]
    MailerNotConfigured,

    #[error("Code delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<MailError> for AuthError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::NotConfigured => Self::MailerNotConfigured,
            MailError::Delivery(msg) => Self::DeliveryFailed(msg),
        }
    }
}

/// Result of a credential check plus code delivery. The account is not
/// authenticated yet; the code must still be verified.
#[derive(Debug, Clone, Serialize)]
pub struct PendingLogin {
    pub user_id: i32,
    pub email: String,
}

/// Result of successful 2FA verification.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedLogin {
    pub user_id: i32,
    pub email: String,
    pub name: String,
}

/// Domain service trait for the 2FA login flow.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Checks credentials, then issues and delivers a fresh 2FA code.
    ///
    /// # Errors
    ///
    /// [`AuthError::UserNotFound`] / [`AuthError::InvalidCredentials`] on
    /// rejection; [`AuthError::DeliveryFailed`] or
    /// [`AuthError::MailerNotConfigured`] when the code cannot reach the
    /// user, in which case the login did not complete.
    async fn login(&self, email: &str, password: &str) -> Result<PendingLogin, AuthError>;

    /// Re-issues a code for a known user id without re-checking
    /// credentials. Supersedes any previously issued code.
    async fn resend_code(&self, user_id: i32) -> Result<PendingLogin, AuthError>;

    /// Consumes a submitted code. Wrong, expired and absent codes are
    /// indistinguishable; a consumed code cannot be replayed.
    async fn verify_code(&self, user_id: i32, code: &str) -> Result<VerifiedLogin, AuthError>;
}
