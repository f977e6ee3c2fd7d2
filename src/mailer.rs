//! Outbound email delivery.
//!
//! 2FA codes leave the system through the [`Mailer`] trait. The production
//! implementation posts to an HTTP mail relay; tests inject
//! [`MemoryMailer`] to capture the delivered code instead.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::config::MailConfig;

#[derive(Debug, Error)]
pub enum MailError {
    /// Delivery is impossible because no relay is configured. This is an
    /// operator problem, never a caller problem.
    #[error("mail relay is not configured")]
    NotConfigured,

    /// The relay was reachable in principle but delivery did not succeed
    /// (HTTP error, timeout, rejected recipient).
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: String,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Mailer that delivers through a JSON HTTP relay endpoint.
///
/// The request carries a bounded timeout; hitting it is reported as a
/// [`MailError::Delivery`], not swallowed.
pub struct HttpRelayMailer {
    config: MailConfig,
    client: reqwest::Client,
}

impl HttpRelayMailer {
    pub fn new(config: MailConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("Hadir/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build mail relay client: {e}"))?;

        Ok(Self { config, client })
    }

    fn from_header(&self) -> String {
        if self.config.from_name.is_empty() {
            self.config.from_address.clone()
        } else {
            format!("{} <{}>", self.config.from_name, self.config.from_address)
        }
    }
}

#[async_trait]
impl Mailer for HttpRelayMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if !self.config.enabled || self.config.relay_url.is_empty() {
            return Err(MailError::NotConfigured);
        }

        let message = RelayMessage {
            from: self.from_header(),
            to,
            subject,
            text: body,
        };

        let response = self
            .client
            .post(&self.config.relay_url)
            .bearer_auth(&self.config.api_token)
            .json(&message)
            .send()
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MailError::Delivery(format!(
                "relay returned {}",
                response.status()
            )));
        }

        tracing::debug!(to, subject, "Mail handed to relay");
        Ok(())
    }
}

/// A delivered message captured by [`MemoryMailer`].
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// In-memory mailer used by tests to observe delivered codes.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl MemoryMailer {
    #[must_use]
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<SentMail> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
