use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

/// Custom error type for mail transport operations
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Mail transport is not configured")]
    NotConfigured,
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Request error: {0}")]
    RequestError(String),
}

/// Connection settings for the HTTP email provider.
#[derive(Debug, Clone, Default)]
pub struct MailerConfig {
    pub api_url: String,
    pub api_token: String,
    pub from_email: String,
    pub from_name: String,
}

impl MailerConfig {
    /// Reads provider settings from the environment. Missing values leave
    /// the transport unconfigured, which the scheduler treats as a
    /// deliberate kill switch rather than an error.
    pub fn from_env() -> Self {
        MailerConfig {
            api_url: std::env::var("MAILER_API_URL").unwrap_or_default(),
            api_token: std::env::var("MAILER_API_TOKEN").unwrap_or_default(),
            from_email: std::env::var("MAILER_FROM_EMAIL").unwrap_or_default(),
            from_name: std::env::var("MAILER_FROM_NAME")
                .unwrap_or_else(|_| "MoneyPulse".to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_url.trim().is_empty()
            && !self.api_token.trim().is_empty()
            && !self.from_email.trim().is_empty()
    }
}

/// Outbound transport contract. The engine never talks to a wire protocol
/// directly; everything goes through the queue, and the queue goes through
/// this trait.
#[async_trait]
pub trait Mailer: Send + Sync {
    fn is_configured(&self) -> bool;
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> std::result::Result<(), MailerError>;
}

/// Mailer backed by an HTTP email provider (JSON POST, bearer token).
pub struct HttpMailer {
    client: Client,
    config: MailerConfig,
}

impl HttpMailer {
    pub fn new(config: MailerConfig) -> Self {
        let client = Client::new();
        HttpMailer { client, config }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> std::result::Result<(), MailerError> {
        if !self.is_configured() {
            return Err(MailerError::NotConfigured);
        }

        let payload = json!({
            "from": {
                "email": self.config.from_email,
                "name": self.config.from_name,
            },
            "to": [{ "email": to }],
            "subject": subject,
            "html": html_body,
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailerError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MailerError::ProviderError(format!(
                "Email provider error: {}",
                error_body
            )));
        }

        Ok(())
    }
}
