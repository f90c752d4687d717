use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::EMAIL_MAX_ATTEMPTS;
use crate::errors::{Error, Result, ValidationError};

/// Delivery state of a queued email.
///
/// `Pending → Processing → {Sent | Pending (retry) | Failed}`. `Cancelled`
/// is set externally on a `Pending` row and is never drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailStatus {
    Pending,
    Processing,
    Sent,
    Failed,
    Cancelled,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Pending => "PENDING",
            EmailStatus::Processing => "PROCESSING",
            EmailStatus::Sent => "SENT",
            EmailStatus::Failed => "FAILED",
            EmailStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal rows are retained for audit and never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EmailStatus::Sent | EmailStatus::Failed | EmailStatus::Cancelled
        )
    }
}

impl std::str::FromStr for EmailStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(EmailStatus::Pending),
            "PROCESSING" => Ok(EmailStatus::Processing),
            "SENT" => Ok(EmailStatus::Sent),
            "FAILED" => Ok(EmailStatus::Failed),
            "CANCELLED" => Ok(EmailStatus::Cancelled),
            other => Err(format!("Unknown email status: {}", other)),
        }
    }
}

impl std::fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model for a queued outbound email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailQueueEntry {
    pub id: String,
    pub to_email: String,
    pub subject: String,
    pub html_body: String,
    pub status: EmailStatus,
    pub attempt_count: i32,
    pub max_attempts: i32,
    pub last_attempt_at: Option<NaiveDateTime>,
    pub next_attempt_at: Option<NaiveDateTime>,
    pub sent_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for enqueuing a new email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmail {
    pub to_email: String,
    pub subject: String,
    pub html_body: String,
    pub idempotency_key: Option<String>,
}

impl NewEmail {
    /// Validates the new email data
    pub fn validate(&self) -> Result<()> {
        if self.to_email.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Recipient address cannot be empty".to_string(),
            )));
        }
        if self.subject.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Subject cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

/// Counters reported by one drain run
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainOutcome {
    pub processed: u32,
    pub sent: u32,
    pub retried: u32,
    pub failed: u32,
}

/// Database model for queued emails
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::email_queue)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EmailQueueDB {
    pub id: String,
    pub to_email: String,
    pub subject: String,
    pub html_body: String,
    pub status: String,
    pub attempt_count: i32,
    pub max_attempts: i32,
    pub last_attempt_at: Option<NaiveDateTime>,
    pub next_attempt_at: Option<NaiveDateTime>,
    pub sent_at: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<EmailQueueDB> for EmailQueueEntry {
    fn from(db: EmailQueueDB) -> Self {
        let status = db.status.parse().unwrap_or_else(|e| {
            log::warn!("{}", e);
            EmailStatus::Failed
        });
        Self {
            id: db.id,
            to_email: db.to_email,
            subject: db.subject,
            html_body: db.html_body,
            status,
            attempt_count: db.attempt_count,
            max_attempts: db.max_attempts,
            last_attempt_at: db.last_attempt_at,
            next_attempt_at: db.next_attempt_at,
            sent_at: db.sent_at,
            error_message: db.error_message,
            idempotency_key: db.idempotency_key,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewEmail> for EmailQueueDB {
    fn from(domain: NewEmail) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            to_email: domain.to_email,
            subject: domain.subject,
            html_body: domain.html_body,
            status: EmailStatus::Pending.as_str().to_string(),
            attempt_count: 0,
            max_attempts: EMAIL_MAX_ATTEMPTS,
            last_attempt_at: None,
            next_attempt_at: None,
            sent_at: None,
            error_message: None,
            idempotency_key: domain.idempotency_key,
            created_at: now,
            updated_at: now,
        }
    }
}
