use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One completed background-job execution. Immutable once written;
/// cleanup is an external retention concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedJob {
    pub id: String,
    pub job_type: String,
    pub job_key: String,
    pub processed_at: NaiveDateTime,
    pub success: bool,
    pub error_message: Option<String>,
    pub metadata: Option<Value>,
}

/// Input model for recording a job execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProcessedJob {
    pub job_type: String,
    pub job_key: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub metadata: Option<Value>,
}

impl NewProcessedJob {
    pub fn succeeded(job_type: &str, job_key: impl Into<String>) -> Self {
        Self {
            job_type: job_type.to_string(),
            job_key: job_key.into(),
            success: true,
            error_message: None,
            metadata: None,
        }
    }

    pub fn failed(job_type: &str, job_key: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            job_type: job_type.to_string(),
            job_key: job_key.into(),
            success: false,
            error_message: Some(error.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Overall condition derived from ledger staleness and queue backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// What the surrounding system's health endpoint reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub status: HealthStatus,
    pub last_successful_alert_run: Option<NaiveDateTime>,
    pub pending_emails: i64,
    pub failed_emails: i64,
}

/// Database model for processed jobs
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::processed_jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProcessedJobDB {
    pub id: String,
    pub job_type: String,
    pub job_key: String,
    pub processed_at: NaiveDateTime,
    pub success: bool,
    pub error_message: Option<String>,
    pub metadata: Option<String>,
}

impl From<ProcessedJobDB> for ProcessedJob {
    fn from(db: ProcessedJobDB) -> Self {
        let metadata = db
            .metadata
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok());
        Self {
            id: db.id,
            job_type: db.job_type,
            job_key: db.job_key,
            processed_at: db.processed_at,
            success: db.success,
            error_message: db.error_message,
            metadata,
        }
    }
}

impl From<NewProcessedJob> for ProcessedJobDB {
    fn from(domain: NewProcessedJob) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_type: domain.job_type,
            job_key: domain.job_key,
            processed_at: chrono::Utc::now().naive_utc(),
            success: domain.success,
            error_message: domain.error_message,
            metadata: domain.metadata.map(|m| m.to_string()),
        }
    }
}
