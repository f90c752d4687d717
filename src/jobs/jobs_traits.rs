use chrono::NaiveDateTime;

use crate::errors::Result;

use super::jobs_model::{HealthSummary, NewProcessedJob, ProcessedJob};

/// Trait defining the contract for the append-only job ledger store.
pub trait ProcessedJobRepositoryTrait: Send + Sync {
    fn record(&self, new_job: NewProcessedJob) -> Result<ProcessedJob>;

    /// Whether a successful execution is already on record for (type, key).
    fn has_succeeded(&self, job_type: &str, job_key: &str) -> Result<bool>;

    /// Timestamp of the most recent successful execution of a job type.
    fn last_successful_run(&self, job_type: &str) -> Result<Option<NaiveDateTime>>;
}

/// Trait defining the contract for job ledger operations.
pub trait JobLedgerServiceTrait: Send + Sync {
    fn record(&self, new_job: NewProcessedJob) -> Result<ProcessedJob>;
    fn has_succeeded(&self, job_type: &str, job_key: &str) -> Result<bool>;
    fn last_successful_run(&self, job_type: &str) -> Result<Option<NaiveDateTime>>;
    fn health_summary(&self) -> Result<HealthSummary>;
}
