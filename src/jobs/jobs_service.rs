use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::constants::{JOB_TYPE_ALERT_PROCESSING, SCHEDULER_TICK_SECS};
use crate::email_queue::{EmailQueueRepositoryTrait, EmailStatus};
use crate::errors::Result;

use super::jobs_model::{HealthStatus, HealthSummary, NewProcessedJob, ProcessedJob};
use super::jobs_traits::{JobLedgerServiceTrait, ProcessedJobRepositoryTrait};

/// Pending entries beyond this are treated as backlog growth.
const PENDING_BACKLOG_THRESHOLD: i64 = 100;

pub struct JobLedgerService {
    job_repository: Arc<dyn ProcessedJobRepositoryTrait>,
    queue_repository: Arc<dyn EmailQueueRepositoryTrait>,
}

impl JobLedgerService {
    pub fn new(
        job_repository: Arc<dyn ProcessedJobRepositoryTrait>,
        queue_repository: Arc<dyn EmailQueueRepositoryTrait>,
    ) -> Self {
        JobLedgerService {
            job_repository,
            queue_repository,
        }
    }
}

impl JobLedgerServiceTrait for JobLedgerService {
    fn record(&self, new_job: NewProcessedJob) -> Result<ProcessedJob> {
        self.job_repository.record(new_job)
    }

    fn has_succeeded(&self, job_type: &str, job_key: &str) -> Result<bool> {
        self.job_repository.has_succeeded(job_type, job_key)
    }

    fn last_successful_run(&self, job_type: &str) -> Result<Option<chrono::NaiveDateTime>> {
        self.job_repository.last_successful_run(job_type)
    }

    fn health_summary(&self) -> Result<HealthSummary> {
        let last_alert_run = self
            .job_repository
            .last_successful_run(JOB_TYPE_ALERT_PROCESSING)?;
        let pending = self.queue_repository.count_by_status(EmailStatus::Pending)?;
        let failed = self.queue_repository.count_by_status(EmailStatus::Failed)?;

        let stale_after = Duration::seconds(2 * SCHEDULER_TICK_SECS as i64);
        let now = Utc::now().naive_utc();

        let status = match last_alert_run {
            Some(at) if now - at > stale_after => HealthStatus::Unhealthy,
            None => HealthStatus::Degraded,
            Some(_) if failed > 0 || pending > PENDING_BACKLOG_THRESHOLD => {
                HealthStatus::Degraded
            }
            Some(_) => HealthStatus::Healthy,
        };

        Ok(HealthSummary {
            status,
            last_successful_alert_run: last_alert_run,
            pending_emails: pending,
            failed_emails: failed,
        })
    }
}
