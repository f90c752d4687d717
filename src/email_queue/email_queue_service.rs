use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{debug, warn};
use std::sync::Arc;

use crate::constants::EMAIL_RETRY_BASE_MINUTES;
use crate::errors::Result;

use super::email_queue_model::{DrainOutcome, EmailQueueEntry, EmailStatus, NewEmail};
use super::email_queue_traits::{EmailQueueRepositoryTrait, EmailQueueServiceTrait};
use super::mailer::Mailer;

/// Delay before attempt `attempt_count + 1`, doubling with each failure.
pub fn backoff_delay(attempt_count: i32) -> Duration {
    let exponent = (attempt_count - 1).max(0).min(16) as u32;
    Duration::minutes(EMAIL_RETRY_BASE_MINUTES * i64::from(2u32.pow(exponent)))
}

pub struct EmailQueueService {
    repository: Arc<dyn EmailQueueRepositoryTrait>,
    mailer: Arc<dyn Mailer>,
}

impl EmailQueueService {
    pub fn new(repository: Arc<dyn EmailQueueRepositoryTrait>, mailer: Arc<dyn Mailer>) -> Self {
        EmailQueueService { repository, mailer }
    }
}

#[async_trait]
impl EmailQueueServiceTrait for EmailQueueService {
    fn enqueue(&self, new_email: NewEmail) -> Result<EmailQueueEntry> {
        self.repository.enqueue(new_email)
    }

    async fn drain_due(&self, batch_size: i64) -> Result<DrainOutcome> {
        let now = Utc::now().naive_utc();
        let batch = self.repository.due_batch(batch_size, now)?;
        let mut outcome = DrainOutcome::default();

        for entry in batch {
            outcome.processed += 1;
            self.repository.mark_processing(&entry.id, now)?;

            match self
                .mailer
                .send(&entry.to_email, &entry.subject, &entry.html_body)
                .await
            {
                Ok(()) => {
                    self.repository
                        .mark_sent(&entry.id, Utc::now().naive_utc())?;
                    outcome.sent += 1;
                    debug!("Email {} sent to {}", entry.id, entry.to_email);
                }
                Err(e) => {
                    let attempts = entry.attempt_count + 1;
                    if attempts >= entry.max_attempts {
                        warn!(
                            "Email {} failed permanently after {} attempts: {}",
                            entry.id, attempts, e
                        );
                        self.repository
                            .mark_failed(&entry.id, attempts, &e.to_string())?;
                        outcome.failed += 1;
                    } else {
                        let retry_at = Utc::now().naive_utc() + backoff_delay(attempts);
                        warn!(
                            "Email {} attempt {} failed, retrying at {}: {}",
                            entry.id, attempts, retry_at, e
                        );
                        self.repository
                            .schedule_retry(&entry.id, attempts, &e.to_string(), retry_at)?;
                        outcome.retried += 1;
                    }
                }
            }
        }

        Ok(outcome)
    }

    fn count_by_status(&self, status: EmailStatus) -> Result<i64> {
        self.repository.count_by_status(status)
    }
}
