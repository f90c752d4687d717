use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::errors::Result;

use super::email_queue_model::{DrainOutcome, EmailQueueEntry, EmailStatus, NewEmail};

/// Trait defining the contract for email queue persistence.
pub trait EmailQueueRepositoryTrait: Send + Sync {
    /// Inserts a new `Pending` row, unless a non-terminal row with the same
    /// idempotency key already exists, in which case that row is returned
    /// and nothing is inserted.
    fn enqueue(&self, new_email: NewEmail) -> Result<EmailQueueEntry>;

    /// Up to `limit` `Pending` rows whose `next_attempt_at` is unset or due,
    /// with attempts remaining, oldest created first.
    fn due_batch(&self, limit: i64, now: NaiveDateTime) -> Result<Vec<EmailQueueEntry>>;

    /// Pending → Processing, stamping `last_attempt_at`.
    fn mark_processing(&self, id: &str, now: NaiveDateTime) -> Result<()>;

    /// Processing → Sent, stamping `sent_at`.
    fn mark_sent(&self, id: &str, now: NaiveDateTime) -> Result<()>;

    /// Processing → Pending with the attempt counted, the transport error
    /// recorded, and the next attempt scheduled.
    fn schedule_retry(
        &self,
        id: &str,
        attempt_count: i32,
        error: &str,
        next_attempt_at: NaiveDateTime,
    ) -> Result<()>;

    /// Processing → Failed, terminal.
    fn mark_failed(&self, id: &str, attempt_count: i32, error: &str) -> Result<()>;

    fn count_by_status(&self, status: EmailStatus) -> Result<i64>;
}

/// Trait defining the contract for email queue operations.
#[async_trait]
pub trait EmailQueueServiceTrait: Send + Sync {
    /// Queues an email for delivery, collapsing duplicates by idempotency key.
    fn enqueue(&self, new_email: NewEmail) -> Result<EmailQueueEntry>;

    /// Drains up to `batch_size` due entries through the transport,
    /// applying the retry/failed transitions. Transport errors never
    /// escape this call.
    async fn drain_due(&self, batch_size: i64) -> Result<DrainOutcome>;

    fn count_by_status(&self, status: EmailStatus) -> Result<i64>;
}
