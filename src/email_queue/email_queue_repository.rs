use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::{Error, Result};

use super::email_queue_model::{EmailQueueDB, EmailQueueEntry, EmailStatus, NewEmail};
use super::email_queue_traits::EmailQueueRepositoryTrait;

pub struct EmailQueueRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl EmailQueueRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        EmailQueueRepository { pool }
    }

    fn find_non_terminal_by_key(&self, key: &str) -> Result<Option<EmailQueueEntry>> {
        use crate::schema::email_queue::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        email_queue
            .filter(idempotency_key.eq(key))
            .filter(status.eq_any(vec![
                EmailStatus::Pending.as_str(),
                EmailStatus::Processing.as_str(),
            ]))
            .first::<EmailQueueDB>(&mut conn)
            .optional()
            .map(|row| row.map(EmailQueueEntry::from))
            .map_err(Error::from)
    }
}

impl EmailQueueRepositoryTrait for EmailQueueRepository {
    fn enqueue(&self, new_email: NewEmail) -> Result<EmailQueueEntry> {
        use crate::schema::email_queue;

        new_email.validate()?;

        // At most one non-terminal row per idempotency key.
        if let Some(key) = new_email.idempotency_key.as_deref() {
            if let Some(existing) = self.find_non_terminal_by_key(key)? {
                return Ok(existing);
            }
        }

        let row: EmailQueueDB = new_email.into();
        let mut conn = get_connection(&self.pool)?;
        diesel::insert_into(email_queue::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(Error::from)?;

        Ok(row.into())
    }

    fn due_batch(&self, limit: i64, now: NaiveDateTime) -> Result<Vec<EmailQueueEntry>> {
        use crate::schema::email_queue::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        email_queue
            .filter(status.eq(EmailStatus::Pending.as_str()))
            .filter(next_attempt_at.is_null().or(next_attempt_at.le(now)))
            .filter(attempt_count.lt(max_attempts))
            .order(created_at.asc())
            .limit(limit)
            .load::<EmailQueueDB>(&mut conn)
            .map(|rows| rows.into_iter().map(EmailQueueEntry::from).collect())
            .map_err(Error::from)
    }

    fn mark_processing(&self, entry_id: &str, now: NaiveDateTime) -> Result<()> {
        use crate::schema::email_queue::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        diesel::update(email_queue.find(entry_id))
            .set((
                status.eq(EmailStatus::Processing.as_str()),
                last_attempt_at.eq(Some(now)),
                updated_at.eq(now),
            ))
            .execute(&mut conn)
            .map_err(Error::from)
            .map(|_| ())
    }

    fn mark_sent(&self, entry_id: &str, now: NaiveDateTime) -> Result<()> {
        use crate::schema::email_queue::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        diesel::update(email_queue.find(entry_id))
            .set((
                status.eq(EmailStatus::Sent.as_str()),
                sent_at.eq(Some(now)),
                updated_at.eq(now),
            ))
            .execute(&mut conn)
            .map_err(Error::from)
            .map(|_| ())
    }

    fn schedule_retry(
        &self,
        entry_id: &str,
        attempts: i32,
        error: &str,
        retry_at: NaiveDateTime,
    ) -> Result<()> {
        use crate::schema::email_queue::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        diesel::update(email_queue.find(entry_id))
            .set((
                status.eq(EmailStatus::Pending.as_str()),
                attempt_count.eq(attempts),
                error_message.eq(Some(error)),
                next_attempt_at.eq(Some(retry_at)),
                updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(Error::from)
            .map(|_| ())
    }

    fn mark_failed(&self, entry_id: &str, attempts: i32, error: &str) -> Result<()> {
        use crate::schema::email_queue::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        diesel::update(email_queue.find(entry_id))
            .set((
                status.eq(EmailStatus::Failed.as_str()),
                attempt_count.eq(attempts),
                error_message.eq(Some(error)),
                updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(Error::from)
            .map(|_| ())
    }

    fn count_by_status(&self, for_status: EmailStatus) -> Result<i64> {
        use crate::schema::email_queue::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        email_queue
            .filter(status.eq(for_status.as_str()))
            .count()
            .get_result(&mut conn)
            .map_err(Error::from)
    }
}
