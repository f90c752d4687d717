use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::Result;

use super::snapshots_model::{MonthlySnapshot, SnapshotDispatchOutcome};

/// Trait defining the contract for monthly snapshot persistence.
pub trait SnapshotRepositoryTrait: Send + Sync {
    fn get_by_user_and_month(
        &self,
        user_id: &str,
        month: NaiveDate,
    ) -> Result<Option<MonthlySnapshot>>;

    fn insert(&self, snapshot: &MonthlySnapshot) -> Result<MonthlySnapshot>;

    /// Snapshots whose email has not been handled yet, oldest month first.
    fn list_unsent(&self) -> Result<Vec<MonthlySnapshot>>;

    /// Marks the snapshot's email handled. `email_sent_at = None` records a
    /// suppressed (never-sent) snapshot; `Some` records a real dispatch.
    fn mark_email_handled(&self, id: &str, email_sent_at: Option<NaiveDateTime>) -> Result<()>;
}

/// Trait defining the contract for the snapshot engine.
pub trait SnapshotServiceTrait: Send + Sync {
    /// Computes and persists the snapshot for (user, month), normalizing
    /// `month` to its first day. Returns the existing row unchanged when
    /// one is already on record, and `None` for a user with no accounts.
    fn generate_monthly_snapshot(
        &self,
        user_id: &str,
        month: NaiveDate,
    ) -> Result<Option<MonthlySnapshot>>;

    /// Queues an email for every unsent snapshot whose owner has the
    /// monthly email enabled, and marks suppressed ones handled without
    /// sending. A processed snapshot is never retried by this step.
    fn send_pending_snapshot_emails(&self) -> Result<SnapshotDispatchOutcome>;
}
