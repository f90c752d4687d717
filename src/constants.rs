/// Job ledger type for the per-tick alert evaluation run
pub const JOB_TYPE_ALERT_PROCESSING: &str = "alert-processing";

/// Job ledger type for monthly snapshot generation (one entry per user)
pub const JOB_TYPE_MONTHLY_SNAPSHOT: &str = "monthly-snapshot";

/// Job ledger type for the pending-snapshot email dispatch run
pub const JOB_TYPE_SNAPSHOT_EMAIL: &str = "snapshot-email";

/// Job ledger type for the queue drain run
pub const JOB_TYPE_EMAIL_QUEUE_PROCESSING: &str = "email-queue-processing";

/// Default net-worth change threshold for freshly created configurations, in percent
pub const DEFAULT_NET_WORTH_THRESHOLD_PERCENT: &str = "5";

/// Default cash-runway alert threshold for freshly created configurations, in months
pub const DEFAULT_CASH_RUNWAY_MONTHS: i32 = 3;

/// Maximum notifications queued by a single alert evaluation run
pub const MAX_ALERTS_PER_RUN: u32 = 5;

/// Delivery attempts before a queue entry is parked as failed
pub const EMAIL_MAX_ATTEMPTS: i32 = 3;

/// Base delay for the exponential retry backoff, in minutes
pub const EMAIL_RETRY_BASE_MINUTES: i64 = 15;

/// Queue entries drained per scheduler tick
pub const EMAIL_DRAIN_BATCH_SIZE: i64 = 20;

/// Scheduler tick interval, in seconds
pub const SCHEDULER_TICK_SECS: u64 = 3600;

/// Trailing window used to estimate monthly burn from balance history, in days
pub const BURN_RATE_WINDOW_DAYS: i64 = 90;

/// Monthly snapshots are generated on the 1st before this UTC hour
pub const SNAPSHOT_GENERATION_CUTOFF_HOUR: u32 = 6;
