use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use crate::alerts::{AlertConfigurationRepositoryTrait, AlertServiceTrait};
use crate::constants::{
    EMAIL_DRAIN_BATCH_SIZE, JOB_TYPE_ALERT_PROCESSING, JOB_TYPE_EMAIL_QUEUE_PROCESSING,
    JOB_TYPE_MONTHLY_SNAPSHOT, JOB_TYPE_SNAPSHOT_EMAIL, SCHEDULER_TICK_SECS,
    SNAPSHOT_GENERATION_CUTOFF_HOUR,
};
use crate::email_queue::{EmailQueueServiceTrait, Mailer};
use crate::jobs::{JobLedgerServiceTrait, NewProcessedJob};
use crate::snapshots::{previous_month, SnapshotServiceTrait};

/// Monthly snapshots are generated on the 1st, in the early-morning window
/// before users start reading email.
pub fn is_snapshot_generation_window(now: NaiveDateTime) -> bool {
    now.day() == 1 && now.hour() < SNAPSHOT_GENERATION_CUTOFF_HOUR
}

/// The single cooperative loop driving the whole engine: one tick runs
/// alert evaluation, then pending-snapshot dispatch, then (on the 1st)
/// monthly snapshot generation, then the queue drain. Nothing inside a
/// tick is allowed to stop the loop.
pub struct AlertScheduler {
    alert_service: Arc<dyn AlertServiceTrait>,
    snapshot_service: Arc<dyn SnapshotServiceTrait>,
    queue_service: Arc<dyn EmailQueueServiceTrait>,
    config_repository: Arc<dyn AlertConfigurationRepositoryTrait>,
    job_ledger: Arc<dyn JobLedgerServiceTrait>,
    mailer: Arc<dyn Mailer>,
    tick_interval: std::time::Duration,
    is_running: Arc<RwLock<bool>>,
    shutdown: Arc<Notify>,
}

impl AlertScheduler {
    pub fn new(
        alert_service: Arc<dyn AlertServiceTrait>,
        snapshot_service: Arc<dyn SnapshotServiceTrait>,
        queue_service: Arc<dyn EmailQueueServiceTrait>,
        config_repository: Arc<dyn AlertConfigurationRepositoryTrait>,
        job_ledger: Arc<dyn JobLedgerServiceTrait>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        AlertScheduler {
            alert_service,
            snapshot_service,
            queue_service,
            config_repository,
            job_ledger,
            mailer,
            tick_interval: std::time::Duration::from_secs(SCHEDULER_TICK_SECS),
            is_running: Arc::new(RwLock::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn with_tick_interval(mut self, interval: std::time::Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Spawns the loop. Returns immediately; the loop runs until `stop`.
    pub async fn start(self: Arc<Self>) {
        {
            let mut is_running = self.is_running.write().await;
            if *is_running {
                return; // Already running
            }
            *is_running = true;
        }

        info!(
            "Starting alert scheduler with a {}s tick",
            self.tick_interval.as_secs()
        );

        let scheduler = self;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.tick_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = scheduler.shutdown.notified() => break,
                }
                if !*scheduler.is_running.read().await {
                    break;
                }
                scheduler.run_tick().await;
            }
            *scheduler.is_running.write().await = false;
            info!("Alert scheduler stopped");
        });
    }

    /// Signals the loop to exit. The wait is interrupted; an in-flight
    /// tick finishes on its own.
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        self.shutdown.notify_one();
    }

    /// One pass of the tick body. Every stage isolates its own failures.
    pub async fn run_tick(&self) {
        if !self.mailer.is_configured() {
            // Deliberate kill switch: no alerts, no dispatch, no snapshots.
            debug!("Mail transport not configured; skipping scheduler tick");
            return;
        }

        let tick_key = Utc::now().format("%Y-%m-%dT%H").to_string();

        match self.alert_service.evaluate_and_send_alerts() {
            Ok(outcome) => {
                debug!(
                    "Alert evaluation: {} evaluated, {} sent",
                    outcome.evaluated, outcome.alerts_sent
                );
                self.record_outcome(
                    NewProcessedJob::succeeded(JOB_TYPE_ALERT_PROCESSING, &tick_key)
                        .with_metadata(serde_json::json!(outcome)),
                );
            }
            Err(e) => {
                error!("Alert evaluation failed: {}", e);
                self.record_outcome(NewProcessedJob::failed(
                    JOB_TYPE_ALERT_PROCESSING,
                    &tick_key,
                    e.to_string(),
                ));
            }
        }

        match self.snapshot_service.send_pending_snapshot_emails() {
            Ok(outcome) => {
                debug!(
                    "Snapshot dispatch: {} processed, {} enqueued, {} suppressed",
                    outcome.processed, outcome.enqueued, outcome.suppressed
                );
                self.record_outcome(
                    NewProcessedJob::succeeded(JOB_TYPE_SNAPSHOT_EMAIL, &tick_key)
                        .with_metadata(serde_json::json!(outcome)),
                );
            }
            Err(e) => {
                error!("Snapshot email dispatch failed: {}", e);
                self.record_outcome(NewProcessedJob::failed(
                    JOB_TYPE_SNAPSHOT_EMAIL,
                    &tick_key,
                    e.to_string(),
                ));
            }
        }

        let now = Utc::now().naive_utc();
        if is_snapshot_generation_window(now) {
            self.generate_monthly_snapshots(now.date());
        }

        match self.queue_service.drain_due(EMAIL_DRAIN_BATCH_SIZE).await {
            Ok(outcome) => {
                if outcome.processed > 0 {
                    info!(
                        "Queue drain: {} processed, {} sent, {} retried, {} failed",
                        outcome.processed, outcome.sent, outcome.retried, outcome.failed
                    );
                }
                self.record_outcome(
                    NewProcessedJob::succeeded(JOB_TYPE_EMAIL_QUEUE_PROCESSING, &tick_key)
                        .with_metadata(serde_json::json!(outcome)),
                );
            }
            Err(e) => {
                error!("Queue drain failed: {}", e);
                self.record_outcome(NewProcessedJob::failed(
                    JOB_TYPE_EMAIL_QUEUE_PROCESSING,
                    &tick_key,
                    e.to_string(),
                ));
            }
        }
    }

    /// Generates the previous month's snapshot for every snapshot-enabled
    /// user, consulting the job ledger so a completed user is not redone,
    /// and isolating per-user failures.
    pub fn generate_monthly_snapshots(&self, today: NaiveDate) {
        let target_month = previous_month(today);

        let configs = match self.config_repository.list_snapshot_enabled() {
            Ok(configs) => configs,
            Err(e) => {
                error!("Listing snapshot-enabled configurations failed: {}", e);
                return;
            }
        };

        for config in configs {
            let job_key = format!("{}:{}", config.user_id, target_month.format("%Y-%m"));

            match self
                .job_ledger
                .has_succeeded(JOB_TYPE_MONTHLY_SNAPSHOT, &job_key)
            {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    error!("Job ledger lookup failed for {}: {}", job_key, e);
                    continue;
                }
            }

            match self
                .snapshot_service
                .generate_monthly_snapshot(&config.user_id, target_month)
            {
                Ok(Some(snapshot)) => {
                    debug!(
                        "Generated snapshot {} for user {}",
                        snapshot.id, config.user_id
                    );
                    self.record_outcome(NewProcessedJob::succeeded(
                        JOB_TYPE_MONTHLY_SNAPSHOT,
                        &job_key,
                    ));
                }
                Ok(None) => {
                    // No accounts, nothing to snapshot; done for this month.
                    self.record_outcome(
                        NewProcessedJob::succeeded(JOB_TYPE_MONTHLY_SNAPSHOT, &job_key)
                            .with_metadata(serde_json::json!({ "skipped": "no accounts" })),
                    );
                }
                Err(e) => {
                    error!(
                        "Monthly snapshot generation failed for user {}: {}",
                        config.user_id, e
                    );
                    self.record_outcome(NewProcessedJob::failed(
                        JOB_TYPE_MONTHLY_SNAPSHOT,
                        &job_key,
                        e.to_string(),
                    ));
                }
            }
        }
    }

    fn record_outcome(&self, job: NewProcessedJob) {
        if let Err(e) = self.job_ledger.record(job) {
            error!("Recording job ledger entry failed: {}", e);
        }
    }
}
