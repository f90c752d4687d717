use chrono::{Datelike, NaiveDate, Utc};
use log::{debug, error, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use crate::accounts::{Account, AccountRepositoryTrait};
use crate::alerts::AlertConfigurationRepositoryTrait;
use crate::email_queue::{EmailQueueServiceTrait, NewEmail};
use crate::errors::Result;
use crate::users::UserDirectoryTrait;
use crate::utils::format_money;

use super::snapshots_model::{
    first_of_month, previous_month, MonthlySnapshot, SnapshotDispatchOutcome,
};
use super::snapshots_traits::{SnapshotRepositoryTrait, SnapshotServiceTrait};

pub struct SnapshotService {
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    config_repository: Arc<dyn AlertConfigurationRepositoryTrait>,
    queue: Arc<dyn EmailQueueServiceTrait>,
    users: Arc<dyn UserDirectoryTrait>,
}

impl SnapshotService {
    pub fn new(
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        config_repository: Arc<dyn AlertConfigurationRepositoryTrait>,
        queue: Arc<dyn EmailQueueServiceTrait>,
        users: Arc<dyn UserDirectoryTrait>,
    ) -> Self {
        SnapshotService {
            snapshot_repository,
            account_repository,
            config_repository,
            queue,
            users,
        }
    }

    /// The single account whose balance moved the most, in absolute terms,
    /// during the snapshot month.
    fn biggest_contributor(
        &self,
        accounts: &[Account],
        month: NaiveDate,
    ) -> Result<Option<(String, Decimal)>> {
        let period_end = next_month(month);
        let mut best: Option<(String, Decimal)> = None;

        for account in accounts {
            let history = self.account_repository.balance_history(&account.id)?;
            let in_period: Vec<_> = history
                .iter()
                .filter(|r| r.recorded_at.date() >= month && r.recorded_at.date() < period_end)
                .collect();
            if in_period.len() < 2 {
                continue;
            }
            let delta = in_period.last().unwrap().balance - in_period.first().unwrap().balance;
            let larger = best
                .as_ref()
                .map(|(_, d)| delta.abs() > d.abs())
                .unwrap_or(true);
            if larger && !delta.is_zero() {
                best = Some((account.name.clone(), delta));
            }
        }

        Ok(best)
    }

    fn dispatch_snapshot(
        &self,
        snapshot: &MonthlySnapshot,
        outcome: &mut SnapshotDispatchOutcome,
    ) -> Result<()> {
        let config = self.config_repository.get_or_create(&snapshot.user_id)?;

        if !config.monthly_snapshot_enabled {
            // Clears the backlog entry without ever notifying the user.
            self.snapshot_repository
                .mark_email_handled(&snapshot.id, None)?;
            outcome.suppressed += 1;
            return Ok(());
        }

        let Some(to_email) = self.users.email_for_user(&snapshot.user_id)? else {
            warn!(
                "Snapshot {} has no deliverable address for user {}; suppressing",
                snapshot.id, snapshot.user_id
            );
            self.snapshot_repository
                .mark_email_handled(&snapshot.id, None)?;
            outcome.suppressed += 1;
            return Ok(());
        };

        let (subject, html_body) = build_snapshot_email(snapshot);
        self.queue.enqueue(NewEmail {
            to_email,
            subject,
            html_body,
            idempotency_key: Some(format!(
                "monthly-snapshot:{}:{}",
                snapshot.user_id,
                snapshot.month.format("%Y-%m")
            )),
        })?;

        let now = Utc::now().naive_utc();
        self.snapshot_repository
            .mark_email_handled(&snapshot.id, Some(now))?;

        let mut config = config;
        config.last_monthly_snapshot_sent_at = Some(now);
        self.config_repository.update(&config)?;

        outcome.enqueued += 1;
        Ok(())
    }
}

impl SnapshotServiceTrait for SnapshotService {
    fn generate_monthly_snapshot(
        &self,
        user_id: &str,
        month: NaiveDate,
    ) -> Result<Option<MonthlySnapshot>> {
        let month = first_of_month(month);

        if let Some(existing) = self
            .snapshot_repository
            .get_by_user_and_month(user_id, month)?
        {
            debug!("Snapshot for user {} month {} already exists", user_id, month);
            return Ok(Some(existing));
        }

        let accounts = self.account_repository.accounts_for_user(user_id)?;
        let active: Vec<Account> = accounts.into_iter().filter(|a| a.is_active).collect();
        if active.is_empty() {
            return Ok(None);
        }

        // Totals reflect balances at generation time, not a historical
        // reconstruction of the month in question.
        let total_assets: Decimal = active
            .iter()
            .filter(|a| !a.category.is_liability())
            .map(|a| a.current_balance)
            .sum();
        let total_liabilities: Decimal = active
            .iter()
            .filter(|a| a.category.is_liability())
            .map(|a| a.current_balance)
            .sum();
        let net_worth = total_assets - total_liabilities;

        let previous = self
            .snapshot_repository
            .get_by_user_and_month(user_id, previous_month(month))?;

        let (net_worth_delta, net_worth_delta_percent) = match &previous {
            Some(prev) => {
                let delta = net_worth - prev.net_worth;
                let percent = if prev.net_worth.is_zero() {
                    None
                } else {
                    Some(delta / prev.net_worth.abs() * dec!(100))
                };
                (Some(delta), percent)
            }
            None => (None, None),
        };

        let contributor = self.biggest_contributor(&active, month)?;

        let interpretation = build_interpretation(
            month,
            net_worth,
            net_worth_delta,
            net_worth_delta_percent,
            contributor.as_ref(),
        );

        let snapshot = MonthlySnapshot {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            month,
            net_worth,
            total_assets,
            total_liabilities,
            net_worth_delta,
            net_worth_delta_percent,
            biggest_contributor_name: contributor.as_ref().map(|(name, _)| name.clone()),
            biggest_contributor_delta: contributor.as_ref().map(|(_, delta)| *delta),
            biggest_contributor_positive: contributor
                .as_ref()
                .map(|(_, delta)| *delta >= Decimal::ZERO),
            interpretation,
            email_sent: false,
            email_sent_at: None,
            created_at: Utc::now().naive_utc(),
        };

        self.snapshot_repository.insert(&snapshot).map(Some)
    }

    fn send_pending_snapshot_emails(&self) -> Result<SnapshotDispatchOutcome> {
        let unsent = self.snapshot_repository.list_unsent()?;
        let mut outcome = SnapshotDispatchOutcome::default();

        for snapshot in unsent {
            outcome.processed += 1;
            if let Err(e) = self.dispatch_snapshot(&snapshot, &mut outcome) {
                error!(
                    "Dispatching snapshot {} for user {} failed: {}",
                    snapshot.id, snapshot.user_id, e
                );
            }
        }

        Ok(outcome)
    }
}

/// First day of the month immediately after `month`.
fn next_month(month: NaiveDate) -> NaiveDate {
    if month.month() == 12 {
        NaiveDate::from_ymd_opt(month.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(month.year(), month.month() + 1, 1).unwrap()
    }
}

fn build_interpretation(
    month: NaiveDate,
    net_worth: Decimal,
    delta: Option<Decimal>,
    delta_percent: Option<Decimal>,
    contributor: Option<&(String, Decimal)>,
) -> String {
    let month_name = month.format("%B %Y");

    let movement = match (delta, delta_percent) {
        (Some(d), Some(pct)) if !d.is_zero() => {
            let direction = if d > Decimal::ZERO { "grew" } else { "fell" };
            format!(
                "your net worth {} {:.1}% ({}) from the previous month",
                direction,
                pct.abs().round_dp(1),
                format_money(d.abs())
            )
        }
        (Some(d), None) if !d.is_zero() => {
            let direction = if d > Decimal::ZERO { "grew" } else { "fell" };
            format!(
                "your net worth {} by {} from the previous month",
                direction,
                format_money(d.abs())
            )
        }
        (Some(_), _) => "your net worth held steady from the previous month".to_string(),
        (None, _) => format!(
            "your first snapshot puts your net worth at {}",
            format_money(net_worth)
        ),
    };

    match contributor {
        Some((name, contributor_delta)) => {
            let verb = if *contributor_delta >= Decimal::ZERO {
                "adding"
            } else {
                "subtracting"
            };
            format!(
                "In {}, {}, with {} {} the most ({}).",
                month_name,
                movement,
                name,
                verb,
                format_money(contributor_delta.abs())
            )
        }
        None => format!("In {}, {}.", month_name, movement),
    }
}

fn build_snapshot_email(snapshot: &MonthlySnapshot) -> (String, String) {
    let subject = format!(
        "Your {} financial snapshot",
        snapshot.month.format("%B %Y")
    );

    let delta_line = match (snapshot.net_worth_delta, snapshot.net_worth_delta_percent) {
        (Some(delta), Some(pct)) => format!(
            "<p>Change vs. last month: <strong>{}{} ({:.1}%)</strong></p>",
            if delta >= Decimal::ZERO { "+" } else { "-" },
            format_money(delta.abs()),
            pct.round_dp(1)
        ),
        (Some(delta), None) => format!(
            "<p>Change vs. last month: <strong>{}{}</strong></p>",
            if delta >= Decimal::ZERO { "+" } else { "-" },
            format_money(delta.abs())
        ),
        _ => String::new(),
    };

    let html_body = format!(
        "<h2>{} snapshot</h2>\
         <p>Net worth: <strong>{}</strong></p>\
         <p>Assets: {} &middot; Liabilities: {}</p>\
         {}\
         <p>{}</p>\
         <p style=\"color:#6b7280;font-size:12px\">You receive this summary once a month. You can turn it off in your notification settings.</p>",
        snapshot.month.format("%B %Y"),
        format_money(snapshot.net_worth),
        format_money(snapshot.total_assets),
        format_money(snapshot.total_liabilities),
        delta_line,
        snapshot.interpretation,
    );

    (subject, html_body)
}
