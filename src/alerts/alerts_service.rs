use chrono::{Duration, Utc};
use log::{debug, error, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use crate::accounts::{Account, AccountRepositoryTrait};
use crate::constants::{BURN_RATE_WINDOW_DAYS, MAX_ALERTS_PER_RUN};
use crate::email_queue::{EmailQueueServiceTrait, NewEmail};
use crate::errors::Result;
use crate::users::UserDirectoryTrait;
use crate::utils::format_money;

use super::alerts_model::{AlertConfiguration, AlertRunOutcome};
use super::alerts_traits::{AlertConfigurationRepositoryTrait, AlertServiceTrait};

pub struct AlertService {
    config_repository: Arc<dyn AlertConfigurationRepositoryTrait>,
    account_repository: Arc<dyn AccountRepositoryTrait>,
    queue: Arc<dyn EmailQueueServiceTrait>,
    users: Arc<dyn UserDirectoryTrait>,
}

impl AlertService {
    pub fn new(
        config_repository: Arc<dyn AlertConfigurationRepositoryTrait>,
        account_repository: Arc<dyn AccountRepositoryTrait>,
        queue: Arc<dyn EmailQueueServiceTrait>,
        users: Arc<dyn UserDirectoryTrait>,
    ) -> Self {
        AlertService {
            config_repository,
            account_repository,
            queue,
            users,
        }
    }

    fn evaluate_user(&self, config: &AlertConfiguration, remaining: &mut u32) -> Result<()> {
        let accounts = self.account_repository.accounts_for_user(&config.user_id)?;
        let active: Vec<Account> = accounts.into_iter().filter(|a| a.is_active).collect();
        if active.is_empty() {
            // Nothing to evaluate, nothing to mutate.
            return Ok(());
        }

        let current_net_worth = net_worth(&active);

        let mut config = config.clone();
        self.check_net_worth_change(&mut config, current_net_worth, remaining)?;
        self.check_cash_runway(&mut config, &active, remaining)?;
        Ok(())
    }

    fn check_net_worth_change(
        &self,
        config: &mut AlertConfiguration,
        current_net_worth: Decimal,
        remaining: &mut u32,
    ) -> Result<()> {
        let threshold = config.net_worth_change_threshold_percent;
        if threshold <= Decimal::ZERO {
            return Ok(());
        }

        let baseline = match config.last_alerted_net_worth {
            // A zero baseline cannot anchor a percent change; start over.
            Some(b) if !b.is_zero() => b,
            _ => {
                config.last_alerted_net_worth = Some(current_net_worth);
                self.config_repository.update(config)?;
                debug!(
                    "Established net-worth baseline {} for user {}",
                    current_net_worth, config.user_id
                );
                return Ok(());
            }
        };

        let percent_change = ((current_net_worth - baseline).abs() / baseline.abs()) * dec!(100);
        if percent_change < threshold {
            return Ok(());
        }
        if *remaining == 0 {
            // Over the per-run cap; thresholds are re-evaluated fresh next tick.
            return Ok(());
        }

        let Some(to_email) = self.users.email_for_user(&config.user_id)? else {
            warn!(
                "User {} qualifies for a net-worth alert but has no email address",
                config.user_id
            );
            return Ok(());
        };

        let (subject, html_body) =
            build_net_worth_email(current_net_worth, baseline, percent_change);
        let now = Utc::now().naive_utc();
        self.queue.enqueue(NewEmail {
            to_email,
            subject,
            html_body,
            idempotency_key: Some(format!(
                "net-worth:{}:{}",
                config.user_id,
                now.format("%Y-%m-%d")
            )),
        })?;

        // Only after a successful enqueue does the new baseline stick.
        config.last_alerted_net_worth = Some(current_net_worth);
        config.last_net_worth_alert_sent_at = Some(now);
        self.config_repository.update(config)?;
        *remaining -= 1;
        Ok(())
    }

    fn check_cash_runway(
        &self,
        config: &mut AlertConfiguration,
        accounts: &[Account],
        remaining: &mut u32,
    ) -> Result<()> {
        if config.cash_runway_months <= 0 {
            return Ok(());
        }

        let liquid: Vec<&Account> = accounts.iter().filter(|a| a.category.is_liquid()).collect();
        if liquid.is_empty() {
            return Ok(());
        }

        let liquid_balance: Decimal = liquid.iter().map(|a| a.current_balance).sum();
        let monthly_burn = self.estimate_monthly_burn(&liquid)?;

        if monthly_burn <= Decimal::ZERO {
            // Balances are flat or growing: runway is infinite.
            self.reset_runway_dedup(config)?;
            return Ok(());
        }

        let runway_months = liquid_balance / monthly_burn;
        let threshold = Decimal::from(config.cash_runway_months);

        if runway_months >= threshold {
            self.reset_runway_dedup(config)?;
            return Ok(());
        }
        if config.last_cash_runway_alert_sent_at.is_some() {
            // Already alerted for this dip; wait for recovery before re-arming.
            return Ok(());
        }
        if *remaining == 0 {
            return Ok(());
        }

        let Some(to_email) = self.users.email_for_user(&config.user_id)? else {
            warn!(
                "User {} qualifies for a cash-runway alert but has no email address",
                config.user_id
            );
            return Ok(());
        };

        let (subject, html_body) =
            build_cash_runway_email(liquid_balance, monthly_burn, runway_months, threshold);
        let now = Utc::now().naive_utc();
        self.queue.enqueue(NewEmail {
            to_email,
            subject,
            html_body,
            idempotency_key: Some(format!(
                "cash-runway:{}:{}",
                config.user_id,
                now.format("%Y-%m-%d")
            )),
        })?;

        config.last_cash_runway_alert_sent_at = Some(now);
        self.config_repository.update(config)?;
        *remaining -= 1;
        Ok(())
    }

    /// Clears the runway-alert stamp once runway has recovered, re-arming
    /// the alert for the next dip.
    fn reset_runway_dedup(&self, config: &mut AlertConfiguration) -> Result<()> {
        if config.last_cash_runway_alert_sent_at.is_some() {
            config.last_cash_runway_alert_sent_at = None;
            self.config_repository.update(config)?;
        }
        Ok(())
    }

    /// Trailing-window average of liquid balance decline, in currency units
    /// per month. Accounts with fewer than two observations in the window
    /// contribute nothing.
    fn estimate_monthly_burn(&self, liquid: &[&Account]) -> Result<Decimal> {
        let cutoff = Utc::now().naive_utc() - Duration::days(BURN_RATE_WINDOW_DAYS);
        let mut total_decline = Decimal::ZERO;

        for account in liquid {
            let history = self.account_repository.balance_history(&account.id)?;
            let window: Vec<_> = history
                .iter()
                .filter(|r| r.recorded_at >= cutoff)
                .collect();
            if window.len() < 2 {
                continue;
            }
            let earliest = window.first().unwrap().balance;
            let latest = window.last().unwrap().balance;
            total_decline += earliest - latest;
        }

        let window_months = Decimal::from(BURN_RATE_WINDOW_DAYS) / dec!(30);
        Ok(total_decline / window_months)
    }
}

impl AlertServiceTrait for AlertService {
    fn evaluate_and_send_alerts(&self) -> Result<AlertRunOutcome> {
        let configs = self.config_repository.list_alert_enabled()?;
        let mut remaining = MAX_ALERTS_PER_RUN;
        let mut outcome = AlertRunOutcome::default();

        for config in &configs {
            if remaining == 0 {
                // Cap exhausted; the rest of the scan waits for the next tick.
                outcome.deferred = true;
                debug!(
                    "Alert send cap reached; deferring {} remaining users",
                    configs.len() as u32 - outcome.evaluated
                );
                break;
            }
            outcome.evaluated += 1;
            if let Err(e) = self.evaluate_user(config, &mut remaining) {
                error!("Alert evaluation failed for user {}: {}", config.user_id, e);
            }
        }

        outcome.alerts_sent = MAX_ALERTS_PER_RUN - remaining;
        Ok(outcome)
    }
}

fn net_worth(accounts: &[Account]) -> Decimal {
    accounts
        .iter()
        .map(|a| {
            if a.category.is_liability() {
                -a.current_balance
            } else {
                a.current_balance
            }
        })
        .sum()
}

fn build_net_worth_email(
    current: Decimal,
    baseline: Decimal,
    percent_change: Decimal,
) -> (String, String) {
    let direction = if current >= baseline {
        "increased"
    } else {
        "decreased"
    };
    let subject = format!(
        "Your net worth {} {:.1}%",
        direction,
        percent_change.round_dp(1)
    );
    let html_body = format!(
        "<h2>Net worth update</h2>\
         <p>Your net worth has {} by <strong>{:.1}%</strong> since your last alert.</p>\
         <p>Previous: <strong>{}</strong><br/>Current: <strong>{}</strong></p>\
         <p style=\"color:#6b7280;font-size:12px\">You can adjust alert thresholds in your notification settings.</p>",
        direction,
        percent_change.round_dp(1),
        format_money(baseline),
        format_money(current),
    );
    (subject, html_body)
}

fn build_cash_runway_email(
    liquid_balance: Decimal,
    monthly_burn: Decimal,
    runway_months: Decimal,
    threshold: Decimal,
) -> (String, String) {
    let subject = format!(
        "Cash runway below {} months",
        threshold
    );
    let html_body = format!(
        "<h2>Cash runway warning</h2>\
         <p>At your current spending rate your cash covers about <strong>{:.1} months</strong>.</p>\
         <p>Liquid balance: <strong>{}</strong><br/>Estimated monthly burn: <strong>{}</strong></p>\
         <p style=\"color:#6b7280;font-size:12px\">You can adjust alert thresholds in your notification settings.</p>",
        runway_months.round_dp(1),
        format_money(liquid_balance),
        format_money(monthly_burn),
    );
    (subject, html_body)
}
