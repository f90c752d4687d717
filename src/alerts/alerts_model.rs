use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CASH_RUNWAY_MONTHS, DEFAULT_NET_WORTH_THRESHOLD_PERCENT};
use crate::utils::parse_decimal_tolerant;

/// Per-user alerting preferences and dedup state. Exactly one row per
/// user; absence means "not yet configured" and is materialized with
/// defaults on first access.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertConfiguration {
    pub id: String,
    pub user_id: String,
    pub alerts_enabled: bool,
    /// 0 disables the net-worth-change alert
    pub net_worth_change_threshold_percent: Decimal,
    /// 0 disables the cash-runway alert
    pub cash_runway_months: i32,
    pub monthly_snapshot_enabled: bool,
    pub last_net_worth_alert_sent_at: Option<NaiveDateTime>,
    pub last_cash_runway_alert_sent_at: Option<NaiveDateTime>,
    pub last_monthly_snapshot_sent_at: Option<NaiveDateTime>,
    /// Net worth at the time the last net-worth alert fired; the baseline
    /// for the next evaluation.
    pub last_alerted_net_worth: Option<Decimal>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Counters reported by one alert evaluation run
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRunOutcome {
    pub evaluated: u32,
    pub alerts_sent: u32,
    pub deferred: bool,
}

/// Database model for alert configurations
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::alert_configurations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AlertConfigurationDB {
    pub id: String,
    pub user_id: String,
    pub alerts_enabled: bool,
    pub net_worth_change_threshold_percent: String,
    pub cash_runway_months: i32,
    pub monthly_snapshot_enabled: bool,
    pub last_net_worth_alert_sent_at: Option<NaiveDateTime>,
    pub last_cash_runway_alert_sent_at: Option<NaiveDateTime>,
    pub last_monthly_snapshot_sent_at: Option<NaiveDateTime>,
    pub last_alerted_net_worth: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl AlertConfigurationDB {
    /// Freshly-defaulted row for a user seen for the first time.
    pub fn defaults_for(user_id: &str) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            alerts_enabled: true,
            net_worth_change_threshold_percent: DEFAULT_NET_WORTH_THRESHOLD_PERCENT.to_string(),
            cash_runway_months: DEFAULT_CASH_RUNWAY_MONTHS,
            monthly_snapshot_enabled: true,
            last_net_worth_alert_sent_at: None,
            last_cash_runway_alert_sent_at: None,
            last_monthly_snapshot_sent_at: None,
            last_alerted_net_worth: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<AlertConfigurationDB> for AlertConfiguration {
    fn from(db: AlertConfigurationDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            alerts_enabled: db.alerts_enabled,
            net_worth_change_threshold_percent: parse_decimal_tolerant(
                &db.net_worth_change_threshold_percent,
                "net_worth_change_threshold_percent",
            ),
            cash_runway_months: db.cash_runway_months,
            monthly_snapshot_enabled: db.monthly_snapshot_enabled,
            last_net_worth_alert_sent_at: db.last_net_worth_alert_sent_at,
            last_cash_runway_alert_sent_at: db.last_cash_runway_alert_sent_at,
            last_monthly_snapshot_sent_at: db.last_monthly_snapshot_sent_at,
            last_alerted_net_worth: db
                .last_alerted_net_worth
                .as_deref()
                .map(|raw| parse_decimal_tolerant(raw, "last_alerted_net_worth")),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<&AlertConfiguration> for AlertConfigurationDB {
    fn from(domain: &AlertConfiguration) -> Self {
        Self {
            id: domain.id.clone(),
            user_id: domain.user_id.clone(),
            alerts_enabled: domain.alerts_enabled,
            net_worth_change_threshold_percent: domain
                .net_worth_change_threshold_percent
                .to_string(),
            cash_runway_months: domain.cash_runway_months,
            monthly_snapshot_enabled: domain.monthly_snapshot_enabled,
            last_net_worth_alert_sent_at: domain.last_net_worth_alert_sent_at,
            last_cash_runway_alert_sent_at: domain.last_cash_runway_alert_sent_at,
            last_monthly_snapshot_sent_at: domain.last_monthly_snapshot_sent_at,
            last_alerted_net_worth: domain.last_alerted_net_worth.map(|d| d.to_string()),
            created_at: domain.created_at,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
