use chrono::{Datelike, NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::parse_decimal_tolerant;

/// Normalizes any date to the first day of its calendar month.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap()
}

/// First day of the month immediately before `month`.
pub fn previous_month(month: NaiveDate) -> NaiveDate {
    let month = first_of_month(month);
    if month.month() == 1 {
        NaiveDate::from_ymd_opt(month.year() - 1, 12, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(month.year(), month.month() - 1, 1).unwrap()
    }
}

/// Point-in-time summary of a user's financial totals for one calendar
/// month. One row per (user, month); created idempotently, mutated once
/// when its email is handled, never deleted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySnapshot {
    pub id: String,
    pub user_id: String,
    /// Always the first of the month
    pub month: NaiveDate,
    pub net_worth: Decimal,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub net_worth_delta: Option<Decimal>,
    pub net_worth_delta_percent: Option<Decimal>,
    pub biggest_contributor_name: Option<String>,
    pub biggest_contributor_delta: Option<Decimal>,
    pub biggest_contributor_positive: Option<bool>,
    pub interpretation: String,
    pub email_sent: bool,
    pub email_sent_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

/// Counters reported by one pending-snapshot dispatch run
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDispatchOutcome {
    pub processed: u32,
    pub enqueued: u32,
    pub suppressed: u32,
}

/// Database model for monthly snapshots
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::monthly_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MonthlySnapshotDB {
    pub id: String,
    pub user_id: String,
    pub month: NaiveDate,
    pub net_worth: String,
    pub total_assets: String,
    pub total_liabilities: String,
    pub net_worth_delta: Option<String>,
    pub net_worth_delta_percent: Option<String>,
    pub biggest_contributor_name: Option<String>,
    pub biggest_contributor_delta: Option<String>,
    pub biggest_contributor_positive: Option<bool>,
    pub interpretation: String,
    pub email_sent: bool,
    pub email_sent_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl From<MonthlySnapshotDB> for MonthlySnapshot {
    fn from(db: MonthlySnapshotDB) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            month: db.month,
            net_worth: parse_decimal_tolerant(&db.net_worth, "net_worth"),
            total_assets: parse_decimal_tolerant(&db.total_assets, "total_assets"),
            total_liabilities: parse_decimal_tolerant(&db.total_liabilities, "total_liabilities"),
            net_worth_delta: db
                .net_worth_delta
                .as_deref()
                .map(|raw| parse_decimal_tolerant(raw, "net_worth_delta")),
            net_worth_delta_percent: db
                .net_worth_delta_percent
                .as_deref()
                .map(|raw| parse_decimal_tolerant(raw, "net_worth_delta_percent")),
            biggest_contributor_name: db.biggest_contributor_name,
            biggest_contributor_delta: db
                .biggest_contributor_delta
                .as_deref()
                .map(|raw| parse_decimal_tolerant(raw, "biggest_contributor_delta")),
            biggest_contributor_positive: db.biggest_contributor_positive,
            interpretation: db.interpretation,
            email_sent: db.email_sent,
            email_sent_at: db.email_sent_at,
            created_at: db.created_at,
        }
    }
}

impl From<&MonthlySnapshot> for MonthlySnapshotDB {
    fn from(domain: &MonthlySnapshot) -> Self {
        Self {
            id: domain.id.clone(),
            user_id: domain.user_id.clone(),
            month: domain.month,
            net_worth: domain.net_worth.to_string(),
            total_assets: domain.total_assets.to_string(),
            total_liabilities: domain.total_liabilities.to_string(),
            net_worth_delta: domain.net_worth_delta.map(|d| d.to_string()),
            net_worth_delta_percent: domain.net_worth_delta_percent.map(|d| d.to_string()),
            biggest_contributor_name: domain.biggest_contributor_name.clone(),
            biggest_contributor_delta: domain.biggest_contributor_delta.map(|d| d.to_string()),
            biggest_contributor_positive: domain.biggest_contributor_positive,
            interpretation: domain.interpretation.clone(),
            email_sent: domain.email_sent,
            email_sent_at: domain.email_sent_at,
            created_at: domain.created_at,
        }
    }
}
