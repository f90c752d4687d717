use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::parse_decimal_tolerant;

/// Categories an account can belong to. Banking accounts are the liquid
/// side of the picture; loans and credit cards sit on the liability side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountCategory {
    Banking,
    Investment,
    Property,
    Vehicle,
    Loan,
    CreditCard,
}

impl AccountCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::Banking => "BANKING",
            AccountCategory::Investment => "INVESTMENT",
            AccountCategory::Property => "PROPERTY",
            AccountCategory::Vehicle => "VEHICLE",
            AccountCategory::Loan => "LOAN",
            AccountCategory::CreditCard => "CREDIT_CARD",
        }
    }

    /// Balances in these categories count against net worth.
    pub fn is_liability(&self) -> bool {
        matches!(self, AccountCategory::Loan | AccountCategory::CreditCard)
    }

    /// Liquid accounts feed the cash-runway estimate.
    pub fn is_liquid(&self) -> bool {
        matches!(self, AccountCategory::Banking)
    }
}

impl std::str::FromStr for AccountCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BANKING" => Ok(AccountCategory::Banking),
            "INVESTMENT" => Ok(AccountCategory::Investment),
            "PROPERTY" => Ok(AccountCategory::Property),
            "VEHICLE" => Ok(AccountCategory::Vehicle),
            "LOAN" => Ok(AccountCategory::Loan),
            "CREDIT_CARD" => Ok(AccountCategory::CreditCard),
            other => Err(format!("Unknown account category: {}", other)),
        }
    }
}

impl std::fmt::Display for AccountCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Domain model representing a financial account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub category: AccountCategory,
    pub currency: String,
    pub current_balance: Decimal,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A point-in-time balance observation for one account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRecord {
    pub id: String,
    pub account_id: String,
    pub balance: Decimal,
    pub recorded_at: NaiveDateTime,
}

/// Database model for accounts
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub category: String,
    pub currency: String,
    pub current_balance: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Database model for balance history records
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::balance_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BalanceRecordDB {
    pub id: String,
    pub account_id: String,
    pub balance: String,
    pub recorded_at: NaiveDateTime,
}

impl From<AccountDB> for Account {
    fn from(db: AccountDB) -> Self {
        let category = db.category.parse().unwrap_or_else(|e| {
            log::warn!("{}", e);
            AccountCategory::Banking
        });
        Self {
            id: db.id,
            user_id: db.user_id,
            name: db.name,
            category,
            currency: db.currency,
            current_balance: parse_decimal_tolerant(&db.current_balance, "current_balance"),
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<BalanceRecordDB> for BalanceRecord {
    fn from(db: BalanceRecordDB) -> Self {
        Self {
            id: db.id,
            account_id: db.account_id,
            balance: parse_decimal_tolerant(&db.balance, "balance"),
            recorded_at: db.recorded_at,
        }
    }
}
