use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::Result;

use super::accounts_model::{Account, AccountDB, BalanceRecord, BalanceRecordDB};
use super::accounts_traits::AccountRepositoryTrait;

pub struct AccountRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl AccountRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        AccountRepository { pool }
    }
}

impl AccountRepositoryTrait for AccountRepository {
    fn accounts_for_user(&self, for_user_id: &str) -> Result<Vec<Account>> {
        use crate::schema::accounts::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        accounts
            .filter(user_id.eq(for_user_id))
            .order(name.asc())
            .load::<AccountDB>(&mut conn)
            .map(|rows| rows.into_iter().map(Account::from).collect())
            .map_err(Into::into)
    }

    fn balance_history(&self, for_account_id: &str) -> Result<Vec<BalanceRecord>> {
        use crate::schema::balance_records::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        balance_records
            .filter(account_id.eq(for_account_id))
            .order(recorded_at.asc())
            .load::<BalanceRecordDB>(&mut conn)
            .map(|rows| rows.into_iter().map(BalanceRecord::from).collect())
            .map_err(Into::into)
    }
}
