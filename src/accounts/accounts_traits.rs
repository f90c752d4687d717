use crate::errors::Result;

use super::accounts_model::{Account, BalanceRecord};

/// Read-side contract over the account store. The alerting engine never
/// writes accounts; it only observes balances the rest of the system keeps
/// up to date.
pub trait AccountRepositoryTrait: Send + Sync {
    /// All accounts belonging to a user, active or not.
    fn accounts_for_user(&self, user_id: &str) -> Result<Vec<Account>>;

    /// Balance observations for one account, oldest first.
    fn balance_history(&self, account_id: &str) -> Result<Vec<BalanceRecord>>;
}
