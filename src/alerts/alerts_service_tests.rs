#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use crate::accounts::{Account, AccountCategory, AccountRepositoryTrait, BalanceRecord};
    use crate::alerts::{
        AlertConfiguration, AlertConfigurationRepositoryTrait, AlertService, AlertServiceTrait,
    };
    use crate::email_queue::{
        DrainOutcome, EmailQueueDB, EmailQueueEntry, EmailQueueServiceTrait, EmailStatus, NewEmail,
    };
    use crate::errors::{Error, Result, ValidationError};
    use crate::users::UserDirectoryTrait;

    #[derive(Default)]
    struct InMemoryConfigRepository {
        rows: Mutex<Vec<AlertConfiguration>>,
    }

    impl InMemoryConfigRepository {
        fn with_config(self, config: AlertConfiguration) -> Self {
            self.rows.lock().unwrap().push(config);
            self
        }

        fn get(&self, user_id: &str) -> AlertConfiguration {
            self.rows
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.user_id == user_id)
                .cloned()
                .expect("config exists")
        }
    }

    impl AlertConfigurationRepositoryTrait for InMemoryConfigRepository {
        fn get_or_create(&self, user_id: &str) -> Result<AlertConfiguration> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(existing) = rows.iter().find(|c| c.user_id == user_id) {
                return Ok(existing.clone());
            }
            let config = default_config(user_id);
            rows.push(config.clone());
            Ok(config)
        }

        fn update(&self, config: &AlertConfiguration) -> Result<AlertConfiguration> {
            let mut rows = self.rows.lock().unwrap();
            let slot = rows.iter_mut().find(|c| c.id == config.id).unwrap();
            *slot = config.clone();
            Ok(config.clone())
        }

        fn list_alert_enabled(&self) -> Result<Vec<AlertConfiguration>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.alerts_enabled)
                .cloned()
                .collect())
        }

        fn list_snapshot_enabled(&self) -> Result<Vec<AlertConfiguration>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.monthly_snapshot_enabled)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct MockAccountRepository {
        accounts: HashMap<String, Vec<Account>>,
        histories: HashMap<String, Vec<BalanceRecord>>,
    }

    impl AccountRepositoryTrait for MockAccountRepository {
        fn accounts_for_user(&self, user_id: &str) -> Result<Vec<Account>> {
            Ok(self.accounts.get(user_id).cloned().unwrap_or_default())
        }

        fn balance_history(&self, account_id: &str) -> Result<Vec<BalanceRecord>> {
            Ok(self.histories.get(account_id).cloned().unwrap_or_default())
        }
    }

    /// Queue double that records enqueues, or refuses them all.
    #[derive(Default)]
    struct RecordingQueue {
        enqueued: Mutex<Vec<NewEmail>>,
        fail_enqueue: bool,
    }

    #[async_trait]
    impl EmailQueueServiceTrait for RecordingQueue {
        fn enqueue(&self, new_email: NewEmail) -> Result<EmailQueueEntry> {
            if self.fail_enqueue {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "queue unavailable".to_string(),
                )));
            }
            self.enqueued.lock().unwrap().push(new_email.clone());
            let db: EmailQueueDB = new_email.into();
            Ok(db.into())
        }

        async fn drain_due(&self, _batch_size: i64) -> Result<DrainOutcome> {
            unimplemented!()
        }

        fn count_by_status(&self, _status: EmailStatus) -> Result<i64> {
            Ok(0)
        }
    }

    struct StaticUsers;

    impl UserDirectoryTrait for StaticUsers {
        fn email_for_user(&self, user_id: &str) -> Result<Option<String>> {
            Ok(Some(format!("{}@example.com", user_id)))
        }
    }

    fn default_config(user_id: &str) -> AlertConfiguration {
        let now = Utc::now().naive_utc();
        AlertConfiguration {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            alerts_enabled: true,
            net_worth_change_threshold_percent: dec!(5),
            cash_runway_months: 0,
            monthly_snapshot_enabled: true,
            last_net_worth_alert_sent_at: None,
            last_cash_runway_alert_sent_at: None,
            last_monthly_snapshot_sent_at: None,
            last_alerted_net_worth: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn account(
        user_id: &str,
        id: &str,
        category: AccountCategory,
        balance: Decimal,
    ) -> Account {
        let now = Utc::now().naive_utc();
        Account {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: id.to_string(),
            category,
            currency: "USD".to_string(),
            current_balance: balance,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn record(account_id: &str, days_ago: i64, balance: Decimal) -> BalanceRecord {
        BalanceRecord {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            balance,
            recorded_at: Utc::now().naive_utc() - Duration::days(days_ago),
        }
    }

    fn service(
        configs: Arc<InMemoryConfigRepository>,
        accounts: Arc<MockAccountRepository>,
        queue: Arc<RecordingQueue>,
    ) -> AlertService {
        AlertService::new(configs, accounts, queue, Arc::new(StaticUsers))
    }

    #[test]
    fn first_evaluation_establishes_baseline_without_alerting() {
        let configs = Arc::new(
            InMemoryConfigRepository::default().with_config(default_config("u1")),
        );
        let mut accounts = MockAccountRepository::default();
        accounts.accounts.insert(
            "u1".to_string(),
            vec![account("u1", "chk", AccountCategory::Banking, dec!(10000))],
        );
        let queue = Arc::new(RecordingQueue::default());

        let svc = service(configs.clone(), Arc::new(accounts), queue.clone());
        svc.evaluate_and_send_alerts().unwrap();

        assert!(queue.enqueued.lock().unwrap().is_empty());
        let stored = configs.get("u1");
        assert_eq!(stored.last_alerted_net_worth, Some(dec!(10000)));
        assert!(stored.last_net_worth_alert_sent_at.is_none());
    }

    #[test]
    fn net_worth_alert_fires_at_threshold_and_rebaselines() {
        let mut config = default_config("u1");
        config.last_alerted_net_worth = Some(dec!(10000));
        let configs = Arc::new(InMemoryConfigRepository::default().with_config(config));

        let mut accounts = MockAccountRepository::default();
        // 10000 -> 10500 is exactly the 5% default threshold.
        accounts.accounts.insert(
            "u1".to_string(),
            vec![account("u1", "chk", AccountCategory::Banking, dec!(10500))],
        );
        let queue = Arc::new(RecordingQueue::default());

        let svc = service(configs.clone(), Arc::new(accounts), queue.clone());
        let outcome = svc.evaluate_and_send_alerts().unwrap();

        assert_eq!(outcome.alerts_sent, 1);
        let sent = queue.enqueued.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_email, "u1@example.com");

        let stored = configs.get("u1");
        assert_eq!(stored.last_alerted_net_worth, Some(dec!(10500)));
        assert!(stored.last_net_worth_alert_sent_at.is_some());
    }

    #[test]
    fn change_below_threshold_does_not_alert_or_mutate() {
        let mut config = default_config("u1");
        config.last_alerted_net_worth = Some(dec!(10000));
        let configs = Arc::new(InMemoryConfigRepository::default().with_config(config));

        let mut accounts = MockAccountRepository::default();
        accounts.accounts.insert(
            "u1".to_string(),
            vec![account("u1", "chk", AccountCategory::Banking, dec!(10400))],
        );
        let queue = Arc::new(RecordingQueue::default());

        let svc = service(configs.clone(), Arc::new(accounts), queue.clone());
        svc.evaluate_and_send_alerts().unwrap();

        assert!(queue.enqueued.lock().unwrap().is_empty());
        assert_eq!(configs.get("u1").last_alerted_net_worth, Some(dec!(10000)));
    }

    #[test]
    fn liabilities_subtract_from_net_worth() {
        let mut config = default_config("u1");
        config.last_alerted_net_worth = Some(dec!(10000));
        let configs = Arc::new(InMemoryConfigRepository::default().with_config(config));

        let mut accounts = MockAccountRepository::default();
        // 15000 assets - 6000 loan = 9000: a 10% drop from the baseline.
        accounts.accounts.insert(
            "u1".to_string(),
            vec![
                account("u1", "chk", AccountCategory::Banking, dec!(15000)),
                account("u1", "loan", AccountCategory::Loan, dec!(6000)),
            ],
        );
        let queue = Arc::new(RecordingQueue::default());

        let svc = service(configs.clone(), Arc::new(accounts), queue.clone());
        svc.evaluate_and_send_alerts().unwrap();

        assert_eq!(queue.enqueued.lock().unwrap().len(), 1);
        assert_eq!(configs.get("u1").last_alerted_net_worth, Some(dec!(9000)));
    }

    #[test]
    fn user_without_accounts_is_skipped_entirely() {
        let configs = Arc::new(
            InMemoryConfigRepository::default().with_config(default_config("u1")),
        );
        let queue = Arc::new(RecordingQueue::default());

        let svc = service(
            configs.clone(),
            Arc::new(MockAccountRepository::default()),
            queue.clone(),
        );
        svc.evaluate_and_send_alerts().unwrap();

        assert!(queue.enqueued.lock().unwrap().is_empty());
        assert!(configs.get("u1").last_alerted_net_worth.is_none());
    }

    #[test]
    fn zero_threshold_disables_net_worth_alert() {
        let mut config = default_config("u1");
        config.net_worth_change_threshold_percent = Decimal::ZERO;
        config.last_alerted_net_worth = Some(dec!(100));
        let configs = Arc::new(InMemoryConfigRepository::default().with_config(config));

        let mut accounts = MockAccountRepository::default();
        accounts.accounts.insert(
            "u1".to_string(),
            vec![account("u1", "chk", AccountCategory::Banking, dec!(100000))],
        );
        let queue = Arc::new(RecordingQueue::default());

        let svc = service(configs, Arc::new(accounts), queue.clone());
        svc.evaluate_and_send_alerts().unwrap();

        assert!(queue.enqueued.lock().unwrap().is_empty());
    }

    #[test]
    fn at_most_five_alerts_per_run_and_the_rest_defer() {
        let configs = InMemoryConfigRepository::default();
        let mut accounts = MockAccountRepository::default();
        for i in 0..8 {
            let user = format!("u{}", i);
            let mut config = default_config(&user);
            config.last_alerted_net_worth = Some(dec!(1000));
            configs.rows.lock().unwrap().push(config);
            accounts.accounts.insert(
                user.clone(),
                vec![account(&user, &format!("chk{}", i), AccountCategory::Banking, dec!(2000))],
            );
        }
        let configs = Arc::new(configs);
        let queue = Arc::new(RecordingQueue::default());

        let svc = service(configs.clone(), Arc::new(accounts), queue.clone());
        let outcome = svc.evaluate_and_send_alerts().unwrap();

        assert_eq!(outcome.alerts_sent, 5);
        assert!(outcome.deferred);
        assert_eq!(queue.enqueued.lock().unwrap().len(), 5);

        // Deferred users keep their old baseline, ready for the next tick.
        let unalerted = configs
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.last_alerted_net_worth == Some(dec!(1000)))
            .count();
        assert_eq!(unalerted, 3);
    }

    #[test]
    fn failed_enqueue_leaves_configuration_untouched() {
        let mut config = default_config("u1");
        config.last_alerted_net_worth = Some(dec!(10000));
        let configs = Arc::new(InMemoryConfigRepository::default().with_config(config));

        let mut accounts = MockAccountRepository::default();
        accounts.accounts.insert(
            "u1".to_string(),
            vec![account("u1", "chk", AccountCategory::Banking, dec!(20000))],
        );
        let queue = Arc::new(RecordingQueue {
            fail_enqueue: true,
            ..Default::default()
        });

        let svc = service(configs.clone(), Arc::new(accounts), queue);
        svc.evaluate_and_send_alerts().unwrap();

        let stored = configs.get("u1");
        assert_eq!(stored.last_alerted_net_worth, Some(dec!(10000)));
        assert!(stored.last_net_worth_alert_sent_at.is_none());
    }

    fn runway_fixture(
        balance_now: Decimal,
        balance_90_days_ago: Decimal,
    ) -> (Arc<InMemoryConfigRepository>, Arc<MockAccountRepository>) {
        let mut config = default_config("u1");
        // Isolate the runway check from the net-worth check.
        config.net_worth_change_threshold_percent = Decimal::ZERO;
        config.cash_runway_months = 3;
        let configs = Arc::new(InMemoryConfigRepository::default().with_config(config));

        let mut accounts = MockAccountRepository::default();
        accounts.accounts.insert(
            "u1".to_string(),
            vec![account("u1", "chk", AccountCategory::Banking, balance_now)],
        );
        accounts.histories.insert(
            "chk".to_string(),
            vec![
                record("chk", 85, balance_90_days_ago),
                record("chk", 1, balance_now),
            ],
        );
        (configs, Arc::new(accounts))
    }

    #[test]
    fn short_runway_alerts_once_until_recovery() {
        // Burn: (4500 - 1500) / 3 months = 1000/month; runway 1.5 months < 3.
        let (configs, accounts) = runway_fixture(dec!(1500), dec!(4500));
        let queue = Arc::new(RecordingQueue::default());

        let svc = service(configs.clone(), accounts.clone(), queue.clone());
        svc.evaluate_and_send_alerts().unwrap();
        assert_eq!(queue.enqueued.lock().unwrap().len(), 1);
        assert!(configs.get("u1").last_cash_runway_alert_sent_at.is_some());

        // Still under water: no duplicate alert.
        svc.evaluate_and_send_alerts().unwrap();
        assert_eq!(queue.enqueued.lock().unwrap().len(), 1);
    }

    #[test]
    fn runway_recovery_rearms_the_alert() {
        let (configs, accounts) = runway_fixture(dec!(1500), dec!(4500));
        let queue = Arc::new(RecordingQueue::default());
        let svc = service(configs.clone(), accounts, queue.clone());
        svc.evaluate_and_send_alerts().unwrap();
        assert_eq!(queue.enqueued.lock().unwrap().len(), 1);

        // Balance recovers: runway climbs above the threshold and the
        // dedup stamp clears.
        let (_, recovered_accounts) = runway_fixture(dec!(9000), dec!(9500));
        let svc = service(configs.clone(), recovered_accounts, queue.clone());
        svc.evaluate_and_send_alerts().unwrap();
        assert!(configs.get("u1").last_cash_runway_alert_sent_at.is_none());
        assert_eq!(queue.enqueued.lock().unwrap().len(), 1);
    }

    #[test]
    fn growing_balances_never_trigger_runway_alert() {
        // Balance grew over the window: burn <= 0, runway infinite.
        let (configs, accounts) = runway_fixture(dec!(5000), dec!(2000));
        let queue = Arc::new(RecordingQueue::default());

        let svc = service(configs, accounts, queue.clone());
        svc.evaluate_and_send_alerts().unwrap();

        assert!(queue.enqueued.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_runway_months_disables_the_check() {
        let (configs, accounts) = runway_fixture(dec!(100), dec!(10000));
        configs.rows.lock().unwrap()[0].cash_runway_months = 0;
        let queue = Arc::new(RecordingQueue::default());

        let svc = service(configs, accounts, queue.clone());
        svc.evaluate_and_send_alerts().unwrap();

        assert!(queue.enqueued.lock().unwrap().is_empty());
    }

    #[test]
    fn runway_fixture_burn_estimate_is_documented() {
        // The estimate uses a 90-day trailing window over banking accounts:
        // (earliest in window - latest) / 3 months. With 4500 down to 1500
        // that is 1000/month, so a 1500 balance has a 1.5-month runway.
        let (configs, accounts) = runway_fixture(dec!(1500), dec!(4500));
        let queue = Arc::new(RecordingQueue::default());
        let svc = service(configs, accounts, queue.clone());
        svc.evaluate_and_send_alerts().unwrap();

        let sent = queue.enqueued.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("3 months"));
        assert!(sent[0].html_body.contains("1.5 months"));
    }
}
