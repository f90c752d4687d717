use crate::errors::Result;

use super::alerts_model::{AlertConfiguration, AlertRunOutcome};

/// Trait defining the contract for alert configuration persistence.
pub trait AlertConfigurationRepositoryTrait: Send + Sync {
    /// Returns the user's configuration, materializing a freshly-defaulted
    /// row when none exists yet.
    fn get_or_create(&self, user_id: &str) -> Result<AlertConfiguration>;

    fn update(&self, config: &AlertConfiguration) -> Result<AlertConfiguration>;

    /// All configurations with alerts enabled.
    fn list_alert_enabled(&self) -> Result<Vec<AlertConfiguration>>;

    /// All configurations with the monthly snapshot email enabled.
    fn list_snapshot_enabled(&self) -> Result<Vec<AlertConfiguration>>;
}

/// Trait defining the contract for the alert evaluator.
pub trait AlertServiceTrait: Send + Sync {
    /// Evaluates every alert-enabled user against their thresholds,
    /// queuing at most the per-run cap of notifications. Per-user failures
    /// are logged and do not abort the run.
    fn evaluate_and_send_alerts(&self) -> Result<AlertRunOutcome>;
}
