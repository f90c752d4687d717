use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::{Error, Result};

use super::alerts_model::{AlertConfiguration, AlertConfigurationDB};
use super::alerts_traits::AlertConfigurationRepositoryTrait;

pub struct AlertConfigurationRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl AlertConfigurationRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        AlertConfigurationRepository { pool }
    }
}

impl AlertConfigurationRepositoryTrait for AlertConfigurationRepository {
    fn get_or_create(&self, for_user_id: &str) -> Result<AlertConfiguration> {
        use crate::schema::alert_configurations::dsl::*;
        let mut conn = get_connection(&self.pool)?;

        let existing = alert_configurations
            .filter(user_id.eq(for_user_id))
            .first::<AlertConfigurationDB>(&mut conn)
            .optional()
            .map_err(Error::from)?;

        if let Some(row) = existing {
            return Ok(row.into());
        }

        let row = AlertConfigurationDB::defaults_for(for_user_id);
        diesel::insert_into(alert_configurations)
            .values(&row)
            .execute(&mut conn)
            .map_err(Error::from)?;

        Ok(row.into())
    }

    fn update(&self, config: &AlertConfiguration) -> Result<AlertConfiguration> {
        use crate::schema::alert_configurations::dsl::*;
        let mut conn = get_connection(&self.pool)?;

        // Explicit sets so clearing a dedup stamp really writes NULL.
        let row: AlertConfigurationDB = config.into();
        diesel::update(alert_configurations.find(&row.id))
            .set((
                alerts_enabled.eq(row.alerts_enabled),
                net_worth_change_threshold_percent
                    .eq(row.net_worth_change_threshold_percent.clone()),
                cash_runway_months.eq(row.cash_runway_months),
                monthly_snapshot_enabled.eq(row.monthly_snapshot_enabled),
                last_net_worth_alert_sent_at.eq(row.last_net_worth_alert_sent_at),
                last_cash_runway_alert_sent_at.eq(row.last_cash_runway_alert_sent_at),
                last_monthly_snapshot_sent_at.eq(row.last_monthly_snapshot_sent_at),
                last_alerted_net_worth.eq(row.last_alerted_net_worth.clone()),
                updated_at.eq(row.updated_at),
            ))
            .execute(&mut conn)
            .map_err(Error::from)?;

        Ok(row.into())
    }

    fn list_alert_enabled(&self) -> Result<Vec<AlertConfiguration>> {
        use crate::schema::alert_configurations::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        alert_configurations
            .filter(alerts_enabled.eq(true))
            .order(user_id.asc())
            .load::<AlertConfigurationDB>(&mut conn)
            .map(|rows| rows.into_iter().map(AlertConfiguration::from).collect())
            .map_err(Error::from)
    }

    fn list_snapshot_enabled(&self) -> Result<Vec<AlertConfiguration>> {
        use crate::schema::alert_configurations::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        alert_configurations
            .filter(monthly_snapshot_enabled.eq(true))
            .order(user_id.asc())
            .load::<AlertConfigurationDB>(&mut conn)
            .map(|rows| rows.into_iter().map(AlertConfiguration::from).collect())
            .map_err(Error::from)
    }
}
