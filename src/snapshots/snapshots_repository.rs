use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::{Error, Result};

use super::snapshots_model::{MonthlySnapshot, MonthlySnapshotDB};
use super::snapshots_traits::SnapshotRepositoryTrait;

pub struct SnapshotRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        SnapshotRepository { pool }
    }
}

impl SnapshotRepositoryTrait for SnapshotRepository {
    fn get_by_user_and_month(
        &self,
        for_user_id: &str,
        for_month: NaiveDate,
    ) -> Result<Option<MonthlySnapshot>> {
        use crate::schema::monthly_snapshots::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        monthly_snapshots
            .filter(user_id.eq(for_user_id))
            .filter(month.eq(for_month))
            .first::<MonthlySnapshotDB>(&mut conn)
            .optional()
            .map(|row| row.map(MonthlySnapshot::from))
            .map_err(Error::from)
    }

    fn insert(&self, snapshot: &MonthlySnapshot) -> Result<MonthlySnapshot> {
        use crate::schema::monthly_snapshots;
        let row: MonthlySnapshotDB = snapshot.into();
        let mut conn = get_connection(&self.pool)?;
        diesel::insert_into(monthly_snapshots::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(Error::from)?;
        Ok(row.into())
    }

    fn list_unsent(&self) -> Result<Vec<MonthlySnapshot>> {
        use crate::schema::monthly_snapshots::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        monthly_snapshots
            .filter(email_sent.eq(false))
            .order(month.asc())
            .load::<MonthlySnapshotDB>(&mut conn)
            .map(|rows| rows.into_iter().map(MonthlySnapshot::from).collect())
            .map_err(Error::from)
    }

    fn mark_email_handled(
        &self,
        snapshot_id: &str,
        sent_at: Option<NaiveDateTime>,
    ) -> Result<()> {
        use crate::schema::monthly_snapshots::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        diesel::update(monthly_snapshots.find(snapshot_id))
            .set((email_sent.eq(true), email_sent_at.eq(sent_at)))
            .execute(&mut conn)
            .map_err(Error::from)
            .map(|_| ())
    }
}
