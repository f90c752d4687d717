use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::{Error, Result};

use super::jobs_model::{NewProcessedJob, ProcessedJob, ProcessedJobDB};
use super::jobs_traits::ProcessedJobRepositoryTrait;

pub struct ProcessedJobRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl ProcessedJobRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        ProcessedJobRepository { pool }
    }
}

impl ProcessedJobRepositoryTrait for ProcessedJobRepository {
    fn record(&self, new_job: NewProcessedJob) -> Result<ProcessedJob> {
        use crate::schema::processed_jobs;
        let row: ProcessedJobDB = new_job.into();
        let mut conn = get_connection(&self.pool)?;
        diesel::insert_into(processed_jobs::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(Error::from)?;
        Ok(row.into())
    }

    fn has_succeeded(&self, for_job_type: &str, for_job_key: &str) -> Result<bool> {
        use crate::schema::processed_jobs::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        let count: i64 = processed_jobs
            .filter(job_type.eq(for_job_type))
            .filter(job_key.eq(for_job_key))
            .filter(success.eq(true))
            .count()
            .get_result(&mut conn)
            .map_err(Error::from)?;
        Ok(count > 0)
    }

    fn last_successful_run(&self, for_job_type: &str) -> Result<Option<NaiveDateTime>> {
        use crate::schema::processed_jobs::dsl::*;
        let mut conn = get_connection(&self.pool)?;
        processed_jobs
            .filter(job_type.eq(for_job_type))
            .filter(success.eq(true))
            .select(diesel::dsl::max(processed_at))
            .get_result::<Option<NaiveDateTime>>(&mut conn)
            .map_err(Error::from)
    }
}
