use std::sync::Arc;

use moneypulse_core::db::{create_pool, run_migrations, DbPool};
use tempfile::TempDir;

/// Fresh on-disk database with all migrations applied. The TempDir must
/// stay alive for the duration of the test.
pub fn get_test_pool() -> (TempDir, Arc<DbPool>) {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.db");
    let pool = create_pool(db_path.to_str().unwrap()).unwrap();
    run_migrations(&pool).unwrap();
    (dir, pool)
}
