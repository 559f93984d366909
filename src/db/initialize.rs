use crate::db::log::ttlog;
use crate::db::migrate::run_pending_migrations;
use crate::db::pool::DbPool;
use crate::errors::AppResult;

/// Open the database at `path` and bring its schema up to date.
/// All schema creation goes through the migration engine.
pub fn init_db(path: &str) -> AppResult<DbPool> {
    let pool = DbPool::new(path)?;
    run_pending_migrations(&pool.conn)?;
    Ok(pool)
}

/// `init_db` plus an `init` entry in the internal log.
pub fn init_db_logged(path: &str) -> AppResult<DbPool> {
    let pool = init_db(path)?;
    ttlog(
        &pool.conn,
        "init",
        "database",
        &format!("Database initialized at {path}"),
    )?;
    Ok(pool)
}
