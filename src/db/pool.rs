//! SQLite connection wrapper (lightweight for CLI usage).

use rusqlite::{Connection, Result};
use std::path::Path;
use std::time::Duration;

/// Writers from other processes hold the lock only for a single statement.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DbPool {
    pub conn: Connection,
    pub path: String,
}

impl DbPool {
    pub fn new(path: &str) -> Result<Self> {
        let conn = open_connection(path)?;
        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }
}

/// Open a connection with the pragmas every slotgrid connection needs.
pub fn open_connection(path: &str) -> Result<Connection> {
    let conn = Connection::open(Path::new(path))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}
