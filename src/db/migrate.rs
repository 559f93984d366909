use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// Ensure that the `log` table exists. Migrations record themselves there.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// Groups and their member rows. Slots are a JSON list of "row,col" keys.
fn create_group_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS groups (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS group_members (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id              TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            user_id               TEXT NOT NULL,
            display_name          TEXT,
            email                 TEXT DEFAULT '',
            avatar_url            TEXT DEFAULT '',
            available_time_slots  TEXT NOT NULL DEFAULT '[]',
            joined_at             TEXT NOT NULL,
            updated_at            TEXT NOT NULL,
            UNIQUE (group_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_group_members_user ON group_members(user_id);
        "#,
    )?;
    Ok(())
}

/// Change feed: one row per committed mutation of a member row.
fn create_change_feed(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS changes (
            seq        INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id   TEXT NOT NULL,
            operation  TEXT NOT NULL CHECK(operation IN ('insert','update','delete','group')),
            user_id    TEXT NOT NULL DEFAULT '',
            at         TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_changes_group_seq ON changes(group_id, seq);

        CREATE TRIGGER IF NOT EXISTS trg_group_members_insert
        AFTER INSERT ON group_members
        BEGIN
            INSERT INTO changes (group_id, operation, user_id)
            VALUES (NEW.group_id, 'insert', NEW.user_id);
        END;

        CREATE TRIGGER IF NOT EXISTS trg_group_members_update
        AFTER UPDATE ON group_members
        BEGIN
            INSERT INTO changes (group_id, operation, user_id)
            VALUES (NEW.group_id, 'update', NEW.user_id);
        END;

        CREATE TRIGGER IF NOT EXISTS trg_group_members_delete
        AFTER DELETE ON group_members
        BEGIN
            INSERT INTO changes (group_id, operation, user_id)
            VALUES (OLD.group_id, 'delete', OLD.user_id);
        END;
        "#,
    )?;
    Ok(())
}

type Migration = (&'static str, &'static str, fn(&Connection) -> Result<()>);

const MIGRATIONS: &[Migration] = &[
    (
        "20251019_0001_create_group_tables",
        "Created groups and group_members tables",
        create_group_tables,
    ),
    (
        "20251019_0002_create_change_feed",
        "Created changes table and member row triggers",
        create_change_feed,
    ),
];

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db() and by every gateway open.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    apply_migrations(conn, MIGRATIONS)
}

/// A failing step is rolled back and reported with its version; later
/// steps are not attempted.
fn apply_migrations(conn: &Connection, migrations: &[Migration]) -> AppResult<()> {
    ensure_log_table(conn)?;

    for (version, message, apply) in migrations {
        if is_applied(conn, version)? {
            continue;
        }

        let tx = conn.unchecked_transaction()?;
        apply(&tx)
            .and_then(|()| mark_applied(&tx, version, message))
            .map_err(|e| AppError::Migration(format!("{version}: {e}")))?;
        tx.commit()?;

        success(format!("Migration applied: {version}"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();
        run_pending_migrations(&conn).unwrap();

        let applied: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM log WHERE operation = 'migration_applied'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }

    #[test]
    fn member_mutations_feed_the_change_table() {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();

        conn.execute_batch(
            r#"
            INSERT INTO groups (id, name, created_at) VALUES ('g', 'Team', 'now');
            INSERT INTO group_members (group_id, user_id, display_name, joined_at, updated_at)
                VALUES ('g', 'u', 'U', 'now', 'now');
            UPDATE group_members SET available_time_slots = '["1,1"]' WHERE user_id = 'u';
            DELETE FROM group_members WHERE user_id = 'u';
            "#,
        )
        .unwrap();

        let ops: Vec<String> = conn
            .prepare("SELECT operation FROM changes ORDER BY seq")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(ops, vec!["insert", "update", "delete"]);
    }

    fn broken_step(conn: &Connection) -> Result<()> {
        conn.execute_batch("CREATE TABLE half_done (id INTEGER); CREATE TABLE (")
    }

    #[test]
    fn failed_step_is_rolled_back_and_named() {
        let conn = Connection::open_in_memory().unwrap();
        let steps: &[Migration] = &[
            MIGRATIONS[0],
            ("20990101_0001_broken", "Never applied", broken_step),
        ];

        let err = apply_migrations(&conn, steps).unwrap_err();
        match err {
            AppError::Migration(msg) => assert!(msg.starts_with("20990101_0001_broken: ")),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(is_applied(&conn, MIGRATIONS[0].0).unwrap());
        assert!(!is_applied(&conn, "20990101_0001_broken").unwrap());
        let half_done: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'half_done'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(half_done, 0);
    }
}
