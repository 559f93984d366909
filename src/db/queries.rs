use crate::errors::AppError;
use crate::gateway::MemberRow;
use crate::models::group::Group;
use crate::models::member::UserInfo;
use chrono::Local;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

fn now() -> String {
    Local::now().to_rfc3339()
}

/// Member row → loosely typed `MemberRow`. Only the JSON column is parsed
/// here; field presence is checked by the gateway decoder.
pub fn map_member_row(row: &Row) -> Result<MemberRow> {
    let slots_raw: Option<String> = row.get("available_time_slots")?;

    let available_time_slots = match slots_raw {
        Some(text) => Some(serde_json::from_str(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(AppError::Fetch(format!("invalid slot list '{text}': {e}"))),
            )
        })?),
        None => None,
    };

    Ok(MemberRow {
        user_id: row.get("user_id")?,
        display_name: row.get("display_name")?,
        email: row.get("email")?,
        avatar_url: row.get("avatar_url")?,
        available_time_slots,
    })
}

pub fn load_member_rows(conn: &Connection, group_id: &str) -> Result<Vec<MemberRow>> {
    let mut stmt = conn.prepare_cached(
        "SELECT user_id, display_name, email, avatar_url, available_time_slots
         FROM group_members
         WHERE group_id = ?1
         ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([group_id], map_member_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn map_group(row: &Row) -> Result<Group> {
    Ok(Group {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}

pub fn load_group(conn: &Connection, group_id: &str) -> Result<Option<Group>> {
    conn.query_row(
        "SELECT id, name FROM groups WHERE id = ?1",
        [group_id],
        map_group,
    )
    .optional()
}

pub fn load_groups_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Group>> {
    let mut stmt = conn.prepare_cached(
        "SELECT g.id, g.name
         FROM groups g
         JOIN group_members m ON m.group_id = g.id
         WHERE m.user_id = ?1
         ORDER BY g.name ASC, g.id ASC",
    )?;

    let rows = stmt.query_map([user_id], map_group)?;
    rows.collect()
}

pub fn insert_group(conn: &Connection, group: &Group) -> Result<()> {
    conn.execute(
        "INSERT INTO groups (id, name, created_at) VALUES (?1, ?2, ?3)",
        params![group.id, group.name, now()],
    )?;
    Ok(())
}

/// Returns the number of renamed rows (0 when the group is unknown).
pub fn update_group_name(conn: &Connection, group_id: &str, name: &str) -> Result<usize> {
    let n = conn.execute(
        "UPDATE groups SET name = ?1 WHERE id = ?2",
        params![name, group_id],
    )?;
    if n > 0 {
        record_group_change(conn, group_id)?;
    }
    Ok(n)
}

pub fn insert_member(conn: &Connection, group_id: &str, user: &UserInfo) -> Result<()> {
    let ts = now();
    conn.execute(
        "INSERT INTO group_members
            (group_id, user_id, display_name, email, avatar_url, available_time_slots, joined_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, '[]', ?6, ?6)",
        params![
            group_id,
            user.user_id,
            user.display_name,
            user.email,
            user.avatar_url,
            ts
        ],
    )?;
    Ok(())
}

/// Returns the number of updated rows (0 when the user is not a member).
pub fn update_member_slots(
    conn: &Connection,
    group_id: &str,
    user_id: &str,
    slots_json: &str,
) -> Result<usize> {
    conn.execute(
        "UPDATE group_members
         SET available_time_slots = ?1, updated_at = ?2
         WHERE group_id = ?3 AND user_id = ?4",
        params![slots_json, now(), group_id, user_id],
    )
}

pub fn delete_member(conn: &Connection, group_id: &str, user_id: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM group_members WHERE group_id = ?1 AND user_id = ?2",
        params![group_id, user_id],
    )
}

/// Delete the group, its members and its change history. A single
/// `group` row is left behind so open subscriptions still notice the
/// deletion; `prune_changes` removes it later. Returns whether a group row
/// existed.
pub fn delete_group(conn: &Connection, group_id: &str) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM group_members WHERE group_id = ?1", [group_id])?;
    let removed = tx.execute("DELETE FROM groups WHERE id = ?1", [group_id])?;
    if removed > 0 {
        tx.execute("DELETE FROM changes WHERE group_id = ?1", [group_id])?;
        record_group_change(&tx, group_id)?;
    }
    tx.commit()?;
    Ok(removed > 0)
}

/// Drop change rows older than `keep_hours`. Cursors only move forward and
/// sequence numbers are never reused, so live subscriptions are unaffected.
pub fn prune_changes(conn: &Connection, keep_hours: u32) -> Result<usize> {
    conn.execute(
        "DELETE FROM changes WHERE at < datetime('now', ?1)",
        [format!("-{keep_hours} hours")],
    )
}

pub fn count_changes(conn: &Connection, group_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM changes WHERE group_id = ?1",
        [group_id],
        |row| row.get(0),
    )
}

pub fn record_group_change(conn: &Connection, group_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO changes (group_id, operation) VALUES (?1, 'group')",
        [group_id],
    )?;
    Ok(())
}

/// Highest change sequence for the group, 0 when none.
pub fn latest_change_seq(conn: &Connection, group_id: &str) -> Result<i64> {
    conn.query_row(
        "SELECT IFNULL(MAX(seq), 0) FROM changes WHERE group_id = ?1",
        [group_id],
        |row| row.get(0),
    )
}

/// `(count, max_seq)` of changes for the group after `seq`.
pub fn changes_after(conn: &Connection, group_id: &str, seq: i64) -> Result<(u64, i64)> {
    conn.query_row(
        "SELECT COUNT(*), IFNULL(MAX(seq), ?2)
         FROM changes
         WHERE group_id = ?1 AND seq > ?2",
        params![group_id, seq],
        |row| Ok((row.get::<_, i64>(0)? as u64, row.get(1)?)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate::run_pending_migrations;

    fn conn_with_group(group_id: &str) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_pending_migrations(&conn).unwrap();
        insert_group(
            &conn,
            &Group {
                id: group_id.into(),
                name: "Team".into(),
            },
        )
        .unwrap();
        conn
    }

    fn user(id: &str) -> UserInfo {
        UserInfo {
            user_id: id.into(),
            display_name: id.into(),
            email: String::new(),
            avatar_url: String::new(),
        }
    }

    #[test]
    fn deleting_a_group_drops_its_history() {
        let conn = conn_with_group("g");
        insert_group(
            &conn,
            &Group {
                id: "other".into(),
                name: "Other".into(),
            },
        )
        .unwrap();
        insert_member(&conn, "other", &user("b")).unwrap();
        insert_member(&conn, "g", &user("a")).unwrap();
        for i in 0..50 {
            update_member_slots(&conn, "g", "a", &format!("[\"{},1\"]", i % 24)).unwrap();
        }
        assert_eq!(count_changes(&conn, "g").unwrap(), 51);

        let seq_before = latest_change_seq(&conn, "g").unwrap();
        assert!(delete_group(&conn, "g").unwrap());

        assert_eq!(count_changes(&conn, "g").unwrap(), 1);
        let (pending, _) = changes_after(&conn, "g", seq_before).unwrap();
        assert_eq!(pending, 1);
        assert_eq!(count_changes(&conn, "other").unwrap(), 1);
    }

    #[test]
    fn pruning_keeps_recent_rows() {
        let conn = conn_with_group("g");
        insert_member(&conn, "g", &user("a")).unwrap();
        insert_member(&conn, "g", &user("b")).unwrap();
        conn.execute(
            "UPDATE changes SET at = '2000-01-01 00:00:00' WHERE user_id = 'a'",
            [],
        )
        .unwrap();

        assert_eq!(prune_changes(&conn, 24).unwrap(), 1);
        assert_eq!(count_changes(&conn, "g").unwrap(), 1);
        assert_eq!(prune_changes(&conn, 24).unwrap(), 0);

        let cursor = latest_change_seq(&conn, "g").unwrap();
        update_member_slots(&conn, "g", "b", "[]").unwrap();
        assert_eq!(changes_after(&conn, "g", cursor).unwrap().0, 1);
    }
}
