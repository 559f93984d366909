//! Gateway over the shared SQLite file. Several processes may open the
//! same database; the `changes` table filled by triggers is the realtime
//! feed they all observe.

use super::{ChangeFeed, Subscription, SyncGateway, decode_members, encode_slots};
use crate::db::initialize::init_db;
use crate::db::log::ttlog_quiet;
use crate::db::pool::{DbPool, open_connection};
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::group::Group;
use crate::models::member::{Member, UserInfo};
use crate::models::slot::TimeSlot;
use rusqlite::Connection;

pub struct SqliteGateway {
    pool: DbPool,
}

fn fetch_err(e: rusqlite::Error) -> AppError {
    AppError::Fetch(e.to_string())
}

fn write_err(e: rusqlite::Error) -> AppError {
    AppError::Write(e.to_string())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl SqliteGateway {
    /// Open (and migrate) the database at `path`.
    pub fn open(path: &str) -> AppResult<Self> {
        Ok(Self {
            pool: init_db(path)?,
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.pool.conn
    }

    pub fn path(&self) -> &str {
        &self.pool.path
    }

    fn require_group(&self, group_id: &str) -> AppResult<Group> {
        queries::load_group(self.conn(), group_id)
            .map_err(fetch_err)?
            .ok_or_else(|| AppError::GroupNotFound(group_id.to_string()))
    }
}

impl SyncGateway for SqliteGateway {
    fn fetch_members(&self, group_id: &str) -> AppResult<Vec<Member>> {
        let rows = queries::load_member_rows(self.conn(), group_id).map_err(fetch_err)?;
        decode_members(rows)
    }

    fn fetch_group(&self, group_id: &str) -> AppResult<Group> {
        self.require_group(group_id)
    }

    fn list_groups_for_user(&self, user_id: &str) -> AppResult<Vec<Group>> {
        queries::load_groups_for_user(self.conn(), user_id).map_err(fetch_err)
    }

    fn create_group(&self, name: &str) -> AppResult<Group> {
        let group = Group {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
        };
        queries::insert_group(self.conn(), &group).map_err(write_err)?;
        ttlog_quiet(self.conn(), "group_create", &group.id, &format!("Created '{name}'"));
        Ok(group)
    }

    fn rename_group(&self, group_id: &str, name: &str) -> AppResult<()> {
        let renamed = queries::update_group_name(self.conn(), group_id, name).map_err(write_err)?;
        if renamed == 0 {
            return Err(AppError::GroupNotFound(group_id.to_string()));
        }
        ttlog_quiet(self.conn(), "group_rename", group_id, &format!("Renamed to '{name}'"));
        Ok(())
    }

    fn subscribe(&self, group_id: &str) -> AppResult<Subscription> {
        if self.path() == ":memory:" {
            return Err(AppError::Other(
                "change feed needs a file-backed database".into(),
            ));
        }
        let conn = open_connection(self.path()).map_err(fetch_err)?;
        let cursor = queries::latest_change_seq(&conn, group_id).map_err(fetch_err)?;

        let feed = SqliteFeed {
            conn: Some(conn),
            group_id: group_id.to_string(),
            cursor,
        };
        Ok(Subscription::new(group_id, Box::new(feed)))
    }

    fn write_slots(&self, group_id: &str, user_id: &str, slots: &[TimeSlot]) -> AppResult<()> {
        let json = encode_slots(slots).to_string();
        let updated = queries::update_member_slots(self.conn(), group_id, user_id, &json)
            .map_err(write_err)?;
        if updated == 0 {
            return Err(AppError::Write(format!(
                "{user_id} is not a member of {group_id}"
            )));
        }
        ttlog_quiet(
            self.conn(),
            "slots",
            group_id,
            &format!("{user_id} saved {} slot(s)", slots.len()),
        );
        Ok(())
    }

    fn join_group(&self, group_id: &str, user: &UserInfo) -> AppResult<()> {
        self.require_group(group_id)?;

        match queries::insert_member(self.conn(), group_id, user) {
            Ok(()) => {
                ttlog_quiet(
                    self.conn(),
                    "join",
                    group_id,
                    &format!("{} joined", user.user_id),
                );
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => Err(AppError::JoinConflict {
                group_id: group_id.to_string(),
                user_id: user.user_id.clone(),
            }),
            Err(e) => Err(write_err(e)),
        }
    }

    fn leave_group(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        let removed = queries::delete_member(self.conn(), group_id, user_id).map_err(write_err)?;
        if removed > 0 {
            ttlog_quiet(self.conn(), "leave", group_id, &format!("{user_id} left"));
        }
        Ok(())
    }

    fn delete_group(&self, group_id: &str) -> AppResult<()> {
        if queries::delete_group(self.conn(), group_id).map_err(write_err)? {
            ttlog_quiet(self.conn(), "group_delete", group_id, "Group deleted");
        }
        Ok(())
    }
}

/// Cursor over `changes.seq` on a dedicated connection.
struct SqliteFeed {
    conn: Option<Connection>,
    group_id: String,
    cursor: i64,
}

impl ChangeFeed for SqliteFeed {
    fn poll(&mut self) -> AppResult<u64> {
        let Some(conn) = &self.conn else {
            return Ok(0);
        };
        let (count, max_seq) =
            queries::changes_after(conn, &self.group_id, self.cursor).map_err(fetch_err)?;
        self.cursor = max_seq;
        Ok(count)
    }

    fn stop(&mut self) {
        self.conn = None;
    }

    fn is_active(&self) -> bool {
        self.conn.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::GroupSession;
    use std::collections::BTreeSet;
    use std::env;
    use std::path::PathBuf;

    fn temp_db(name: &str) -> String {
        let mut path: PathBuf = env::temp_dir();
        path.push(format!("{name}_slotgrid_gw.sqlite"));
        let p = path.to_string_lossy().to_string();
        std::fs::remove_file(&p).ok();
        p
    }

    fn user(id: &str) -> UserInfo {
        UserInfo {
            user_id: id.into(),
            display_name: format!("User {id}"),
            email: format!("{id}@example.com"),
            avatar_url: String::new(),
        }
    }

    fn slot(row: u8, col: u8) -> TimeSlot {
        TimeSlot::new(row, col).unwrap()
    }

    #[test]
    fn join_write_and_fetch_round_trip() {
        let gw = SqliteGateway::open(&temp_db("round_trip")).unwrap();
        let group = gw.create_group("Team").unwrap();

        gw.join_group(&group.id, &user("a")).unwrap();
        gw.write_slots(&group.id, "a", &[slot(3, 2), slot(1, 1), slot(3, 2)])
            .unwrap();

        let members = gw.fetch_members(&group.id).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].slot_keys(), vec!["1,1", "3,2"]);
        assert_eq!(members[0].display_name, "User a");
    }

    #[test]
    fn duplicate_join_is_a_conflict() {
        let gw = SqliteGateway::open(&temp_db("dup_join")).unwrap();
        let group = gw.create_group("Team").unwrap();

        gw.join_group(&group.id, &user("a")).unwrap();
        let err = gw.join_group(&group.id, &user("a")).unwrap_err();
        assert!(matches!(err, AppError::JoinConflict { .. }));
        assert_eq!(gw.fetch_members(&group.id).unwrap().len(), 1);
    }

    #[test]
    fn joining_an_unknown_group_fails() {
        let gw = SqliteGateway::open(&temp_db("unknown_group")).unwrap();
        let err = gw.join_group("nope", &user("a")).unwrap_err();
        assert!(matches!(err, AppError::GroupNotFound(_)));
    }

    #[test]
    fn writing_for_a_non_member_fails() {
        let gw = SqliteGateway::open(&temp_db("non_member")).unwrap();
        let group = gw.create_group("Team").unwrap();
        let err = gw.write_slots(&group.id, "ghost", &[slot(1, 1)]).unwrap_err();
        assert!(matches!(err, AppError::Write(_)));
    }

    #[test]
    fn corrupt_slot_column_fails_closed() {
        let gw = SqliteGateway::open(&temp_db("corrupt")).unwrap();
        let group = gw.create_group("Team").unwrap();
        gw.join_group(&group.id, &user("a")).unwrap();
        gw.conn()
            .execute(
                "UPDATE group_members SET available_time_slots = '[\"3,0\"]'",
                [],
            )
            .unwrap();

        assert!(matches!(
            gw.fetch_members(&group.id),
            Err(AppError::Fetch(_))
        ));
    }

    #[test]
    fn feed_sees_writes_from_another_connection() {
        let path = temp_db("feed");
        let gw = SqliteGateway::open(&path).unwrap();
        let group = gw.create_group("Team").unwrap();
        gw.join_group(&group.id, &user("a")).unwrap();

        let mut sub = gw.subscribe(&group.id).unwrap();
        assert_eq!(sub.poll().unwrap(), 0);

        let other = SqliteGateway::open(&path).unwrap();
        other.join_group(&group.id, &user("b")).unwrap();
        other.write_slots(&group.id, "b", &[slot(2, 2)]).unwrap();

        assert_eq!(sub.poll().unwrap(), 2);
        assert_eq!(sub.poll().unwrap(), 0);

        sub.stop();
        assert!(!sub.is_active());
        other.leave_group(&group.id, "b").unwrap();
        assert_eq!(sub.poll().unwrap(), 0);
    }

    #[test]
    fn session_started_late_sees_earlier_writes() {
        let path = temp_db("late_start");
        let gw = SqliteGateway::open(&path).unwrap();
        let group = gw.create_group("Team").unwrap();
        gw.join_group(&group.id, &user("a")).unwrap();

        let mut session = GroupSession::new(gw, &group.id, None);
        session.refresh();

        let other = SqliteGateway::open(&path).unwrap();
        other.write_slots(&group.id, "a", &[slot(4, 4)]).unwrap();

        assert!(session.start());
        assert_eq!(
            session.directory().slots_of("a"),
            BTreeSet::from([slot(4, 4)])
        );

        other.write_slots(&group.id, "a", &[]).unwrap();
        assert!(session.pump());
        assert!(session.directory().slots_of("a").is_empty());
    }

    #[test]
    fn delete_group_removes_members_and_is_idempotent() {
        let gw = SqliteGateway::open(&temp_db("delete")).unwrap();
        let group = gw.create_group("Team").unwrap();
        gw.join_group(&group.id, &user("a")).unwrap();
        for hour in 0..20 {
            gw.write_slots(&group.id, "a", &[slot(hour, 1)]).unwrap();
        }

        gw.delete_group(&group.id).unwrap();
        gw.delete_group(&group.id).unwrap();

        assert_eq!(queries::count_changes(gw.conn(), &group.id).unwrap(), 1);

        assert!(gw.fetch_members(&group.id).unwrap().is_empty());
        assert!(gw.list_groups_for_user("a").unwrap().is_empty());
    }
}
