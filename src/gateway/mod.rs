//! Sync gateway: the narrow CRUD + subscribe surface the session engine
//! talks to. Rows cross this boundary loosely typed and are decoded here
//! into the strongly typed model; decoding fails closed.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryGateway;
pub use sqlite::SqliteGateway;

use crate::errors::{AppError, AppResult};
use crate::models::group::Group;
use crate::models::member::{Member, UserInfo};
use crate::models::slot::TimeSlot;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Store operations scoped by `(group_id, user_id)`.
///
/// Every call may fail; none of the failures is fatal to a session.
pub trait SyncGateway {
    fn fetch_members(&self, group_id: &str) -> AppResult<Vec<Member>>;

    fn fetch_group(&self, group_id: &str) -> AppResult<Group>;

    /// Groups `user_id` is a member of, ordered by name.
    fn list_groups_for_user(&self, user_id: &str) -> AppResult<Vec<Group>>;

    fn create_group(&self, name: &str) -> AppResult<Group>;

    fn rename_group(&self, group_id: &str, name: &str) -> AppResult<()>;

    /// Start listening for committed mutations of the group's member rows.
    fn subscribe(&self, group_id: &str) -> AppResult<Subscription>;

    /// Replace the full slot list of one member.
    fn write_slots(&self, group_id: &str, user_id: &str, slots: &[TimeSlot]) -> AppResult<()>;

    /// Insert an empty member row. A duplicate yields `JoinConflict`.
    fn join_group(&self, group_id: &str, user: &UserInfo) -> AppResult<()>;

    /// Idempotent: leaving twice is not an error.
    fn leave_group(&self, group_id: &str, user_id: &str) -> AppResult<()>;

    /// Idempotent: removes the group row and every member row.
    fn delete_group(&self, group_id: &str) -> AppResult<()>;
}

/// Transport side of a subscription.
pub trait ChangeFeed {
    /// Committed mutations observed since the previous poll.
    fn poll(&mut self) -> AppResult<u64>;

    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// Cancellable subscription handle. Dropping it unsubscribes.
pub struct Subscription {
    group_id: String,
    feed: Box<dyn ChangeFeed>,
}

impl Subscription {
    pub fn new(group_id: &str, feed: Box<dyn ChangeFeed>) -> Self {
        Self {
            group_id: group_id.to_string(),
            feed,
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Pending change count; always 0 once stopped.
    pub fn poll(&mut self) -> AppResult<u64> {
        if !self.feed.is_active() {
            return Ok(0);
        }
        self.feed.poll()
    }

    pub fn stop(&mut self) {
        self.feed.stop();
    }

    pub fn is_active(&self) -> bool {
        self.feed.is_active()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.feed.stop();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("group_id", &self.group_id)
            .field("active", &self.feed.is_active())
            .finish()
    }
}

/// A member row as the store hands it back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberRow {
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub available_time_slots: Option<Value>,
}

/// Row → Member. Missing identity, name or slot list, or any bad key, is a
/// `Fetch` error. Repeated keys collapse.
pub fn decode_member(row: MemberRow) -> AppResult<Member> {
    let user_id = required(row.user_id, "user_id")?;
    let display_name = required(row.display_name, "display_name")?;

    let raw_slots = row
        .available_time_slots
        .ok_or_else(|| missing_field("available_time_slots", &user_id))?;
    let Value::Array(items) = raw_slots else {
        return Err(AppError::Fetch(format!(
            "available_time_slots of {user_id} is not a list"
        )));
    };

    let mut available_slots = BTreeSet::new();
    for item in items {
        let key = item.as_str().ok_or_else(|| {
            AppError::Fetch(format!("non-string slot key for {user_id}: {item}"))
        })?;
        let slot = TimeSlot::from_key(key)
            .map_err(|e| AppError::Fetch(format!("member {user_id}: {e}")))?;
        available_slots.insert(slot);
    }

    Ok(Member {
        user_id,
        display_name,
        email: row.email.unwrap_or_default(),
        avatar_url: row.avatar_url.unwrap_or_default(),
        available_slots,
    })
}

pub fn decode_members(rows: Vec<MemberRow>) -> AppResult<Vec<Member>> {
    rows.into_iter().map(decode_member).collect()
}

/// Sorted, de-duplicated slot keys as persisted.
pub fn encode_slots(slots: &[TimeSlot]) -> Value {
    let unique: BTreeSet<&TimeSlot> = slots.iter().collect();
    Value::Array(unique.into_iter().map(|s| Value::String(s.key())).collect())
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Fetch(format!("member row without {field}"))),
    }
}

fn missing_field(field: &str, user_id: &str) -> AppError {
    AppError::Fetch(format!("member row {user_id} without {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> MemberRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn decodes_a_complete_row() {
        let member = decode_member(row(json!({
            "user_id": "u1",
            "display_name": "Ann",
            "email": "ann@example.com",
            "avatar_url": "https://example.com/a.png",
            "available_time_slots": ["3,2", "3,1", "3,2"]
        })))
        .unwrap();

        assert_eq!(member.user_id, "u1");
        assert_eq!(member.slot_keys(), vec!["3,1", "3,2"]);
    }

    #[test]
    fn optional_contact_fields_default_to_empty() {
        let member = decode_member(row(json!({
            "user_id": "u1",
            "display_name": "Ann",
            "available_time_slots": []
        })))
        .unwrap();
        assert!(member.email.is_empty());
        assert!(member.available_slots.is_empty());
    }

    #[test]
    fn missing_required_fields_fail_closed() {
        let no_id = row(json!({"display_name": "Ann", "available_time_slots": []}));
        assert!(matches!(decode_member(no_id), Err(AppError::Fetch(_))));

        let no_slots = row(json!({"user_id": "u1", "display_name": "Ann"}));
        assert!(matches!(decode_member(no_slots), Err(AppError::Fetch(_))));

        let blank_name = row(json!({"user_id": "u1", "display_name": " ", "available_time_slots": []}));
        assert!(matches!(decode_member(blank_name), Err(AppError::Fetch(_))));
    }

    #[test]
    fn bad_slot_keys_fail_closed() {
        for bad in [
            json!(["3,0"]),
            json!(["x"]),
            json!([5]),
            json!("3,1"),
            json!([" 3 , 2"]),
            json!(["03,2"]),
            json!(["+3,2"]),
        ] {
            let r = row(json!({"user_id": "u1", "display_name": "Ann", "available_time_slots": bad}));
            assert!(matches!(decode_member(r), Err(AppError::Fetch(_))));
        }
    }

    #[test]
    fn encode_sorts_and_dedupes() {
        let a = TimeSlot::new(9, 1).unwrap();
        let b = TimeSlot::new(2, 7).unwrap();
        assert_eq!(encode_slots(&[a, b, a]), json!(["2,7", "9,1"]));
    }
}
