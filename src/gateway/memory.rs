//! In-process gateway. Clones share one store, so two sessions built on
//! clones behave like two clients of the same backend.

use super::{ChangeFeed, MemberRow, Subscription, SyncGateway, decode_members, encode_slots};
use crate::errors::{AppError, AppResult};
use crate::models::group::Group;
use crate::models::member::{Member, UserInfo};
use crate::models::slot::TimeSlot;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Default)]
struct MemoryStore {
    groups: BTreeMap<String, String>,
    rows: BTreeMap<String, Vec<MemberRow>>,
    versions: HashMap<String, u64>,
    subscribers: HashSet<u64>,
    next_subscriber: u64,
    writes: Vec<(String, String, Value)>,
    fail_fetch: bool,
    fail_write: bool,
}

impl MemoryStore {
    fn bump(&mut self, group_id: &str) {
        *self.versions.entry(group_id.to_string()).or_insert(0) += 1;
    }

    fn row_user(row: &MemberRow) -> Option<&str> {
        row.user_id.as_deref()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    store: Rc<RefCell<MemoryStore>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group with a fixed id.
    pub fn with_group(self, group_id: &str, name: &str) -> Self {
        self.store
            .borrow_mut()
            .groups
            .insert(group_id.to_string(), name.to_string());
        self
    }

    /// Put a member row straight into the store, bypassing join checks.
    pub fn insert_member(&self, group_id: &str, member: &Member) {
        self.insert_raw(
            group_id,
            MemberRow {
                user_id: Some(member.user_id.clone()),
                display_name: Some(member.display_name.clone()),
                email: Some(member.email.clone()),
                avatar_url: Some(member.avatar_url.clone()),
                available_time_slots: Some(Value::from(member.slot_keys())),
            },
        );
    }

    /// Append any row, even one that will not decode.
    pub fn insert_raw(&self, group_id: &str, row: MemberRow) {
        let mut store = self.store.borrow_mut();
        store.rows.entry(group_id.to_string()).or_default().push(row);
        store.bump(group_id);
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.store.borrow_mut().fail_fetch = fail;
    }

    pub fn set_fail_write(&self, fail: bool) {
        self.store.borrow_mut().fail_write = fail;
    }

    /// Every successful slot write, oldest first.
    pub fn writes(&self) -> Vec<(String, String, Value)> {
        self.store.borrow().writes.clone()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.store.borrow().subscribers.len()
    }

    pub fn row_count(&self, group_id: &str) -> usize {
        self.store
            .borrow()
            .rows
            .get(group_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl SyncGateway for MemoryGateway {
    fn fetch_members(&self, group_id: &str) -> AppResult<Vec<Member>> {
        let store = self.store.borrow();
        if store.fail_fetch {
            return Err(AppError::Fetch(format!("members of {group_id} unavailable")));
        }
        decode_members(store.rows.get(group_id).cloned().unwrap_or_default())
    }

    fn fetch_group(&self, group_id: &str) -> AppResult<Group> {
        let store = self.store.borrow();
        if store.fail_fetch {
            return Err(AppError::Fetch(format!("group {group_id} unavailable")));
        }
        store
            .groups
            .get(group_id)
            .map(|name| Group {
                id: group_id.to_string(),
                name: name.clone(),
            })
            .ok_or_else(|| AppError::GroupNotFound(group_id.to_string()))
    }

    fn list_groups_for_user(&self, user_id: &str) -> AppResult<Vec<Group>> {
        let store = self.store.borrow();
        if store.fail_fetch {
            return Err(AppError::Fetch("groups unavailable".into()));
        }
        let mut groups: Vec<Group> = store
            .rows
            .iter()
            .filter(|(_, rows)| {
                rows.iter()
                    .any(|r| MemoryStore::row_user(r) == Some(user_id))
            })
            .filter_map(|(gid, _)| {
                store.groups.get(gid).map(|name| Group {
                    id: gid.clone(),
                    name: name.clone(),
                })
            })
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }

    fn create_group(&self, name: &str) -> AppResult<Group> {
        let mut store = self.store.borrow_mut();
        if store.fail_write {
            return Err(AppError::Write("cannot create group".into()));
        }
        let id = uuid::Uuid::new_v4().to_string();
        store.groups.insert(id.clone(), name.to_string());
        Ok(Group {
            id,
            name: name.to_string(),
        })
    }

    fn rename_group(&self, group_id: &str, name: &str) -> AppResult<()> {
        let mut store = self.store.borrow_mut();
        if store.fail_write {
            return Err(AppError::Write(format!("cannot rename {group_id}")));
        }
        match store.groups.get_mut(group_id) {
            Some(current) => {
                *current = name.to_string();
                store.bump(group_id);
                Ok(())
            }
            None => Err(AppError::GroupNotFound(group_id.to_string())),
        }
    }

    fn subscribe(&self, group_id: &str) -> AppResult<Subscription> {
        let mut store = self.store.borrow_mut();
        let id = store.next_subscriber;
        store.next_subscriber += 1;
        store.subscribers.insert(id);
        let seen = store.versions.get(group_id).copied().unwrap_or(0);

        let feed = MemoryFeed {
            store: Rc::clone(&self.store),
            group_id: group_id.to_string(),
            id,
            seen,
            active: true,
        };
        Ok(Subscription::new(group_id, Box::new(feed)))
    }

    fn write_slots(&self, group_id: &str, user_id: &str, slots: &[TimeSlot]) -> AppResult<()> {
        let mut store = self.store.borrow_mut();
        if store.fail_write {
            return Err(AppError::Write(format!("slots of {user_id} not saved")));
        }
        let encoded = encode_slots(slots);
        let row = store
            .rows
            .get_mut(group_id)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|r| MemoryStore::row_user(r) == Some(user_id))
            })
            .ok_or_else(|| AppError::Write(format!("{user_id} is not a member of {group_id}")))?;
        row.available_time_slots = Some(encoded.clone());

        store
            .writes
            .push((group_id.to_string(), user_id.to_string(), encoded));
        store.bump(group_id);
        Ok(())
    }

    fn join_group(&self, group_id: &str, user: &UserInfo) -> AppResult<()> {
        let mut store = self.store.borrow_mut();
        if store.fail_write {
            return Err(AppError::Write(format!("cannot join {group_id}")));
        }
        if !store.groups.contains_key(group_id) {
            return Err(AppError::GroupNotFound(group_id.to_string()));
        }
        let rows = store.rows.entry(group_id.to_string()).or_default();
        if rows
            .iter()
            .any(|r| MemoryStore::row_user(r) == Some(user.user_id.as_str()))
        {
            return Err(AppError::JoinConflict {
                group_id: group_id.to_string(),
                user_id: user.user_id.clone(),
            });
        }
        rows.push(MemberRow {
            user_id: Some(user.user_id.clone()),
            display_name: Some(user.display_name.clone()),
            email: Some(user.email.clone()),
            avatar_url: Some(user.avatar_url.clone()),
            available_time_slots: Some(Value::Array(Vec::new())),
        });
        store.bump(group_id);
        Ok(())
    }

    fn leave_group(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        let mut store = self.store.borrow_mut();
        if store.fail_write {
            return Err(AppError::Write(format!("cannot leave {group_id}")));
        }
        if let Some(rows) = store.rows.get_mut(group_id) {
            let before = rows.len();
            rows.retain(|r| MemoryStore::row_user(r) != Some(user_id));
            if rows.len() != before {
                store.bump(group_id);
            }
        }
        Ok(())
    }

    fn delete_group(&self, group_id: &str) -> AppResult<()> {
        let mut store = self.store.borrow_mut();
        if store.fail_write {
            return Err(AppError::Write(format!("cannot delete {group_id}")));
        }
        let had_group = store.groups.remove(group_id).is_some();
        let had_rows = store.rows.remove(group_id).is_some();
        if had_group || had_rows {
            store.bump(group_id);
        }
        Ok(())
    }
}

struct MemoryFeed {
    store: Rc<RefCell<MemoryStore>>,
    group_id: String,
    id: u64,
    seen: u64,
    active: bool,
}

impl ChangeFeed for MemoryFeed {
    fn poll(&mut self) -> AppResult<u64> {
        let current = self
            .store
            .borrow()
            .versions
            .get(&self.group_id)
            .copied()
            .unwrap_or(0);
        let pending = current.saturating_sub(self.seen);
        self.seen = current;
        Ok(pending)
    }

    fn stop(&mut self) {
        if self.active {
            self.store.borrow_mut().subscribers.remove(&self.id);
            self.active = false;
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserInfo {
        UserInfo {
            user_id: id.into(),
            display_name: id.to_uppercase(),
            email: format!("{id}@example.com"),
            avatar_url: String::new(),
        }
    }

    #[test]
    fn second_join_reports_conflict_without_duplicating() {
        let gw = MemoryGateway::new().with_group("g", "Team");
        gw.join_group("g", &user("a")).unwrap();
        let err = gw.join_group("g", &user("a")).unwrap_err();

        assert!(err.is_benign());
        assert_eq!(gw.row_count("g"), 1);
    }

    #[test]
    fn feed_counts_changes_since_last_poll() {
        let gw = MemoryGateway::new().with_group("g", "Team");
        let mut sub = gw.subscribe("g").unwrap();
        assert_eq!(sub.poll().unwrap(), 0);

        gw.join_group("g", &user("a")).unwrap();
        gw.write_slots("g", "a", &[TimeSlot::new(1, 1).unwrap()])
            .unwrap();
        assert_eq!(sub.poll().unwrap(), 2);
        assert_eq!(sub.poll().unwrap(), 0);
    }

    #[test]
    fn dropping_the_handle_unsubscribes() {
        let gw = MemoryGateway::new().with_group("g", "Team");
        let sub = gw.subscribe("g").unwrap();
        assert_eq!(sub.group_id(), "g");
        assert_eq!(gw.active_subscriptions(), 1);
        drop(sub);
        assert_eq!(gw.active_subscriptions(), 0);
    }

    #[test]
    fn leave_and_delete_are_idempotent() {
        let gw = MemoryGateway::new().with_group("g", "Team");
        gw.join_group("g", &user("a")).unwrap();
        gw.leave_group("g", "a").unwrap();
        gw.leave_group("g", "a").unwrap();
        gw.delete_group("g").unwrap();
        gw.delete_group("g").unwrap();
        assert!(matches!(
            gw.fetch_group("g"),
            Err(AppError::GroupNotFound(_))
        ));
    }

    #[test]
    fn lists_only_groups_the_user_joined() {
        let gw = MemoryGateway::new()
            .with_group("g1", "Beta")
            .with_group("g2", "Alpha")
            .with_group("g3", "Gamma");
        gw.join_group("g1", &user("a")).unwrap();
        gw.join_group("g2", &user("a")).unwrap();
        gw.join_group("g3", &user("b")).unwrap();

        let names: Vec<String> = gw
            .list_groups_for_user("a")
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }
}
