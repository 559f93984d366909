use crate::core::availability::{AbsenceIndex, compute_absence_index};
use crate::models::member::Member;
use crate::models::slot::TimeSlot;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectoryState {
    #[default]
    Uninitialized,
    Loaded,
}

/// Roster of a group plus the absence index derived from it.
///
/// Only ever rebuilt wholesale from a fresh snapshot; no partial patching.
#[derive(Debug, Clone, Default)]
pub struct MemberDirectory {
    state: DirectoryState,
    members: Vec<Member>,
    member_ids: HashSet<String>,
    index: AbsenceIndex,
}

impl MemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DirectoryState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == DirectoryState::Loaded
    }

    /// Replace the whole roster atomically and recompute the index.
    ///
    /// A store without a uniqueness constraint may hand back the same user
    /// twice; the last row wins.
    pub fn replace(&mut self, members: Vec<Member>) {
        let mut seen: HashSet<String> = HashSet::new();
        let mut unique: Vec<Member> = Vec::with_capacity(members.len());
        for member in members.into_iter().rev() {
            if seen.insert(member.user_id.clone()) {
                unique.push(member);
            }
        }
        unique.reverse();

        self.index = compute_absence_index(&unique);
        self.member_ids = seen;
        self.members = unique;
        self.state = DirectoryState::Loaded;
    }

    /// Add a member locally (freshly joined viewer not yet in a snapshot).
    pub fn insert_local(&mut self, member: Member) {
        if self.contains(&member.user_id) {
            return;
        }
        let mut members = self.members.clone();
        members.push(member);
        self.replace(members);
    }

    /// Drop every member (group deleted).
    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.member_ids.contains(user_id)
    }

    pub fn get(&self, user_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    /// Persisted slots of `user_id`, empty when unknown.
    pub fn slots_of(&self, user_id: &str) -> BTreeSet<TimeSlot> {
        self.get(user_id)
            .map(|m| m.available_slots.clone())
            .unwrap_or_default()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Roster ordered for the selection list (display name, then id).
    pub fn sorted_by_name(&self) -> Vec<&Member> {
        let mut sorted: Vec<&Member> = self.members.iter().collect();
        sorted.sort_by(|a, b| {
            a.display_name
                .cmp(&b.display_name)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        sorted
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn index(&self) -> &AbsenceIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(row: u8, col: u8) -> TimeSlot {
        TimeSlot::new(row, col).unwrap()
    }

    #[test]
    fn starts_uninitialized_and_loads_on_replace() {
        let mut dir = MemberDirectory::new();
        assert_eq!(dir.state(), DirectoryState::Uninitialized);

        dir.replace(vec![Member::with_slots("a", [slot(1, 1)])]);
        assert!(dir.is_loaded());
        assert!(dir.contains("a"));
        assert_eq!(dir.index().member_count(), 1);
    }

    #[test]
    fn replace_discards_previous_roster() {
        let mut dir = MemberDirectory::new();
        dir.replace(vec![
            Member::with_slots("a", [slot(1, 1)]),
            Member::with_slots("b", [slot(2, 2)]),
        ]);
        dir.replace(vec![Member::with_slots("b", [slot(5, 5)])]);

        assert!(!dir.contains("a"));
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.slots_of("b"), BTreeSet::from([slot(5, 5)]));
        assert_eq!(dir.index().absence(&slot(2, 2)), 1);
    }

    #[test]
    fn duplicate_rows_collapse_to_one_member() {
        let mut dir = MemberDirectory::new();
        dir.replace(vec![
            Member::with_slots("a", [slot(1, 1)]),
            Member::with_slots("a", [slot(4, 4)]),
        ]);

        assert_eq!(dir.len(), 1);
        assert_eq!(dir.slots_of("a"), BTreeSet::from([slot(4, 4)]));
        assert_eq!(dir.index().member_count(), 1);
    }

    #[test]
    fn insert_local_is_idempotent() {
        let mut dir = MemberDirectory::new();
        dir.insert_local(Member::with_slots("me", []));
        dir.insert_local(Member::with_slots("me", []));
        assert_eq!(dir.len(), 1);
        assert!(dir.is_loaded());
    }

    #[test]
    fn sorted_by_name_orders_selection_list() {
        let mut dir = MemberDirectory::new();
        let mut zed = Member::with_slots("1", []);
        zed.display_name = "Zed".into();
        let mut amy = Member::with_slots("2", []);
        amy.display_name = "Amy".into();
        dir.replace(vec![zed, amy]);

        let names: Vec<&str> = dir
            .sorted_by_name()
            .iter()
            .map(|m| m.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Amy", "Zed"]);
    }
}
