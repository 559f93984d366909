//! Availability set algebra.
//!
//! Everything here is pure: callers hand in the roster, get back derived
//! slot sets. The index is sparse: a slot appears only when at least one
//! member marked it.

use crate::models::member::Member;
use crate::models::selection::ViewSelection;
use crate::models::slot::TimeSlot;
use std::collections::{BTreeSet, HashMap};

/// Per-slot count of members who are *not* available.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbsenceIndex {
    member_count: usize,
    absences: HashMap<TimeSlot, usize>,
}

impl AbsenceIndex {
    pub fn member_count(&self) -> usize {
        self.member_count
    }

    /// Absence count for `slot`; slots nobody marked are absent for everyone.
    pub fn absence(&self, slot: &TimeSlot) -> usize {
        self.absences
            .get(slot)
            .copied()
            .unwrap_or(self.member_count)
    }

    /// Members available at `slot`.
    pub fn available(&self, slot: &TimeSlot) -> usize {
        self.member_count - self.absence(slot)
    }

    pub fn len(&self) -> usize {
        self.absences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.absences.is_empty()
    }

    /// Materialized entries, unordered.
    pub fn iter(&self) -> impl Iterator<Item = (&TimeSlot, &usize)> {
        self.absences.iter()
    }
}

/// Single pass over every member's slots: each slot starts at the member
/// count and is decremented once per member holding it.
///
/// The accumulation is commutative, so roster order never matters.
pub fn compute_absence_index(members: &[Member]) -> AbsenceIndex {
    let member_count = members.len();
    let mut absences: HashMap<TimeSlot, usize> = HashMap::new();

    for member in members {
        for slot in &member.available_slots {
            let counter = absences.entry(*slot).or_insert(member_count);
            *counter = counter.saturating_sub(1);
        }
    }

    AbsenceIndex {
        member_count,
        absences,
    }
}

/// Slots every member marked.
pub fn common_slots(index: &AbsenceIndex) -> BTreeSet<TimeSlot> {
    slots_with_absence(index, 0)
}

/// Slots all but exactly one member marked. Empty for rosters of 0 or 1.
pub fn near_common_slots(index: &AbsenceIndex) -> BTreeSet<TimeSlot> {
    if index.member_count <= 1 {
        return BTreeSet::new();
    }
    slots_with_absence(index, 1)
}

fn slots_with_absence(index: &AbsenceIndex, absent: usize) -> BTreeSet<TimeSlot> {
    index
        .absences
        .iter()
        .filter(|(_, count)| **count == absent)
        .map(|(slot, _)| *slot)
        .collect()
}

/// Common slots for the combined view, or the raw persisted slots of the
/// selected member. An unknown member yields an empty set.
pub fn combined_or_individual(
    selection: &ViewSelection,
    members: &[Member],
    index: &AbsenceIndex,
) -> BTreeSet<TimeSlot> {
    match selection {
        ViewSelection::All => common_slots(index),
        ViewSelection::Member(user_id) => members
            .iter()
            .find(|m| &m.user_id == user_id)
            .map(|m| m.available_slots.clone())
            .unwrap_or_default(),
    }
}
