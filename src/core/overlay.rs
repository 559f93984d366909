use crate::models::slot::TimeSlot;
use std::collections::BTreeSet;

/// The viewer's optimistic copy of their own slots.
///
/// Seeded from the directory when the viewer selects themselves; after that
/// only local clicks mutate it, never roster refreshes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalOverlay {
    owner: String,
    slots: BTreeSet<TimeSlot>,
}

/// What a row/column toggle did to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEdit {
    Added,
    Removed,
}

impl LocalOverlay {
    pub fn seed(owner: &str, slots: BTreeSet<TimeSlot>) -> Self {
        Self {
            owner: owner.to_string(),
            slots,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn slots(&self) -> &BTreeSet<TimeSlot> {
        &self.slots
    }

    /// Flip one slot; returns whether it is now marked.
    pub fn toggle(&mut self, slot: TimeSlot) -> bool {
        if self.slots.remove(&slot) {
            false
        } else {
            self.slots.insert(slot);
            true
        }
    }

    /// Toggle a range: a fully marked range is cleared, anything else is filled.
    pub fn toggle_range(&mut self, range: &[TimeSlot]) -> RangeEdit {
        if range.iter().all(|s| self.slots.contains(s)) {
            for slot in range {
                self.slots.remove(slot);
            }
            RangeEdit::Removed
        } else {
            self.slots.extend(range.iter().copied());
            RangeEdit::Added
        }
    }

    /// De-duplicated keys in grid order, ready to be written.
    pub fn keys(&self) -> Vec<String> {
        self.slots.iter().map(TimeSlot::key).collect()
    }
}
