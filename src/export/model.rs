use crate::core::availability::AbsenceIndex;
use crate::core::session::DisplayState;
use crate::models::slot::{DAYS, HOURS, TimeSlot, WEEKDAY_NAMES};
use serde::Serialize;
use std::fmt;

/// How many members are missing from a slot, in words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotCategory {
    Common,
    NearCommon,
    Partial,
    None,
}

impl SlotCategory {
    pub fn classify(index: &AbsenceIndex, slot: &TimeSlot) -> Self {
        let members = index.member_count();
        if members == 0 {
            return SlotCategory::None;
        }
        match index.absence(slot) {
            0 => SlotCategory::Common,
            1 if members > 1 => SlotCategory::NearCommon,
            a if a < members => SlotCategory::Partial,
            _ => SlotCategory::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotCategory::Common => "common",
            SlotCategory::NearCommon => "near_common",
            SlotCategory::Partial => "partial",
            SlotCategory::None => "none",
        }
    }
}

impl fmt::Display for SlotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exported grid cell. Field order is the CSV column order.
#[derive(Debug, Clone, Serialize)]
pub struct SlotExport {
    pub slot: String,
    pub weekday: &'static str,
    pub hour: String,
    pub available: usize,
    pub absent: usize,
    pub category: SlotCategory,
    pub selected: bool,
}

/// Every selectable cell of the week, Sunday first, hour by hour.
/// `selected` mirrors what the grid shows for the current view.
pub fn build_slot_exports(index: &AbsenceIndex, display: &DisplayState) -> Vec<SlotExport> {
    let mut out = Vec::with_capacity(HOURS as usize * DAYS as usize);

    for col in 1..=DAYS {
        for row in 0..HOURS {
            let Ok(slot) = TimeSlot::new(row, col) else {
                continue;
            };
            out.push(SlotExport {
                slot: slot.key(),
                weekday: WEEKDAY_NAMES[(col - 1) as usize],
                hour: format!("{row:02}:00"),
                available: index.available(&slot),
                absent: index.absence(&slot),
                category: SlotCategory::classify(index, &slot),
                selected: display.display_slots.contains(&slot),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::availability::compute_absence_index;
    use crate::models::member::Member;

    fn slot(row: u8, col: u8) -> TimeSlot {
        TimeSlot::new(row, col).unwrap()
    }

    #[test]
    fn categories_follow_absence_counts() {
        let members = vec![
            Member::with_slots("a", [slot(3, 1), slot(3, 2), slot(4, 4)]),
            Member::with_slots("b", [slot(3, 1), slot(3, 2)]),
            Member::with_slots("c", [slot(3, 1)]),
        ];
        let index = compute_absence_index(&members);

        assert_eq!(SlotCategory::classify(&index, &slot(3, 1)), SlotCategory::Common);
        assert_eq!(SlotCategory::classify(&index, &slot(3, 2)), SlotCategory::NearCommon);
        assert_eq!(SlotCategory::classify(&index, &slot(4, 4)), SlotCategory::Partial);
        assert_eq!(SlotCategory::classify(&index, &slot(10, 6)), SlotCategory::None);
    }

    #[test]
    fn lone_member_has_no_near_common_category() {
        let members = vec![Member::with_slots("a", [slot(1, 1)])];
        let index = compute_absence_index(&members);
        assert_eq!(SlotCategory::classify(&index, &slot(1, 1)), SlotCategory::Common);
        assert_eq!(SlotCategory::classify(&index, &slot(1, 2)), SlotCategory::None);
    }

    #[test]
    fn rows_cover_the_whole_week() {
        let members = vec![Member::with_slots("a", [slot(9, 2)])];
        let index = compute_absence_index(&members);
        let display = DisplayState {
            display_slots: [slot(9, 2)].into_iter().collect(),
            ..DisplayState::default()
        };

        let rows = build_slot_exports(&index, &display);
        assert_eq!(rows.len(), 168);
        assert_eq!(rows[0].slot, "0,1");
        assert_eq!(rows[0].weekday, "Sunday");

        let monday_nine = rows.iter().find(|r| r.slot == "9,2").unwrap();
        assert_eq!(monday_nine.weekday, "Monday");
        assert_eq!(monday_nine.hour, "09:00");
        assert_eq!(monday_nine.available, 1);
        assert!(monday_nine.selected);
        assert_eq!(rows.iter().filter(|r| r.selected).count(), 1);
    }
}
