//! Text rendering of the 24 x 7 week grid.

use crate::core::session::DisplayState;
use crate::models::slot::{DAYS, HOURS, TimeSlot, WEEKDAY_SHORT};
use crate::utils::colors::{GREEN, GREY, RESET, YELLOW};
use std::collections::BTreeSet;

const MARK_SELECTED: char = '#';
const MARK_NEAR: char = '+';
const MARK_EMPTY: char = '.';

/// Label column width ("HH:00" plus a gap).
const LABEL_WIDTH: usize = 7;

fn cell(display: &DisplayState, slot: &TimeSlot, show_near_common: bool) -> String {
    let (mark, color) = if display.display_slots.contains(slot) {
        (MARK_SELECTED, GREEN)
    } else if show_near_common && display.near_common_slots.contains(slot) {
        (MARK_NEAR, YELLOW)
    } else {
        (MARK_EMPTY, GREY)
    };
    format!(" {color}{mark}{RESET} ")
}

/// Header row plus one line per hour. Marked cells outrank near-common ones.
pub fn render_grid(display: &DisplayState, show_near_common: bool) -> String {
    let mut out = String::new();

    out.push_str(&" ".repeat(LABEL_WIDTH));
    for day in WEEKDAY_SHORT {
        out.push_str(&format!(" {day} "));
    }
    out.push('\n');

    for row in 0..HOURS {
        out.push_str(&format!("{:<width$}", format!("{row:02}:00"), width = LABEL_WIDTH));
        for col in 1..=DAYS {
            if let Ok(slot) = TimeSlot::new(row, col) {
                out.push_str(&cell(display, &slot, show_near_common));
            }
        }
        out.push('\n');
    }
    out
}

fn keys(slots: &BTreeSet<TimeSlot>) -> String {
    if slots.is_empty() {
        return "none".to_string();
    }
    slots.iter().map(TimeSlot::key).collect::<Vec<_>>().join(" ")
}

/// Plain-text slot lists under the grid, for copy/paste and scripts.
pub fn render_summary(display: &DisplayState, show_near_common: bool) -> String {
    let mut out = format!("Selected: {}\n", keys(&display.display_slots));
    if show_near_common && !display.near_common_slots.is_empty() {
        out.push_str(&format!("Near-common: {}\n", keys(&display.near_common_slots)));
    }
    out
}

pub fn legend(show_near_common: bool) -> String {
    if show_near_common {
        format!("{MARK_SELECTED} available   {MARK_NEAR} one member missing   {MARK_EMPTY} free")
    } else {
        format!("{MARK_SELECTED} available   {MARK_EMPTY} free")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(row: u8, col: u8) -> TimeSlot {
        TimeSlot::new(row, col).unwrap()
    }

    fn state() -> DisplayState {
        DisplayState {
            display_slots: [slot(3, 1)].into_iter().collect(),
            near_common_slots: [slot(3, 2), slot(3, 1)].into_iter().collect(),
            is_editable: false,
        }
    }

    #[test]
    fn grid_has_header_and_one_line_per_hour() {
        let out = render_grid(&state(), true);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 25);
        assert!(lines[0].contains(" S  M  T  W  T  F  S "));
        assert!(lines[1].starts_with("00:00"));
        assert!(lines[24].starts_with("23:00"));
    }

    #[test]
    fn marked_cell_wins_over_near_common() {
        let out = render_grid(&state(), true);
        let row3 = out.lines().nth(4).unwrap();
        let first = row3.find(MARK_SELECTED).unwrap();
        let near = row3.find(MARK_NEAR).unwrap();
        assert!(first < near);
        assert_eq!(row3.matches(MARK_NEAR).count(), 1);
    }

    #[test]
    fn near_common_can_be_hidden() {
        let out = render_grid(&state(), false);
        assert!(!out.contains(MARK_NEAR));
        assert_eq!(render_summary(&state(), false), "Selected: 3,1\n");
    }

    #[test]
    fn summary_lists_keys() {
        assert_eq!(
            render_summary(&state(), true),
            "Selected: 3,1\nNear-common: 3,1 3,2\n"
        );
        assert_eq!(
            render_summary(&DisplayState::default(), true),
            "Selected: none\n"
        );
    }
}
