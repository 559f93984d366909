use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of hour rows in the weekly grid (00:00 .. 23:00).
pub const HOURS: u8 = 24;
/// Number of weekday columns (Sunday .. Saturday).
pub const DAYS: u8 = 7;
/// Column 0 renders the hour label and is never a storable slot.
pub const LABEL_COL: u8 = 0;

/// Short weekday headers, indexed by `col - 1`.
pub const WEEKDAY_SHORT: [&str; 7] = ["S", "M", "T", "W", "T", "F", "S"];
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// One bookable (hour, weekday) cell.
///
/// The canonical identity is the key `"row,col"`; ordering is row-major so
/// sorted sets iterate the grid top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TimeSlot {
    row: u8,
    col: u8,
}

impl TimeSlot {
    /// Build a storable slot. Fails for the label column or out-of-grid cells.
    pub fn new(row: u8, col: u8) -> AppResult<Self> {
        if row >= HOURS || !is_selectable(row, col) || col > DAYS {
            return Err(AppError::InvalidSlot(format!("{row},{col}")));
        }
        Ok(Self { row, col })
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    /// Canonical `"row,col"` encoding.
    pub fn key(&self) -> String {
        format!("{},{}", self.row, self.col)
    }

    /// Parse a canonical key. Padding, signs and leading zeros are
    /// rejected: the key must read back exactly as `key()` writes it.
    pub fn from_key(key: &str) -> AppResult<Self> {
        let invalid = || AppError::InvalidSlot(key.to_string());

        let (r, c) = key.split_once(',').ok_or_else(invalid)?;
        let row: u8 = r.parse().map_err(|_| invalid())?;
        let col: u8 = c.parse().map_err(|_| invalid())?;

        let slot = Self::new(row, col).map_err(|_| invalid())?;
        if slot.key() != key {
            return Err(invalid());
        }
        Ok(slot)
    }

    /// e.g. "Monday 09:00"
    pub fn label(&self) -> String {
        format!(
            "{} {:02}:00",
            WEEKDAY_NAMES[(self.col - 1) as usize],
            self.row
        )
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl From<TimeSlot> for String {
    fn from(slot: TimeSlot) -> Self {
        slot.key()
    }
}

impl TryFrom<String> for TimeSlot {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeSlot::from_key(&value)
    }
}

/// False for the row-label column: those cells render but never toggle.
pub fn is_selectable(_row: u8, col: u8) -> bool {
    col != LABEL_COL
}

/// The whole week for one hour: `(row,1) ..= (row,7)`.
pub fn row_range(row: u8) -> AppResult<Vec<TimeSlot>> {
    (1..=DAYS).map(|col| TimeSlot::new(row, col)).collect()
}

/// The whole day for one weekday: `(0,col) ..= (23,col)`.
pub fn col_range(col: u8) -> AppResult<Vec<TimeSlot>> {
    (0..HOURS).map(|row| TimeSlot::new(row, col)).collect()
}
