use std::fmt;

/// Which schedule the viewer is looking at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewSelection {
    /// Combined view: slots every member has marked.
    #[default]
    All,
    Member(String),
}

impl ViewSelection {
    /// Sentinel used on the command line and in the selection list.
    pub const ALL: &'static str = "all";

    /// Convert CLI input → selection (`all` is case-insensitive).
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case(Self::ALL) {
            ViewSelection::All
        } else {
            ViewSelection::Member(value.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, ViewSelection::All)
    }

    /// True when this selection points at `user_id`.
    pub fn is_member(&self, user_id: &str) -> bool {
        matches!(self, ViewSelection::Member(id) if id == user_id)
    }
}

impl fmt::Display for ViewSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewSelection::All => f.write_str(Self::ALL),
            ViewSelection::Member(id) => f.write_str(id),
        }
    }
}
