use super::slot::TimeSlot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identity of the signed-in viewer, as supplied by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// One participant of a group with their last persisted availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
    pub available_slots: BTreeSet<TimeSlot>,
}

impl Member {
    /// A freshly joined member: same identity, nothing marked yet.
    pub fn from_user(user: &UserInfo) -> Self {
        Self {
            user_id: user.user_id.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            available_slots: BTreeSet::new(),
        }
    }

    /// Builder used mostly by tests and fakes.
    pub fn with_slots<I>(user_id: &str, slots: I) -> Self
    where
        I: IntoIterator<Item = TimeSlot>,
    {
        Self {
            user_id: user_id.to_string(),
            display_name: user_id.to_string(),
            email: String::new(),
            avatar_url: String::new(),
            available_slots: slots.into_iter().collect(),
        }
    }

    /// Slot keys in grid order, the persisted representation.
    pub fn slot_keys(&self) -> Vec<String> {
        self.available_slots.iter().map(TimeSlot::key).collect()
    }
}
