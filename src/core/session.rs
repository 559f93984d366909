//! Per-group viewer session: roster, selection, optimistic overlay and the
//! live subscription, all driven from one thread.
//!
//! Two event streams reach a session: the viewer's own clicks (applied to
//! the overlay first, then written) and change notifications from the
//! feed (answered with a full roster re-read). Re-reading is idempotent,
//! so duplicated or reordered notifications are harmless.

use crate::core::availability::{combined_or_individual, near_common_slots};
use crate::core::directory::MemberDirectory;
use crate::core::notice::Notice;
use crate::core::overlay::{LocalOverlay, RangeEdit};
use crate::errors::{AppError, AppResult};
use crate::gateway::{Subscription, SyncGateway};
use crate::models::member::{Member, UserInfo};
use crate::models::selection::ViewSelection;
use crate::models::slot::{TimeSlot, col_range, is_selectable, row_range};
use std::collections::BTreeSet;

/// What the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    pub display_slots: BTreeSet<TimeSlot>,
    pub near_common_slots: BTreeSet<TimeSlot>,
    pub is_editable: bool,
}

/// Given the roster, the selection and overlay ownership, produce what is
/// displayed. The overlay wins exactly when the viewer looks at themselves.
pub fn next_display(
    directory: &MemberDirectory,
    selection: &ViewSelection,
    viewer: Option<&str>,
    overlay: Option<&LocalOverlay>,
) -> DisplayState {
    let self_view = match (viewer, overlay) {
        (Some(v), Some(o)) if selection.is_member(v) && o.owner() == v => Some(o),
        _ => None,
    };

    let display_slots = match self_view {
        Some(o) => o.slots().clone(),
        None => combined_or_individual(selection, directory.members(), directory.index()),
    };

    let near_common_slots = if selection.is_all() {
        near_common_slots(directory.index())
    } else {
        BTreeSet::new()
    };

    DisplayState {
        display_slots,
        near_common_slots,
        is_editable: self_view.is_some(),
    }
}

pub struct GroupSession<G: SyncGateway> {
    gateway: G,
    group_id: String,
    viewer: Option<UserInfo>,
    directory: MemberDirectory,
    selection: ViewSelection,
    overlay: Option<LocalOverlay>,
    subscription: Option<Subscription>,
    notices: Vec<Notice>,
}

impl<G: SyncGateway> GroupSession<G> {
    /// `viewer == None` means view-only: no self-selection is possible.
    pub fn new(gateway: G, group_id: &str, viewer: Option<UserInfo>) -> Self {
        Self {
            gateway,
            group_id: group_id.to_string(),
            viewer,
            directory: MemberDirectory::new(),
            selection: ViewSelection::All,
            overlay: None,
            subscription: None,
            notices: Vec::new(),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn viewer(&self) -> Option<&UserInfo> {
        self.viewer.as_ref()
    }

    fn viewer_id(&self) -> Option<&str> {
        self.viewer.as_ref().map(|v| v.user_id.as_str())
    }

    pub fn directory(&self) -> &MemberDirectory {
        &self.directory
    }

    pub fn selection(&self) -> &ViewSelection {
        &self.selection
    }

    pub fn overlay(&self) -> Option<&LocalOverlay> {
        self.overlay.as_ref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    /// True when the viewer is on the roster as last fetched.
    pub fn viewer_is_member(&self) -> bool {
        self.viewer_id().is_some_and(|id| self.directory.contains(id))
    }

    /// Notices accumulated since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn surface(&mut self, err: &AppError) {
        if let Some(notice) = Notice::from_error(err) {
            self.notices.push(notice);
        }
    }

    /// Re-read the roster and replace it wholesale. On failure the last
    /// known roster stays and a notice is queued. The overlay is never
    /// touched here.
    pub fn refresh(&mut self) -> bool {
        match self.gateway.fetch_members(&self.group_id) {
            Ok(members) => {
                self.directory.replace(members);
                true
            }
            Err(e) => {
                self.surface(&e);
                false
            }
        }
    }

    /// First visit: load the roster and add the viewer when missing.
    ///
    /// A `JoinConflict` (another tab got there first) is swallowed.
    pub fn join(&mut self) -> bool {
        if !self.directory.is_loaded() && !self.refresh() {
            return false;
        }
        let Some(viewer) = self.viewer.clone() else {
            return false;
        };
        if self.directory.contains(&viewer.user_id) {
            return true;
        }

        match self.gateway.join_group(&self.group_id, &viewer) {
            Ok(()) => {}
            Err(e) if e.is_benign() => {}
            Err(e) => {
                self.surface(&e);
                return false;
            }
        }

        self.refresh();
        if !self.directory.contains(&viewer.user_id) {
            self.directory.insert_local(Member::from_user(&viewer));
        }
        true
    }

    /// Subscribe to the group's change feed, then re-read the roster.
    /// Anything committed before the cursor was placed is covered by that
    /// read, anything after it by the feed. Idempotent.
    pub fn start(&mut self) -> bool {
        if self.is_subscribed() {
            return true;
        }
        match self.gateway.subscribe(&self.group_id) {
            Ok(sub) => {
                self.subscription = Some(sub);
                self.refresh();
                true
            }
            Err(e) => {
                self.surface(&e);
                false
            }
        }
    }

    /// Cancel the subscription. Also happens when the session is dropped.
    pub fn stop(&mut self) {
        if let Some(mut sub) = self.subscription.take() {
            sub.stop();
        }
    }

    /// Drain pending notifications; refresh once if any arrived.
    pub fn pump(&mut self) -> bool {
        let pending = match self.subscription.as_mut().map(Subscription::poll) {
            Some(Ok(n)) => n,
            Some(Err(e)) => {
                self.surface(&e);
                return false;
            }
            None => return false,
        };
        pending > 0 && self.refresh()
    }

    /// Switch the viewed schedule. Selecting oneself reseeds the overlay
    /// from the roster; any other selection discards it.
    pub fn select(&mut self, selection: ViewSelection) {
        self.overlay = match self.viewer_id() {
            Some(id) if selection.is_member(id) && self.directory.contains(id) => {
                Some(LocalOverlay::seed(id, self.directory.slots_of(id)))
            }
            _ => None,
        };
        self.selection = selection;
    }

    /// Select the viewer's own schedule, if signed in.
    pub fn select_self(&mut self) -> bool {
        match self.viewer_id() {
            Some(id) => {
                let selection = ViewSelection::Member(id.to_string());
                self.select(selection);
                self.overlay.is_some()
            }
            None => false,
        }
    }

    pub fn display(&self) -> DisplayState {
        next_display(
            &self.directory,
            &self.selection,
            self.viewer_id(),
            self.overlay.as_ref(),
        )
    }

    fn overlay_mut(&mut self) -> AppResult<&mut LocalOverlay> {
        let selection = self.selection.to_string();
        self.overlay
            .as_mut()
            .ok_or(AppError::NotEditable(selection))
    }

    /// Toggle one cell. Label-column cells are ignored (`Ok(false)`).
    ///
    /// The overlay changes before the write is sent; a failed write only
    /// queues a notice, the next click sends the full state again.
    pub fn click(&mut self, row: u8, col: u8) -> AppResult<bool> {
        if !is_selectable(row, col) {
            return Ok(false);
        }
        let slot = TimeSlot::new(row, col)?;
        self.overlay_mut()?.toggle(slot);
        self.push_overlay();
        Ok(true)
    }

    /// Row-label click: toggles the whole week at `row` (cleared when fully
    /// marked, filled otherwise), one write.
    pub fn toggle_row(&mut self, row: u8) -> AppResult<RangeEdit> {
        let range = row_range(row)?;
        self.toggle_range(&range)
    }

    /// Column-header click: toggles the whole day at `col`, one write.
    pub fn toggle_col(&mut self, col: u8) -> AppResult<RangeEdit> {
        let range = col_range(col)?;
        self.toggle_range(&range)
    }

    fn toggle_range(&mut self, range: &[TimeSlot]) -> AppResult<RangeEdit> {
        let edit = self.overlay_mut()?.toggle_range(range);
        self.push_overlay();
        Ok(edit)
    }

    fn push_overlay(&mut self) {
        let Some(overlay) = &self.overlay else {
            return;
        };
        let slots: Vec<TimeSlot> = overlay.slots().iter().copied().collect();
        let owner = overlay.owner().to_string();

        if let Err(e) = self.gateway.write_slots(&self.group_id, &owner, &slots) {
            self.surface(&e);
        }
    }

    /// Remove the viewer from the group and fall back to the combined view.
    pub fn leave(&mut self) -> AppResult<()> {
        let viewer_id = self
            .viewer_id()
            .map(str::to_string)
            .ok_or(AppError::NotSignedIn)?;

        if let Err(e) = self.gateway.leave_group(&self.group_id, &viewer_id) {
            self.surface(&e);
            return Err(e);
        }
        self.select(ViewSelection::All);
        self.refresh();
        Ok(())
    }

    /// Delete the group: roster emptied, subscription cancelled.
    pub fn delete_group(&mut self) -> AppResult<()> {
        if let Err(e) = self.gateway.delete_group(&self.group_id) {
            self.surface(&e);
            return Err(e);
        }
        self.stop();
        self.directory.clear();
        self.select(ViewSelection::All);
        Ok(())
    }
}
