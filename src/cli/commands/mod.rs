pub mod auth;
pub mod config;
pub mod db;
pub mod edit;
pub mod export;
pub mod group;
pub mod init;
pub mod join;
pub mod leave;
pub mod log;
pub mod members;
pub mod show;
pub mod toggle;
pub mod watch;

use crate::config::Config;
use crate::config::session::SessionStore;
use crate::core::session::GroupSession;
use crate::db::log::log_notice;
use crate::errors::{AppError, AppResult};
use crate::gateway::{SqliteGateway, SyncGateway};
use crate::models::group::Group;
use crate::models::member::UserInfo;
use crate::models::selection::ViewSelection;
use crate::ui::messages;

/// Selection alias for the signed-in user.
const ME: &str = "me";

pub(crate) fn open_gateway(cfg: &Config) -> AppResult<SqliteGateway> {
    SqliteGateway::open(&cfg.database)
}

pub(crate) fn current_user() -> AppResult<Option<UserInfo>> {
    SessionStore::default().load()
}

pub(crate) fn require_user() -> AppResult<UserInfo> {
    current_user()?.ok_or(AppError::NotSignedIn)
}

/// Open a session on an existing group and load its roster once.
pub(crate) fn open_session(
    cfg: &Config,
    group_id: &str,
    viewer: Option<UserInfo>,
) -> AppResult<(Group, GroupSession<SqliteGateway>)> {
    let gateway = open_gateway(cfg)?;
    let group = gateway.fetch_group(group_id)?;
    let mut session = GroupSession::new(gateway, group_id, viewer);
    session.refresh();
    Ok((group, session))
}

/// `None`/"all" → combined view, "me" → the viewer, anything else → that id.
pub(crate) fn resolve_selection(
    value: Option<&str>,
    viewer: Option<&UserInfo>,
) -> AppResult<ViewSelection> {
    match value {
        None => Ok(ViewSelection::All),
        Some(v) if v.trim().eq_ignore_ascii_case(ME) => viewer
            .map(|u| ViewSelection::Member(u.user_id.clone()))
            .ok_or(AppError::NotSignedIn),
        Some(v) => Ok(ViewSelection::parse(v)),
    }
}

/// Parse a `row,col` cell. Column 0 is accepted here; the session
/// decides what a label-column click means.
pub(crate) fn parse_cell(text: &str) -> AppResult<(u8, u8)> {
    let invalid = || AppError::InvalidSlot(text.to_string());
    let (r, c) = text.split_once(',').ok_or_else(invalid)?;
    let row = r.trim().parse().map_err(|_| invalid())?;
    let col = c.trim().parse().map_err(|_| invalid())?;
    Ok((row, col))
}

/// Print queued notices and keep a copy in the internal log.
pub(crate) fn flush_notices(session: &mut GroupSession<SqliteGateway>) {
    for notice in session.take_notices() {
        messages::notice(&notice);
        log_notice(session.gateway().conn(), session.group_id(), &notice);
    }
}
