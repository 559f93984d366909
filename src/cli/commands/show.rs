use super::{current_user, flush_notices, open_session, resolve_selection};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::session::GroupSession;
use crate::errors::AppResult;
use crate::gateway::SyncGateway;
use crate::models::group::Group;
use crate::models::selection::ViewSelection;
use crate::ui::grid::{legend, render_grid, render_summary};
use crate::ui::messages::{header, warning};

/// "All (n)", a display name, or the raw id for someone off the roster.
pub(crate) fn selection_label<G: SyncGateway>(session: &GroupSession<G>) -> String {
    let directory = session.directory();
    match session.selection() {
        ViewSelection::All => format!("All ({})", directory.len()),
        ViewSelection::Member(id) => match directory.get(id) {
            Some(m) => m.display_name.clone(),
            None => format!("{id} (not a member)"),
        },
    }
}

/// Header, grid, legend and slot lists for the session's current view.
pub(crate) fn print_view<G: SyncGateway>(session: &GroupSession<G>, group: &Group, cfg: &Config) {
    let display = session.display();
    let editing = if display.is_editable { " [editing]" } else { "" };

    header(format!("{} | {}{editing}", group.name, selection_label(session)));
    print!("{}", render_grid(&display, cfg.show_near_common));
    println!("{}", legend(cfg.show_near_common));
    print!("{}", render_summary(&display, cfg.show_near_common));
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Show { group, member } = cmd {
        let viewer = current_user()?;
        let selection = resolve_selection(member.as_deref(), viewer.as_ref())?;
        let (found, mut session) = open_session(cfg, group, viewer)?;

        if let ViewSelection::Member(id) = &selection
            && !session.directory().contains(id)
        {
            warning(format!("{id} is not a member of '{}'", found.name));
        }
        session.select(selection);

        flush_notices(&mut session);
        print_view(&session, &found, cfg);
    }
    Ok(())
}
