use super::{current_user, flush_notices, open_session, resolve_selection};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::header;
use crate::utils::table::{Column, Table};

/// Selection list: "All (n)" first, then the roster by display name.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Members { group, member } = cmd {
        let viewer = current_user()?;
        let selection = resolve_selection(member.as_deref(), viewer.as_ref())?;
        let viewer_id = viewer.as_ref().map(|u| u.user_id.clone());
        let (found, mut session) = open_session(cfg, group, viewer)?;
        flush_notices(&mut session);

        let directory = session.directory();
        let marker = |hit: bool| (if hit { ">" } else { " " }).to_string();

        let separator = cfg.separator_char.chars().next().unwrap_or('-');
        let mut table = Table::new(vec![
            Column::new(" ", 1),
            Column::new("Member", 12),
            Column::new("ID", 8),
            Column::new("Slots", 5),
        ])
        .with_separator(separator);

        table.add_row(vec![
            marker(selection.is_all()),
            format!("All ({})", directory.len()),
            String::new(),
            String::new(),
        ]);
        for m in directory.sorted_by_name() {
            let you = if viewer_id.as_deref() == Some(m.user_id.as_str()) {
                " (you)"
            } else {
                ""
            };
            table.add_row(vec![
                marker(selection.is_member(&m.user_id)),
                format!("{}{you}", m.display_name),
                m.user_id.clone(),
                m.available_slots.len().to_string(),
            ]);
        }

        header(&found.name);
        print!("{}", table.render());
    }
    Ok(())
}
