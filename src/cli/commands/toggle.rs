use super::show::print_view;
use super::{flush_notices, open_session, parse_cell, require_user};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::overlay::RangeEdit;
use crate::errors::{AppError, AppResult};
use crate::models::slot::{TimeSlot, WEEKDAY_NAMES};
use crate::ui::messages::{success, warning};

fn range_verb(edit: RangeEdit) -> &'static str {
    match edit {
        RangeEdit::Added => "Filled",
        RangeEdit::Removed => "Cleared",
    }
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Toggle {
        group,
        slots,
        rows,
        cols,
    } = cmd
    {
        if slots.is_empty() && rows.is_empty() && cols.is_empty() {
            return Err(AppError::InvalidSlot(
                "nothing to toggle (give row,col cells, --row or --col)".into(),
            ));
        }
        let cells = slots
            .iter()
            .map(|s| parse_cell(s))
            .collect::<AppResult<Vec<_>>>()?;

        let user = require_user()?;
        let (found, mut session) = open_session(cfg, group, Some(user))?;
        if !session.join() {
            flush_notices(&mut session);
            return Err(AppError::Write(format!("could not join '{}'", found.name)));
        }
        session.select_self();

        for (row, col) in cells {
            if !session.click(row, col)? {
                warning(format!("{row},{col} is a label cell, ignored"));
                continue;
            }
            let slot = TimeSlot::new(row, col)?;
            let marked = session.overlay().is_some_and(|o| o.slots().contains(&slot));
            let verb = if marked { "Marked" } else { "Cleared" };
            success(format!("{verb} {}", slot.label()));
        }
        for row in rows {
            let edit = session.toggle_row(*row)?;
            success(format!("{} {row:02}:00 on every day", range_verb(edit)));
        }
        for col in cols {
            let edit = session.toggle_col(*col)?;
            let day = WEEKDAY_NAMES[usize::from(*col - 1)];
            success(format!("{} all of {day}", range_verb(edit)));
        }

        flush_notices(&mut session);
        print_view(&session, &found, cfg);
    }
    Ok(())
}
