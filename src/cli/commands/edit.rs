//! Interactive editing session. One thread: before every command the
//! change feed is drained, then the command runs against the session.

use super::show::{print_view, selection_label};
use super::{current_user, flush_notices, open_session, parse_cell, resolve_selection};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::overlay::RangeEdit;
use crate::core::session::GroupSession;
use crate::errors::{AppError, AppResult};
use crate::gateway::SyncGateway;
use crate::models::group::Group;
use crate::ui::messages::{info, success, warning};
use std::io::{self, BufRead, Write};

const HELP: &str = "\
commands:
  r,c          toggle one cell (row 0-23, col 1-7, 1 = Sunday)
  row N        toggle hour N on every day (cleared when full)
  col N        toggle weekday column N (cleared when full)
  select ID    view a member ('me' or 'all' work too)
  show         print the grid
  members      list the roster
  refresh      re-read the roster now
  quit         leave the session";

#[derive(Debug, PartialEq, Eq)]
enum EditCommand {
    Toggle(u8, u8),
    Row(u8),
    Col(u8),
    Select(String),
    Show,
    Members,
    Refresh,
    Help,
    Quit,
}

impl EditCommand {
    /// `Ok(None)` for a blank line.
    fn parse(line: &str) -> AppResult<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((w, a)) => (w, a.trim()),
            None => (line, ""),
        };
        let number = |what: &str| {
            arg.parse::<u8>()
                .map_err(|_| AppError::InvalidSlot(format!("{what} '{arg}'")))
        };

        let cmd = match word.to_ascii_lowercase().as_str() {
            "quit" | "exit" | "q" => EditCommand::Quit,
            "show" => EditCommand::Show,
            "members" => EditCommand::Members,
            "refresh" => EditCommand::Refresh,
            "help" | "?" => EditCommand::Help,
            "row" => EditCommand::Row(number("row")?),
            "col" => EditCommand::Col(number("col")?),
            "select" if !arg.is_empty() => EditCommand::Select(arg.to_string()),
            _ if line.contains(',') => {
                let (row, col) = parse_cell(line)?;
                EditCommand::Toggle(row, col)
            }
            _ => {
                return Err(AppError::Other(format!(
                    "unknown command '{line}' (type help)"
                )));
            }
        };
        Ok(Some(cmd))
    }
}

fn report_range(edit: RangeEdit, what: &str) {
    match edit {
        RangeEdit::Added => success(format!("Filled {what}")),
        RangeEdit::Removed => success(format!("Cleared {what}")),
    }
}

/// Apply one command. Errors are shown and the session goes on.
fn apply<G: SyncGateway>(
    session: &mut GroupSession<G>,
    group: &Group,
    cfg: &Config,
    cmd: EditCommand,
) -> AppResult<()> {
    match cmd {
        EditCommand::Toggle(row, col) => {
            if session.click(row, col)? {
                success(format!("Toggled {row},{col}"));
            } else {
                warning(format!("{row},{col} is a label cell, ignored"));
            }
        }
        EditCommand::Row(row) => report_range(session.toggle_row(row)?, &format!("row {row}")),
        EditCommand::Col(col) => report_range(session.toggle_col(col)?, &format!("col {col}")),
        EditCommand::Select(who) => {
            let selection = resolve_selection(Some(who.as_str()), session.viewer())?;
            session.select(selection);
            info(format!("Viewing {}", selection_label(session)));
        }
        EditCommand::Show => print_view(session, group, cfg),
        EditCommand::Members => {
            println!("All ({})", session.directory().len());
            for m in session.directory().sorted_by_name() {
                println!("  {} ({})", m.display_name, m.user_id);
            }
        }
        EditCommand::Refresh => {
            if session.refresh() {
                info(format!("{} loaded", selection_label(session)));
            }
        }
        EditCommand::Help => println!("{HELP}"),
        EditCommand::Quit => {}
    }
    Ok(())
}

/// Read commands until `quit` or end of input. Returns how many commands
/// ran. The subscription is stopped on every way out.
pub(crate) fn run_session<G, R, F>(
    session: &mut GroupSession<G>,
    group: &Group,
    cfg: &Config,
    input: R,
    mut flush: F,
) -> AppResult<usize>
where
    G: SyncGateway,
    R: BufRead,
    F: FnMut(&mut GroupSession<G>),
{
    let mut executed = 0;
    let result = (|| -> AppResult<()> {
        for line in input.lines() {
            let line = line?;

            if session.pump() {
                info("Schedule changed, refreshed.");
            }

            match EditCommand::parse(&line) {
                Ok(None) => {}
                Ok(Some(EditCommand::Quit)) => break,
                Ok(Some(cmd)) => {
                    if let Err(e) = apply(session, group, cfg, cmd) {
                        warning(e);
                    }
                    executed += 1;
                }
                Err(e) => warning(e),
            }
            flush(session);

            print!("slotgrid> ");
            io::stdout().flush()?;
        }
        Ok(())
    })();

    session.stop();
    flush(session);
    result.map(|()| executed)
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Edit { group } = cmd {
        let viewer = current_user()?;
        let (found, mut session) = open_session(cfg, group, viewer)?;
        session.start();

        if session.viewer().is_some() {
            if session.join() {
                session.select_self();
            }
        } else {
            warning("Not signed in: this session is view-only.");
        }
        flush_notices(&mut session);

        print_view(&session, &found, cfg);
        println!("Type 'help' for commands.");
        print!("slotgrid> ");
        io::stdout().flush()?;

        let stdin = io::stdin();
        let executed = run_session(&mut session, &found, cfg, stdin.lock(), flush_notices)?;
        println!();
        info(format!("Session closed after {executed} command(s)."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryGateway;
    use crate::models::member::UserInfo;
    use crate::models::selection::ViewSelection;
    use crate::models::slot::TimeSlot;
    use std::io::Cursor;

    fn user(id: &str) -> UserInfo {
        UserInfo {
            user_id: id.into(),
            display_name: id.to_uppercase(),
            email: String::new(),
            avatar_url: String::new(),
        }
    }

    fn cfg() -> Config {
        Config {
            database: ":memory:".into(),
            poll_interval_ms: 10,
            show_near_common: true,
            separator_char: "-".into(),
        }
    }

    fn group() -> Group {
        Group {
            id: "g".into(),
            name: "Team".into(),
        }
    }

    #[test]
    fn parse_commands() {
        assert_eq!(EditCommand::parse("  ").unwrap(), None);
        assert_eq!(
            EditCommand::parse("3,2").unwrap(),
            Some(EditCommand::Toggle(3, 2))
        );
        assert_eq!(EditCommand::parse("row 7").unwrap(), Some(EditCommand::Row(7)));
        assert_eq!(EditCommand::parse("COL 1").unwrap(), Some(EditCommand::Col(1)));
        assert_eq!(
            EditCommand::parse("select bob").unwrap(),
            Some(EditCommand::Select("bob".into()))
        );
        assert_eq!(EditCommand::parse("exit").unwrap(), Some(EditCommand::Quit));
        assert!(EditCommand::parse("row x").is_err());
        assert!(EditCommand::parse("select").is_err());
        assert!(EditCommand::parse("dance").is_err());
    }

    #[test]
    fn scripted_session_edits_and_unsubscribes() {
        let gw = MemoryGateway::new().with_group("g", "Team");
        let mut session = GroupSession::new(gw.clone(), "g", Some(user("a")));
        assert!(session.join());
        session.select_self();
        assert!(session.start());

        let script = "3,2\n3,0\nrow 5\nbogus\nselect all\nquit\n1,1\n";
        let executed =
            run_session(&mut session, &group(), &cfg(), Cursor::new(script), |s| {
                s.take_notices();
            })
            .unwrap();

        assert_eq!(executed, 4);
        assert!(!session.is_subscribed());
        assert_eq!(gw.active_subscriptions(), 0);
        assert_eq!(*session.selection(), ViewSelection::All);

        let stored = gw.fetch_members("g").unwrap();
        let slots = &stored[0].available_slots;
        assert!(slots.contains(&TimeSlot::new(3, 2).unwrap()));
        assert_eq!(slots.len(), 1 + 7);
        assert!(!slots.contains(&TimeSlot::new(1, 1).unwrap()));
    }

    #[test]
    fn remote_changes_are_picked_up_between_commands() {
        let gw = MemoryGateway::new().with_group("g", "Team");
        let mut session = GroupSession::new(gw.clone(), "g", Some(user("a")));
        session.join();
        session.start();

        let other = gw.clone();
        other.join_group("g", &user("b")).unwrap();

        run_session(&mut session, &group(), &cfg(), Cursor::new("show\n"), |s| {
            s.take_notices();
        })
        .unwrap();
        assert_eq!(session.directory().len(), 2);
    }

    #[test]
    fn view_only_session_cannot_toggle() {
        let gw = MemoryGateway::new().with_group("g", "Team");
        let mut session = GroupSession::new(gw.clone(), "g", None);
        session.refresh();

        let executed = run_session(&mut session, &group(), &cfg(), Cursor::new("2,2\n"), |s| {
            s.take_notices();
        })
        .unwrap();
        assert_eq!(executed, 1);
        assert!(gw.writes().is_empty());
    }
}
