use super::show::print_view;
use super::{current_user, flush_notices, open_session, resolve_selection};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::info;
use std::thread;
use std::time::Duration;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Watch {
        group,
        member,
        ticks,
    } = cmd
    {
        let viewer = current_user()?;
        let selection = resolve_selection(member.as_deref(), viewer.as_ref())?;
        let (found, mut session) = open_session(cfg, group, viewer)?;

        if !session.start() {
            flush_notices(&mut session);
            return Ok(());
        }
        session.select(selection);
        flush_notices(&mut session);
        print_view(&session, &found, cfg);
        info(format!(
            "Watching '{}' every {} ms (Ctrl+C to stop)",
            found.name, cfg.poll_interval_ms
        ));

        let interval = Duration::from_millis(cfg.poll_interval_ms);
        let mut tick: u64 = 0;
        while ticks.is_none_or(|n| tick < n) {
            thread::sleep(interval);
            tick += 1;

            if session.pump() {
                // nothing is edited here, so an own view follows other devices too
                let selection = session.selection().clone();
                session.select(selection);
                print_view(&session, &found, cfg);
            }
            flush_notices(&mut session);
        }
        session.stop();
    }
    Ok(())
}
