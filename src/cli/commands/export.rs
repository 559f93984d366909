use super::{current_user, flush_notices, open_session, resolve_selection};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::export::ExportLogic;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        group,
        format,
        file,
        member,
        force,
    } = cmd
    {
        let viewer = current_user()?;
        let selection = resolve_selection(member.as_deref(), viewer.as_ref())?;
        let (_, mut session) = open_session(cfg, group, viewer)?;
        session.select(selection);
        flush_notices(&mut session);

        ExportLogic::export(&session, *format, file, *force)?;
    }
    Ok(())
}
