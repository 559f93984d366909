use super::{flush_notices, open_session, require_user};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::{info, success};
use crate::ui::prompt::confirm;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Leave { group, yes } = cmd {
        let user = require_user()?;
        let (found, mut session) = open_session(cfg, group, Some(user))?;

        if !session.viewer_is_member() {
            info(format!("You are not a member of '{}'", found.name));
            return Ok(());
        }
        if !*yes && !confirm(&format!("Leave '{}'? Your slots will be removed.", found.name))? {
            info("Still a member.");
            return Ok(());
        }

        let result = session.leave();
        flush_notices(&mut session);
        result?;
        success(format!("Left '{}'", found.name));
    }
    Ok(())
}
