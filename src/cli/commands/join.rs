use super::{flush_notices, open_session, require_user};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Join { group } = cmd {
        let user = require_user()?;
        let (found, mut session) = open_session(cfg, group, Some(user))?;

        if session.viewer_is_member() {
            info(format!("Already a member of '{}'", found.name));
            return Ok(());
        }

        let joined = session.join();
        flush_notices(&mut session);
        if !joined {
            return Err(AppError::Write(format!("could not join '{}'", found.name)));
        }
        success(format!("Joined '{}'", found.name));
    }
    Ok(())
}
