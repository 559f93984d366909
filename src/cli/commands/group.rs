use super::{flush_notices, open_gateway, open_session, require_user};
use crate::cli::parser::{Commands, GroupAction};
use crate::config::Config;
use crate::core::session::GroupSession;
use crate::errors::{AppError, AppResult};
use crate::gateway::SyncGateway;
use crate::ui::messages::{info, success, warning};
use crate::ui::prompt::confirm;
use crate::utils::formatting::plural;
use crate::utils::table::{Column, Table};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Group { action } = cmd {
        match action {
            GroupAction::List => list(cfg)?,
            GroupAction::Create { name } => create(cfg, name)?,
            GroupAction::Rename { group, name } => rename(cfg, group, name)?,
            GroupAction::Delete { group, yes } => delete(cfg, group, *yes)?,
        }
    }
    Ok(())
}

fn validate_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Other("group name must not be empty".into()));
    }
    Ok(name)
}

fn list(cfg: &Config) -> AppResult<()> {
    let user = require_user()?;
    let gateway = open_gateway(cfg)?;
    let groups = gateway.list_groups_for_user(&user.user_id)?;

    if groups.is_empty() {
        info("You are not a member of any group yet.");
        return Ok(());
    }

    let separator = cfg.separator_char.chars().next().unwrap_or('-');
    let mut table = Table::new(vec![
        Column::new("ID", 36),
        Column::new("Name", 10),
        Column::new("Members", 7),
    ])
    .with_separator(separator);

    for g in &groups {
        let members = match gateway.fetch_members(&g.id) {
            Ok(m) => m.len().to_string(),
            Err(e) => {
                warning(format!("{}: {e}", g.name));
                "?".to_string()
            }
        };
        table.add_row(vec![g.id.clone(), g.name.clone(), members]);
    }
    print!("{}", table.render());
    Ok(())
}

/// The creator joins right away; the new id goes to stdout on its own line.
fn create(cfg: &Config, name: &str) -> AppResult<()> {
    let name = validate_name(name)?;
    let user = require_user()?;
    let gateway = open_gateway(cfg)?;
    let group = gateway.create_group(name)?;

    let mut session = GroupSession::new(gateway, &group.id, Some(user));
    let joined = session.join();
    flush_notices(&mut session);

    success(format!("Created group '{}'", group.name));
    if !joined {
        warning("Group created, but joining it failed. Run `slotgrid join` to retry.");
    }
    println!("{}", group.id);
    Ok(())
}

fn rename(cfg: &Config, group_id: &str, name: &str) -> AppResult<()> {
    let name = validate_name(name)?;
    let gateway = open_gateway(cfg)?;
    let old = gateway.fetch_group(group_id)?;
    gateway.rename_group(group_id, name)?;
    success(format!("Renamed '{}' to '{name}'", old.name));
    Ok(())
}

fn delete(cfg: &Config, group_id: &str, yes: bool) -> AppResult<()> {
    let user = require_user()?;
    let (group, mut session) = open_session(cfg, group_id, Some(user))?;

    let question = format!(
        "Delete '{}' and its {}?",
        group.name,
        plural(session.directory().len(), "membership")
    );
    if !yes && !confirm(&question)? {
        info("Nothing deleted.");
        return Ok(());
    }

    let result = session.delete_group();
    flush_notices(&mut session);
    result?;
    success(format!("Deleted group '{}'", group.name));
    Ok(())
}
