//! `login`, `logout` and `whoami`.

use crate::cli::parser::Commands;
use crate::config::session::SessionStore;
use crate::errors::AppResult;
use crate::models::member::UserInfo;
use crate::ui::messages::{info, success};

pub fn handle(cmd: &Commands) -> AppResult<()> {
    let store = SessionStore::default();

    match cmd {
        Commands::Login {
            user_id,
            name,
            email,
            avatar,
        } => {
            let user = UserInfo {
                user_id: user_id.trim().to_string(),
                display_name: name.clone().unwrap_or_else(|| user_id.trim().to_string()),
                email: email.clone(),
                avatar_url: avatar.clone(),
            };
            store.login(&user)?;
            success(format!("Signed in as {} ({})", user.display_name, user.user_id));
        }
        Commands::Logout => {
            if store.logout()? {
                success("Signed out.");
            } else {
                info("No active session.");
            }
        }
        Commands::Whoami => match store.load()? {
            Some(user) => println!("{} ({})", user.display_name, user.user_id),
            None => info("Not signed in (view-only)."),
        },
        _ => {}
    }
    Ok(())
}
