//! slotgrid library root.
//! Weekly availability grids shared by a group: who is free when, and
//! which hours everyone (or all but one) can make.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod export;
pub mod gateway;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::commands;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let cmd = &cli.command;
    match cmd {
        Commands::Init => commands::init::handle(cli),
        Commands::Config { .. } => commands::config::handle(cmd, cfg),
        Commands::Db { .. } => commands::db::handle(cmd, cfg),
        Commands::Log { .. } => commands::log::handle(cmd, cfg),
        Commands::Login { .. } | Commands::Logout | Commands::Whoami => {
            commands::auth::handle(cmd)
        }
        Commands::Group { .. } => commands::group::handle(cmd, cfg),
        Commands::Join { .. } => commands::join::handle(cmd, cfg),
        Commands::Leave { .. } => commands::leave::handle(cmd, cfg),
        Commands::Members { .. } => commands::members::handle(cmd, cfg),
        Commands::Show { .. } => commands::show::handle(cmd, cfg),
        Commands::Toggle { .. } => commands::toggle::handle(cmd, cfg),
        Commands::Edit { .. } => commands::edit::handle(cmd, cfg),
        Commands::Watch { .. } => commands::watch::handle(cmd, cfg),
        Commands::Export { .. } => commands::export::handle(cmd, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = Config::resolve_db_path(custom_db)
            .to_string_lossy()
            .to_string();
    }

    dispatch(&cli, &cfg)
}
