use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::initialize::init_db_logged;
use crate::errors::AppResult;
use crate::ui::messages::success;

/// Handle the `init` command
///
/// Creates the config directory and file (not in test mode), the SQLite
/// file, and applies every pending migration.
pub fn handle(cli: &Cli) -> AppResult<()> {
    let cfg = Config::init_all(cli.db.clone(), cli.test)?;

    println!("⚙️  Initializing slotgrid…");
    println!("📄 Config file : {}", Config::config_file().display());
    println!("🗄️  Database   : {}", cfg.database);

    init_db_logged(&cfg.database)?;

    success(format!("Database initialized at {}", cfg.database));
    Ok(())
}
