use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, success, warning};
use std::process::Command;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        check,
        edit_config,
        editor,
    } = cmd
    {
        let path = Config::config_file();

        if *print_config {
            let yaml = serde_yaml::to_string(cfg).map_err(|e| AppError::Config(e.to_string()))?;
            println!("📄 Current configuration ({}):\n", path.display());
            println!("{yaml}");
        }

        if *check {
            let missing = Config::missing_keys()?;
            if missing.is_empty() {
                success("Configuration file is complete.");
            } else {
                for key in &missing {
                    warning(format!("Missing field '{key}' (default value in use)"));
                }
            }
        }

        if *edit_config {
            let default_editor = std::env::var("EDITOR")
                .or_else(|_| std::env::var("VISUAL"))
                .unwrap_or_else(|_| {
                    if cfg!(target_os = "windows") {
                        "notepad".to_string()
                    } else {
                        "nano".to_string()
                    }
                });
            let requested = editor.clone().unwrap_or_else(|| default_editor.clone());

            let edited = |ed: &str| {
                Command::new(ed)
                    .arg(&path)
                    .status()
                    .is_ok_and(|s| s.success())
            };

            if edited(&requested) {
                success(format!("Configuration file edited using '{requested}'"));
                return Ok(());
            }
            if requested != default_editor {
                warning(format!(
                    "Editor '{requested}' not available, falling back to '{default_editor}'"
                ));
                if edited(&default_editor) {
                    success(format!("Configuration file edited using '{default_editor}'"));
                    return Ok(());
                }
            }
            error("Failed to edit the configuration file");
        }
    }

    Ok(())
}
