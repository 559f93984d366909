use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

pub mod session;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_show_near_common")]
    pub show_near_common: bool,
    #[serde(default = "default_separator_char")]
    pub separator_char: String,
}

/// Every key a complete configuration file carries.
pub const CONFIG_KEYS: [&str; 4] = [
    "database",
    "poll_interval_ms",
    "show_near_common",
    "separator_char",
];

fn default_poll_interval() -> u64 {
    1000
}
fn default_show_near_common() -> bool {
    true
}
fn default_separator_char() -> String {
    "-".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            poll_interval_ms: default_poll_interval(),
            show_near_common: default_show_near_common(),
            separator_char: default_separator_char(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("slotgrid")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".slotgrid")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("slotgrid.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("slotgrid.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let mut cfg: Config = serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
        cfg.database = expand_tilde(&cfg.database).to_string_lossy().to_string();
        Ok(cfg)
    }

    /// Keys of `CONFIG_KEYS` missing from the file on disk.
    pub fn missing_keys() -> AppResult<Vec<&'static str>> {
        let path = Self::config_file();
        if !path.exists() {
            return Ok(CONFIG_KEYS.to_vec());
        }
        let content = fs::read_to_string(&path)?;
        let yaml: serde_yaml::Value = serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;

        let Some(map) = yaml.as_mapping() else {
            return Err(AppError::Config("configuration is not a YAML mapping".into()));
        };
        Ok(CONFIG_KEYS
            .iter()
            .copied()
            .filter(|k| !map.contains_key(serde_yaml::Value::String(k.to_string())))
            .collect())
    }

    /// A `--db` value: `~/` expanded, bare names placed in the config dir.
    pub fn resolve_db_path(name: &str) -> PathBuf {
        let p = expand_tilde(name);
        if p.is_absolute() || p.parent().is_some_and(|d| !d.as_os_str().is_empty()) {
            p
        } else {
            Self::config_dir().join(p)
        }
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_db: Option<String>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let db_path = match custom_db {
            Some(name) => Self::resolve_db_path(&name),
            None => Self::database_file(),
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        if !is_test {
            let yaml = serde_yaml::to_string(&config)
                .map_err(|e| AppError::Config(e.to_string()))?;
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(yaml.as_bytes())?;
        }

        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !db_path.exists() {
            fs::File::create(&db_path)?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_paths_resolve_like_init_does() {
        assert_eq!(
            Config::resolve_db_path("/tmp/team.sqlite"),
            PathBuf::from("/tmp/team.sqlite")
        );
        assert_eq!(
            Config::resolve_db_path("team.sqlite"),
            Config::config_dir().join("team.sqlite")
        );
        assert_eq!(
            Config::resolve_db_path("./team.sqlite"),
            PathBuf::from("./team.sqlite")
        );
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let cfg: Config = serde_yaml::from_str("database: /tmp/x.sqlite\n").unwrap();
        assert_eq!(cfg.poll_interval_ms, 1000);
        assert!(cfg.show_near_common);
        assert_eq!(cfg.separator_char, "-");
    }
}
