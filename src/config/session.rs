//! Signed-in identity, kept next to the configuration file.

use super::Config;
use crate::errors::{AppError, AppResult};
use crate::models::member::UserInfo;
use std::fs;
use std::path::PathBuf;

pub struct SessionStore {
    path: PathBuf,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Config::config_dir().join("session.yml"))
    }
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Current identity; `None` means view-only.
    pub fn load(&self) -> AppResult<Option<UserInfo>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| AppError::AuthAction(format!("cannot read session: {e}")))?;
        serde_yaml::from_str(&content)
            .map(Some)
            .map_err(|e| AppError::AuthAction(format!("corrupt session file: {e}")))
    }

    pub fn login(&self, user: &UserInfo) -> AppResult<()> {
        if user.user_id.trim().is_empty() {
            return Err(AppError::AuthAction("user id must not be empty".into()));
        }
        let yaml =
            serde_yaml::to_string(user).map_err(|e| AppError::AuthAction(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::AuthAction(format!("cannot save session: {e}")))?;
        }
        fs::write(&self.path, yaml)
            .map_err(|e| AppError::AuthAction(format!("cannot save session: {e}")))
    }

    /// Returns whether a session existed.
    pub fn logout(&self) -> AppResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .map(|_| true)
            .map_err(|e| AppError::AuthAction(format!("cannot remove session: {e}")))
    }
}
