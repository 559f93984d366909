//! Unified application error type.
//! All modules (db, gateway, core, cli) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Sync gateway
    // ---------------------------
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Write failed: {0}")]
    Write(String),

    /// Two joins for the same `(group, user)` raced; the row already exists.
    #[error("User {user_id} is already a member of group {group_id}")]
    JoinConflict { group_id: String, user_id: String },

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    // ---------------------------
    // Identity
    // ---------------------------
    #[error("Authentication action failed: {0}")]
    AuthAction(String),

    #[error("Not signed in (run `slotgrid login` first)")]
    NotSignedIn,

    // ---------------------------
    // Parsing / engine errors
    // ---------------------------
    #[error("Invalid time slot: {0}")]
    InvalidSlot(String),

    #[error("Schedule is read-only: {0}")]
    NotEditable(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Errors that describe a harmless race rather than a failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, AppError::JoinConflict { .. })
    }
}

pub type AppResult<T> = Result<T, AppError>;
