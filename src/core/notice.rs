use crate::errors::AppError;
use std::fmt;

/// Category of a user-visible, non-blocking notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Fetch,
    Write,
    AuthAction,
    Other,
}

impl NoticeKind {
    /// Operation name used in the internal log table.
    pub fn as_log_operation(&self) -> &'static str {
        match self {
            NoticeKind::Fetch => "fetch_error",
            NoticeKind::Write => "write_error",
            NoticeKind::AuthAction => "auth_error",
            NoticeKind::Other => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    /// Classify an error for the notification layer. Benign races yield None.
    pub fn from_error(err: &AppError) -> Option<Self> {
        if err.is_benign() {
            return None;
        }
        let kind = match err {
            AppError::Fetch(_) | AppError::GroupNotFound(_) => NoticeKind::Fetch,
            AppError::Write(_) => NoticeKind::Write,
            AppError::AuthAction(_) | AppError::NotSignedIn => NoticeKind::AuthAction,
            _ => NoticeKind::Other,
        };
        Some(Self {
            kind,
            message: err.to_string(),
        })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
