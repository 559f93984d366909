use crate::core::notice::{Notice, NoticeKind};
use crate::utils::colors::{BLUE, BOLD, GREEN, RED, RESET, YELLOW};
use std::fmt;

const ICON_INFO: &str = "ℹ️";
const ICON_OK: &str = "✅";
const ICON_WARN: &str = "⚠️";
const ICON_ERR: &str = "❌";

fn line(color: &str, icon: &str, msg: impl fmt::Display) -> String {
    format!("{color}{BOLD}{icon} {RESET}{msg}")
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{}", line(BLUE, ICON_INFO, msg));
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{}", line(GREEN, ICON_OK, msg));
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{}", line(YELLOW, ICON_WARN, msg));
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{}", line(RED, ICON_ERR, msg));
}

/// Section header, e.g. the group name above a grid.
pub fn header<T: fmt::Display>(msg: T) {
    println!("{BLUE}{BOLD}== {msg}{RESET}");
}

/// Show a queued engine notice. Nothing here is fatal.
pub fn notice(n: &Notice) {
    match n.kind {
        NoticeKind::Fetch => warning(format!("Could not load the schedule: {n}")),
        NoticeKind::Write => warning(format!("Could not save your changes: {n}")),
        NoticeKind::AuthAction => error(format!("Sign-in problem: {n}")),
        NoticeKind::Other => warning(n),
    }
}
