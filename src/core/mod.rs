pub mod availability;
pub mod directory;
pub mod log;
pub mod notice;
pub mod overlay;
pub mod session;
