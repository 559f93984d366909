use crate::core::session::GroupSession;
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::build_slot_exports;
use crate::gateway::SyncGateway;
use crate::ui::messages::warning;
use std::path::Path;

pub struct ExportLogic;

impl ExportLogic {
    /// Write the session's current view to `file`.
    ///
    /// - `format`: csv | json
    /// - `file`: absolute output path
    /// - `force`: overwrite without asking
    pub fn export<G: SyncGateway>(
        session: &GroupSession<G>,
        format: ExportFormat,
        file: &str,
        force: bool,
    ) -> AppResult<()> {
        let path = Path::new(file);

        if !path.is_absolute() {
            return Err(AppError::Export(format!(
                "output file path must be absolute: {file}"
            )));
        }

        ensure_writable(path, force)?;

        let directory = session.directory();
        if directory.is_empty() {
            warning("Group has no members yet; every slot is exported as empty.");
        }

        let rows = build_slot_exports(directory.index(), &session.display());

        match format {
            ExportFormat::Csv => export_csv(&rows, path),
            ExportFormat::Json => export_json(&rows, path),
        }
    }
}
