//! Full and selected exports.
//!
//! Handles messages: `RunExport`, `ExportFinished`, `ExportSelected`,
//! `SelectedExportFinished`

use gsync_bridge::{ExportResult, ListQuery};
use log::info;

use crate::error::AppError;
use crate::message::Message;

use super::{App, joined};

impl App {
    pub(super) fn handle_run_export(&mut self) {
        if self.state.busy.exporting {
            return;
        }
        self.state.busy.exporting = true;
        self.state.export_output.clear();
        self.state.refresh_error = None;

        let bridge = self.bridge.clone();
        self.perform(async move {
            let handle = tokio::spawn(async move {
                bridge
                    .export()
                    .await
                    .map_err(|error| AppError::bridge("Export", error))
            });
            Message::ExportFinished(joined(handle).await)
        });
    }

    pub(super) fn handle_export_finished(&mut self, result: Result<String, AppError>) {
        self.state.busy.exporting = false;
        match result {
            Ok(output) => self.state.export_output = output,
            Err(error) => {
                self.state.export_output = format!("Error: {error}");
                self.state.last_error = Some(error);
            }
        }
        self.after_export();
    }

    pub(super) fn handle_export_selected(&mut self, ids: Vec<String>, force: bool) {
        if self.state.busy.exporting {
            return;
        }
        info!("Exporting {} selected meetings (force: {force})", ids.len());
        self.state.busy.exporting = true;
        self.state.export_output.clear();
        self.state.refresh_error = None;

        let bridge = self.bridge.clone();
        self.perform(async move {
            let handle = tokio::spawn(async move {
                bridge
                    .export_selected(&ids, force)
                    .await
                    .map_err(|error| AppError::bridge("Export", error))
            });
            Message::SelectedExportFinished(joined(handle).await)
        });
    }

    pub(super) fn handle_selected_export_finished(
        &mut self,
        result: Result<ExportResult, AppError>,
    ) {
        self.state.busy.exporting = false;
        match result {
            Ok(export) => {
                self.state.export_output.clone_from(&export.message);
                self.state.last_export = Some(export);
            }
            Err(error) => {
                self.state.export_output = format!("Error: {error}");
                self.state.last_error = Some(error);
            }
        }
        self.after_export();
    }

    /// Exported flags and counts change after any export attempt.
    fn after_export(&mut self) {
        self.load_status(true);
        self.load_meetings(ListQuery::default(), true);
    }
}
