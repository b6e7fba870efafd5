use std::sync::Arc;

use gsync_platform::{ProcessInvoker, SystemInvoker};
use log::{debug, error, info};

use crate::command::{ListQuery, ToolCommand};
use crate::decode::{DecodedPayload, decode, decode_json, decode_text};
use crate::error::BridgeError;
use crate::locator::{TOOL_NAME, ToolLocator};
use crate::types::{
    ExportResult, MeetingDetail, MeetingSummary, ScheduleStatus, StatusMap, SyncStats,
};

/// One method per tool subcommand: locate, run, decode.
///
/// Holds no state between calls. Callers that need "one export at a time"
/// gate on their own busy flag.
#[derive(Clone)]
pub struct CommandBridge {
    locator: ToolLocator,
    invoker: Arc<dyn ProcessInvoker>,
}

impl CommandBridge {
    #[must_use]
    pub fn new(locator: ToolLocator, invoker: Arc<dyn ProcessInvoker>) -> Self {
        Self { locator, invoker }
    }

    /// Bridge over the real tool found from the default locations.
    #[must_use]
    pub fn system() -> Self {
        Self::new(ToolLocator::new(TOOL_NAME), Arc::new(SystemInvoker::new()))
    }

    #[must_use]
    pub fn locator(&self) -> &ToolLocator {
        &self.locator
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.locator.locate().is_ok()
    }

    async fn execute(&self, command: &ToolCommand) -> Result<Vec<u8>, BridgeError> {
        let path = self.locator.locate()?;
        let args = command.args();
        info!("Executing {} {}", self.locator.name(), args.join(" "));

        let result = self.invoker.run(&path, &args).await?;
        debug!(
            "{} exited with {:?} after {} attempt(s)",
            self.locator.name(),
            result.code,
            result.attempts
        );

        if result.success() {
            Ok(result.output)
        } else {
            let output = result.text();
            error!("{command} failed: {output}");
            Err(BridgeError::ExecutionFailed(output))
        }
    }

    /// Run any command and decode it by its declared shape.
    ///
    /// # Errors
    /// Propagates locate, execution and decoding failures unchanged.
    pub async fn run(&self, command: &ToolCommand) -> Result<DecodedPayload, BridgeError> {
        let output = self.execute(command).await?;
        decode(&output, command.shape())
    }

    /// Plain export; returns the tool's human-readable report verbatim.
    ///
    /// # Errors
    /// Fails when the tool is missing or exits non-zero.
    pub async fn export(&self) -> Result<String, BridgeError> {
        let output = self.execute(&ToolCommand::Export).await?;
        Ok(decode_text(&output))
    }

    /// # Errors
    /// Fails when the tool is missing, exits non-zero, or prints something
    /// other than an export result.
    pub async fn export_json(&self) -> Result<ExportResult, BridgeError> {
        let output = self.execute(&ToolCommand::ExportJson).await?;
        decode_json(&output)
    }

    /// Export only `ids`; `force` re-exports meetings already on disk.
    ///
    /// # Errors
    /// Same as [`Self::export_json`].
    pub async fn export_selected(
        &self,
        ids: &[String],
        force: bool,
    ) -> Result<ExportResult, BridgeError> {
        let command = ToolCommand::ExportSelected {
            ids: ids.to_vec(),
            force,
        };
        let output = self.execute(&command).await?;
        decode_json(&output)
    }

    /// Meetings in the order the tool returns them.
    ///
    /// # Errors
    /// Fails on a missing tool, non-zero exit, or shape mismatch.
    pub async fn list(&self) -> Result<Vec<MeetingSummary>, BridgeError> {
        self.list_with(ListQuery::default()).await
    }

    /// # Errors
    /// Fails on a missing tool, non-zero exit, or shape mismatch.
    pub async fn list_with(&self, query: ListQuery) -> Result<Vec<MeetingSummary>, BridgeError> {
        let output = self.execute(&ToolCommand::List(query)).await?;
        decode_json(&output)
    }

    /// # Errors
    /// Fails on a missing tool, non-zero exit (unknown id), or shape mismatch.
    pub async fn show(&self, id: &str) -> Result<MeetingDetail, BridgeError> {
        let command = ToolCommand::Show { id: id.to_string() };
        let output = self.execute(&command).await?;
        decode_json(&output)
    }

    /// # Errors
    /// Fails on a missing tool, non-zero exit, or shape mismatch.
    pub async fn stats(&self) -> Result<SyncStats, BridgeError> {
        let output = self.execute(&ToolCommand::Stats).await?;
        decode_json(&output)
    }

    /// # Errors
    /// Fails on a missing tool, non-zero exit, or a non-object document.
    pub async fn status(&self) -> Result<StatusMap, BridgeError> {
        match self.run(&ToolCommand::Status).await? {
            DecodedPayload::Status(map) => Ok(map),
            other => Err(BridgeError::DecodingFailed(format!("{other:?}"))),
        }
    }

    /// Install or remove the scheduled export job.
    ///
    /// # Errors
    /// Fails when the tool is missing or exits non-zero.
    pub async fn schedule_toggle(&self, enable: bool) -> Result<String, BridgeError> {
        let output = self.execute(&ToolCommand::Schedule { enable }).await?;
        Ok(decode_text(&output))
    }

    /// # Errors
    /// Fails on a missing tool, non-zero exit, or shape mismatch.
    pub async fn schedule_status(&self) -> Result<ScheduleStatus, BridgeError> {
        let output = self.execute(&ToolCommand::ScheduleStatus).await?;
        decode_json(&output)
    }

    /// The tool's version string, without the program name.
    ///
    /// # Errors
    /// Fails when the tool is missing or exits non-zero.
    pub async fn tool_version(&self) -> Result<String, BridgeError> {
        let output = decode_text(&self.execute(&ToolCommand::Version).await?);
        let trimmed = output.trim();
        let prefix = format!("{} ", self.locator.name());
        Ok(trimmed.strip_prefix(&prefix).unwrap_or(trimmed).to_string())
    }
}
