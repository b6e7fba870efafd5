mod operations;

pub use operations::*;

use gsync_bridge::{
    ExportResult, MeetingDetail, MeetingSummary, ScheduleStatus, StatusMap, SyncStats,
};
use gsync_core::{UpdateCheck, UpdateSession};

use crate::error::AppError;

/// A result the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// Everything the front-end shows. Only `App::update` mutates it.
#[derive(Debug, Default)]
pub struct AppState {
    pub busy: BusyFlags,
    pub export_output: String,
    pub last_export: Option<ExportResult>,
    pub meetings: Vec<MeetingSummary>,
    pub meeting_detail: Option<MeetingDetail>,
    pub stats: Option<SyncStats>,
    pub status: Option<StatusMap>,
    pub schedule: Option<ScheduleStatus>,
    pub schedule_output: String,
    pub update: UpdateSession,
    /// Result of the most recent applied check.
    pub last_check: Option<UpdateCheck>,
    pub pending_check: Option<PendingCheck>,
    pub check_generation: u64,
    pub manual_download_url: Option<String>,
    pub alert: Option<Alert>,
    pub last_error: Option<AppError>,
    /// Reload after an export or schedule toggle that failed. Reported as a
    /// warning, never as the action's error.
    pub refresh_error: Option<AppError>,
    pub should_exit: bool,
}
