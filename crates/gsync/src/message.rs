use gsync_bridge::{
    ExportResult, ListQuery, MeetingDetail, MeetingSummary, ScheduleStatus, StatusMap, SyncStats,
};
use gsync_core::{InstallOutcome, InstallState, UpdateCheck};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub enum Message {
    NoOp,

    RunExport,
    ExportFinished(Result<String, AppError>),
    ExportSelected {
        ids: Vec<String>,
        force: bool,
    },
    SelectedExportFinished(Result<ExportResult, AppError>),

    LoadMeetings(ListQuery),
    MeetingsLoaded {
        result: Result<Vec<MeetingSummary>, AppError>,
        refresh: bool,
    },
    ShowMeeting(String),
    MeetingLoaded(Result<Box<MeetingDetail>, AppError>),
    LoadStats,
    StatsLoaded(Result<Box<SyncStats>, AppError>),
    LoadStatus,
    StatusLoaded {
        result: Result<StatusMap, AppError>,
        refresh: bool,
    },

    ToggleSchedule(bool),
    ScheduleToggled(Result<String, AppError>),
    LoadScheduleStatus,
    ScheduleStatusLoaded {
        result: Result<ScheduleStatus, AppError>,
        refresh: bool,
    },

    CheckForUpdates {
        interactive: bool,
    },
    UpdateCheckFinished {
        generation: u64,
        interactive: bool,
        check: UpdateCheck,
    },
    StartUpdate,
    UpdateProgress(InstallState),
    UpdateFinished(InstallOutcome),
    Relaunch,

    ClearLog,
    DismissAlert,
}
