use serde::{Deserialize, Serialize};

/// Loosely typed `status --json` document; consumers pick the keys they know.
pub type StatusMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResult {
    pub success: bool,
    pub exported: u32,
    pub skipped: u32,
    pub api_fetched: u32,
    pub errors: Vec<String>,
    pub files: Vec<String>,
    pub message: String,
}

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub doc_id: String,
    pub title: String,
    pub created_at: String,
    pub attendees: Vec<String>,
    pub duration_seconds: Option<u64>,
    pub has_transcript: bool,
    pub has_summary: bool,
    pub has_notes: bool,
    pub is_exported: bool,
    pub export_filename: Option<String>,
}

impl MeetingSummary {
    /// `45m` or `1h 30m`; `None` when the tool did not know the duration.
    #[must_use]
    pub fn duration_display(&self) -> Option<String> {
        let minutes = self.duration_seconds? / 60;
        if minutes < 60 {
            Some(format!("{minutes}m"))
        } else {
            Some(format!("{}h {}m", minutes / 60, minutes % 60))
        }
    }

    /// At most three names, then a `+N` suffix.
    #[must_use]
    pub fn attendee_display(&self) -> String {
        if self.attendees.len() <= 3 {
            return self.attendees.join(", ");
        }
        format!(
            "{} +{}",
            self.attendees[..3].join(", "),
            self.attendees.len() - 3
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub speaker: String,
    pub text: String,
    pub timestamp: String,
}

impl TranscriptChunk {
    #[must_use]
    pub fn speaker_label(&self) -> &'static str {
        if self.speaker == "microphone" {
            "You"
        } else {
            "Speaker"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDetail {
    pub doc_id: String,
    pub title: String,
    pub created_at: String,
    pub attendees: Vec<Attendee>,
    pub duration_seconds: Option<u64>,
    pub summary_html: String,
    pub notes_markdown: String,
    pub transcript: Vec<TranscriptChunk>,
    pub is_exported: bool,
    pub export_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
    pub month: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayCount {
    pub day: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeCount {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStats {
    pub total_meetings: u32,
    pub total_exported: u32,
    pub total_pending: u32,
    pub meetings_by_month: Vec<MonthCount>,
    pub meetings_by_weekday: Vec<WeekdayCount>,
    pub top_attendees: Vec<AttendeeCount>,
    pub avg_duration_minutes: f64,
    pub total_duration_hours: f64,
    pub storage_used_mb: f64,
    pub last_export_at: Option<String>,
    pub activity_heatmap: Vec<DayCount>,
}

/// `launchd status --json`. Interval and binary only appear once installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStatus {
    pub installed: bool,
    pub loaded: bool,
    pub plist_path: String,
    #[serde(default)]
    pub interval: Option<u64>,
    #[serde(default)]
    pub binary: Option<String>,
}
