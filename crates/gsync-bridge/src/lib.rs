//! Bridge between the front-end and the `granola-sync` command-line tool.
//!
//! Every call re-resolves the tool location, runs it once, and decodes the
//! captured output into a typed record. The tool's own behavior is opaque.

mod bridge;
mod command;
mod decode;
mod error;
mod locator;
mod types;

pub use bridge::CommandBridge;
pub use command::{ListQuery, OutputShape, SortOrder, ToolCommand};
pub use decode::{DecodedPayload, decode, decode_json, decode_text};
pub use error::BridgeError;
pub use locator::{TOOL_NAME, ToolLocator};
pub use types::{
    Attendee, AttendeeCount, DayCount, ExportResult, MeetingDetail, MeetingSummary, MonthCount,
    ScheduleStatus, StatusMap, SyncStats, TranscriptChunk, WeekdayCount,
};
