//! Command-line surface of the `gsync` binary.

use clap::{Parser, Subcommand, ValueEnum};
use gsync_bridge::{ListQuery, SortOrder};

use crate::message::Message;

/// Granola Sync front-end: export meetings, manage the schedule and update
/// the app from the command line.
#[derive(Parser, Debug)]
#[command(name = "gsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Write debug diagnostics regardless of the saved setting.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print records as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every new meeting.
    Export,

    /// Export specific meetings.
    ExportSelected {
        /// Comma-separated meeting ids.
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// Re-export meetings that were already exported.
        #[arg(long)]
        force: bool,
    },

    /// List meetings.
    List {
        /// Only meetings whose title or attendees match.
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, value_enum)]
        sort: Option<SortArg>,

        /// Maximum number of meetings to show.
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one meeting in detail.
    Show {
        /// Meeting document id.
        id: String,
    },

    /// Show export statistics.
    Stats,

    /// Show the tool's configuration and export status.
    Status,

    /// Turn scheduled exports on or off.
    Schedule {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Show whether scheduled exports are installed and loaded.
    ScheduleStatus,

    /// Show where granola-sync was found and its version.
    Tool,

    /// Check for a newer release.
    CheckUpdate,

    /// Update through Homebrew.
    Update {
        /// Relaunch the app once the update succeeds.
        #[arg(long)]
        relaunch: bool,
    },

    /// Print the export log.
    Log {
        /// Empty the log instead.
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortArg {
    Date,
    Title,
    Duration,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Date => Self::Date,
            SortArg::Title => Self::Title,
            SortArg::Duration => Self::Duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Commands {
    /// The controller request this command starts with, if it has one.
    pub fn message(&self) -> Option<Message> {
        let message = match self {
            Self::Export => Message::RunExport,
            Self::ExportSelected { ids, force } => Message::ExportSelected {
                ids: ids.clone(),
                force: *force,
            },
            Self::List {
                search,
                sort,
                limit,
            } => Message::LoadMeetings(ListQuery {
                search: search.clone(),
                sort: sort.map(SortOrder::from),
                limit: *limit,
            }),
            Self::Show { id } => Message::ShowMeeting(id.clone()),
            Self::Stats => Message::LoadStats,
            Self::Status => Message::LoadStatus,
            Self::Schedule { state } => Message::ToggleSchedule(*state == Toggle::On),
            Self::ScheduleStatus => Message::LoadScheduleStatus,
            Self::CheckUpdate => Message::CheckForUpdates { interactive: true },
            Self::Update { .. } => Message::CheckForUpdates { interactive: false },
            Self::Log { clear: true } => Message::ClearLog,
            Self::Tool | Self::Log { clear: false } => return None,
        };
        Some(message)
    }
}
