use std::fmt;

/// What a command prints on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    Text,
    ExportResult,
    MeetingList,
    MeetingDetail,
    Stats,
    KeyValue,
    ScheduleStatus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Date,
    Title,
    Duration,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Title => "title",
            Self::Duration => "duration",
        }
    }
}

/// Optional filters understood by `list`. The default passes none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
    pub limit: Option<usize>,
}

/// One invocation of the tool. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    Export,
    ExportJson,
    ExportSelected { ids: Vec<String>, force: bool },
    List(ListQuery),
    Show { id: String },
    Stats,
    Status,
    Schedule { enable: bool },
    ScheduleStatus,
    Version,
}

impl ToolCommand {
    /// Argument vector, subcommand first.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        let mut push = |arg: &str| args.push(arg.to_string());

        match self {
            Self::Export => push("export"),
            Self::ExportJson => {
                push("export");
                push("--json");
            }
            Self::ExportSelected { ids, force } => {
                push("export");
                push("--json");
                if !ids.is_empty() {
                    push("--ids");
                    push(&ids.join(","));
                }
                if *force {
                    push("--force");
                }
            }
            Self::List(query) => {
                push("list");
                push("--json");
                if let Some(search) = &query.search {
                    push("--search");
                    push(search);
                }
                if let Some(sort) = query.sort {
                    push("--sort");
                    push(sort.as_str());
                }
                if let Some(limit) = query.limit {
                    push("--limit");
                    push(&limit.to_string());
                }
            }
            Self::Show { id } => {
                push("show");
                push(id);
                push("--json");
            }
            Self::Stats => {
                push("stats");
                push("--json");
            }
            Self::Status => {
                push("status");
                push("--json");
            }
            Self::Schedule { enable } => {
                push("launchd");
                push(if *enable { "install" } else { "uninstall" });
            }
            Self::ScheduleStatus => {
                push("launchd");
                push("status");
                push("--json");
            }
            Self::Version => push("version"),
        }

        args
    }

    #[must_use]
    pub fn shape(&self) -> OutputShape {
        match self {
            Self::Export | Self::Schedule { .. } | Self::Version => OutputShape::Text,
            Self::ExportJson | Self::ExportSelected { .. } => OutputShape::ExportResult,
            Self::List(_) => OutputShape::MeetingList,
            Self::Show { .. } => OutputShape::MeetingDetail,
            Self::Stats => OutputShape::Stats,
            Self::Status => OutputShape::KeyValue,
            Self::ScheduleStatus => OutputShape::ScheduleStatus,
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args().join(" "))
    }
}
