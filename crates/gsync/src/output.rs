//! Terminal rendering of controller state after a command finishes.

use std::fmt::Write as _;

use gsync_bridge::{MeetingDetail, MeetingSummary, ScheduleStatus, StatusMap, SyncStats};
use serde::Serialize;

use crate::cli::Commands;
use crate::state::AppState;

/// Text for `command` from `state`, JSON records when `json` is set.
pub fn render(command: &Commands, state: &AppState, json: bool) -> String {
    let mut out = String::new();
    if let Some(alert) = &state.alert {
        let _ = writeln!(out, "{}: {}", alert.title, alert.message);
    }

    match command {
        Commands::Log { clear: true } if state.last_error.is_none() => {
            out.push_str("Log cleared.\n");
        }
        Commands::Export | Commands::Log { .. } => out.push_str(&state.export_output),
        Commands::ExportSelected { .. } => match (&state.last_export, json) {
            (Some(export), true) => out.push_str(&to_json(export)),
            (Some(export), false) => {
                let _ = writeln!(out, "{}", export.message);
                let _ = writeln!(
                    out,
                    "exported {}, skipped {}, fetched {}",
                    export.exported, export.skipped, export.api_fetched
                );
                for error in &export.errors {
                    let _ = writeln!(out, "error: {error}");
                }
            }
            (None, _) => out.push_str(&state.export_output),
        },
        Commands::List { .. } if json => out.push_str(&to_json(&state.meetings)),
        Commands::List { .. } => meeting_table(&mut out, &state.meetings),
        Commands::Show { .. } => match &state.meeting_detail {
            Some(detail) if json => out.push_str(&to_json(detail)),
            Some(detail) => meeting_detail(&mut out, detail),
            None => {}
        },
        Commands::Stats => match &state.stats {
            Some(stats) if json => out.push_str(&to_json(stats)),
            Some(stats) => stats_summary(&mut out, stats),
            None => {}
        },
        Commands::Status => match &state.status {
            Some(status) if json => out.push_str(&to_json(status)),
            Some(status) => status_lines(&mut out, status),
            None => {}
        },
        Commands::Schedule { .. } | Commands::ScheduleStatus => {
            if matches!(command, Commands::Schedule { .. }) {
                out.push_str(&state.schedule_output);
            }
            match &state.schedule {
                Some(schedule) if json => out.push_str(&to_json(schedule)),
                Some(schedule) => schedule_summary(&mut out, schedule),
                None => {}
            }
        }
        Commands::CheckUpdate | Commands::Update { .. } => {
            if state.alert.is_none() && !state.update.message.is_empty() {
                let _ = writeln!(out, "{}", state.update.message);
            }
            if let Some(url) = &state.manual_download_url {
                let _ = writeln!(out, "Release page: {url}");
            }
        }
        Commands::Tool => {}
    }

    if json && !out.ends_with('\n') && !out.is_empty() {
        out.push('\n');
    }
    out
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn meeting_table(out: &mut String, meetings: &[MeetingSummary]) {
    for meeting in meetings {
        let date = meeting.created_at.get(..10).unwrap_or(&meeting.created_at);
        let _ = writeln!(
            out,
            "{} {}  {}  {}  {}  {}",
            if meeting.is_exported { "*" } else { " " },
            meeting.doc_id,
            date,
            meeting.title,
            meeting.duration_display().unwrap_or_default(),
            meeting.attendee_display(),
        );
    }
}

fn meeting_detail(out: &mut String, detail: &MeetingDetail) {
    let _ = writeln!(out, "{}", detail.title);
    let _ = writeln!(out, "{}", detail.created_at);
    for attendee in &detail.attendees {
        let _ = writeln!(out, "  {} <{}>", attendee.name, attendee.email);
    }
    if let Some(file) = &detail.export_filename {
        let _ = writeln!(out, "Exported as {file}");
    }
    if !detail.notes_markdown.is_empty() {
        let _ = writeln!(out, "\n{}", detail.notes_markdown.trim_end());
    }
    if !detail.transcript.is_empty() {
        out.push_str("\nTranscript\n");
        for chunk in &detail.transcript {
            let _ = writeln!(
                out,
                "[{}] {}: {}",
                chunk.timestamp,
                chunk.speaker_label(),
                chunk.text
            );
        }
    }
}

fn stats_summary(out: &mut String, stats: &SyncStats) {
    let _ = writeln!(
        out,
        "{} meetings, {} exported, {} pending",
        stats.total_meetings, stats.total_exported, stats.total_pending
    );
    let _ = writeln!(
        out,
        "{:.1} hours recorded, {:.0} minutes on average",
        stats.total_duration_hours, stats.avg_duration_minutes
    );
    let _ = writeln!(out, "{:.1} MB used", stats.storage_used_mb);
    if let Some(last) = &stats.last_export_at {
        let _ = writeln!(out, "Last export {last}");
    }
    for attendee in &stats.top_attendees {
        let _ = writeln!(out, "  {} ({})", attendee.name, attendee.count);
    }
}

fn status_lines(out: &mut String, status: &StatusMap) {
    for (key, value) in status {
        match value {
            serde_json::Value::String(text) => {
                let _ = writeln!(out, "{key}: {text}");
            }
            other => {
                let _ = writeln!(out, "{key}: {other}");
            }
        }
    }
}

fn schedule_summary(out: &mut String, schedule: &ScheduleStatus) {
    let state = match (schedule.installed, schedule.loaded) {
        (true, true) => "on",
        (true, false) => "installed but not loaded",
        (false, _) => "off",
    };
    let _ = writeln!(out, "Scheduled exports: {state}");
    if let Some(interval) = schedule.interval {
        let _ = writeln!(out, "Every {} minutes", interval / 60);
    }
    if !schedule.plist_path.is_empty() {
        let _ = writeln!(out, "{}", schedule.plist_path);
    }
}
