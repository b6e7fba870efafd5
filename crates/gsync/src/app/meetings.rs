//! Read-only queries: meeting list, meeting detail, stats and status.
//!
//! Handles messages: `LoadMeetings`, `MeetingsLoaded`, `ShowMeeting`,
//! `MeetingLoaded`, `LoadStats`, `StatsLoaded`, `LoadStatus`, `StatusLoaded`

use gsync_bridge::{ListQuery, MeetingDetail, MeetingSummary, StatusMap, SyncStats};

use crate::error::AppError;
use crate::message::Message;

use super::{App, joined};

impl App {
    pub(super) fn handle_load_meetings(&mut self, query: ListQuery) {
        self.load_meetings(query, false);
    }

    pub(super) fn load_meetings(&mut self, query: ListQuery, refresh: bool) {
        if self.state.busy.loading_meetings {
            return;
        }
        self.state.busy.loading_meetings = true;

        let bridge = self.bridge.clone();
        self.perform(async move {
            let handle = tokio::spawn(async move {
                bridge
                    .list_with(query)
                    .await
                    .map_err(|error| AppError::bridge("List", error))
            });
            Message::MeetingsLoaded {
                result: joined(handle).await,
                refresh,
            }
        });
    }

    pub(super) fn handle_meetings_loaded(
        &mut self,
        result: Result<Vec<MeetingSummary>, AppError>,
        refresh: bool,
    ) {
        self.state.busy.loading_meetings = false;
        match result {
            Ok(meetings) => self.state.meetings = meetings,
            Err(error) => {
                self.state.meetings.clear();
                self.record_load_error(error, refresh);
            }
        }
    }

    pub(super) fn handle_show_meeting(&mut self, id: String) {
        if self.state.busy.loading_detail {
            return;
        }
        self.state.busy.loading_detail = true;

        let bridge = self.bridge.clone();
        self.perform(async move {
            let handle = tokio::spawn(async move {
                bridge
                    .show(&id)
                    .await
                    .map(Box::new)
                    .map_err(|error| AppError::bridge("Show", error))
            });
            Message::MeetingLoaded(joined(handle).await)
        });
    }

    pub(super) fn handle_meeting_loaded(&mut self, result: Result<Box<MeetingDetail>, AppError>) {
        self.state.busy.loading_detail = false;
        match result {
            Ok(detail) => self.state.meeting_detail = Some(*detail),
            Err(error) => {
                self.state.meeting_detail = None;
                self.state.last_error = Some(error);
            }
        }
    }

    pub(super) fn handle_load_stats(&mut self) {
        if self.state.busy.loading_stats {
            return;
        }
        self.state.busy.loading_stats = true;

        let bridge = self.bridge.clone();
        self.perform(async move {
            let handle = tokio::spawn(async move {
                bridge
                    .stats()
                    .await
                    .map(Box::new)
                    .map_err(|error| AppError::bridge("Stats", error))
            });
            Message::StatsLoaded(joined(handle).await)
        });
    }

    pub(super) fn handle_stats_loaded(&mut self, result: Result<Box<SyncStats>, AppError>) {
        self.state.busy.loading_stats = false;
        match result {
            Ok(stats) => self.state.stats = Some(*stats),
            Err(error) => {
                self.state.stats = None;
                self.state.last_error = Some(error);
            }
        }
    }

    pub(super) fn handle_load_status(&mut self) {
        self.load_status(false);
    }

    pub(super) fn load_status(&mut self, refresh: bool) {
        if self.state.busy.loading_status {
            return;
        }
        self.state.busy.loading_status = true;

        let bridge = self.bridge.clone();
        self.perform(async move {
            let handle = tokio::spawn(async move {
                bridge
                    .status()
                    .await
                    .map_err(|error| AppError::bridge("Status", error))
            });
            Message::StatusLoaded {
                result: joined(handle).await,
                refresh,
            }
        });
    }

    pub(super) fn handle_status_loaded(
        &mut self,
        result: Result<StatusMap, AppError>,
        refresh: bool,
    ) {
        self.state.busy.loading_status = false;
        match result {
            Ok(status) => self.state.status = Some(status),
            Err(error) => self.record_load_error(error, refresh),
        }
    }
}

#[cfg(test)]
mod tests {
    use gsync_bridge::{ListQuery, SortOrder};

    use crate::app::test_support::test_app;
    use crate::error::AppError;
    use crate::message::Message;

    const LIST_JSON: &str = r#"[
        {"doc_id":"b","title":"Later","created_at":"2025-02-01T09:00:00Z","attendees":[],"duration_seconds":null,"has_transcript":false,"has_summary":true,"has_notes":false,"is_exported":false,"export_filename":null},
        {"doc_id":"a","title":"Earlier","created_at":"2025-01-01T09:00:00Z","attendees":["Ann"],"duration_seconds":600,"has_transcript":true,"has_summary":true,"has_notes":true,"is_exported":true,"export_filename":"a.md"}
    ]"#;

    #[tokio::test]
    async fn meetings_keep_tool_order_and_query() {
        let mut test = test_app(&[("list", 0, LIST_JSON)]);

        test.app.update(Message::LoadMeetings(ListQuery {
            search: Some("sync".to_string()),
            sort: Some(SortOrder::Title),
            limit: Some(5),
        }));
        test.app.run_until_idle().await;

        let ids: Vec<&str> = test
            .app
            .state()
            .meetings
            .iter()
            .map(|meeting| meeting.doc_id.as_str())
            .collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(
            test.invoker.calls()[0].join(" "),
            "list --json --search sync --sort title --limit 5"
        );
    }

    #[tokio::test]
    async fn garbled_list_clears_meetings_and_keeps_payload() {
        let mut test = test_app(&[("list", 0, LIST_JSON), ("list", 0, "not json")]);
        test.app.update(Message::LoadMeetings(ListQuery::default()));
        test.app.run_until_idle().await;
        assert_eq!(test.app.state().meetings.len(), 2);

        test.app.update(Message::LoadMeetings(ListQuery::default()));
        test.app.run_until_idle().await;

        let state = test.app.state();
        assert!(state.meetings.is_empty());
        assert_eq!(
            state.last_error,
            Some(AppError::UnexpectedOutput {
                operation: "List",
                raw: "not json".to_string()
            })
        );
    }

    #[tokio::test]
    async fn failed_stats_clear_previous_stats() {
        let mut test = test_app(&[("stats", 2, "no database\n")]);

        test.app.update(Message::LoadStats);
        assert!(!test.app.is_idle());
        test.app.run_until_idle().await;

        let state = test.app.state();
        assert!(state.stats.is_none());
        assert!(matches!(
            state.last_error,
            Some(AppError::ToolFailed {
                operation: "Stats",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn show_loads_detail() {
        let detail = r#"{"doc_id":"a","title":"Earlier","created_at":"2025-01-01T09:00:00Z","attendees":[{"name":"Ann","email":"ann@example.com"}],"duration_seconds":600,"summary_html":"<p>hi</p>","notes_markdown":"","transcript":[],"is_exported":true,"export_filename":"a.md"}"#;
        let mut test = test_app(&[("show a", 0, detail)]);

        test.app.update(Message::ShowMeeting("a".to_string()));
        test.app.run_until_idle().await;

        let loaded = test
            .app
            .state()
            .meeting_detail
            .as_ref()
            .expect("detail should load");
        assert_eq!(loaded.attendees[0].email, "ann@example.com");
    }

    #[tokio::test]
    async fn status_is_stored_as_map() {
        let mut test = test_app(&[("status", 0, r#"{"drive_path":"/Drive","exported":4}"#)]);

        test.app.update(Message::LoadStatus);
        test.app.run_until_idle().await;

        let status = test.app.state().status.as_ref().expect("status loaded");
        assert_eq!(status["exported"], 4);
    }
}
