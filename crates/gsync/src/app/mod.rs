mod auto_update;
mod export;
mod meetings;
mod schedule;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use gsync_bridge::{CommandBridge, ToolLocator};
use gsync_core::{LogSink, UpdateChecker, UpdateInstaller};
use gsync_platform::{ProcessInvoker, SystemInvoker};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::AppError;
use crate::message::Message;
use crate::settings::AppSettings;
use crate::state::AppState;

/// Single owner of [`AppState`]. Background work reports back as messages and
/// only [`App::update`] applies them.
pub struct App {
    pub(crate) state: AppState,
    pub(crate) settings: AppSettings,
    pub(crate) bridge: CommandBridge,
    pub(crate) checker: UpdateChecker,
    pub(crate) installer: UpdateInstaller,
    pub(crate) log: Arc<LogSink>,
    log_feed: Receiver<String>,
    sender: UnboundedSender<Message>,
    receiver: UnboundedReceiver<Message>,
}

impl App {
    pub fn new(settings: AppSettings, log: Arc<LogSink>) -> Self {
        Self::with_invoker(settings, log, Arc::new(SystemInvoker::new()))
    }

    /// Build with every external command routed through `invoker`.
    pub fn with_invoker(
        settings: AppSettings,
        log: Arc<LogSink>,
        invoker: Arc<dyn ProcessInvoker>,
    ) -> Self {
        let locator = ToolLocator::new(&settings.tool_name)
            .with_extra_paths(settings.extra_tool_paths.clone());
        let bridge = CommandBridge::new(locator, Arc::clone(&invoker));

        let checker = UpdateChecker::with_endpoint(
            env!("CARGO_PKG_VERSION"),
            &settings.release_endpoint,
            Duration::from_secs(settings.http_timeout_secs),
        );

        let installer = UpdateInstaller::new(invoker, Arc::clone(&log))
            .with_package_manager_paths(settings.package_manager_paths.clone())
            .with_cask(&settings.cask_name)
            .with_tap(&settings.tap_name);

        let log_feed = log.subscribe();
        let (sender, receiver) = mpsc::unbounded_channel();

        let state = AppState {
            export_output: log.contents(),
            ..AppState::default()
        };

        Self {
            state,
            settings,
            bridge,
            checker,
            installer,
            log,
            log_feed,
            sender,
            receiver,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// `true` once nothing is in flight.
    pub fn is_idle(&self) -> bool {
        !self.state.busy.any() && !self.state.update.is_busy()
    }

    pub fn update(&mut self, message: Message) {
        self.drain_log_feed();
        match message {
            Message::NoOp => {}

            Message::RunExport => self.handle_run_export(),
            Message::ExportFinished(result) => self.handle_export_finished(result),
            Message::ExportSelected { ids, force } => self.handle_export_selected(ids, force),
            Message::SelectedExportFinished(result) => {
                self.handle_selected_export_finished(result);
            }

            Message::LoadMeetings(query) => self.handle_load_meetings(query),
            Message::MeetingsLoaded { result, refresh } => {
                self.handle_meetings_loaded(result, refresh);
            }
            Message::ShowMeeting(id) => self.handle_show_meeting(id),
            Message::MeetingLoaded(result) => self.handle_meeting_loaded(result),
            Message::LoadStats => self.handle_load_stats(),
            Message::StatsLoaded(result) => self.handle_stats_loaded(result),
            Message::LoadStatus => self.handle_load_status(),
            Message::StatusLoaded { result, refresh } => {
                self.handle_status_loaded(result, refresh);
            }

            Message::ToggleSchedule(enable) => self.handle_toggle_schedule(enable),
            Message::ScheduleToggled(result) => self.handle_schedule_toggled(result),
            Message::LoadScheduleStatus => self.handle_load_schedule_status(),
            Message::ScheduleStatusLoaded { result, refresh } => {
                self.handle_schedule_status_loaded(result, refresh);
            }

            Message::CheckForUpdates { interactive } => self.handle_check_for_updates(interactive),
            Message::UpdateCheckFinished {
                generation,
                interactive,
                check,
            } => self.handle_update_check_finished(generation, interactive, check),
            Message::StartUpdate => self.handle_start_update(),
            Message::UpdateProgress(state) => self.state.update.apply_progress(state),
            Message::UpdateFinished(outcome) => self.handle_update_finished(outcome),
            Message::Relaunch => self.handle_relaunch(),

            Message::ClearLog => self.handle_clear_log(),
            Message::DismissAlert => self.state.alert = None,
        }
        self.drain_log_feed();
    }

    /// Apply results as they arrive until nothing is in flight.
    pub async fn run_until_idle(&mut self) {
        self.drain_log_feed();
        while !self.is_idle() {
            let Some(message) = self.receiver.recv().await else {
                break;
            };
            self.update(message);
        }
    }

    /// Run `future` in the background and feed its message back in.
    pub(crate) fn perform<F>(&self, future: F)
    where
        F: Future<Output = Message> + Send + 'static,
    {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let _ = sender.send(future.await);
        });
    }

    pub(crate) fn sender(&self) -> UnboundedSender<Message> {
        self.sender.clone()
    }

    fn drain_log_feed(&mut self) {
        for chunk in self.log_feed.try_iter() {
            self.state.export_output.push_str(&chunk);
        }
    }

    /// Record a failed reload that followed an action without masking the
    /// action's own result.
    fn record_load_error(&mut self, error: AppError, refresh: bool) {
        if refresh {
            log::warn!("Refresh failed: {error}");
            self.state.refresh_error = Some(error);
        } else {
            self.state.last_error = Some(error);
        }
    }

    fn handle_clear_log(&mut self) {
        match self.log.clear() {
            Ok(()) => self.state.export_output.clear(),
            Err(error) => {
                log::error!("Failed to clear log: {error}");
                self.state.last_error = Some(AppError::io("Failed to clear log", &error));
            }
        }
    }
}

/// Await a spawned bridge call, turning a panicked task into an error.
pub(crate) async fn joined<T>(
    handle: tokio::task::JoinHandle<Result<T, AppError>>,
) -> Result<T, AppError> {
    handle
        .await
        .unwrap_or_else(|error| Err(AppError::Message(format!("Background task failed: {error}"))))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use gsync_core::LogSink;
    use gsync_platform::{InvocationResult, ProcessInvoker, SpawnError};

    use super::App;
    use crate::settings::AppSettings;

    /// Answers each call with the first unused response whose key prefixes
    /// the joined argv, and records the argv. Unmatched `list`, `status` and
    /// `launchd status` calls get empty JSON, anything else succeeds silently.
    #[derive(Default)]
    pub struct FakeInvoker {
        pub responses: Mutex<Vec<(&'static str, i32, String)>>,
        pub calls: Mutex<Vec<Vec<String>>>,
    }

    impl FakeInvoker {
        pub fn with(responses: &[(&'static str, i32, &str)]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses
                        .iter()
                        .map(|(key, code, output)| (*key, *code, (*output).to_string()))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().expect("calls lock").clone()
        }

        pub fn calls_to(&self, subcommand: &str) -> usize {
            self.calls()
                .iter()
                .filter(|args| args.first().is_some_and(|arg| arg == subcommand))
                .count()
        }
    }

    #[async_trait]
    impl ProcessInvoker for FakeInvoker {
        async fn run(
            &self,
            _program: &Path,
            args: &[String],
        ) -> Result<InvocationResult, SpawnError> {
            self.calls.lock().expect("calls lock").push(args.to_vec());
            let command_line = args.join(" ");
            let mut responses = self.responses.lock().expect("responses lock");
            let matched = responses
                .iter()
                .position(|(key, ..)| command_line.starts_with(key));
            let (code, output) = match matched {
                Some(index) => {
                    let (_, code, output) = responses.remove(index);
                    (code, output)
                }
                None if command_line.starts_with("list") => (0, "[]".to_string()),
                None if command_line.starts_with("status") => (0, "{}".to_string()),
                None if command_line.starts_with("launchd status") => (
                    0,
                    r#"{"installed":false,"loaded":false,"plist_path":""}"#.to_string(),
                ),
                None => (0, String::new()),
            };
            Ok(InvocationResult::new(Some(code), output))
        }
    }

    /// An executable stand-in for the tool and the package manager.
    pub fn fake_binary(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").expect("fake binary should be written");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("fake binary should be executable");
        }
        path
    }

    pub struct TestApp {
        pub app: App,
        pub invoker: Arc<FakeInvoker>,
        pub _dir: tempfile::TempDir,
    }

    /// App whose tool and brew live in a temp dir and whose release endpoint
    /// refuses connections.
    pub fn test_app(responses: &[(&'static str, i32, &str)]) -> TestApp {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let tool = fake_binary(dir.path(), "granola-sync");
        let brew = fake_binary(dir.path(), "brew");
        let settings = AppSettings {
            extra_tool_paths: vec![tool],
            package_manager_paths: vec![brew],
            release_endpoint: "http://127.0.0.1:9/releases/latest".to_string(),
            http_timeout_secs: 2,
            open_release_page_on_failure: false,
            ..AppSettings::default()
        };
        let log = Arc::new(LogSink::new(dir.path().join("export.log")));
        let invoker = FakeInvoker::with(responses);
        let app = App::with_invoker(settings, log, invoker.clone());
        TestApp {
            app,
            invoker,
            _dir: dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::test_support::test_app;
    use crate::message::Message;

    #[tokio::test]
    async fn new_app_is_idle() {
        let test = test_app(&[]);
        assert!(test.app.is_idle());
        assert!(test.app.state().export_output.is_empty());
    }

    #[tokio::test]
    async fn log_appends_are_mirrored_into_output() {
        let mut test = test_app(&[]);

        let log = Arc::clone(&test.app.log);
        log.append("scheduled export done\n").expect("log append");
        test.app.update(Message::NoOp);

        assert_eq!(test.app.state().export_output, "scheduled export done\n");
    }

    #[tokio::test]
    async fn clear_log_empties_file_and_output() {
        let mut test = test_app(&[]);
        test.app.log.append("old\n").expect("append should succeed");
        test.app.update(Message::NoOp);

        test.app.update(Message::ClearLog);

        assert!(test.app.state().export_output.is_empty());
        assert!(test.app.log.contents().is_empty());
        assert!(test.app.state().last_error.is_none());
    }
}
