//! Background export schedule.
//!
//! Handles messages: `ToggleSchedule`, `ScheduleToggled`, `LoadScheduleStatus`,
//! `ScheduleStatusLoaded`

use gsync_bridge::ScheduleStatus;
use log::info;

use crate::error::AppError;
use crate::message::Message;

use super::{App, joined};

impl App {
    pub(super) fn handle_toggle_schedule(&mut self, enable: bool) {
        if self.state.busy.toggling_schedule {
            return;
        }
        info!(
            "Turning scheduled exports {}",
            if enable { "on" } else { "off" }
        );
        self.state.busy.toggling_schedule = true;
        self.state.refresh_error = None;

        let bridge = self.bridge.clone();
        self.perform(async move {
            let handle = tokio::spawn(async move {
                bridge
                    .schedule_toggle(enable)
                    .await
                    .map_err(|error| AppError::bridge("Schedule", error))
            });
            Message::ScheduleToggled(joined(handle).await)
        });
    }

    pub(super) fn handle_schedule_toggled(&mut self, result: Result<String, AppError>) {
        self.state.busy.toggling_schedule = false;
        match result {
            Ok(output) => self.state.schedule_output = output,
            Err(error) => {
                self.state.schedule_output = format!("Error: {error}");
                self.state.last_error = Some(error);
            }
        }
        self.load_schedule_status(true);
    }

    pub(super) fn handle_load_schedule_status(&mut self) {
        self.load_schedule_status(false);
    }

    fn load_schedule_status(&mut self, refresh: bool) {
        if self.state.busy.loading_schedule {
            return;
        }
        self.state.busy.loading_schedule = true;

        let bridge = self.bridge.clone();
        self.perform(async move {
            let handle = tokio::spawn(async move {
                bridge
                    .schedule_status()
                    .await
                    .map_err(|error| AppError::bridge("Schedule status", error))
            });
            Message::ScheduleStatusLoaded {
                result: joined(handle).await,
                refresh,
            }
        });
    }

    pub(super) fn handle_schedule_status_loaded(
        &mut self,
        result: Result<ScheduleStatus, AppError>,
        refresh: bool,
    ) {
        self.state.busy.loading_schedule = false;
        match result {
            Ok(status) => self.state.schedule = Some(status),
            Err(error) => {
                self.state.schedule = None;
                self.record_load_error(error, refresh);
            }
        }
    }
}
