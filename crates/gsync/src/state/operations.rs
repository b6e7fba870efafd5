use tokio_util::sync::CancellationToken;

/// One flag per request kind. A request whose flag is set is ignored.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusyFlags {
    pub exporting: bool,
    pub loading_meetings: bool,
    pub loading_stats: bool,
    pub loading_detail: bool,
    pub loading_status: bool,
    pub loading_schedule: bool,
    pub toggling_schedule: bool,
}

impl BusyFlags {
    #[must_use]
    pub fn any(&self) -> bool {
        self.exporting
            || self.loading_meetings
            || self.loading_stats
            || self.loading_detail
            || self.loading_status
            || self.loading_schedule
            || self.toggling_schedule
    }
}

/// The update check whose result will be applied. Older generations are
/// dropped when they arrive.
#[derive(Debug, Clone)]
pub struct PendingCheck {
    pub generation: u64,
    pub interactive: bool,
    pub cancel: CancellationToken,
}
