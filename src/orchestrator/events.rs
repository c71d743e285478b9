use std::fmt;

/// Why a run ended in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No `metadata.json` under the search root.
    AppFolderNotFound,
    /// No `update.json` after unpacking.
    NoUpdateDownloaded,
    /// A descriptor exists but could not be read or parsed.
    DescriptorInvalid,
    /// The update package could not be unpacked.
    Extraction,
    /// The unpacked payload could not be deployed.
    Replace,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AppFolderNotFound => "app folder not found",
            Self::NoUpdateDownloaded => "no update downloaded",
            Self::DescriptorInvalid => "invalid descriptor",
            Self::Extraction => "extraction failed",
            Self::Replace => "replacement failed",
        };
        f.write_str(name)
    }
}

/// Where a run stands, as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// A step is running; more events follow.
    InProgress,
    /// Nothing to do; the installed version is current.
    UpToDate,
    /// The update was deployed.
    Completed,
    /// The run stopped early.
    Failed(FailureKind),
}

impl UpdateStatus {
    /// Terminal statuses end the run and go to [`UpdateObserver::on_completed`].
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Text shown to the operator.
    pub message: String,
    /// Installed version, or `-` when not known yet.
    pub old_version: String,
    /// Version being installed, or `-` when not known yet.
    pub new_version: String,
    /// Percentage in `0.0..=100.0`.
    pub progress: f32,
    pub status: UpdateStatus,
}

impl ProgressEvent {
    pub fn new(
        status: UpdateStatus,
        message: impl Into<String>,
        old_version: impl Into<String>,
        new_version: impl Into<String>,
        progress: f32,
    ) -> Self {
        Self {
            message: message.into(),
            old_version: old_version.into(),
            new_version: new_version.into(),
            progress: progress.clamp(0.0, 100.0),
            status,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Receives progress notifications in emission order.
///
/// Calls arrive on whatever thread the orchestrator's
/// [`ExecutionContext`](super::ExecutionContext) runs tasks on.
pub trait UpdateObserver: Send + Sync {
    /// A non-terminal status update.
    fn on_status(&self, event: &ProgressEvent);

    /// The single terminal event of a run.
    fn on_completed(&self, event: &ProgressEvent);
}

/// Observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl UpdateObserver for NullObserver {
    fn on_status(&self, _event: &ProgressEvent) {}

    fn on_completed(&self, _event: &ProgressEvent) {}
}
