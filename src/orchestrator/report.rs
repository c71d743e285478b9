use std::fmt;
use std::path::PathBuf;

use super::UpdateStatus;

/// Steps of an update run, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Init,
    LocatingAppFolder,
    UnpackingUpdate,
    LocatingUpdateFolder,
    ComparingVersions,
    NoUpdateNeeded,
    ClosingTarget,
    ReplacingFiles,
    Relaunching,
    Completed,
    Failed,
}

/// A problem the run recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftFailure {
    /// The target could not be closed, or did not exit in time.
    ProcessClose { process: String, reason: String },
    /// One payload file could not be backed up or copied.
    FileReplace { path: PathBuf, reason: String },
    /// The target could not be started again.
    Relaunch { executable: PathBuf, reason: String },
    /// The unpacked package could not be deleted.
    ArchiveCleanup { path: PathBuf, reason: String },
}

impl fmt::Display for SoftFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProcessClose { process, reason } => {
                write!(f, "could not close {process}: {reason}")
            }
            Self::FileReplace { path, reason } => {
                write!(f, "could not replace {}: {reason}", path.display())
            }
            Self::Relaunch { executable, reason } => {
                write!(f, "could not start {}: {reason}", executable.display())
            }
            Self::ArchiveCleanup { path, reason } => {
                write!(f, "could not remove {}: {reason}", path.display())
            }
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    /// Status of the terminal event.
    pub outcome: UpdateStatus,
    /// States entered, starting with [`UpdateState::Init`].
    pub states: Vec<UpdateState>,
    pub soft_failures: Vec<SoftFailure>,
    /// Payload files written to the installation.
    pub files_replaced: usize,
    /// Payload files found, including ones that are never deployed.
    pub files_total: usize,
}

impl UpdateReport {
    /// `true` for [`UpdateStatus::UpToDate`] and [`UpdateStatus::Completed`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, UpdateStatus::UpToDate | UpdateStatus::Completed)
    }

    /// `true` when the run succeeded without recovering from anything.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.is_success() && self.soft_failures.is_empty()
    }

    #[must_use]
    pub fn final_state(&self) -> UpdateState {
        self.states.last().copied().unwrap_or(UpdateState::Init)
    }
}
