use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::orchestrator::{HostControl, ProgressEvent, UpdateObserver};
use crate::process::{CloseOutcome, RunningProcess, TargetProcess};

/// Ordered log of interesting calls, shared between fakes.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Position of the first entry starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries.lock().unwrap().iter().position(|e| e.starts_with(prefix))
    }
}

/// Observer that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    journal: Journal,
    statuses: Mutex<Vec<ProgressEvent>>,
    completions: Mutex<Vec<ProgressEvent>>,
}

impl RecordingObserver {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    pub fn statuses(&self) -> Vec<ProgressEvent> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn completions(&self) -> Vec<ProgressEvent> {
        self.completions.lock().unwrap().clone()
    }

    /// The only terminal event. Panics unless exactly one was received.
    pub fn terminal(&self) -> ProgressEvent {
        let completions = self.completions();
        assert_eq!(completions.len(), 1, "expected one terminal event, got {completions:?}");
        completions[0].clone()
    }

    pub fn status_messages(&self) -> Vec<String> {
        self.statuses().into_iter().map(|e| e.message).collect()
    }
}

impl UpdateObserver for RecordingObserver {
    fn on_status(&self, event: &ProgressEvent) {
        self.journal.record(format!("status: {}", event.message));
        self.statuses.lock().unwrap().push(event.clone());
    }

    fn on_completed(&self, event: &ProgressEvent) {
        self.journal.record(format!("completed: {}", event.message));
        self.completions.lock().unwrap().push(event.clone());
    }
}

/// Scripted stand-in for the target application.
#[derive(Debug)]
pub struct FakeProcess {
    journal: Journal,
    running: Option<RunningProcess>,
    close_outcome: CloseOutcome,
    relaunch_error: Option<io::ErrorKind>,
    relaunched: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl FakeProcess {
    /// A target that is not running.
    pub fn stopped(journal: Journal) -> Self {
        Self {
            journal,
            running: None,
            close_outcome: CloseOutcome::NotRunning,
            relaunch_error: None,
            relaunched: Mutex::new(Vec::new()),
        }
    }

    /// A target that is running and closes cleanly.
    pub fn running(journal: Journal, name: &str) -> Self {
        Self {
            running: Some(RunningProcess {
                pid: 4242,
                name: name.to_string(),
            }),
            close_outcome: CloseOutcome::Exited,
            ..Self::stopped(journal)
        }
    }

    #[must_use]
    pub fn close_outcome(mut self, outcome: CloseOutcome) -> Self {
        self.close_outcome = outcome;
        self
    }

    #[must_use]
    pub fn failing_relaunch(mut self, kind: io::ErrorKind) -> Self {
        self.relaunch_error = Some(kind);
        self
    }

    /// `(executable, working_dir)` of every relaunch.
    pub fn relaunched(&self) -> Vec<(PathBuf, PathBuf)> {
        self.relaunched.lock().unwrap().clone()
    }
}

impl TargetProcess for FakeProcess {
    fn find_running(&self, name: &str) -> Option<RunningProcess> {
        self.journal.record(format!("find: {name}"));
        self.running.clone()
    }

    fn close(&self, process: &RunningProcess) -> CloseOutcome {
        self.journal.record(format!("close: {}", process.pid));
        self.close_outcome.clone()
    }

    fn relaunch(&self, executable: &Path, working_dir: &Path) -> io::Result<u32> {
        self.journal.record(format!("relaunch: {}", executable.display()));
        self.relaunched
            .lock()
            .unwrap()
            .push((executable.to_path_buf(), working_dir.to_path_buf()));
        match self.relaunch_error {
            Some(kind) => Err(io::Error::new(kind, "relaunch refused")),
            None => Ok(4343),
        }
    }
}

/// Host that counts shutdown requests.
#[derive(Debug, Default)]
pub struct RecordingHost {
    journal: Journal,
    requests: AtomicUsize,
}

impl RecordingHost {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl HostControl for RecordingHost {
    fn request_shutdown(&self) {
        self.journal.record("shutdown");
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}
