//! Lifecycle of the application being updated.
//!
//! Before files are replaced the running target is asked to close and the
//! updater waits for it to leave the process list; afterwards it is started
//! again. Closing is advisory: every failure is returned as a
//! [`CloseOutcome::Failed`] value and the update carries on regardless.
//!
//! [`TargetProcess`] is the seam the orchestrator talks to.
//! [`ProcessLifecycleManager`] implements it against the real process table
//! via `sysinfo`.

use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessStatus, Signal, System, ThreadKind};
use tracing::{debug, info, warn};

use crate::constants::PROCESS_EXIT_POLL_INTERVAL;

/// A process that matched the target name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningProcess {
    pub pid: u32,
    pub name: String,
}

/// Result of asking the target to close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Nothing matched; there was nothing to close.
    NotRunning,
    /// The process left the process list.
    Exited,
    /// The close request failed or the process outlived the wait.
    Failed { reason: String },
}

/// Operations the orchestrator needs on the target application.
pub trait TargetProcess: Send + Sync {
    /// First running process whose name contains `name`, ignoring case.
    fn find_running(&self, name: &str) -> Option<RunningProcess>;

    /// Request a graceful close of `process` and block until it has exited.
    fn close(&self, process: &RunningProcess) -> CloseOutcome;

    /// Start `executable` detached, with `working_dir` as its current directory.
    fn relaunch(&self, executable: &Path, working_dir: &Path) -> io::Result<u32>;
}

/// [`TargetProcess`] backed by the operating system's process table.
#[derive(Debug, Clone)]
pub struct ProcessLifecycleManager {
    poll_interval: Duration,
    exit_timeout: Option<Duration>,
}

impl Default for ProcessLifecycleManager {
    fn default() -> Self {
        Self {
            poll_interval: PROCESS_EXIT_POLL_INTERVAL,
            exit_timeout: None,
        }
    }
}

impl ProcessLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up waiting for exit after `timeout`. `None` waits indefinitely.
    #[must_use]
    pub fn exit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.exit_timeout = timeout;
        self
    }

    /// Block until `pid` is gone from the process list.
    ///
    /// Returns `false` if the timeout elapsed first.
    pub fn wait_for_exit(&self, pid: u32) -> bool {
        let pid = Pid::from_u32(pid);
        let started = Instant::now();
        let mut system = System::new();

        loop {
            system.refresh_processes();
            let alive = system
                .process(pid)
                .is_some_and(|p| !matches!(p.status(), ProcessStatus::Zombie | ProcessStatus::Dead));
            if !alive {
                return true;
            }
            if let Some(limit) = self.exit_timeout {
                if started.elapsed() >= limit {
                    return false;
                }
            }
            thread::sleep(self.poll_interval);
        }
    }
}

/// Case-insensitive substring match, as used for target lookup.
#[must_use]
pub fn name_matches(process_name: &str, target: &str) -> bool {
    !target.is_empty() && process_name.to_lowercase().contains(&target.to_lowercase())
}

impl TargetProcess for ProcessLifecycleManager {
    fn find_running(&self, name: &str) -> Option<RunningProcess> {
        let mut system = System::new();
        system.refresh_processes();
        let own_pid = sysinfo::get_current_pid().ok();

        let mut matches: Vec<RunningProcess> = system
            .processes()
            .iter()
            .filter(|(pid, _)| Some(**pid) != own_pid)
            // Linux lists every thread as its own entry, ours included
            .filter(|(_, process)| process.thread_kind() != Some(ThreadKind::Userland))
            .filter_map(|(pid, process)| {
                let process_name: &OsStr = process.name().as_ref();
                let process_name = process_name.to_string_lossy();
                name_matches(&process_name, name).then(|| RunningProcess {
                    pid: pid.as_u32(),
                    name: process_name.into_owned(),
                })
            })
            .collect();
        matches.sort_by_key(|p| p.pid);
        let found = matches.into_iter().next();

        match &found {
            Some(p) => debug!("Found running target {} (pid {})", p.name, p.pid),
            None => debug!("No running process matches '{}'", name),
        }
        found
    }

    fn close(&self, process: &RunningProcess) -> CloseOutcome {
        let mut system = System::new();
        system.refresh_processes();
        let Some(handle) = system.process(Pid::from_u32(process.pid)) else {
            debug!("Process {} exited before it could be closed", process.pid);
            return CloseOutcome::Exited;
        };

        info!("Asking {} (pid {}) to close", process.name, process.pid);
        let requested = match handle.kill_with(Signal::Term) {
            Some(sent) => sent,
            // No graceful signal on this platform
            None => handle.kill(),
        };
        if !requested {
            warn!("Close request to pid {} was refused", process.pid);
            return CloseOutcome::Failed {
                reason: format!("close request to pid {} was refused", process.pid),
            };
        }

        if self.wait_for_exit(process.pid) {
            info!("{} has exited", process.name);
            CloseOutcome::Exited
        } else {
            warn!("{} (pid {}) is still running; continuing anyway", process.name, process.pid);
            CloseOutcome::Failed {
                reason: format!("pid {} did not exit in time", process.pid),
            }
        }
    }

    fn relaunch(&self, executable: &Path, working_dir: &Path) -> io::Result<u32> {
        info!("Starting {}", executable.display());
        let child = Command::new(executable)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(child.id())
    }
}
