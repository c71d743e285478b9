//! The update run.
//!
//! [`UpdateOrchestrator`] drives a single pass through these states:
//!
//! ```text
//! Init -> LocatingAppFolder -> UnpackingUpdate -> LocatingUpdateFolder -> ComparingVersions
//!      -> NoUpdateNeeded
//!      -> ClosingTarget -> ReplacingFiles -> Relaunching -> Completed
//! ```
//!
//! Any step may end the run in `Failed` instead. Every run emits exactly one
//! terminal [`ProgressEvent`]; everything before it is a status update. Events
//! are handed to an [`ExecutionContext`], which decides which thread the
//! [`UpdateObserver`] is called on, and are delivered in emission order.
//!
//! Problems the run recovers from (a target that will not close, a single file
//! that cannot be replaced, a failed relaunch) do not change the outcome. They
//! are collected as [`SoftFailure`] values in the returned [`UpdateReport`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use overlay_updater::config::AgentConfig;
//! use overlay_updater::metadata::VersionMetadataStore;
//! use overlay_updater::orchestrator::UpdateOrchestrator;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = AgentConfig::default();
//! let store = VersionMetadataStore::new(".");
//! let report = UpdateOrchestrator::new(store, &config).start()?.join()?;
//! println!("{:?}", report.outcome);
//! # Ok(())
//! # }
//! ```

mod context;
mod events;
pub mod messages;
mod report;

pub use context::{
    ChannelContext, DetachedHost, ExecutionContext, HostControl, HostMessage, InlineContext, Task,
};
pub use events::{FailureKind, NullObserver, ProgressEvent, UpdateObserver, UpdateStatus};
pub use report::{SoftFailure, UpdateReport, UpdateState};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::archive::{ArchiveExtractor, ArchiveFormat};
use crate::config::{AgentConfig, TargetConfig};
use crate::constants::{
    UNKNOWN_VERSION, UNPACKED_DIR, UPDATE_DIR, UPDATE_PACKAGE_PREFIX, WORKER_THREAD_NAME,
};
use crate::core::{ExtractionError, UpdaterError};
use crate::metadata::VersionMetadataStore;
use crate::process::{CloseOutcome, ProcessLifecycleManager, TargetProcess};
use crate::replace::FileReplacer;
use crate::utils::fs::find_shortest_match;

/// Runs one update of the installation found under the store's search root.
///
/// Collaborators default to the real implementations: the system process
/// table, inline notification delivery and a host that ignores shutdown
/// requests. Replace them with the `with_*` builders.
pub struct UpdateOrchestrator {
    store: VersionMetadataStore,
    extractor: ArchiveExtractor,
    replacer: FileReplacer,
    target: TargetConfig,
    remove_archive: bool,
    process: Arc<dyn TargetProcess>,
    observer: Arc<dyn UpdateObserver>,
    context: Arc<dyn ExecutionContext>,
    host: Arc<dyn HostControl>,
}

impl UpdateOrchestrator {
    pub fn new(store: VersionMetadataStore, config: &AgentConfig) -> Self {
        let process =
            ProcessLifecycleManager::new().exit_timeout(config.target.close_timeout());
        Self {
            store,
            extractor: ArchiveExtractor::new(),
            replacer: FileReplacer::new(),
            target: config.target.clone(),
            remove_archive: config.remove_archive_after_extract,
            process: Arc::new(process),
            observer: Arc::new(NullObserver),
            context: Arc::new(InlineContext),
            host: Arc::new(DetachedHost),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn UpdateObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Arc<dyn ExecutionContext>) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_process(mut self, process: Arc<dyn TargetProcess>) -> Self {
        self.process = process;
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn HostControl>) -> Self {
        self.host = host;
        self
    }

    /// Run the update on a dedicated worker thread.
    ///
    /// Consumes the orchestrator, so a run can only be started once.
    pub fn start(self) -> Result<UpdateHandle, UpdaterError> {
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || self.run())
            .map_err(|e| UpdaterError::Worker {
                message: format!("failed to spawn {WORKER_THREAD_NAME}: {e}"),
            })?;
        Ok(UpdateHandle { worker })
    }

    /// Run the update on the calling thread, blocking until it ends.
    pub fn run(&self) -> UpdateReport {
        let mut run = Run::new();
        let name = self.target.display_name.as_str();

        run.enter(UpdateState::LocatingAppFolder);
        self.status(messages::FIND_APP_FOLDER, UNKNOWN_VERSION, UNKNOWN_VERSION, 0.0);
        let installed = match self.store.find_installed_version() {
            Ok(Some(found)) => found,
            Ok(None) => {
                return self.fail(
                    run,
                    FailureKind::AppFolderNotFound,
                    messages::app_folder_not_found(name),
                    UNKNOWN_VERSION,
                    UNKNOWN_VERSION,
                    100.0,
                );
            }
            Err(e) => {
                warn!("{e}");
                return self.fail(
                    run,
                    FailureKind::DescriptorInvalid,
                    messages::app_folder_not_found(name),
                    UNKNOWN_VERSION,
                    UNKNOWN_VERSION,
                    100.0,
                );
            }
        };
        let app_folder = installed.folder().to_path_buf();
        let current_version = installed.info.version.clone();
        let current = current_version.as_deref().unwrap_or(UNKNOWN_VERSION);
        info!("App folder is {} (version {})", app_folder.display(), current);

        run.enter(UpdateState::UnpackingUpdate);
        if let Err(e) = self.unpack_if_present(&app_folder, current, &mut run) {
            warn!("Failed to unpack update: {e}");
            return self.fail(
                run,
                FailureKind::Extraction,
                messages::extraction_failed(name),
                current,
                UNKNOWN_VERSION,
                100.0,
            );
        }

        run.enter(UpdateState::LocatingUpdateFolder);
        self.status(messages::FIND_UPDATE_FOLDER, current, UNKNOWN_VERSION, 0.0);
        let update = match self.store.find_available_update() {
            Ok(Some(found)) => found,
            Ok(None) => {
                return self.fail(
                    run,
                    FailureKind::NoUpdateDownloaded,
                    messages::no_update_downloaded(name),
                    current,
                    UNKNOWN_VERSION,
                    100.0,
                );
            }
            Err(e) => {
                warn!("{e}");
                return self.fail(
                    run,
                    FailureKind::DescriptorInvalid,
                    messages::no_update_downloaded(name),
                    current,
                    UNKNOWN_VERSION,
                    100.0,
                );
            }
        };
        let update_folder = update.folder().to_path_buf();
        let new = update.info.version.as_deref().unwrap_or(UNKNOWN_VERSION);

        run.enter(UpdateState::ComparingVersions);
        if update.info.version.is_none() || update.info.version == current_version {
            run.enter(UpdateState::NoUpdateNeeded);
            info!("{} is already at version {}", name, current);
            self.emit(ProgressEvent::new(
                UpdateStatus::UpToDate,
                messages::up_to_date(name),
                current,
                new,
                100.0,
            ));
            return run.finish(UpdateStatus::UpToDate);
        }
        info!("Updating {} from {} to {}", name, current, new);

        run.enter(UpdateState::ClosingTarget);
        self.close_target(current, new, &mut run);

        run.enter(UpdateState::ReplacingFiles);
        self.status(messages::UPDATING, current, new, 0.0);
        let replaced = self.replacer.replace_all(&update_folder, &app_folder, |index, total| {
            let progress = index as f32 / total as f32 * 100.0;
            self.status(messages::UPDATING, current, new, progress);
        });
        let replaced = match replaced {
            Ok(report) => report,
            Err(e) => {
                warn!("{e}");
                return self.fail(run, FailureKind::Replace, messages::failed(name), current, new, 0.0);
            }
        };
        run.files_total = replaced.total;
        run.files_replaced = replaced.replaced.len();
        for failure in replaced.failures {
            run.soft(SoftFailure::FileReplace {
                path: failure.path,
                reason: failure.reason,
            });
        }

        run.enter(UpdateState::Relaunching);
        self.emit(ProgressEvent::new(
            UpdateStatus::Completed,
            messages::completed(name),
            current,
            new,
            100.0,
        ));
        if self.target.relaunch {
            let executable = self.target.executable_in(&app_folder);
            if let Err(e) = self.process.relaunch(&executable, &app_folder) {
                run.soft(SoftFailure::Relaunch {
                    executable,
                    reason: e.to_string(),
                });
            }
        }
        self.host.request_shutdown();

        run.enter(UpdateState::Completed);
        run.finish(UpdateStatus::Completed)
    }

    /// Extract `update.*` into `<app>/update/unpacked` when a package is present.
    fn unpack_if_present(
        &self,
        app_folder: &Path,
        current: &str,
        run: &mut Run,
    ) -> Result<(), ExtractionError> {
        let destination = app_folder.join(UPDATE_DIR).join(UNPACKED_DIR);
        let Some(package) = find_update_package(app_folder, &destination) else {
            debug!("No update package under {}", app_folder.display());
            return Ok(());
        };

        self.extractor.extract(&package, &destination, |entry| {
            self.status(messages::unpacking(entry), current, UNKNOWN_VERSION, 0.0);
        })?;

        if self.remove_archive {
            match fs::remove_file(&package) {
                Ok(()) => debug!("Removed {}", package.display()),
                Err(e) => run.soft(SoftFailure::ArchiveCleanup {
                    path: package,
                    reason: e.to_string(),
                }),
            }
        }
        Ok(())
    }

    fn close_target(&self, current: &str, new: &str, run: &mut Run) {
        let Some(process) = self.process.find_running(&self.target.process_name) else {
            debug!("{} is not running", self.target.process_name);
            return;
        };

        self.status(messages::waiting_for_exit(&self.target.display_name), current, new, 0.0);
        match self.process.close(&process) {
            CloseOutcome::NotRunning | CloseOutcome::Exited => {}
            CloseOutcome::Failed { reason } => run.soft(SoftFailure::ProcessClose {
                process: process.name,
                reason,
            }),
        }
    }

    fn status(&self, message: impl Into<String>, current: &str, new: &str, progress: f32) {
        self.emit(ProgressEvent::new(UpdateStatus::InProgress, message, current, new, progress));
    }

    fn fail(
        &self,
        mut run: Run,
        kind: FailureKind,
        message: String,
        current: &str,
        new: &str,
        progress: f32,
    ) -> UpdateReport {
        run.enter(UpdateState::Failed);
        warn!("Update failed: {kind}");
        self.emit(ProgressEvent::new(UpdateStatus::Failed(kind), message, current, new, progress));
        run.finish(UpdateStatus::Failed(kind))
    }

    fn emit(&self, event: ProgressEvent) {
        debug!("[{:>5.1}%] {}", event.progress, event.message);
        let observer = Arc::clone(&self.observer);
        self.context.dispatch(Box::new(move || {
            if event.is_terminal() {
                observer.on_completed(&event);
            } else {
                observer.on_status(&event);
            }
        }));
    }
}

/// Shortest-path `update.<supported extension>` under the app folder,
/// ignoring anything already extracted.
fn find_update_package(app_folder: &Path, unpacked: &Path) -> Option<PathBuf> {
    find_shortest_match(app_folder, |path| {
        !path.starts_with(unpacked)
            && path.file_name().is_some_and(|name| {
                name.to_string_lossy().to_lowercase().starts_with(UPDATE_PACKAGE_PREFIX)
            })
            && ArchiveFormat::is_supported(path)
    })
}

/// Bookkeeping for a run in progress.
struct Run {
    states: Vec<UpdateState>,
    soft_failures: Vec<SoftFailure>,
    files_replaced: usize,
    files_total: usize,
}

impl Run {
    fn new() -> Self {
        Self {
            states: vec![UpdateState::Init],
            soft_failures: Vec::new(),
            files_replaced: 0,
            files_total: 0,
        }
    }

    fn enter(&mut self, state: UpdateState) {
        debug!("Entering {:?}", state);
        self.states.push(state);
    }

    fn soft(&mut self, failure: SoftFailure) {
        warn!("Continuing after error: {failure}");
        self.soft_failures.push(failure);
    }

    fn finish(self, outcome: UpdateStatus) -> UpdateReport {
        UpdateReport {
            outcome,
            states: self.states,
            soft_failures: self.soft_failures,
            files_replaced: self.files_replaced,
            files_total: self.files_total,
        }
    }
}

/// A run started with [`UpdateOrchestrator::start`].
#[derive(Debug)]
pub struct UpdateHandle {
    worker: JoinHandle<UpdateReport>,
}

impl UpdateHandle {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the run to end.
    pub fn join(self) -> Result<UpdateReport, UpdaterError> {
        self.worker.join().map_err(|_| UpdaterError::Worker {
            message: format!("{WORKER_THREAD_NAME} panicked"),
        })
    }
}
