//! Global constants used throughout the updater.
//!
//! File names, directory conventions, buffer sizes and timing parameters
//! shared by more than one module live here so the conventions of an
//! installation are discoverable in one place.

use std::time::Duration;

/// File name of the installed-version descriptor.
///
/// The directory containing the shortest-path match is the app folder.
pub const INSTALLED_DESCRIPTOR: &str = "metadata.json";

/// File name of the available-update descriptor.
///
/// The directory containing the shortest-path match is the update folder.
pub const UPDATE_DESCRIPTOR: &str = "update.json";

/// File name prefix of a downloaded update package (`update.zip`, `update.7z`, ...).
pub const UPDATE_PACKAGE_PREFIX: &str = "update.";

/// Directory under the app folder that receives the pending update payload.
pub const UPDATE_DIR: &str = "update";

/// Directory under [`UPDATE_DIR`] that archives are extracted into.
pub const UNPACKED_DIR: &str = "unpacked";

/// Directory under the app folder that mirrors every file replaced by an update.
pub const BACKUP_DIR: &str = "backup";

/// Extensions of archive artifacts that are never deployed as live files.
pub const NON_DEPLOYABLE_EXTENSIONS: &[&str] = &["zip", "7z"];

/// Size of the buffer used to stream archive entries to disk (4 KiB).
pub const EXTRACT_CHUNK_SIZE: usize = 4096;

/// Upper bound on how long the timer loop sleeps between deadline checks.
pub const SCHEDULER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Interval between process list refreshes while waiting for the target to exit.
pub const PROCESS_EXIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Name given to the worker thread that runs an update.
pub const WORKER_THREAD_NAME: &str = "update-worker";

/// Name given to the timer scheduler's background thread.
pub const SCHEDULER_THREAD_NAME: &str = "timer-scheduler";

/// Placeholder shown in progress events when a version is not known yet.
pub const UNKNOWN_VERSION: &str = "-";

/// Environment variable that points at an alternative configuration file.
pub const CONFIG_ENV_VAR: &str = "OVERLAY_UPDATER_CONFIG";

/// Configuration file looked up in the search root when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "updater.toml";
