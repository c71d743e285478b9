use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use crate::constants::DEFAULT_CONFIG_FILE;
use crate::core::ConfigError;

/// Settings for one updater run.
///
/// Every field has a serde default so a partial (or absent) `updater.toml`
/// yields a usable configuration.
///
/// ```toml
/// exit_delay_ms = 4000
/// remove_archive_after_extract = true
///
/// [target]
/// process_name = "game"
/// executable = "game.exe"
/// display_name = "Game"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Directory tree searched for the descriptors. `None` means the working directory.
    #[serde(default)]
    pub search_root: Option<PathBuf>,

    /// Delay before the agent exits after a failed run, in milliseconds.
    #[serde(default = "default_exit_delay_ms")]
    pub exit_delay_ms: u64,

    /// Grace period before a requested self-termination becomes a forced exit.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// Delete the update package once it has been unpacked.
    #[serde(default = "default_remove_archive")]
    pub remove_archive_after_extract: bool,

    /// The application being updated.
    #[serde(default)]
    pub target: TargetConfig,
}

/// The application that is closed before and relaunched after an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Matched case-insensitively as a substring of running process names.
    #[serde(default = "default_process_name")]
    pub process_name: String,

    /// Executable started after a successful update; relative paths are
    /// resolved against the app folder.
    #[serde(default = "default_executable")]
    pub executable: PathBuf,

    /// Name used in progress messages.
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// How long to wait for the target to exit. Zero waits indefinitely.
    #[serde(default = "default_close_timeout_secs")]
    pub close_timeout_secs: u64,

    /// Start the target again after a successful update.
    #[serde(default = "default_relaunch")]
    pub relaunch: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            search_root: None,
            exit_delay_ms: default_exit_delay_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            remove_archive_after_extract: default_remove_archive(),
            target: TargetConfig::default(),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            process_name: default_process_name(),
            executable: default_executable(),
            display_name: default_display_name(),
            close_timeout_secs: default_close_timeout_secs(),
            relaunch: default_relaunch(),
        }
    }
}

fn default_exit_delay_ms() -> u64 {
    4000
}

fn default_shutdown_grace_ms() -> u64 {
    2000
}

fn default_remove_archive() -> bool {
    true
}

fn default_process_name() -> String {
    "app".to_string()
}

fn default_executable() -> PathBuf {
    PathBuf::from("app")
}

fn default_display_name() -> String {
    "Application".to_string()
}

fn default_close_timeout_secs() -> u64 {
    0
}

fn default_relaunch() -> bool {
    true
}

impl AgentConfig {
    /// Load the configuration for a run.
    ///
    /// An explicit path must exist. Without one, `<search_root>/updater.toml`
    /// is used when present and defaults otherwise.
    pub async fn load(explicit: Option<&Path>, search_root: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path).await;
        }

        let candidate = search_root.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load_from(&candidate).await
        } else {
            debug!("No {} in {}, using defaults", DEFAULT_CONFIG_FILE, search_root.display());
            Ok(Self::default())
        }
    }

    /// Parse a configuration file.
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).await.map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Directory searched for descriptors, falling back to `cwd`.
    #[must_use]
    pub fn search_root_or(&self, cwd: &Path) -> PathBuf {
        self.search_root.clone().unwrap_or_else(|| cwd.to_path_buf())
    }

    #[must_use]
    pub fn exit_delay(&self) -> Duration {
        Duration::from_millis(self.exit_delay_ms)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl TargetConfig {
    /// `None` when the wait is unbounded.
    #[must_use]
    pub fn close_timeout(&self) -> Option<Duration> {
        (self.close_timeout_secs > 0).then(|| Duration::from_secs(self.close_timeout_secs))
    }

    /// Absolute path of the executable for an install rooted at `app_folder`.
    #[must_use]
    pub fn executable_in(&self, app_folder: &Path) -> PathBuf {
        if self.executable.is_absolute() {
            self.executable.clone()
        } else {
            app_folder.join(&self.executable)
        }
    }
}
