//! Command-line interface for the update agent.
//!
//! The agent has no subcommands: one invocation performs one update run.
//!
//! ```bash
//! # Update the installation below the working directory
//! overlay-updater
//!
//! # Search another tree and restart a specific executable afterwards
//! overlay-updater --root /opt/game --process-name game --executable bin/game
//!
//! # Exit straight away after a failure and keep the output plain
//! overlay-updater --exit-delay-ms 0 --no-progress
//! ```
//!
//! # Exit codes
//!
//! - `0` - the update completed or nothing needed updating
//! - `1` - the run failed, or the agent itself could not start

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AgentConfig;
use crate::constants::CONFIG_ENV_VAR;
use crate::metadata::VersionMetadataStore;
use crate::orchestrator::{ChannelContext, UpdateOrchestrator};
use crate::scheduler::TimerScheduler;
use crate::ui::{ConsoleHost, ConsoleObserver, run_ui_loop};

/// Unpack a downloaded update, overlay it onto the installed application and restart it.
#[derive(Parser, Debug)]
#[command(
    name = "overlay-updater",
    version,
    about = "Self-update agent: unpack, back up, replace and relaunch",
    long_about = "Finds the installed application (metadata.json) below the search root, \
                  unpacks a downloaded update.* package, compares versions, closes the running \
                  application, overlays the new files with backups and starts it again."
)]
pub struct Cli {
    /// Directory searched for metadata.json and update.json [default: working directory]
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Configuration file [default: <root>/updater.toml when present]
    #[arg(short, long, value_name = "FILE", env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Milliseconds to keep a failure message on screen before exiting
    #[arg(long, value_name = "MS")]
    exit_delay_ms: Option<u64>,

    /// Running process to close before files are replaced (case-insensitive substring)
    #[arg(long, value_name = "NAME")]
    process_name: Option<String>,

    /// Executable to start after the update, relative to the app folder
    #[arg(long, value_name = "PATH")]
    executable: Option<PathBuf>,

    /// Application name shown in progress messages
    #[arg(long, value_name = "NAME")]
    display_name: Option<String>,

    /// Do not start the application after updating
    #[arg(long)]
    no_relaunch: bool,

    /// Print progress as plain lines instead of a progress bar
    #[arg(long)]
    no_progress: bool,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Run the agent and return the process exit code.
    pub async fn execute(self) -> Result<i32> {
        self.init_logging();

        let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
        let config = self.load_config(&cwd).await?;
        let search_root = self.root.clone().unwrap_or_else(|| config.search_root_or(&cwd));
        info!("Searching for the installation under {}", search_root.display());

        let scheduler = Arc::new(TimerScheduler::new());
        scheduler.start()?;

        let (context, receiver) = ChannelContext::new();
        let observer =
            ConsoleObserver::new(context.sender(), Arc::clone(&scheduler), config.exit_delay())
                .with_progress_bar(!self.no_progress);
        let host =
            ConsoleHost::new(context.sender(), Arc::clone(&scheduler), config.shutdown_grace());

        let handle = UpdateOrchestrator::new(VersionMetadataStore::new(search_root), &config)
            .with_observer(Arc::new(observer))
            .with_context(Arc::new(context))
            .with_host(Arc::new(host))
            .start()?;

        let code = run_ui_loop(receiver).await;

        match tokio::task::spawn_blocking(move || handle.join()).await {
            Ok(Ok(report)) => {
                debug!("Run finished in state {:?}", report.final_state());
                if !self.quiet {
                    for failure in &report.soft_failures {
                        eprintln!("{}: {}", "warning".yellow(), failure);
                    }
                }
            }
            Ok(Err(e)) => warn!("{e}"),
            Err(e) => warn!("Failed to join the update worker: {e}"),
        }
        scheduler.stop();
        Ok(code)
    }

    /// Load the configuration file and apply command-line overrides.
    pub async fn load_config(&self, cwd: &Path) -> Result<AgentConfig> {
        let lookup_root = self.root.as_deref().unwrap_or(cwd);
        let mut config = AgentConfig::load(self.config.as_deref(), lookup_root)
            .await
            .context("Failed to load configuration")?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut AgentConfig) {
        if let Some(delay) = self.exit_delay_ms {
            config.exit_delay_ms = delay;
        }
        if let Some(name) = &self.process_name {
            config.target.process_name.clone_from(name);
        }
        if let Some(executable) = &self.executable {
            config.target.executable.clone_from(executable);
        }
        if let Some(name) = &self.display_name {
            config.target.display_name.clone_from(name);
        }
        if self.no_relaunch {
            config.target.relaunch = false;
        }
    }

    /// `None` disables logging.
    fn log_level(&self) -> Option<&'static str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            None
        } else {
            Some("warn")
        }
    }

    /// Log to stderr. `RUST_LOG` wins over the flags when set.
    fn init_logging(&self) {
        let Some(level) = self.log_level() else {
            return;
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[cfg(test)]
mod tests;
