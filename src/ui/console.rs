use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::orchestrator::{HostMessage, ProgressEvent, UpdateObserver, UpdateStatus};
use crate::scheduler::TimerScheduler;

/// Exit code of a run that ended in [`UpdateStatus::Failed`].
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Renders progress on the terminal and ends the UI loop after a terminal event.
///
/// Status updates drive a progress bar when one is enabled and stderr is a
/// terminal; otherwise each one is printed as a line. The terminal message is
/// always printed.
///
/// After a failure the loop is ended with [`FAILURE_EXIT_CODE`] once the exit
/// delay has passed, leaving the message on screen. "Already up to date" ends
/// it immediately. A completed update is left to the
/// [`ConsoleHost`](super::ConsoleHost).
pub struct ConsoleObserver {
    bar: Option<ProgressBar>,
    sender: UnboundedSender<HostMessage>,
    scheduler: Arc<TimerScheduler>,
    exit_delay: Duration,
}

impl ConsoleObserver {
    pub fn new(
        sender: UnboundedSender<HostMessage>,
        scheduler: Arc<TimerScheduler>,
        exit_delay: Duration,
    ) -> Self {
        Self {
            bar: None,
            sender,
            scheduler,
            exit_delay,
        }
    }

    /// Use a progress bar for status updates when `enabled` and stderr is interactive.
    #[must_use]
    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        if enabled && std::io::stderr().is_terminal() {
            let bar = ProgressBar::new(100);
            bar.set_style(bar_style());
            self.bar = Some(bar);
        }
        self
    }

    fn print_terminal(event: &ProgressEvent) {
        let versions = format!("({} -> {})", event.old_version, event.new_version).dimmed();
        match event.status {
            UpdateStatus::Completed => println!("{} {}", event.message.green().bold(), versions),
            UpdateStatus::UpToDate => println!("{} {}", event.message.green(), versions),
            UpdateStatus::Failed(kind) => {
                println!("{} {}", event.message.red().bold(), format!("[{kind}]").dimmed());
            }
            UpdateStatus::InProgress => println!("{}", event.message),
        }
    }

    fn end_loop(&self, code: i32) {
        if self.sender.send(HostMessage::Shutdown(code)).is_err() {
            debug!("UI loop already gone");
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

impl UpdateObserver for ConsoleObserver {
    fn on_status(&self, event: &ProgressEvent) {
        match &self.bar {
            Some(bar) => {
                bar.set_position(event.progress.round() as u64);
                bar.set_message(event.message.clone());
            }
            None => println!("[{:>3.0}%] {}", event.progress, event.message),
        }
    }

    fn on_completed(&self, event: &ProgressEvent) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        Self::print_terminal(event);

        match event.status {
            UpdateStatus::Failed(_) => {
                let sender = self.sender.clone();
                self.scheduler.schedule(self.exit_delay, move || {
                    if sender.send(HostMessage::Shutdown(FAILURE_EXIT_CODE)).is_err() {
                        std::process::exit(FAILURE_EXIT_CODE);
                    }
                    Ok(())
                });
            }
            UpdateStatus::UpToDate => self.end_loop(0),
            UpdateStatus::Completed | UpdateStatus::InProgress => {}
        }
    }
}
