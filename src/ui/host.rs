use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::orchestrator::{HostControl, HostMessage};
use crate::scheduler::TimerScheduler;

/// [`HostControl`] for the console binary.
///
/// A shutdown request ends the UI loop with exit code 0. If the process is
/// still alive after the grace period it is terminated with
/// [`std::process::exit`].
pub struct ConsoleHost {
    sender: UnboundedSender<HostMessage>,
    scheduler: Arc<TimerScheduler>,
    grace: Duration,
}

impl ConsoleHost {
    pub fn new(
        sender: UnboundedSender<HostMessage>,
        scheduler: Arc<TimerScheduler>,
        grace: Duration,
    ) -> Self {
        Self {
            sender,
            scheduler,
            grace,
        }
    }
}

impl HostControl for ConsoleHost {
    fn request_shutdown(&self) {
        if self.sender.send(HostMessage::Shutdown(0)).is_err() {
            debug!("UI loop already gone");
        }
        self.scheduler.schedule(self.grace, || {
            warn!("Graceful shutdown did not finish in time; exiting");
            std::process::exit(0)
        });
    }
}
