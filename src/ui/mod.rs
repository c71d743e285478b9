//! Terminal front end of the agent.
//!
//! The binary runs [`run_ui_loop`] on its main task. Notifications from the
//! update worker arrive over a [`ChannelContext`](crate::orchestrator::ChannelContext)
//! and run there in order; the loop ends on the first
//! [`HostMessage::Shutdown`].
//!
//! - [`ConsoleObserver`] renders progress and decides when a finished run exits
//! - [`ConsoleHost`] turns the orchestrator's shutdown request into a loop exit,
//!   with a forced exit as fallback

mod console;
mod host;

pub use console::ConsoleObserver;
pub use host::ConsoleHost;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::orchestrator::HostMessage;

/// Exit code used when every producer went away without requesting shutdown.
pub const ABANDONED_EXIT_CODE: i32 = 1;

/// Run notification tasks until a shutdown is requested, returning its exit code.
pub async fn run_ui_loop(mut receiver: UnboundedReceiver<HostMessage>) -> i32 {
    while let Some(message) = receiver.recv().await {
        match message {
            HostMessage::Run(task) => task(),
            HostMessage::Shutdown(code) => {
                debug!("Shutdown requested with exit code {}", code);
                return code;
            }
        }
    }
    warn!("Update worker stopped without finishing the run");
    ABANDONED_EXIT_CODE
}
