//! Where observer notifications run, and how the host is asked to exit.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// A unit of work handed to an [`ExecutionContext`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs notification tasks on behalf of the orchestrator.
///
/// Implementations must run tasks in the order they were dispatched.
pub trait ExecutionContext: Send + Sync {
    fn dispatch(&self, task: Task);
}

/// Runs every task immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineContext;

impl ExecutionContext for InlineContext {
    fn dispatch(&self, task: Task) {
        task();
    }
}

/// Messages consumed by the host's UI loop.
pub enum HostMessage {
    /// Run a notification task.
    Run(Task),
    /// Leave the UI loop with this exit code.
    Shutdown(i32),
}

impl std::fmt::Debug for HostMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Run(_) => f.write_str("Run(..)"),
            Self::Shutdown(code) => f.debug_tuple("Shutdown").field(code).finish(),
        }
    }
}

/// Forwards tasks to a UI loop over an unbounded channel.
///
/// The receiving end runs [`HostMessage::Run`] tasks as it drains the
/// channel, which keeps them in dispatch order.
#[derive(Debug, Clone)]
pub struct ChannelContext {
    sender: UnboundedSender<HostMessage>,
}

impl ChannelContext {
    /// Create a context and the receiver the UI loop should drain.
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<HostMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Sender for other producers on the same loop, such as a [`HostControl`].
    #[must_use]
    pub fn sender(&self) -> UnboundedSender<HostMessage> {
        self.sender.clone()
    }
}

impl ExecutionContext for ChannelContext {
    fn dispatch(&self, task: Task) {
        if self.sender.send(HostMessage::Run(task)).is_err() {
            debug!("UI loop has exited; dropping notification");
        }
    }
}

/// Lets the orchestrator ask its hosting process to terminate.
pub trait HostControl: Send + Sync {
    /// Best effort; the host decides how and when to exit.
    fn request_shutdown(&self);
}

/// Host that ignores shutdown requests, for embedding and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

impl HostControl for DetachedHost {
    fn request_shutdown(&self) {
        debug!("Shutdown requested; no host attached");
    }
}
