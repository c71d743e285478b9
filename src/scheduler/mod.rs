//! One-shot delayed callbacks on a dedicated thread.
//!
//! [`TimerScheduler`] keeps an unordered list of pending timeouts. Its loop
//! picks the earliest deadline, sleeps for at most
//! [`SCHEDULER_POLL_INTERVAL`](crate::constants::SCHEDULER_POLL_INTERVAL) or
//! until that deadline, and fires every timeout that has come due. Callbacks
//! run on the scheduler thread; an error or panic in one is logged and does
//! not stop the loop.
//!
//! The agent shares one scheduler (behind an `Arc`) between the host's
//! delayed exit and the forced-termination fallback.
//!
//! # Examples
//!
//! ```rust,no_run
//! use overlay_updater::scheduler::TimerScheduler;
//! use std::time::Duration;
//!
//! let scheduler = TimerScheduler::new();
//! scheduler.start()?;
//! let handle = scheduler.schedule(Duration::from_secs(4), || {
//!     println!("timed out");
//!     Ok(())
//! });
//! scheduler.cancel(handle);
//! scheduler.stop();
//! # Ok::<(), overlay_updater::core::UpdaterError>(())
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::constants::{SCHEDULER_POLL_INTERVAL, SCHEDULER_THREAD_NAME};
use crate::core::UpdaterError;

type Callback = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;

/// Identifies a scheduled timeout for [`TimerScheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeoutHandle(u64);

/// Whether the scheduler thread is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct ScheduledTimeout {
    id: u64,
    registered_at: Instant,
    deadline: Instant,
    callback: Callback,
}

#[derive(Default)]
struct Pending {
    timeouts: Vec<ScheduledTimeout>,
    next_id: u64,
}

impl Pending {
    /// Index of the timeout with the earliest deadline.
    fn earliest(&self) -> Option<usize> {
        self.timeouts
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (t.deadline, t.id))
            .map(|(index, _)| index)
    }
}

#[derive(Default)]
struct Shared {
    pending: Mutex<Pending>,
    wake: Condvar,
    running: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background scheduler for one-shot timeouts.
///
/// Timeouts can be registered before [`start`](Self::start); they fire once
/// the loop runs. Dropping the scheduler stops it.
pub struct TimerScheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            worker: Mutex::new(None),
        }
    }

    /// Register `callback` to run once `delay` has elapsed.
    pub fn schedule<F>(&self, delay: Duration, callback: F) -> TimeoutHandle
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        let now = Instant::now();
        let mut pending = self.shared.lock();
        let id = pending.next_id;
        pending.next_id += 1;
        pending.timeouts.push(ScheduledTimeout {
            id,
            registered_at: now,
            deadline: now + delay,
            callback: Box::new(callback),
        });
        drop(pending);

        self.shared.wake.notify_all();
        trace!("Scheduled timeout {} in {:?}", id, delay);
        TimeoutHandle(id)
    }

    /// Remove a pending timeout. Returns `false` if it already fired or was
    /// cancelled before.
    pub fn cancel(&self, handle: TimeoutHandle) -> bool {
        let mut pending = self.shared.lock();
        let before = pending.timeouts.len();
        pending.timeouts.retain(|t| t.id != handle.0);
        before != pending.timeouts.len()
    }

    /// Number of timeouts that have not fired yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.lock().timeouts.len()
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        if self.shared.running.load(Ordering::SeqCst) {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    /// Spawn the scheduler thread. Starting a running scheduler is a no-op.
    pub fn start(&self) -> Result<(), UpdaterError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(SCHEDULER_THREAD_NAME.to_string())
            .spawn(move || run_loop(&shared))
            .map_err(|e| {
                self.shared.running.store(false, Ordering::SeqCst);
                UpdaterError::Worker {
                    message: format!("failed to spawn {SCHEDULER_THREAD_NAME}: {e}"),
                }
            })?;
        *worker = Some(handle);
        debug!("Timer scheduler started");
        Ok(())
    }

    /// Stop the loop and wait for the thread. Pending timeouts are kept.
    ///
    /// Called from inside a callback, this only signals the loop to end.
    pub fn stop(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.shared.wake.notify_all();

        let handle = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!("Timer scheduler thread panicked");
            }
        }
        debug!("Timer scheduler stopped");
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(shared: &Shared) {
    let mut pending = shared.lock();
    while shared.running.load(Ordering::SeqCst) {
        let now = Instant::now();
        let wait = match pending.earliest() {
            Some(index) if pending.timeouts[index].deadline <= now => {
                let due = pending.timeouts.swap_remove(index);
                drop(pending);
                fire(due);
                // Check again without sleeping; more timeouts may be due
                pending = shared.lock();
                continue;
            }
            Some(index) => (pending.timeouts[index].deadline - now).min(SCHEDULER_POLL_INTERVAL),
            None => SCHEDULER_POLL_INTERVAL,
        };
        pending = match shared.wake.wait_timeout(pending, wait) {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        };
    }
}

fn fire(timeout: ScheduledTimeout) {
    trace!(
        "Firing timeout {} after {:?} ({:?} past deadline)",
        timeout.id,
        timeout.registered_at.elapsed(),
        Instant::now().saturating_duration_since(timeout.deadline)
    );

    match panic::catch_unwind(AssertUnwindSafe(timeout.callback)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Scheduled callback {} failed: {:#}", timeout.id, e),
        Err(_) => warn!("Scheduled callback {} panicked", timeout.id),
    }
}
