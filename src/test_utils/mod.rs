//! Test utilities for the updater
//!
//! Fakes for the orchestrator's collaborators and builders for installation
//! layouts, shared by unit tests and the integration suite.
//!
//! The fakes can write into a shared [`Journal`] so a test can assert on the
//! relative order of notifications, process calls and shutdown requests.
//!
//! # Example
//!
//! ```rust,no_run
//! use overlay_updater::test_utils::{InstallFixture, Journal, RecordingObserver};
//!
//! let journal = Journal::default();
//! let install = InstallFixture::new("1.0").unwrap();
//! install.write_app_file("app.bin", b"old").unwrap();
//! let observer = RecordingObserver::new(journal.clone());
//! ```

mod fakes;
mod fixtures;

pub use fakes::{FakeProcess, Journal, RecordingHost, RecordingObserver};
pub use fixtures::{InstallFixture, write_zip};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` when given, otherwise `RUST_LOG`; without either, logging
/// stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_names(true)
            .try_init();
    });
}
