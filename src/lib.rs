//! Overlay Updater - a self-update agent for installed applications
//!
//! The agent runs next to an installed application and brings it to the
//! version of a previously downloaded update package:
//!
//! 1. Locate the installation by its `metadata.json`
//! 2. Unpack `update.*` (zip, rar, 7z, tar, gz) into `<app>/update/unpacked`
//! 3. Read the new version from the unpacked `update.json`
//! 4. Stop if the versions match
//! 5. Close the running application
//! 6. Copy every payload file over the installation, saving the previous
//!    copy under `<app>/backup`
//! 7. Start the application again and exit
//!
//! # Installation layout
//!
//! ```text
//! <search root>/
//!   app/
//!     metadata.json          {"Version": "1.0"}
//!     update.zip             downloaded package, removed once unpacked
//!     update/unpacked/       extracted payload
//!       update.json          {"Version": "1.1", "DownloadUrl": ..., "Released": ...}
//!     backup/                files as they were before the last update
//! ```
//!
//! # Modules
//!
//! ## Core Functionality
//! - [`orchestrator`] - the update state machine, progress events and observers
//! - [`metadata`] - version descriptors and their discovery
//! - [`archive`] - update package extraction per format
//! - [`replace`] - overlaying the payload with backups
//! - [`process`] - closing and relaunching the target application
//! - [`scheduler`] - one-shot timers on a background thread
//!
//! ## Host
//! - [`cli`] - command-line parsing, logging and wiring
//! - [`ui`] - console rendering and the notification loop
//! - [`config`] - `updater.toml` loading
//!
//! ## Supporting Modules
//! - [`core`] - error types and user-facing error formatting
//! - [`constants`] - file names, directories and timing parameters
//! - [`utils`] - file system helpers
//!
//! # Embedding
//!
//! ```rust,no_run
//! use overlay_updater::config::AgentConfig;
//! use overlay_updater::metadata::VersionMetadataStore;
//! use overlay_updater::orchestrator::{UpdateOrchestrator, UpdateStatus};
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = AgentConfig::default();
//! let report = UpdateOrchestrator::new(VersionMetadataStore::new("/opt/game"), &config).run();
//! if let UpdateStatus::Failed(kind) = report.outcome {
//!     eprintln!("update failed: {kind}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod metadata;
pub mod orchestrator;
pub mod process;
pub mod replace;
pub mod scheduler;
pub mod ui;
pub mod utils;

// Fakes and fixtures for unit and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
