//! Configuration for the update agent.
//!
//! The agent reads an optional `updater.toml`. Lookup order:
//!
//! 1. `--config <path>` or the `OVERLAY_UPDATER_CONFIG` environment variable
//! 2. `updater.toml` in the search root
//! 3. Built-in defaults
//!
//! Command line flags are applied on top of whatever was loaded.

mod agent;

pub use agent::{AgentConfig, TargetConfig};
