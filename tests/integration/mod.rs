//! Integration test suite for overlay-updater
//!
//! End-to-end runs against temporary installation trees, through the library
//! API and through the compiled binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: the binary's exit codes and console output
//! - **packages**: full updates from each package format
//! - **update_flow**: repeated runs, backups and failure reporting

mod cli;
mod packages;
mod update_flow;
