//! Cross-platform utilities and helpers
//!
//! - [`fs`] - directory creation, shortest-path discovery, path containment checks

pub mod fs;

pub use fs::{ensure_dir, ensure_parent_dir, find_shortest_match, is_contained_relative};
