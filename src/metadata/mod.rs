//! Version descriptors and their discovery.
//!
//! Two JSON descriptors drive an update run:
//!
//! - `metadata.json` marks the app folder and records the installed version
//! - `update.json` marks the unpacked update folder and records the version it installs
//!
//! Versions are opaque strings. An update is needed exactly when the update
//! version is present and differs from the installed one.

mod descriptor;
mod store;

pub use descriptor::{AvailableUpdateInfo, InstalledVersionInfo};
pub use store::{Discovered, VersionMetadataStore};
