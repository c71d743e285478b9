//! Core types shared by every component of the updater.
//!
//! Currently this is the error taxonomy and the helpers that turn errors into
//! operator-facing messages. See [`error`] for details.

pub mod error;

pub use error::{
    ConfigError, ErrorContext, ExtractionError, MetadataError, ReplaceError, UpdaterError,
    user_friendly_error,
};
