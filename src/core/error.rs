//! Error handling for the updater
//!
//! Errors are split along the component boundaries of an update run so callers
//! can match on the failure mode they care about:
//!
//! - [`MetadataError`] - descriptor discovery and parsing
//! - [`ExtractionError`] - archive format dispatch and entry extraction
//! - [`ReplaceError`] - enumerating the unpacked payload
//! - [`ConfigError`] - loading `updater.toml`
//!
//! [`UpdaterError`] wraps all of them for code that only needs one error type.
//! The binary renders any [`anyhow::Error`] through [`user_friendly_error`],
//! which attaches a suggestion when the failure is recognized.
//!
//! # Examples
//!
//! ```rust,no_run
//! use overlay_updater::core::{ExtractionError, user_friendly_error};
//!
//! let error = ExtractionError::UnsupportedFormat {
//!     extension: "cab".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while locating or parsing a version descriptor.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The descriptor exists but could not be read.
    #[error("Failed to read descriptor {path}")]
    Io {
        /// Descriptor path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The descriptor is not valid JSON or does not have the expected shape.
    ///
    /// This is kept apart from "not found" so a corrupt install is never
    /// mistaken for a missing one.
    #[error("Invalid descriptor {path}: {reason}")]
    Parse {
        /// Descriptor path
        path: PathBuf,
        /// Parser message
        reason: String,
    },
}

/// Failures while unpacking an update package.
///
/// Every variant aborts extraction of the whole archive.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The file extension does not map to a supported archive format.
    #[error("The archive extension '{extension}' is not supported")]
    UnsupportedFormat {
        /// Lowercased extension without the leading dot
        extension: String,
    },

    /// Reading the archive or writing an entry failed.
    #[error("I/O error while extracting {path}")]
    Io {
        /// File being read or written when the failure happened
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The archive container itself is corrupt or unreadable.
    #[error("Failed to read {format} archive: {reason}")]
    Archive {
        /// Format name (zip, tar, ...)
        format: &'static str,
        /// Codec message
        reason: String,
    },

    /// An entry would be written outside the destination directory.
    #[error("Archive entry '{entry}' escapes the destination directory")]
    UnsafeEntryPath {
        /// Entry name as stored in the archive
        entry: String,
    },
}

impl ExtractionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive(format: &'static str, reason: impl fmt::Display) -> Self {
        Self::Archive {
            format,
            reason: reason.to_string(),
        }
    }
}

/// Failures that stop a replacement batch before any file is touched.
///
/// Individual file failures are not errors; they are collected as
/// [`SoftFailure`](crate::orchestrator::SoftFailure) values instead.
#[derive(Error, Debug)]
pub enum ReplaceError {
    /// The unpacked payload directory could not be enumerated.
    #[error("Failed to enumerate update payload at {path}: {reason}")]
    SourceUnreadable {
        /// Payload root
        path: PathBuf,
        /// Walk failure message
        reason: String,
    },

    /// The payload and the installation are the same directory.
    #[error("Update payload {path} is the installation itself")]
    SameRoot {
        /// The shared directory
        path: PathBuf,
    },
}

/// Failures while loading the agent configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration file {path}")]
    Read {
        /// Configuration path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`AgentConfig`](crate::config::AgentConfig).
    #[error("Invalid configuration file {path}: {reason}")]
    Parse {
        /// Configuration path
        path: PathBuf,
        /// Parser message
        reason: String,
    },
}

/// Umbrella error for the updater library.
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// Descriptor discovery or parsing failed
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Archive extraction failed
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// File replacement could not start
    #[error(transparent)]
    Replace(#[from] ReplaceError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A background thread could not be spawned or joined
    #[error("Worker thread failure: {message}")]
    Worker {
        /// What went wrong
        message: String,
    },
}

/// Error wrapper with a suggestion and optional details for terminal output.
#[derive(Debug)]
pub struct ErrorContext {
    /// Headline message
    pub message: String,
    /// Actionable hint for the operator
    pub suggestion: Option<String>,
    /// Additional context such as the error chain
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with only a headline message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
///
/// The error chain below the top-level message is collected into the details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    let mut ctx = ErrorContext::new(error.to_string());
    if !chain.is_empty() {
        ctx = ctx.with_details(chain.join(": "));
    }

    if let Some(config_error) = error.downcast_ref::<ConfigError>() {
        return match config_error {
            ConfigError::Parse { .. } => ctx.with_suggestion(
                "Check the TOML syntax of the configuration file. Verify quotes, brackets and key names",
            ),
            ConfigError::Read { .. } => ctx.with_suggestion(
                "Check that the configuration path is correct or set OVERLAY_UPDATER_CONFIG",
            ),
        };
    }

    if let Some(extraction_error) = error.downcast_ref::<ExtractionError>() {
        return match extraction_error {
            ExtractionError::UnsupportedFormat { .. } => ctx.with_suggestion(
                "Supported package formats are .zip, .rar, .7z, .tar, .gz and .gzip",
            ),
            _ => ctx.with_suggestion("Delete the update package and download it again"),
        };
    }

    if let Some(MetadataError::Parse { .. }) = error.downcast_ref::<MetadataError>() {
        return ctx.with_suggestion("Repair or reinstall the application; its descriptor is corrupt");
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ctx.with_suggestion(
                    "Run the updater with permissions to write to the installation directory",
                );
            }
            std::io::ErrorKind::NotFound => {
                return ctx
                    .with_suggestion("Check that the search root and executable paths are correct");
            }
            _ => {}
        }
    }

    ctx
}
