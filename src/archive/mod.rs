//! Archive extraction for update packages.
//!
//! The format is chosen from the file extension, case-insensitively, once per
//! call to [`ArchiveExtractor::extract`]:
//!
//! | Extension        | Format   | Strategy      |
//! |------------------|----------|---------------|
//! | `.zip`           | zip      | random access |
//! | `.tar`           | tar      | solid         |
//! | `.gz`, `.gzip`   | gzip     | solid         |
//! | `.7z`            | 7z       | solid         |
//! | `.rar`           | rar      | solid         |
//!
//! A **solid** container is read through one forward-only reader and every
//! entry is extracted as it is encountered. A **random access** container
//! exposes an entry table and each entry is opened independently.
//!
//! A gzip file whose stem ends in `.tar` (`update.tar.gz`) is read as a tar
//! stream; any other gzip file holds a single entry named after the gzip
//! header's file name or, failing that, the archive's stem.
//!
//! Entries are streamed to disk in fixed-size chunks, so entry size is not
//! bounded by memory. Any I/O or codec failure aborts the whole archive.
//!
//! # Examples
//!
//! ```rust,no_run
//! use overlay_updater::archive::ArchiveExtractor;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let summary = ArchiveExtractor::new().extract(
//!     Path::new("app/update.zip"),
//!     Path::new("app/update/unpacked"),
//!     |entry| println!("Unpacked {entry}"),
//! )?;
//! println!("{} entries", summary.entries);
//! # Ok(())
//! # }
//! ```

mod entry;
mod formats;

pub use entry::sanitize_entry_name;

use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::constants::EXTRACT_CHUNK_SIZE;
use crate::core::ExtractionError;
use crate::utils::fs::{ensure_dir, lowercase_extension};
use entry::EntryWriter;

/// Supported archive container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    Zip,
    Rar,
    SevenZip,
    Tar,
    Gzip,
}

/// How entries of a container can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Entries are only reachable in order through one sequential reader.
    Solid,
    /// Entries can be opened individually in any order.
    RandomAccess,
}

impl ArchiveFormat {
    /// Map a lowercase extension (without the dot) to a format.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "zip" => Some(Self::Zip),
            "rar" => Some(Self::Rar),
            "7z" => Some(Self::SevenZip),
            "tar" => Some(Self::Tar),
            "gz" | "gzip" => Some(Self::Gzip),
            _ => None,
        }
    }

    /// Resolve the format of `path` from its extension.
    ///
    /// # Errors
    ///
    /// [`ExtractionError::UnsupportedFormat`] for any other extension, including none.
    pub fn from_path(path: &Path) -> Result<Self, ExtractionError> {
        let extension = lowercase_extension(path).unwrap_or_default();
        Self::from_extension(&extension).ok_or(ExtractionError::UnsupportedFormat { extension })
    }

    /// Whether `path` has an extension this module can extract.
    #[must_use]
    pub fn is_supported(path: &Path) -> bool {
        Self::from_path(path).is_ok()
    }

    #[must_use]
    pub const fn strategy(self) -> ExtractionStrategy {
        match self {
            Self::Zip => ExtractionStrategy::RandomAccess,
            Self::Rar | Self::SevenZip | Self::Tar | Self::Gzip => ExtractionStrategy::Solid,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Rar => "rar",
            Self::SevenZip => "7z",
            Self::Tar => "tar",
            Self::Gzip => "gzip",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub format: ArchiveFormat,
    /// File entries written (directories are not counted).
    pub entries: usize,
    /// Total bytes written.
    pub bytes: u64,
}

/// Unpacks update packages into a destination directory.
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    chunk_size: usize,
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self {
            chunk_size: EXTRACT_CHUNK_SIZE,
        }
    }
}

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract every entry of `source` below `destination`.
    ///
    /// Intermediate directories are created as needed and existing files are
    /// overwritten. `on_entry` receives the entry name as stored in the archive
    /// after each file entry has been fully written.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::UnsupportedFormat`] for an unknown extension
    /// - [`ExtractionError::Archive`] when the container is corrupt
    /// - [`ExtractionError::Io`] when reading or writing fails
    /// - [`ExtractionError::UnsafeEntryPath`] when an entry points outside `destination`
    pub fn extract<F>(
        &self,
        source: &Path,
        destination: &Path,
        mut on_entry: F,
    ) -> Result<ExtractionSummary, ExtractionError>
    where
        F: FnMut(&str),
    {
        let format = ArchiveFormat::from_path(source)?;
        info!("Extracting {} archive {} into {}", format, source.display(), destination.display());

        ensure_dir(destination).map_err(|e| ExtractionError::io(destination, e))?;
        let mut writer = EntryWriter::new(source, destination, self.chunk_size, &mut on_entry);

        match formats::open(format, source)? {
            formats::OpenedArchive::Solid(archive) => {
                debug!("Reading {} sequentially", format);
                archive.extract_all(&mut writer)?;
            }
            formats::OpenedArchive::RandomAccess(mut archive) => {
                let count = archive.entry_count();
                debug!("Reading {} entries of {} by index", count, format);
                for index in 0..count {
                    archive.extract_entry(index, &mut writer)?;
                }
            }
        }

        let summary = ExtractionSummary {
            format,
            entries: writer.entries(),
            bytes: writer.bytes(),
        };
        info!("Extracted {} entries ({} bytes)", summary.entries, summary.bytes);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests;
