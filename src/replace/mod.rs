//! Overlaying an unpacked update onto the live installation.
//!
//! [`FileReplacer`] copies every file of the update payload to the same
//! relative path inside the installation. A live file that is about to be
//! overwritten is first saved under `<install>/backup` (see [`BackupLocation`]).
//!
//! Replacement is best effort: a file that cannot be backed up or copied is
//! recorded in [`ReplaceReport::failures`] and the batch moves on to the next
//! file. Only failing to enumerate the payload at all is an error.
//!
//! The update descriptor (`update.json`) and archive artifacts (`.zip`, `.7z`)
//! are never deployed.

mod backup;

pub use backup::BackupLocation;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::{NON_DEPLOYABLE_EXTENSIONS, UPDATE_DESCRIPTOR};
use crate::core::ReplaceError;
use crate::utils::fs::{ensure_parent_dir, list_files, lowercase_extension};

/// A payload file that could not be deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    /// Path relative to the payload root.
    pub path: PathBuf,
    /// Error chain, outermost first.
    pub reason: String,
}

/// Outcome of a replacement batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceReport {
    /// Files found in the payload, including skipped ones.
    pub total: usize,
    /// Relative paths written to the installation.
    pub replaced: Vec<PathBuf>,
    /// Relative paths that were backed up before being overwritten.
    pub backed_up: Vec<PathBuf>,
    /// Relative paths that are never deployed.
    pub skipped: Vec<PathBuf>,
    /// Files that failed; the rest of the batch was still processed.
    pub failures: Vec<FileFailure>,
}

impl ReplaceReport {
    /// `true` when no file failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Copies an update payload over an installation, keeping backups.
#[derive(Debug, Clone, Default)]
pub struct FileReplacer;

impl FileReplacer {
    pub fn new() -> Self {
        Self
    }

    /// Whether a payload file is deployed at all.
    #[must_use]
    pub fn is_deployable(path: &Path) -> bool {
        if path.file_name().is_some_and(|name| name == UPDATE_DESCRIPTOR) {
            return false;
        }
        !lowercase_extension(path)
            .is_some_and(|ext| NON_DEPLOYABLE_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Overlay every file under `source_root` onto `destination_root`.
    ///
    /// `on_file_replaced(index, total)` fires after each file is attempted,
    /// whatever the outcome, with the zero-based index of that file, so
    /// `index / total` is the fraction of the batch done before it.
    ///
    /// # Errors
    ///
    /// [`ReplaceError::SourceUnreadable`] when `source_root` cannot be enumerated,
    /// [`ReplaceError::SameRoot`] when both roots are the same directory.
    /// Per-file failures are reported in [`ReplaceReport::failures`] instead.
    pub fn replace_all<F>(
        &self,
        source_root: &Path,
        destination_root: &Path,
        mut on_file_replaced: F,
    ) -> Result<ReplaceReport, ReplaceError>
    where
        F: FnMut(usize, usize),
    {
        if same_directory(source_root, destination_root) {
            return Err(ReplaceError::SameRoot {
                path: destination_root.to_path_buf(),
            });
        }
        let files = list_files(source_root).map_err(|e| ReplaceError::SourceUnreadable {
            path: source_root.to_path_buf(),
            reason: e.to_string(),
        })?;
        let backups = BackupLocation::for_install(destination_root);
        let mut report = ReplaceReport {
            total: files.len(),
            ..ReplaceReport::default()
        };
        info!(
            "Replacing {} files from {} into {}",
            files.len(),
            source_root.display(),
            destination_root.display()
        );

        for (index, file) in files.iter().enumerate() {
            let relative = file.strip_prefix(source_root).unwrap_or(file).to_path_buf();

            if !Self::is_deployable(&relative) {
                debug!("Skipping {}", relative.display());
                report.skipped.push(relative);
            } else {
                match replace_one(file, &relative, destination_root, &backups) {
                    Ok(backed_up) => {
                        debug!("Replaced {}", relative.display());
                        if backed_up {
                            report.backed_up.push(relative.clone());
                        }
                        report.replaced.push(relative);
                    }
                    Err(e) => {
                        warn!("Failed to replace {}: {:#}", relative.display(), e);
                        report.failures.push(FileFailure {
                            path: relative,
                            reason: format!("{e:#}"),
                        });
                    }
                }
            }

            on_file_replaced(index, files.len());
        }

        info!(
            "Replaced {} files ({} skipped, {} failed)",
            report.replaced.len(),
            report.skipped.len(),
            report.failures.len()
        );
        Ok(report)
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Back up the live file if there is one, then copy the payload file over it.
/// Returns whether a backup was taken.
fn replace_one(
    source: &Path,
    relative: &Path,
    destination_root: &Path,
    backups: &BackupLocation,
) -> Result<bool> {
    let target = destination_root.join(relative);

    let backed_up = if target.is_file() {
        backups.save(&target, relative)?;
        true
    } else {
        false
    };

    ensure_parent_dir(&target)
        .with_context(|| format!("Failed to create directory for {}", target.display()))?;
    fs::copy(source, &target)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), target.display()))?;
    Ok(backed_up)
}

#[cfg(test)]
mod tests;
