use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::BACKUP_DIR;
use crate::utils::fs::ensure_parent_dir;

/// Maps live files of an installation to their backup copies.
///
/// Backups mirror the relative layout of the install under
/// `<install>/backup`, so `<install>/data/a.dat` is saved as
/// `<install>/backup/data/a.dat`. A later backup of the same file overwrites
/// the earlier one; backups are never removed.
#[derive(Debug, Clone)]
pub struct BackupLocation {
    root: PathBuf,
}

impl BackupLocation {
    /// Backups for the installation rooted at `install_root`.
    pub fn for_install(install_root: &Path) -> Self {
        Self {
            root: install_root.join(BACKUP_DIR),
        }
    }

    /// Directory all backups are written below.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backup path for a file at `relative` inside the installation.
    #[must_use]
    pub fn path_for(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Copy `live` to the backup slot for `relative`, replacing an older backup.
    ///
    /// Permissions travel with the copy.
    pub fn save(&self, live: &Path, relative: &Path) -> Result<PathBuf> {
        let backup = self.path_for(relative);
        ensure_parent_dir(&backup)
            .with_context(|| format!("Failed to create backup directory for {}", backup.display()))?;

        debug!("Backing up {} to {}", live.display(), backup.display());
        fs::copy(live, &backup)
            .with_context(|| format!("Failed to back up {} to {}", live.display(), backup.display()))?;
        Ok(backup)
    }
}
