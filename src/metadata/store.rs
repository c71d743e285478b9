use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use super::{AvailableUpdateInfo, InstalledVersionInfo};
use crate::constants::{INSTALLED_DESCRIPTOR, UPDATE_DESCRIPTOR};
use crate::core::MetadataError;
use crate::utils::fs::find_shortest_match;

/// A parsed descriptor together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered<T> {
    /// Full path of the descriptor file.
    pub descriptor: PathBuf,
    /// Parsed contents.
    pub info: T,
}

impl<T> Discovered<T> {
    /// Directory holding the descriptor: the app folder or the update folder.
    #[must_use]
    pub fn folder(&self) -> &Path {
        self.descriptor.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// Locates and caches the installed-version and available-update descriptors.
///
/// Both lookups walk the search root recursively and pick the match with the
/// shortest path, so a top-level install wins over nested copies (for example
/// one inside `backup/`). A found descriptor is read once and kept for the
/// lifetime of the store; later calls never touch the disk. A lookup that
/// finds nothing is not cached, which lets the update descriptor appear after
/// the package has been unpacked.
///
/// # Examples
///
/// ```rust,no_run
/// use overlay_updater::metadata::VersionMetadataStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let store = VersionMetadataStore::new(".");
/// if let Some(installed) = store.find_installed_version()? {
///     println!("App folder: {}", installed.folder().display());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct VersionMetadataStore {
    root: PathBuf,
    installed: OnceLock<Discovered<InstalledVersionInfo>>,
    available: OnceLock<Discovered<AvailableUpdateInfo>>,
}

impl VersionMetadataStore {
    /// Create a store that searches below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            installed: OnceLock::new(),
            available: OnceLock::new(),
        }
    }

    /// Directory tree searched for descriptors.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find and parse `metadata.json`.
    ///
    /// # Errors
    ///
    /// [`MetadataError::Parse`] when the closest descriptor is malformed.
    pub fn find_installed_version(
        &self,
    ) -> Result<Option<&Discovered<InstalledVersionInfo>>, MetadataError> {
        cached_or_load(&self.installed, &self.root, INSTALLED_DESCRIPTOR)
    }

    /// Find and parse `update.json`.
    ///
    /// # Errors
    ///
    /// [`MetadataError::Parse`] when the closest descriptor is malformed.
    pub fn find_available_update(
        &self,
    ) -> Result<Option<&Discovered<AvailableUpdateInfo>>, MetadataError> {
        cached_or_load(&self.available, &self.root, UPDATE_DESCRIPTOR)
    }
}

fn cached_or_load<'a, T>(
    cell: &'a OnceLock<Discovered<T>>,
    root: &Path,
    file_name: &str,
) -> Result<Option<&'a Discovered<T>>, MetadataError>
where
    T: DeserializeOwned,
{
    if let Some(cached) = cell.get() {
        return Ok(Some(cached));
    }

    let Some(descriptor) =
        find_shortest_match(root, |path| path.file_name().is_some_and(|name| name == file_name))
    else {
        debug!("No {} found under {}", file_name, root.display());
        return Ok(None);
    };

    let info = read_descriptor(&descriptor)?;
    info!("Found {} at {}", file_name, descriptor.display());

    // A concurrent caller may have won the race; either value came from the same file.
    let _ = cell.set(Discovered { descriptor, info });
    Ok(cell.get())
}

fn read_descriptor<T: DeserializeOwned>(path: &Path) -> Result<T, MetadataError> {
    let content = fs::read_to_string(path).map_err(|source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // Descriptors written by Windows tooling often start with a BOM
    let content = content.trim_start_matches('\u{feff}');
    serde_json::from_str(content).map_err(|e| MetadataError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
