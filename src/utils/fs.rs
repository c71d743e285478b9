//! File system helpers shared by the extraction, replacement and discovery code.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Create `path` and all missing parents.
///
/// Succeeds when the directory already exists. Fails when `path` exists but is
/// not a directory.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Path exists but is not a directory: {}", path.display()),
        ));
    }
    fs::create_dir_all(path)
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Find the file under `root` closest to the root that satisfies `predicate`.
///
/// "Closest" is the shortest full path measured in bytes, with a lexical
/// tie-break so the result does not depend on directory iteration order.
/// Symlinks are not followed and unreadable subdirectories are skipped.
///
/// # Examples
///
/// ```rust,no_run
/// use overlay_updater::utils::fs::find_shortest_match;
/// use std::path::Path;
///
/// let descriptor = find_shortest_match(Path::new("."), |p| {
///     p.file_name().is_some_and(|n| n == "metadata.json")
/// });
/// ```
pub fn find_shortest_match<F>(root: &Path, mut predicate: F) -> Option<PathBuf>
where
    F: FnMut(&Path) -> bool,
{
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| predicate(path))
        .min_by(|a, b| a.as_os_str().len().cmp(&b.as_os_str().len()).then_with(|| a.cmp(b)))
}

/// Collect every regular file under `root`, in walk order.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Whether `path` stays inside whatever directory it is joined onto.
///
/// Absolute paths, prefixes and any `..` component are rejected. `.` is allowed.
#[must_use]
pub fn is_contained_relative(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Lowercased extension of `path` without the dot.
#[must_use]
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
}
