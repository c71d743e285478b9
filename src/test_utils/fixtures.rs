use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use crate::constants::{INSTALLED_DESCRIPTOR, UNPACKED_DIR, UPDATE_DESCRIPTOR, UPDATE_DIR};

/// A temporary search root with an installed application under `app/`.
///
/// ```text
/// <root>/
///   app/
///     metadata.json      {"Version": "<installed>"}
/// ```
pub struct InstallFixture {
    temp: TempDir,
    app: PathBuf,
}

impl InstallFixture {
    pub fn new(installed_version: &str) -> io::Result<Self> {
        let fixture = Self::empty()?;
        fs::create_dir_all(&fixture.app)?;
        fixture.write_app_file(
            INSTALLED_DESCRIPTOR,
            format!(r#"{{"Version": "{installed_version}"}}"#).as_bytes(),
        )?;
        Ok(fixture)
    }

    /// A search root with nothing in it.
    pub fn empty() -> io::Result<Self> {
        let temp = TempDir::new()?;
        let app = temp.path().join("app");
        Ok(Self { temp, app })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn app(&self) -> &Path {
        &self.app
    }

    /// `<app>/update/unpacked`
    pub fn unpacked(&self) -> PathBuf {
        self.app.join(UPDATE_DIR).join(UNPACKED_DIR)
    }

    pub fn backup(&self, relative: &str) -> PathBuf {
        self.app.join(crate::constants::BACKUP_DIR).join(relative)
    }

    /// Write a file relative to the app folder, creating parents.
    pub fn write_app_file(&self, relative: &str, content: &[u8]) -> io::Result<PathBuf> {
        write_file(&self.app.join(relative), content)
    }

    /// Write a file into the already-unpacked update folder.
    pub fn write_unpacked_file(&self, relative: &str, content: &[u8]) -> io::Result<PathBuf> {
        write_file(&self.unpacked().join(relative), content)
    }

    /// Place an unpacked update for `version` without an archive.
    pub fn stage_unpacked_update(&self, version: &str, files: &[(&str, &[u8])]) -> io::Result<()> {
        self.write_unpacked_file(UPDATE_DESCRIPTOR, update_descriptor(version).as_bytes())?;
        for (name, content) in files {
            self.write_unpacked_file(name, content)?;
        }
        Ok(())
    }

    /// Write `<app>/update.zip` containing `files` plus an `update.json` for `version`.
    pub fn write_update_zip(&self, version: &str, files: &[(&str, &[u8])]) -> io::Result<PathBuf> {
        let descriptor = update_descriptor(version);
        let mut entries: Vec<(&str, &[u8])> = files.to_vec();
        entries.push((UPDATE_DESCRIPTOR, descriptor.as_bytes()));
        let path = self.app.join("update.zip");
        write_zip(&path, &entries)?;
        Ok(path)
    }

    pub fn read_app_file(&self, relative: &str) -> io::Result<Vec<u8>> {
        fs::read(self.app.join(relative))
    }
}

fn update_descriptor(version: &str) -> String {
    format!(
        r#"{{"DownloadUrl": "https://example.invalid/update.zip", "Version": "{version}", "Released": "2024-05-01T10:00:00Z"}}"#
    )
}

fn write_file(path: &Path, content: &[u8]) -> io::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(path.to_path_buf())
}

/// Write a zip archive holding `entries`, in order.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut zip = zip::ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        zip.start_file(*name, options).map_err(io::Error::other)?;
        zip.write_all(data)?;
    }
    zip.finish().map_err(io::Error::other)?;
    Ok(())
}
