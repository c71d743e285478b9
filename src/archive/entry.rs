use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::trace;

use crate::core::ExtractionError;
use crate::utils::fs::{ensure_dir, ensure_parent_dir, is_contained_relative};

/// Turn an archive entry name into a relative output path.
///
/// Every `?` is removed (some packers emit it for unencodable characters) and
/// Windows separators become `/`. Removing `?` never touches the extension
/// separator, so `data/file?.txt` becomes `data/file.txt`.
#[must_use]
pub fn sanitize_entry_name(name: &str) -> PathBuf {
    let cleaned: String =
        name.chars().filter(|c| *c != '?').map(|c| if c == '\\' { '/' } else { c }).collect();
    PathBuf::from(cleaned)
}

/// Writes entries below the destination and reports each one.
///
/// Shared by every format so path handling, chunked copying and the
/// completion callback behave identically.
pub(crate) struct EntryWriter<'a> {
    source: &'a Path,
    destination: &'a Path,
    buffer: Vec<u8>,
    on_entry: &'a mut dyn FnMut(&str),
    entries: usize,
    bytes: u64,
}

impl<'a> EntryWriter<'a> {
    pub(crate) fn new(
        source: &'a Path,
        destination: &'a Path,
        chunk_size: usize,
        on_entry: &'a mut dyn FnMut(&str),
    ) -> Self {
        Self {
            source,
            destination,
            buffer: vec![0; chunk_size.max(1)],
            on_entry,
            entries: 0,
            bytes: 0,
        }
    }

    pub(crate) fn entries(&self) -> usize {
        self.entries
    }

    pub(crate) fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Destination path for `entry_name`, rejecting names that escape the destination.
    pub(crate) fn target_for(&self, entry_name: &str) -> Result<PathBuf, ExtractionError> {
        let relative = sanitize_entry_name(entry_name);
        if relative.as_os_str().is_empty() || !is_contained_relative(&relative) {
            return Err(ExtractionError::UnsafeEntryPath {
                entry: entry_name.to_string(),
            });
        }
        Ok(self.destination.join(relative))
    }

    pub(crate) fn create_dir(&mut self, entry_name: &str) -> Result<(), ExtractionError> {
        // Some packers store the archive root itself as a directory entry
        let relative = sanitize_entry_name(entry_name);
        if relative.components().all(|c| c == Component::CurDir) {
            trace!("Skipping root directory entry '{}'", entry_name);
            return Ok(());
        }
        let target = self.target_for(entry_name)?;
        trace!("Creating directory {}", target.display());
        ensure_dir(&target).map_err(|e| ExtractionError::io(&target, e))
    }

    /// Create the parent directories of a file entry and return its path.
    ///
    /// For codecs that write the file themselves; call [`finish_file`](Self::finish_file) afterwards.
    pub(crate) fn prepare_file(&mut self, entry_name: &str) -> Result<PathBuf, ExtractionError> {
        let target = self.target_for(entry_name)?;
        ensure_parent_dir(&target).map_err(|e| ExtractionError::io(&target, e))?;
        Ok(target)
    }

    pub(crate) fn finish_file(&mut self, entry_name: &str, bytes: u64) {
        self.entries += 1;
        self.bytes += bytes;
        trace!("Extracted {} ({} bytes)", entry_name, bytes);
        (self.on_entry)(entry_name);
    }

    /// Stream `reader` into the file for `entry_name`, one chunk at a time.
    pub(crate) fn write_file(
        &mut self,
        entry_name: &str,
        reader: &mut dyn Read,
    ) -> Result<(), ExtractionError> {
        let target = self.prepare_file(entry_name)?;
        let mut file = File::create(&target).map_err(|e| ExtractionError::io(&target, e))?;

        let mut written = 0u64;
        loop {
            let read = match reader.read(&mut self.buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ExtractionError::io(self.source, e)),
            };
            file.write_all(&self.buffer[..read]).map_err(|e| ExtractionError::io(&target, e))?;
            written += read as u64;
        }
        file.flush().map_err(|e| ExtractionError::io(&target, e))?;

        self.finish_file(entry_name, written);
        Ok(())
    }
}
