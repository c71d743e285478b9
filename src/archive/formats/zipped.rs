use std::fs::File;
use std::path::{Path, PathBuf};
use zip::ZipArchive;
use zip::result::ZipError;

use super::RandomAccessArchive;
use crate::archive::entry::EntryWriter;
use crate::core::ExtractionError;

pub(crate) struct ZipSource {
    path: PathBuf,
    archive: ZipArchive<File>,
}

impl ZipSource {
    pub(crate) fn open(path: &Path) -> Result<Self, ExtractionError> {
        let file = File::open(path).map_err(|e| ExtractionError::io(path, e))?;
        let archive = ZipArchive::new(file).map_err(|e| map_zip_error(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }
}

impl RandomAccessArchive for ZipSource {
    fn entry_count(&self) -> usize {
        self.archive.len()
    }

    fn extract_entry(
        &mut self,
        index: usize,
        writer: &mut EntryWriter<'_>,
    ) -> Result<(), ExtractionError> {
        let mut entry = self.archive.by_index(index).map_err(|e| map_zip_error(&self.path, e))?;
        let name = entry.name().to_string();
        if entry.is_dir() {
            writer.create_dir(&name)
        } else {
            writer.write_file(&name, &mut entry)
        }
    }
}

fn map_zip_error(path: &Path, error: ZipError) -> ExtractionError {
    match error {
        ZipError::Io(e) => ExtractionError::io(path, e),
        other => ExtractionError::archive("zip", other),
    }
}
