use std::fs;
use std::path::{Path, PathBuf};
use unrar::Archive;

use super::SolidArchive;
use crate::archive::entry::EntryWriter;
use crate::core::ExtractionError;

pub(crate) struct RarSource {
    path: PathBuf,
}

impl RarSource {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SolidArchive for RarSource {
    fn extract_all(self: Box<Self>, writer: &mut EntryWriter<'_>) -> Result<(), ExtractionError> {
        let mut archive = Archive::new(&self.path)
            .open_for_processing()
            .map_err(|e| ExtractionError::archive("rar", e))?;

        while let Some(header) =
            archive.read_header().map_err(|e| ExtractionError::archive("rar", e))?
        {
            let name = header.entry().filename.to_string_lossy().into_owned();
            archive = if header.entry().is_directory() {
                writer.create_dir(&name)?;
                header.skip().map_err(|e| ExtractionError::archive("rar", e))?
            } else {
                // unrar streams the entry to disk itself
                let target = writer.prepare_file(&name)?;
                let next =
                    header.extract_to(&target).map_err(|e| ExtractionError::archive("rar", e))?;
                let size = fs::metadata(&target).map(|m| m.len()).unwrap_or(0);
                writer.finish_file(&name, size);
                next
            };
        }
        Ok(())
    }
}
