use sevenz_rust::{Password, SevenZReader};
use std::path::{Path, PathBuf};

use super::SolidArchive;
use crate::archive::entry::EntryWriter;
use crate::core::ExtractionError;

pub(crate) struct SevenZipSource {
    path: PathBuf,
}

impl SevenZipSource {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SolidArchive for SevenZipSource {
    fn extract_all(self: Box<Self>, writer: &mut EntryWriter<'_>) -> Result<(), ExtractionError> {
        let mut reader = SevenZReader::open(&self.path, Password::empty())
            .map_err(|e| ExtractionError::archive("7z", e))?;

        // The codec's callback can only return its own error type, so ours is
        // parked here and iteration is stopped.
        let mut failure = None;
        reader
            .for_each_entries(|entry, data| {
                let result = if entry.is_directory {
                    writer.create_dir(&entry.name)
                } else {
                    writer.write_file(&entry.name, data)
                };
                match result {
                    Ok(()) => Ok(true),
                    Err(e) => {
                        failure = Some(e);
                        Ok(false)
                    }
                }
            })
            .map_err(|e| ExtractionError::archive("7z", e))?;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
