use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::trace;

use super::SolidArchive;
use crate::archive::entry::EntryWriter;
use crate::core::ExtractionError;

/// A tar stream, optionally wrapped in gzip.
pub(crate) struct TarSource {
    path: PathBuf,
    gzipped: bool,
}

impl TarSource {
    pub(crate) fn plain(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            gzipped: false,
        }
    }

    pub(crate) fn gzipped(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            gzipped: true,
        }
    }
}

impl SolidArchive for TarSource {
    fn extract_all(self: Box<Self>, writer: &mut EntryWriter<'_>) -> Result<(), ExtractionError> {
        let file = File::open(&self.path).map_err(|e| ExtractionError::io(&self.path, e))?;
        if self.gzipped {
            extract_entries(Archive::new(GzDecoder::new(file)), writer)
        } else {
            extract_entries(Archive::new(file), writer)
        }
    }
}

fn extract_entries<R: Read>(
    mut archive: Archive<R>,
    writer: &mut EntryWriter<'_>,
) -> Result<(), ExtractionError> {
    let entries = archive.entries().map_err(|e| ExtractionError::archive("tar", e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| ExtractionError::archive("tar", e))?;
        let name = entry
            .path()
            .map_err(|e| ExtractionError::archive("tar", e))?
            .to_string_lossy()
            .into_owned();
        let kind = entry.header().entry_type();

        if kind.is_dir() {
            writer.create_dir(&name)?;
        } else if kind.is_file() {
            writer.write_file(&name, &mut entry)?;
        } else {
            trace!("Skipping tar entry {} of type {:?}", name, kind);
        }
    }
    Ok(())
}
