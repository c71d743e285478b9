use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::SolidArchive;
use crate::archive::entry::EntryWriter;
use crate::core::ExtractionError;

/// A bare gzip stream holding exactly one entry.
pub(crate) struct GzipSource {
    path: PathBuf,
}

impl GzipSource {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn fallback_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unpacked".to_string())
    }
}

impl SolidArchive for GzipSource {
    fn extract_all(self: Box<Self>, writer: &mut EntryWriter<'_>) -> Result<(), ExtractionError> {
        let file = File::open(&self.path).map_err(|e| ExtractionError::io(&self.path, e))?;
        let mut decoder = GzDecoder::new(file);

        // Only the final component of the recorded name is trusted
        let name = decoder
            .header()
            .and_then(|header| header.filename())
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .and_then(|raw| {
                Path::new(&raw.replace('\\', "/"))
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| self.fallback_name());

        writer.write_file(&name, &mut decoder)
    }
}
