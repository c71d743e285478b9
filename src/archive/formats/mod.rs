//! Per-format readers.
//!
//! Each format is opened as one of two capabilities. Solid readers extract
//! everything in one forward pass; random access readers expose an entry
//! count and extract entries by index.

mod gzip;
#[cfg(feature = "rar")]
mod rar;
mod sevenz;
mod tarball;
mod zipped;

use std::path::Path;

use super::ArchiveFormat;
use super::entry::EntryWriter;
use crate::core::ExtractionError;

pub(crate) trait SolidArchive {
    fn extract_all(self: Box<Self>, writer: &mut EntryWriter<'_>) -> Result<(), ExtractionError>;
}

pub(crate) trait RandomAccessArchive {
    fn entry_count(&self) -> usize;

    fn extract_entry(
        &mut self,
        index: usize,
        writer: &mut EntryWriter<'_>,
    ) -> Result<(), ExtractionError>;
}

pub(crate) enum OpenedArchive {
    Solid(Box<dyn SolidArchive>),
    RandomAccess(Box<dyn RandomAccessArchive>),
}

pub(crate) fn open(format: ArchiveFormat, path: &Path) -> Result<OpenedArchive, ExtractionError> {
    let opened = match format {
        ArchiveFormat::Zip => OpenedArchive::RandomAccess(Box::new(zipped::ZipSource::open(path)?)),
        ArchiveFormat::Tar => OpenedArchive::Solid(Box::new(tarball::TarSource::plain(path))),
        ArchiveFormat::Gzip if is_tarball(path) => {
            OpenedArchive::Solid(Box::new(tarball::TarSource::gzipped(path)))
        }
        ArchiveFormat::Gzip => OpenedArchive::Solid(Box::new(gzip::GzipSource::new(path))),
        ArchiveFormat::SevenZip => OpenedArchive::Solid(Box::new(sevenz::SevenZipSource::new(path))),
        #[cfg(feature = "rar")]
        ArchiveFormat::Rar => OpenedArchive::Solid(Box::new(rar::RarSource::new(path))),
        #[cfg(not(feature = "rar"))]
        ArchiveFormat::Rar => {
            return Err(ExtractionError::UnsupportedFormat {
                extension: "rar".to_string(),
            });
        }
    };
    Ok(opened)
}

fn is_tarball(path: &Path) -> bool {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase().ends_with(".tar"))
        .unwrap_or(false)
}
