use super::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn build_zip(path: &Path, entries: &[(&str, &[u8])], dirs: &[&str]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for dir in dirs {
        zip.add_directory(*dir, options).unwrap();
    }
    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

fn tar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

fn gzip(bytes: &[u8], path: &Path) {
    let mut encoder =
        flate2::write::GzEncoder::new(File::create(path).unwrap(), flate2::Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap();
}

fn extract(source: &Path, dest: &Path) -> (Result<ExtractionSummary, ExtractionError>, Vec<String>) {
    let mut seen = Vec::new();
    let result = ArchiveExtractor::new().extract(source, dest, |name| seen.push(name.to_string()));
    (result, seen)
}

#[test]
fn test_format_dispatch_is_case_insensitive() {
    assert_eq!(ArchiveFormat::from_path(Path::new("update.ZIP")).unwrap(), ArchiveFormat::Zip);
    assert_eq!(ArchiveFormat::from_path(Path::new("u.GzIp")).unwrap(), ArchiveFormat::Gzip);
    assert_eq!(ArchiveFormat::from_path(Path::new("u.7z")).unwrap(), ArchiveFormat::SevenZip);
    assert_eq!(ArchiveFormat::from_path(Path::new("u.Rar")).unwrap(), ArchiveFormat::Rar);
    assert_eq!(ArchiveFormat::from_path(Path::new("u.tar")).unwrap(), ArchiveFormat::Tar);
    assert_eq!(ArchiveFormat::Zip.strategy(), ExtractionStrategy::RandomAccess);
    assert_eq!(ArchiveFormat::Tar.strategy(), ExtractionStrategy::Solid);
}

#[test]
fn test_unsupported_extension_is_fatal() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("update.cab");
    fs::write(&source, b"whatever").unwrap();

    let (result, seen) = extract(&source, &temp.path().join("out"));
    match result {
        Err(ExtractionError::UnsupportedFormat { extension }) => assert_eq!(extension, "cab"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(seen.is_empty());
    assert!(!ArchiveFormat::is_supported(Path::new("update")));
}

#[test]
fn test_zip_recreates_directory_structure() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("update.zip");
    build_zip(
        &source,
        &[("app.bin", b"binary"), ("data/levels/one.dat", b"level one"), ("update.json", b"{}")],
        &["empty/"],
    );

    let dest = temp.path().join("out");
    let (result, seen) = extract(&source, &dest);
    let summary = result.unwrap();

    assert_eq!(summary.format, ArchiveFormat::Zip);
    assert_eq!(summary.entries, 3);
    assert_eq!(fs::read(dest.join("app.bin")).unwrap(), b"binary");
    assert_eq!(fs::read(dest.join("data/levels/one.dat")).unwrap(), b"level one");
    assert!(dest.join("empty").is_dir());
    assert_eq!(seen.len(), 3);
    assert!(seen.contains(&"data/levels/one.dat".to_string()));
}

#[test]
fn test_question_mark_stripped_extension_kept() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("update.zip");
    build_zip(&source, &[("docs/read?me.txt", b"hello")], &[]);

    let dest = temp.path().join("out");
    let (result, seen) = extract(&source, &dest);
    result.unwrap();

    let written = dest.join("docs/readme.txt");
    assert_eq!(fs::read(&written).unwrap(), b"hello");
    assert_eq!(written.extension().unwrap(), "txt");
    assert_eq!(seen, vec!["docs/read?me.txt".to_string()]);
}

#[test]
fn test_zip_slip_is_rejected() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("update.zip");
    build_zip(&source, &[("../escaped.txt", b"nope")], &[]);

    let dest = temp.path().join("out");
    let (result, _) = extract(&source, &dest);
    assert!(matches!(result, Err(ExtractionError::UnsafeEntryPath { .. })));
    assert!(!temp.path().join("escaped.txt").exists());
}

#[test]
fn test_corrupt_zip_aborts() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("update.zip");
    fs::write(&source, b"this is not a zip file").unwrap();

    let (result, seen) = extract(&source, &temp.path().join("out"));
    assert!(matches!(result, Err(ExtractionError::Archive { format: "zip", .. })));
    assert!(seen.is_empty());
}

#[test]
fn test_tar_extracts_sequentially() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("update.tar");
    fs::write(&source, tar_bytes(&[("bin/app.bin", b"tar binary"), ("lib/a.so", b"so")])).unwrap();

    let dest = temp.path().join("out");
    let (result, seen) = extract(&source, &dest);
    assert_eq!(result.unwrap().entries, 2);
    assert_eq!(fs::read(dest.join("bin/app.bin")).unwrap(), b"tar binary");
    assert_eq!(fs::read(dest.join("lib/a.so")).unwrap(), b"so");
    assert_eq!(seen, vec!["bin/app.bin".to_string(), "lib/a.so".to_string()]);
}

#[test]
fn test_tar_gz_is_read_as_tarball() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("update.tar.gz");
    gzip(&tar_bytes(&[("x/y.txt", b"inner")]), &source);

    let dest = temp.path().join("out");
    let (result, _) = extract(&source, &dest);
    assert_eq!(result.unwrap().format, ArchiveFormat::Gzip);
    assert_eq!(fs::read(dest.join("x/y.txt")).unwrap(), b"inner");
}

#[test]
fn test_plain_gzip_uses_archive_stem() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("payload.bin.gz");
    gzip(b"raw bytes", &source);

    let dest = temp.path().join("out");
    let (result, seen) = extract(&source, &dest);
    assert_eq!(result.unwrap().entries, 1);
    assert_eq!(fs::read(dest.join("payload.bin")).unwrap(), b"raw bytes");
    assert_eq!(seen, vec!["payload.bin".to_string()]);
}

#[test]
fn test_large_entry_is_streamed() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("big.zip");
    let data: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    build_zip(&source, &[("big.bin", &data)], &[]);

    let dest = temp.path().join("out");
    let (result, _) = extract(&source, &dest);
    assert_eq!(result.unwrap().bytes, data.len() as u64);
    assert_eq!(fs::read(dest.join("big.bin")).unwrap(), data);
}

#[test]
fn test_seven_zip_round_trip() {
    let temp = TempDir::new().unwrap();
    let staged = temp.path().join("staged");
    fs::create_dir_all(staged.join("data/deep")).unwrap();
    fs::write(staged.join("app.bin"), b"seven").unwrap();
    fs::write(staged.join("data/cfg.ini"), b"k=v").unwrap();
    fs::write(staged.join("data/deep/empty.dat"), b"").unwrap();

    let source = temp.path().join("update.7z");
    sevenz_rust::compress_to_path(&staged, &source).unwrap();

    let dest = temp.path().join("out");
    let (result, mut seen) = extract(&source, &dest);
    let summary = result.unwrap();
    assert_eq!(summary.format, ArchiveFormat::SevenZip);
    assert_eq!(summary.entries, 3);

    seen.sort();
    assert_eq!(seen, vec!["app.bin", "data/cfg.ini", "data/deep/empty.dat"]);
    assert_eq!(fs::read(dest.join("app.bin")).unwrap(), b"seven");
    assert_eq!(fs::read(dest.join("data/cfg.ini")).unwrap(), b"k=v");
    assert_eq!(fs::read(dest.join("data/deep/empty.dat")).unwrap(), b"");

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&dest)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(&dest).unwrap().to_path_buf())
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec![
            PathBuf::from("app.bin"),
            PathBuf::from("data/cfg.ini"),
            PathBuf::from("data/deep/empty.dat"),
        ]
    );
}
