//! Full updates from every package format that can be produced in-process.

use overlay_updater::config::AgentConfig;
use overlay_updater::metadata::VersionMetadataStore;
use overlay_updater::orchestrator::{UpdateOrchestrator, UpdateStatus};
use overlay_updater::test_utils::{FakeProcess, InstallFixture, Journal, RecordingObserver};
use std::fs::{self, File};
use std::io::Write;
use std::sync::Arc;

const DESCRIPTOR: &[u8] = br#"{"Version": "2.0"}"#;

fn run(install: &InstallFixture) -> (UpdateStatus, Arc<RecordingObserver>) {
    let journal = Journal::default();
    let observer = Arc::new(RecordingObserver::new(journal.clone()));
    let report = UpdateOrchestrator::new(VersionMetadataStore::new(install.root()), &AgentConfig::default())
        .with_observer(observer.clone())
        .with_process(Arc::new(FakeProcess::stopped(journal)))
        .run();
    (report.outcome, observer)
}

fn assert_deployed(install: &InstallFixture) {
    assert_eq!(install.read_app_file("app.bin").unwrap(), b"new binary");
    assert_eq!(install.read_app_file("data/levels/1.dat").unwrap(), b"level one");
    assert_eq!(fs::read(install.backup("app.bin")).unwrap(), b"old binary");
    assert!(!install.app().join("update.json").exists());
}

fn tar_bytes() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in [
        ("app.bin", &b"new binary"[..]),
        ("data/levels/1.dat", &b"level one"[..]),
        ("update.json", DESCRIPTOR),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }
    builder.into_inner().unwrap()
}

fn installed() -> InstallFixture {
    let install = InstallFixture::new("1.0").unwrap();
    install.write_app_file("app.bin", b"old binary").unwrap();
    install
}

#[test]
fn test_update_from_tar_gz() {
    let install = installed();
    let package = install.app().join("update.tar.gz");
    let mut encoder =
        flate2::write::GzEncoder::new(File::create(&package).unwrap(), flate2::Compression::default());
    encoder.write_all(&tar_bytes()).unwrap();
    encoder.finish().unwrap();

    let (outcome, observer) = run(&install);

    assert_eq!(outcome, UpdateStatus::Completed);
    assert_deployed(&install);
    assert!(!package.exists());
    assert!(observer.status_messages().contains(&"Unpacking data/levels/1.dat".to_string()));
}

#[test]
fn test_update_from_plain_tar_with_uppercase_extension() {
    let install = installed();
    fs::write(install.app().join("UPDATE.TAR"), tar_bytes()).unwrap();

    let (outcome, _) = run(&install);

    assert_eq!(outcome, UpdateStatus::Completed);
    assert_deployed(&install);
}

#[test]
fn test_update_from_7z() {
    let install = installed();
    let staging = tempfile::TempDir::new().unwrap();
    let write = |relative: &str, data: &[u8]| {
        let path = staging.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    };
    write("app.bin", b"new binary");
    write("data/levels/1.dat", b"level one");
    write("update.json", DESCRIPTOR);
    sevenz_rust::compress_to_path(staging.path(), install.app().join("update.7z")).unwrap();

    let (outcome, _) = run(&install);

    assert_eq!(outcome, UpdateStatus::Completed);
    assert_deployed(&install);
}

#[test]
fn test_update_from_zip_with_question_marks_in_names() {
    let install = installed();
    overlay_updater::test_utils::write_zip(
        &install.app().join("update.zip"),
        &[
            ("app.bin", b"new binary"),
            ("data/levels/1.dat", b"level one"),
            ("readme?.txt", b"read me"),
            ("update.json", DESCRIPTOR),
        ],
    )
    .unwrap();

    let (outcome, _) = run(&install);

    assert_eq!(outcome, UpdateStatus::Completed);
    assert_deployed(&install);
    assert_eq!(install.read_app_file("readme.txt").unwrap(), b"read me");
}

#[test]
fn test_unsupported_package_is_ignored() {
    let install = installed();
    fs::write(install.app().join("update.cab"), b"cabinet").unwrap();

    let (outcome, _) = run(&install);

    // Not a package: nothing unpacked, so there is no update descriptor
    assert!(matches!(outcome, UpdateStatus::Failed(_)));
    assert!(install.app().join("update.cab").exists());
}
