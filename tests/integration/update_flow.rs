//! Multi-run behavior of the update agent through the library API.

use overlay_updater::config::AgentConfig;
use overlay_updater::metadata::VersionMetadataStore;
use overlay_updater::orchestrator::{
    FailureKind, SoftFailure, UpdateOrchestrator, UpdateReport, UpdateState, UpdateStatus,
};
use overlay_updater::test_utils::{
    FakeProcess, InstallFixture, Journal, RecordingHost, RecordingObserver, init_test_logging,
};
use std::fs;
use std::sync::Arc;

struct Run {
    report: UpdateReport,
    observer: Arc<RecordingObserver>,
    process: Arc<FakeProcess>,
    host: Arc<RecordingHost>,
}

fn run_with(install: &InstallFixture, process: FakeProcess, journal: Journal) -> Run {
    init_test_logging(None);
    let observer = Arc::new(RecordingObserver::new(journal.clone()));
    let host = Arc::new(RecordingHost::new(journal));
    let process = Arc::new(process);
    let report = UpdateOrchestrator::new(VersionMetadataStore::new(install.root()), &AgentConfig::default())
        .with_observer(observer.clone())
        .with_process(process.clone())
        .with_host(host.clone())
        .run();
    Run {
        report,
        observer,
        process,
        host,
    }
}

fn run(install: &InstallFixture) -> Run {
    let journal = Journal::default();
    run_with(install, FakeProcess::stopped(journal.clone()), journal)
}

#[test]
fn test_payload_with_new_metadata_makes_second_run_up_to_date() {
    let install = InstallFixture::new("1.0").unwrap();
    install.write_app_file("app.bin", b"v1").unwrap();
    install
        .write_update_zip("1.1", &[("app.bin", b"v1.1"), ("metadata.json", br#"{"Version": "1.1"}"#)])
        .unwrap();

    let first = run(&install);
    assert_eq!(first.report.outcome, UpdateStatus::Completed);
    assert_eq!(first.process.relaunched().len(), 1);
    assert_eq!(first.host.requests(), 1);

    let second = run(&install);
    assert_eq!(second.report.outcome, UpdateStatus::UpToDate);
    let terminal = second.observer.terminal();
    assert_eq!(terminal.old_version, "1.1");
    assert_eq!(terminal.new_version, "1.1");
    assert!(second.process.relaunched().is_empty());
    assert_eq!(second.host.requests(), 0);
}

#[test]
fn test_reapplying_an_update_backs_up_the_state_before_the_second_run() {
    let install = InstallFixture::new("1.0").unwrap();
    install.write_app_file("app.bin", b"original").unwrap();
    install.stage_unpacked_update("1.1", &[("app.bin", b"updated")]).unwrap();

    assert_eq!(run(&install).report.outcome, UpdateStatus::Completed);
    assert_eq!(fs::read(install.backup("app.bin")).unwrap(), b"original");

    // metadata.json was not part of the payload, so the versions still differ
    install.write_app_file("app.bin", b"locally modified").unwrap();
    assert_eq!(run(&install).report.outcome, UpdateStatus::Completed);

    assert_eq!(install.read_app_file("app.bin").unwrap(), b"updated");
    assert_eq!(fs::read(install.backup("app.bin")).unwrap(), b"locally modified");
}

#[test]
fn test_nested_install_is_found_below_search_root() {
    let install = InstallFixture::empty().unwrap();
    let nested = install.root().join("games/deep/app");
    fs::create_dir_all(nested.join("update/unpacked")).unwrap();
    fs::write(nested.join("metadata.json"), r#"{"Version": "3"}"#).unwrap();
    fs::write(nested.join("update/unpacked/update.json"), r#"{"Version": "4"}"#).unwrap();
    fs::write(nested.join("update/unpacked/new.bin"), b"new").unwrap();

    let result = run(&install);

    assert_eq!(result.report.outcome, UpdateStatus::Completed);
    assert_eq!(fs::read(nested.join("new.bin")).unwrap(), b"new");
    assert_eq!(
        result.process.relaunched()[0].1,
        nested,
        "relaunch runs in the app folder"
    );
}

#[test]
fn test_failure_event_is_the_only_terminal_event() {
    let install = InstallFixture::new("1.0").unwrap();
    install.write_app_file("update.zip", b"PK\x03\x04 truncated").unwrap();

    let result = run(&install);

    assert_eq!(result.report.outcome, UpdateStatus::Failed(FailureKind::Extraction));
    assert_eq!(result.report.final_state(), UpdateState::Failed);
    let terminal = result.observer.terminal();
    assert!(terminal.message.starts_with("Update failed."));
    assert_eq!(terminal.progress, 100.0);
    assert!(result.observer.statuses().iter().all(|e| !e.status.is_terminal()));
}

#[test]
fn test_unclosable_target_does_not_block_the_update() {
    let install = InstallFixture::new("1.0").unwrap();
    install.stage_unpacked_update("1.1", &[("app.bin", b"new")]).unwrap();
    let journal = Journal::default();
    let process = FakeProcess::running(journal.clone(), "app").close_outcome(
        overlay_updater::process::CloseOutcome::Failed {
            reason: "did not exit in time".to_string(),
        },
    );

    let result = run_with(&install, process, journal.clone());

    assert_eq!(result.report.outcome, UpdateStatus::Completed);
    assert!(matches!(result.report.soft_failures.as_slice(), [SoftFailure::ProcessClose { .. }]));
    assert!(journal.position("close:").unwrap() < journal.position("completed:").unwrap());
    assert_eq!(install.read_app_file("app.bin").unwrap(), b"new");
}
