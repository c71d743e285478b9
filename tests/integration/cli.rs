//! Tests for the `overlay-updater` binary.

use assert_cmd::Command;
use overlay_updater::test_utils::InstallFixture;
use predicates::prelude::*;

fn updater(root: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("overlay-updater").unwrap();
    cmd.current_dir(root)
        .env_remove("OVERLAY_UPDATER_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--root")
        .arg(root)
        .args(["--no-progress", "--exit-delay-ms", "0"]);
    cmd
}

#[test]
fn test_empty_root_reports_missing_app_folder() {
    let install = InstallFixture::empty().unwrap();

    updater(install.root())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("App folder not found"))
        .stdout(predicate::str::contains("Looking for app folder..."));
}

#[test]
fn test_same_version_exits_successfully() {
    let install = InstallFixture::new("1.0").unwrap();
    install.stage_unpacked_update("1.0", &[("app.bin", b"new")]).unwrap();

    updater(install.root())
        .args(["--display-name", "Game"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Game is already up to date"));
    assert!(!install.backup("app.bin").exists());
}

#[test]
fn test_update_without_relaunch() {
    let install = InstallFixture::new("1.0").unwrap();
    install.write_app_file("app.bin", b"old").unwrap();
    install.write_update_zip("1.1", &[("app.bin", b"new")]).unwrap();

    updater(install.root())
        .args(["--display-name", "Game", "--process-name", "no-such-process-5b7f", "--no-relaunch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unpacking app.bin"))
        .stdout(predicate::str::contains("Update complete! Starting Game"));

    assert_eq!(install.read_app_file("app.bin").unwrap(), b"new");
    assert_eq!(std::fs::read(install.backup("app.bin")).unwrap(), b"old");
}

#[test]
fn test_missing_update_exits_with_failure() {
    let install = InstallFixture::new("1.0").unwrap();

    updater(install.root())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No update has been downloaded"));
}

#[test]
fn test_settings_come_from_config_file() {
    let install = InstallFixture::new("1.0").unwrap();
    install.stage_unpacked_update("1.0", &[]).unwrap();
    std::fs::write(
        install.root().join("updater.toml"),
        "[target]\ndisplay_name = \"Configured App\"\n",
    )
    .unwrap();

    updater(install.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configured App is already up to date"));
}

#[test]
fn test_broken_config_is_reported() {
    let install = InstallFixture::new("1.0").unwrap();
    let config = install.root().join("broken.toml");
    std::fs::write(&config, "exit_delay_ms = [").unwrap();

    updater(install.root())
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"))
        .stderr(predicate::str::contains("suggestion"));
}

#[test]
fn test_help() {
    Command::cargo_bin("overlay-updater")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--exit-delay-ms"));
}
