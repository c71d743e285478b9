use super::*;
use tempfile::TempDir;

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["overlay-updater"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_log_level_selection() {
    assert_eq!(parse(&[]).log_level(), Some("warn"));
    assert_eq!(parse(&["--verbose"]).log_level(), Some("debug"));
    assert_eq!(parse(&["-q"]).log_level(), None);
}

#[test]
fn test_verbose_and_quiet_conflict() {
    assert!(Cli::try_parse_from(["overlay-updater", "-v", "-q"]).is_err());
}

#[test]
fn test_overrides_replace_config_values() {
    let cli = parse(&[
        "--exit-delay-ms",
        "0",
        "--process-name",
        "game",
        "--executable",
        "bin/game",
        "--display-name",
        "Game",
        "--no-relaunch",
    ]);
    let mut config = AgentConfig::default();
    cli.apply_overrides(&mut config);

    assert_eq!(config.exit_delay_ms, 0);
    assert_eq!(config.target.process_name, "game");
    assert_eq!(config.target.executable, PathBuf::from("bin/game"));
    assert_eq!(config.target.display_name, "Game");
    assert!(!config.target.relaunch);
}

#[test]
fn test_no_overrides_keep_config_values() {
    let cli = parse(&[]);
    let mut config = AgentConfig::default();
    cli.apply_overrides(&mut config);
    assert_eq!(config, AgentConfig::default());
}

#[tokio::test]
async fn test_load_config_reads_root_file_then_applies_flags() {
    let temp = TempDir::new().unwrap();
    tokio::fs::write(
        temp.path().join("updater.toml"),
        "exit_delay_ms = 500\n[target]\nprocess_name = \"from-file\"\n",
    )
    .await
    .unwrap();
    let root = temp.path().to_string_lossy().to_string();
    let cli = parse(&["--root", &root, "--process-name", "from-flag"]);

    let config = cli.load_config(Path::new("/nonexistent")).await.unwrap();
    assert_eq!(config.exit_delay_ms, 500);
    assert_eq!(config.target.process_name, "from-flag");
}

#[tokio::test]
async fn test_missing_explicit_config_is_an_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing.toml").to_string_lossy().to_string();
    let cli = parse(&["--config", &missing]);

    let err = cli.load_config(temp.path()).await.unwrap_err();
    assert!(err.downcast_ref::<crate::core::ConfigError>().is_some());
}
