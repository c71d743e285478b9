use super::*;
use tempfile::TempDir;

fn write(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

struct Layout {
    _temp: TempDir,
    app: PathBuf,
    payload: PathBuf,
}

fn layout() -> Layout {
    let temp = TempDir::new().unwrap();
    let app = temp.path().join("app");
    let payload = app.join("update/unpacked");
    fs::create_dir_all(&payload).unwrap();
    Layout {
        _temp: temp,
        app,
        payload,
    }
}

#[test]
fn test_deployable_rules() {
    assert!(!FileReplacer::is_deployable(Path::new("update.json")));
    assert!(!FileReplacer::is_deployable(Path::new("nested/update.json")));
    assert!(!FileReplacer::is_deployable(Path::new("update.ZIP")));
    assert!(!FileReplacer::is_deployable(Path::new("extra/pack.7z")));
    assert!(FileReplacer::is_deployable(Path::new("app.bin")));
    assert!(FileReplacer::is_deployable(Path::new("metadata.json")));
}

#[test]
fn test_replace_backs_up_and_overwrites() {
    let l = layout();
    write(&l.app.join("app.bin"), b"old");
    write(&l.payload.join("app.bin"), b"new");
    write(&l.payload.join("data/new.dat"), b"fresh");
    write(&l.payload.join("update.json"), b"{}");

    let mut calls = Vec::new();
    let report = FileReplacer::new()
        .replace_all(&l.payload, &l.app, |i, total| calls.push((i, total)))
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.total, 3);
    assert_eq!(report.replaced.len(), 2);
    assert_eq!(report.skipped, vec![PathBuf::from("update.json")]);
    assert_eq!(report.backed_up, vec![PathBuf::from("app.bin")]);

    assert_eq!(fs::read(l.app.join("app.bin")).unwrap(), b"new");
    assert_eq!(fs::read(l.app.join("backup/app.bin")).unwrap(), b"old");
    assert_eq!(fs::read(l.app.join("data/new.dat")).unwrap(), b"fresh");
    assert!(!l.app.join("update.json").exists());
    assert!(!l.app.join("backup/data/new.dat").exists());

    assert_eq!(calls, vec![(0, 3), (1, 3), (2, 3)]);
}

#[test]
fn test_second_run_is_idempotent_and_backs_up_current_state() {
    let l = layout();
    write(&l.app.join("app.bin"), b"v1");
    write(&l.payload.join("app.bin"), b"v2");

    let replacer = FileReplacer::new();
    replacer.replace_all(&l.payload, &l.app, |_, _| {}).unwrap();
    assert_eq!(fs::read(l.app.join("backup/app.bin")).unwrap(), b"v1");

    replacer.replace_all(&l.payload, &l.app, |_, _| {}).unwrap();
    assert_eq!(fs::read(l.app.join("app.bin")).unwrap(), b"v2");
    // The backup reflects the tree just before the second overwrite
    assert_eq!(fs::read(l.app.join("backup/app.bin")).unwrap(), b"v2");
}

#[test]
fn test_failure_does_not_abort_batch() {
    let l = layout();
    write(&l.payload.join("a.bin"), b"a");
    write(&l.payload.join("blocked/file.bin"), b"b");
    write(&l.payload.join("z.bin"), b"z");
    // A regular file where a directory is needed makes one copy fail
    write(&l.app.join("blocked"), b"i am a file");

    let mut calls = 0;
    let report = FileReplacer::new().replace_all(&l.payload, &l.app, |_, _| calls += 1).unwrap();

    assert_eq!(calls, 3);
    assert!(!report.is_complete());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, PathBuf::from("blocked/file.bin"));
    assert_eq!(fs::read(l.app.join("a.bin")).unwrap(), b"a");
    assert_eq!(fs::read(l.app.join("z.bin")).unwrap(), b"z");
}

#[test]
fn test_missing_source_root_is_an_error() {
    let l = layout();
    let result = FileReplacer::new().replace_all(&l.app.join("nope"), &l.app, |_, _| {});
    assert!(matches!(result, Err(ReplaceError::SourceUnreadable { .. })));
}

#[test]
fn test_payload_equal_to_install_is_rejected() {
    let l = layout();
    write(&l.app.join("app.bin"), b"live");

    let err = FileReplacer::new().replace_all(&l.app, &l.app, |_, _| {}).unwrap_err();
    assert!(matches!(err, ReplaceError::SameRoot { .. }));
    assert_eq!(fs::read(l.app.join("app.bin")).unwrap(), b"live");
}
