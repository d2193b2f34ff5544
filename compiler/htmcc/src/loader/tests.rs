use htmc_rt::{CapabilityTable, DebugBackend, RequestContext};

use super::{run_artifact, Artifact, LoadError};

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.so");
    let err = Artifact::load(&path).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { path: ref p } if *p == path));
}

#[test]
fn directory_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = Artifact::load(dir.path()).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
}

#[test]
fn non_object_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.so");
    std::fs::write(&path, "<html>not an object</html>").unwrap();

    let err = Artifact::load(&path).unwrap_err();
    match err {
        LoadError::Open { path: p, reason } => {
            assert_eq!(p, path);
            assert!(!reason.is_empty());
        }
        other => panic!("expected Open, got {other:?}"),
    }
}

#[test]
fn run_artifact_reports_load_errors_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let mut table = CapabilityTable::new(DebugBackend::with_writer(Vec::new()), RequestContext::default());
    let err = run_artifact(dir.path().join("absent.so"), &mut *table).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
    assert!(table.backend().writer().is_empty());
}

#[test]
fn error_messages_name_the_artifact() {
    let err = LoadError::MissingEntry {
        path: "/srv/page.so".into(),
        symbol: "htmc_main".to_string(),
    };
    assert_eq!(err.to_string(), "artifact '/srv/page.so' does not export `htmc_main`");
}
