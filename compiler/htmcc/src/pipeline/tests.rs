use std::ffi::OsString;
use std::io;
use std::path::Path;

use htmc_rt::{DebugBackend, RequestContext};
use htmc_translate::{TranslateError, HEADER};
use pretty_assertions::assert_eq;

use super::{artifact_name, build_file, compile_file, run_shared, translate_file, PipelineError};
use crate::cc::{CcConfig, CcDriver, RUNTIME_DIR_NAME};
use crate::loader::LoadError;

#[test]
fn translate_file_writes_c_source() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("page.htmc");
    let dst = dir.path().join("page.c");
    std::fs::write(&src, "<p>hi</p><?c int x = 1; ?>").unwrap();

    let stats = translate_file(&src, &dst).unwrap();
    assert_eq!(stats.code_spans, 1);

    let c = std::fs::read_to_string(&dst).unwrap();
    assert!(c.starts_with(HEADER));
    assert!(c.contains("int x = 1;"));
}

#[test]
fn failed_translation_removes_stale_output() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("page.htmc");
    let dst = dir.path().join("page.c");
    std::fs::write(&src, "<?c int x;").unwrap();
    std::fs::write(&dst, "stale").unwrap();

    let err = translate_file(&src, &dst).unwrap_err();
    assert!(matches!(err, PipelineError::Translate(TranslateError::UnterminatedCode { .. })));
    assert!(!dst.exists());
}

#[test]
fn missing_source_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("absent.htmc");
    let err = translate_file(&src, &dir.path().join("out.c")).unwrap_err();
    match err {
        PipelineError::Io { path, source } => {
            assert_eq!(path, src);
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("expected Io, got {other:?}"),
    }
}

#[test]
fn compile_requires_existing_source() {
    let dir = tempfile::tempdir().unwrap();
    let err = compile_file(
        &CcDriver::default(),
        &dir.path().join("absent.c"),
        &dir.path().join("absent.so"),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Io { .. }));
}

#[test]
fn run_shared_surfaces_load_errors() {
    let dir = tempfile::tempdir().unwrap();
    let Err(err) = run_shared(
        &dir.path().join("absent.so"),
        DebugBackend::with_writer(Vec::new()),
        RequestContext::default(),
    ) else {
        panic!("expected a load error");
    };
    assert!(matches!(err, PipelineError::Load(LoadError::NotFound { .. })));
}

#[test]
fn build_leaves_neighbouring_c_file_alone() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("page.htmc");
    let user_c = dir.path().join("page.c");
    std::fs::write(&src, "<p>hi</p>").unwrap();
    std::fs::write(&user_c, "int keep_me;\n").unwrap();

    let driver = CcDriver::new(CcConfig {
        compiler: OsString::from("htmc-no-such-compiler-0xdead"),
        ..CcConfig::default()
    });
    let err = build_file(&driver, &src, &dir.path().join("page.so")).unwrap_err();

    assert!(matches!(err, PipelineError::Build(_)));
    assert_eq!(std::fs::read_to_string(&user_c).unwrap(), "int keep_me;\n");
    let translated = std::fs::read_to_string(dir.path().join(RUNTIME_DIR_NAME).join("page.c")).unwrap();
    assert!(translated.starts_with(HEADER));
}

#[test]
fn artifact_names_flatten_paths() {
    assert_eq!(artifact_name(Path::new("index.htmc")), "index.htmc.so");
    assert_eq!(artifact_name(Path::new("pages/index.htmc")), "pages_index.htmc.so");
    assert_eq!(artifact_name(Path::new("/srv/www/a.htmc")), "_srv_www_a.htmc.so");
}

#[test]
fn missing_input_message() {
    assert_eq!(
        PipelineError::MissingInput.to_string(),
        "input file required but not provided"
    );
}
