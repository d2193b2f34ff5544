//! Documents rendered through the full pipeline.

use htmc_rt::RequestContext;
use htmcc::pipeline::{self, PipelineError};
use htmcc::{BuildError, CcDriver};
use pretty_assertions::assert_eq;

use crate::util::{require_cc, Page};

// ─── Output ───

#[test]
fn hello_world() {
    require_cc!();
    let page = Page::new("hello.htmc", "Hello <?c htmc_printf(\"world\"); ?>!");
    assert_eq!(
        page.run_debug(RequestContext::default()),
        (0, "Hello world!".to_string())
    );
}

#[test]
fn loop_repeats_markup() {
    require_cc!();
    let page = Page::new(
        "list.htmc",
        "<ul><?c for (int i = 0; i < 3; i++) { ?><li><?c htmc_printf(\"%d\", i); ?></li><?c }; ?></ul>",
    );
    assert_eq!(
        page.run_debug(RequestContext::default()),
        (0, "<ul><li>0</li><li>1</li><li>2</li></ul>".to_string())
    );
}

#[test]
fn markup_special_characters_survive() {
    require_cc!();
    let page = Page::new("escape.htmc", "<a href=\"x\">100% \\ \"quoted\"</a>\n");
    assert_eq!(
        page.run_debug(RequestContext::default()),
        (0, "<a href=\"x\">100% \\ \"quoted\"</a>\n".to_string())
    );
}

#[test]
fn mixed_conversions() {
    require_cc!();
    let page = Page::new(
        "fmt.htmc",
        "<?c htmc_printf(\"%s=%d %c %f %%\", \"n\", -7, 'z', 1.5); ?>",
    );
    assert_eq!(
        page.run_production(RequestContext::default()),
        (0, "n=-7 z 1.500000 %".to_string())
    );
}

#[test]
fn entry_status_is_returned() {
    require_cc!();
    let page = Page::new("status.htmc", "bye<?c return 3; ?>");
    assert_eq!(page.run_debug(RequestContext::default()), (3, "bye".to_string()));
}

#[test]
fn request_accessors_see_context() {
    require_cc!();
    let page = Page::new(
        "method.htmc",
        "<?c htmc_printf(\"%s %s\", htmc_request_method(), htmc_content_type()); ?>",
    );
    let context = RequestContext {
        method: Some("POST".to_string()),
        ..RequestContext::default()
    };
    assert_eq!(page.run_debug(context), (0, "POST text/plain".to_string()));
}

// ─── Allocation ───

#[test]
fn debug_arena_rejects_overflow() {
    require_cc!();
    let page = Page::new(
        "alloc.htmc",
        "<?c void *a = htmc_alloc(1000); void *b = htmc_alloc(100); \
         htmc_printf(\"%d %d\", a != 0, b != 0); ?>",
    );
    assert_eq!(page.run_debug(RequestContext::default()), (0, "1 0".to_string()));
}

#[test]
fn production_alloc_and_free() {
    require_cc!();
    let page = Page::new(
        "heap.htmc",
        "<?c char *s = htmc_alloc(4000); s[0] = 'o'; s[1] = 'k'; s[2] = 0; \
         htmc_printf(\"%s\", s); htmc_free(s); ?>",
    );
    assert_eq!(page.run_production(RequestContext::default()), (0, "ok".to_string()));
}

// ─── Failures ───

#[test]
fn c_errors_surface_as_build_failures() {
    require_cc!();
    let page = Page::new("broken.htmc", "<?c this is not C; ?>");
    let err = page.build().unwrap_err();
    match err {
        PipelineError::Build(BuildError::Failed { stderr, .. }) => assert!(!stderr.is_empty()),
        other => panic!("expected a compiler failure, got {other:?}"),
    }
}

#[test]
fn build_and_run_uses_build_dir() {
    require_cc!();
    let page = Page::new("dir.htmc", "<p>in dir</p>");
    let build = page.dir.path().join("out");
    std::fs::create_dir_all(&build).unwrap();

    let (status, backend) = pipeline::build_and_run(
        &CcDriver::from_env(),
        &page.source,
        &build,
        htmc_rt::DebugBackend::with_writer(Vec::new()),
        RequestContext::default(),
    )
    .unwrap();

    assert_eq!(status, 0);
    assert_eq!(backend.into_writer(), b"<p>in dir</p>".to_vec());
    assert!(build.join(pipeline::artifact_name(&page.source)).is_file());
}
