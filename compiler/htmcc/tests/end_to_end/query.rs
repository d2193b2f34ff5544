//! Query-string scanning through the C glue.

use htmc_rt::RequestContext;
use pretty_assertions::assert_eq;

use crate::util::{require_cc, Page};

const SCAN_X: &str = "<?c int x = 0; int r = htmc_query_scanf(\"x=%d\", &x); \
                      htmc_printf(\"%d:%d\", r, x); ?>";

fn with_query(query: &str) -> RequestContext {
    RequestContext {
        query_string: Some(query.to_string()),
        ..RequestContext::default()
    }
}

#[test]
fn scans_after_question_mark() {
    require_cc!();
    let page = Page::new("q.htmc", SCAN_X);
    assert_eq!(page.run_debug(with_query("a=1&b=2?x=5")), (0, "0:5".to_string()));
}

#[test]
fn missing_question_mark_fails() {
    require_cc!();
    let page = Page::new("q.htmc", SCAN_X);
    assert_eq!(page.run_debug(with_query("a=1&b=2")), (0, "-1:0".to_string()));
}

#[test]
fn scans_strings() {
    require_cc!();
    let page = Page::new(
        "name.htmc",
        "<?c char name[32] = {0}; if (htmc_query_scanf(\"name=%s\", name) == 0) { ?>\
         <b><?c htmc_printf(\"%s\", name); ?></b><?c }; ?>",
    );
    assert_eq!(
        page.run_debug(with_query("?name=ada")),
        (0, "<b>ada</b>".to_string())
    );
}

#[test]
fn form_scan_is_unsupported() {
    require_cc!();
    let page = Page::new(
        "form.htmc",
        "<?c int x = 0; htmc_printf(\"%d\", htmc_form_scanf(\"x=%d\", &x)); ?>",
    );
    assert_eq!(page.run_debug(with_query("?x=1")), (0, "-1".to_string()));
}
