//! Agreement between the translator's output and the runtime it links to.

use pretty_assertions::assert_eq;

#[test]
fn entry_symbols_match() {
    assert_eq!(htmc_translate::ENTRY_SYMBOL, htmc_rt::ENTRY_SYMBOL);
}

#[test]
fn translated_header_includes_the_glue_header() {
    let include = htmc_rt::glue::HEADER_PATH
        .strip_prefix(htmc_rt::glue::INCLUDE_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap();
    assert!(htmc_translate::HEADER.contains(&format!("#include \"{include}\"")));
}

#[test]
fn glue_declares_the_entry_point() {
    let decl = format!("int {}(htmc_handover_t *handover);", htmc_rt::ENTRY_SYMBOL);
    assert!(htmc_rt::glue::LIBHTMC_H.contains(&decl));
    assert!(htmc_translate::HEADER.contains(&format!("int {}(", htmc_translate::ENTRY_SYMBOL)));
}
