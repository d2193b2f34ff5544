//! Whole-document translation.

use std::io::{Read, Write};

use crate::emit::Emitter;
use crate::error::TranslateError;
use crate::scanner::{SpanKind, TagScanner};

/// Summary of one successful translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TranslateStats {
    pub literal_spans: usize,
    pub code_spans: usize,
    /// Lines in the source document.
    pub lines: u32,
}

/// Translate a complete hybrid document held in memory.
pub fn translate_bytes(source: &[u8]) -> Result<Vec<u8>, TranslateError> {
    translate_to_vec(source).map(|(out, _)| out)
}

/// Read a hybrid document from `src` and write the C translation to `dst`.
///
/// Output is buffered; `dst` receives nothing unless translation succeeds.
pub fn translate<R: Read, W: Write>(
    mut src: R,
    mut dst: W,
) -> Result<TranslateStats, TranslateError> {
    let mut source = Vec::new();
    src.read_to_end(&mut source)?;

    let (out, stats) = translate_to_vec(&source)?;
    dst.write_all(&out)?;
    dst.flush()?;
    Ok(stats)
}

#[tracing::instrument(level = "debug", skip_all, fields(bytes = source.len()))]
fn translate_to_vec(source: &[u8]) -> Result<(Vec<u8>, TranslateStats), TranslateError> {
    let mut emitter = Emitter::new();
    let mut stats = TranslateStats::default();
    let mut scanner = TagScanner::new(source);

    emitter.header();
    for span in scanner.by_ref() {
        let span = span?;
        match span.kind {
            SpanKind::Literal => {
                stats.literal_spans += 1;
                emitter.literal(&span.bytes);
            }
            SpanKind::Code => {
                stats.code_spans += 1;
                emitter.code(&span.bytes);
            }
        }
    }
    emitter.footer();

    let end = scanner.position();
    if end.scope_depth() != 0 {
        tracing::warn!(
            depth = end.scope_depth(),
            "document ends with unclosed `{{` scopes"
        );
    }
    stats.lines = end.line();

    tracing::debug!(
        literal_spans = stats.literal_spans,
        code_spans = stats.code_spans,
        lines = stats.lines,
        "translated"
    );
    Ok((emitter.into_bytes(), stats))
}
