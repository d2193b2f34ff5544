//! Tag scanner: splits hybrid source into literal and code spans.
//!
//! Literal text runs until a `<` followed by `?c`. A `<` that fails the
//! two-byte sniff is ordinary text: it stays in the current literal span
//! and scanning resumes at the byte after it, so the peeked bytes are
//! scanned (and can themselves open a tag) like any other text.
//!
//! Empty literal spans are skipped, except that a document without code
//! spans always produces exactly one literal span.

use crate::collector::CodeCollector;
use crate::cursor::{Cursor, ParseCursor};
use crate::error::TranslateError;

/// Tag-open marker.
pub const TAG_OPEN: u8 = b'<';
/// Marker between `<` and the language id, and before the closing `>`.
pub const TAG_FIT: u8 = b'?';
/// Language id of C code spans.
pub const LANG_MARKER: u8 = b'c';
/// Tag-close marker.
pub const TAG_CLOSE: u8 = b'>';

/// Classification of a span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanKind {
    /// Markup, emitted as an escaped string literal.
    Literal,
    /// C code, emitted verbatim.
    Code,
}

/// A maximal run of literal or code bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    /// Raw bytes: unescaped for literals, delimiters stripped for code.
    pub bytes: Vec<u8>,
    /// Line the span starts on.
    pub line: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Scanning markup.
    Literal,
    /// `<?c` consumed; the next span is code opened at `(line, column)`.
    Code { line: u32, column: u32 },
    /// End of input reached or a fatal error was returned.
    Done,
}

/// Lazy iterator over the spans of one document.
pub struct TagScanner<'a> {
    input: Cursor<'a>,
    pos: ParseCursor,
    mode: Mode,
    spans_emitted: usize,
}

impl<'a> TagScanner<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            input: Cursor::new(source),
            pos: ParseCursor::new(),
            mode: Mode::Literal,
            spans_emitted: 0,
        }
    }

    /// Position and scope depth after the spans produced so far.
    pub fn position(&self) -> ParseCursor {
        self.pos
    }

    /// Returns `true` if the cursor sits on `<?c`.
    fn at_code_tag(&self) -> bool {
        self.input.current() == Some(TAG_OPEN)
            && self.input.peek() == Some(TAG_FIT)
            && self.input.peek2() == Some(LANG_MARKER)
    }

    /// Scan markup up to the next code tag or end of input.
    ///
    /// Returns the raw literal bytes and the line they started on. On a tag,
    /// the `<?c` is consumed and the mode switches to [`Mode::Code`].
    fn scan_literal(&mut self) -> (Vec<u8>, u32) {
        let line = self.pos.line();
        let mut text = Vec::new();

        loop {
            let run = self.input.skip_to_tag_or_newline();
            text.extend_from_slice(run);
            self.pos.advance_over(run);

            match self.input.current() {
                None => {
                    self.mode = Mode::Done;
                    break;
                }
                Some(b'\n') => {
                    text.push(b'\n');
                    self.input.advance();
                    self.pos.advance(b'\n');
                }
                Some(_) if self.at_code_tag() => {
                    let (line, column) = (self.pos.line(), self.pos.column());
                    self.input.advance_n(3);
                    self.pos.advance_over(b"<?c");
                    self.mode = Mode::Code { line, column };
                    break;
                }
                Some(b) => {
                    // Sniff failed: the `<` is text; peeked bytes are rescanned.
                    tracing::trace!(line = self.pos.line(), "`<` is not a code tag");
                    text.push(b);
                    self.input.advance();
                    self.pos.advance(b);
                }
            }
        }

        (text, line)
    }
}

impl Iterator for TagScanner<'_> {
    type Item = Result<Span, TranslateError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.mode {
                Mode::Done => return None,
                Mode::Code { line, column } => {
                    let start_line = self.pos.line();
                    let collected =
                        CodeCollector::new(&mut self.input, &mut self.pos).collect((line, column));
                    return match collected {
                        Ok(bytes) => {
                            self.mode = Mode::Literal;
                            self.spans_emitted += 1;
                            Some(Ok(Span {
                                kind: SpanKind::Code,
                                bytes,
                                line: start_line,
                            }))
                        }
                        Err(err) => {
                            self.mode = Mode::Done;
                            Some(Err(err))
                        }
                    };
                }
                Mode::Literal => {
                    let (bytes, line) = self.scan_literal();
                    let only_span = self.mode == Mode::Done && self.spans_emitted == 0;
                    if bytes.is_empty() && !only_span {
                        continue;
                    }
                    self.spans_emitted += 1;
                    return Some(Ok(Span {
                        kind: SpanKind::Literal,
                        bytes,
                        line,
                    }));
                }
            }
        }
    }
}
