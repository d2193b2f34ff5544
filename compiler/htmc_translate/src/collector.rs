//! Code span collector.
//!
//! Consumes the bytes of one `<?c … ?>` span after the opening tag, copying
//! them verbatim, until it reaches a `?>` at a statement boundary.
//!
//! # Close-tag Heuristic
//!
//! `?>` can occur inside ordinary C, so it only closes the span once a `;`
//! has been seen outside strings and comments. A span whose last statement
//! has no `;`, such as a bare `}`, is therefore not closed by `?>`; write
//! `};` instead. This is a known limitation of the tag syntax.
//!
//! Comments hide `"` and `;` but not braces or the close tag: a `}` in a
//! comment still counts against the scope depth, and `?>` in a comment
//! closes the span once the statement is terminated.
//!
//! # Per-byte Rules
//!
//! Applied in this order for byte `c` with previous byte `last`:
//!
//! 1. `//` outside strings/comments enters a line comment.
//! 2. `/*` outside strings/comments enters a block comment.
//! 3. LF ends strings and line comments.
//! 4. `*/` inside a block comment ends it.
//! 5. `\` inside a string starts an escape.
//! 6. `"` while escaping clears the escape; the string stays open.
//! 7. `"` outside comments toggles string mode.
//! 8. `}` outside strings at scope depth zero is fatal.
//! 9. `;` outside strings/comments marks the statement terminated.
//! 10. `?>` after a terminator, outside strings, closes.
//! 11. Anything else updates the brace depth (outside strings) and is
//!     emitted.
//!
//! A `?` is held back one byte so the `?` of the closing `?>` never reaches
//! the output.

use bitflags::bitflags;

use crate::cursor::{Cursor, ParseCursor};
use crate::error::TranslateError;
use crate::scanner::{TAG_CLOSE, TAG_FIT};

const STR_DELIM: u8 = b'"';
const ESCAPE: u8 = b'\\';
const SCOPE_OPEN: u8 = b'{';
const SCOPE_CLOSE: u8 = b'}';
const TERMINATOR: u8 = b';';
const COMMENT_SLASH: u8 = b'/';
const COMMENT_STAR: u8 = b'*';

bitflags! {
    /// Lexical context of the byte being scanned.
    ///
    /// `IN_STRING`, `IN_LINE_COMMENT`, and `IN_BLOCK_COMMENT` are mutually
    /// exclusive; `IN_ESCAPE` is only set together with `IN_STRING`.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ScanFlags: u8 {
        const IN_STRING = 1 << 0;
        const IN_ESCAPE = 1 << 1;
        const IN_LINE_COMMENT = 1 << 2;
        const IN_BLOCK_COMMENT = 1 << 3;
        /// A `;` has been seen; the next `?>` may close the span.
        const TERMINATED = 1 << 4;

        const IN_COMMENT = Self::IN_LINE_COMMENT.bits() | Self::IN_BLOCK_COMMENT.bits();
    }
}

/// Transient state for one code span.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CodeScanState {
    pub flags: ScanFlags,
    /// Previous byte, or `0` right after a comment opener/closer.
    pub last: u8,
    /// A `?` is waiting to be emitted.
    pending_fit: bool,
}

impl CodeScanState {
    pub fn in_string(&self) -> bool {
        self.flags.contains(ScanFlags::IN_STRING)
    }

    pub fn in_escape(&self) -> bool {
        self.flags.contains(ScanFlags::IN_ESCAPE)
    }

    pub fn in_comment(&self) -> bool {
        self.flags.intersects(ScanFlags::IN_COMMENT)
    }

    pub fn is_terminated(&self) -> bool {
        self.flags.contains(ScanFlags::TERMINATED)
    }
}

/// Outcome of feeding one byte to the collector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Emit,
    Close,
}

/// Collects one code span.
pub struct CodeCollector<'c, 'a> {
    input: &'c mut Cursor<'a>,
    pos: &'c mut ParseCursor,
    state: CodeScanState,
    out: Vec<u8>,
}

impl<'c, 'a> CodeCollector<'c, 'a> {
    /// Create a collector positioned just after an opening `<?c`.
    pub fn new(input: &'c mut Cursor<'a>, pos: &'c mut ParseCursor) -> Self {
        Self {
            input,
            pos,
            state: CodeScanState::default(),
            out: Vec::new(),
        }
    }

    /// Consume the span and return its code without the closing `?>`.
    ///
    /// `opened_at` is the `(line, column)` of the opening tag, reported if
    /// input runs out before the span closes.
    pub fn collect(mut self, opened_at: (u32, u32)) -> Result<Vec<u8>, TranslateError> {
        while let Some(c) = self.input.current() {
            let step = self.step(c)?;
            self.input.advance();
            self.pos.advance(c);
            match step {
                Step::Emit => self.emit(c),
                Step::Close => {
                    tracing::trace!(
                        line = self.pos.line(),
                        bytes = self.out.len(),
                        "code span closed"
                    );
                    return Ok(self.out);
                }
            }
        }

        Err(TranslateError::UnterminatedCode {
            line: opened_at.0,
            column: opened_at.1,
        })
    }

    fn emit(&mut self, c: u8) {
        if self.state.pending_fit {
            self.out.push(TAG_FIT);
            self.state.pending_fit = false;
        }
        if c == TAG_FIT {
            self.state.pending_fit = true;
        } else {
            self.out.push(c);
        }
    }

    /// Classify one byte and update the scan state.
    fn step(&mut self, c: u8) -> Result<Step, TranslateError> {
        let state = &mut self.state;
        let last = state.last;
        let in_string = state.in_string();
        let in_comment = state.in_comment();
        let escaping = state.in_escape();

        // Comment openers. `last` is cleared so `/*/` stays open.
        if !in_string && !in_comment && last == COMMENT_SLASH {
            if c == COMMENT_SLASH {
                state.flags.insert(ScanFlags::IN_LINE_COMMENT);
                state.last = 0;
                return Ok(Step::Emit);
            }
            if c == COMMENT_STAR {
                state.flags.insert(ScanFlags::IN_BLOCK_COMMENT);
                state.last = 0;
                return Ok(Step::Emit);
            }
        }

        // Strings and line comments do not span lines.
        if c == b'\n' {
            state
                .flags
                .remove(ScanFlags::IN_STRING | ScanFlags::IN_ESCAPE | ScanFlags::IN_LINE_COMMENT);
            state.last = c;
            return Ok(Step::Emit);
        }

        if state.flags.contains(ScanFlags::IN_BLOCK_COMMENT)
            && last == COMMENT_STAR
            && c == COMMENT_SLASH
        {
            state.flags.remove(ScanFlags::IN_BLOCK_COMMENT);
            state.last = 0;
            return Ok(Step::Emit);
        }

        if in_string && !escaping && c == ESCAPE {
            state.flags.insert(ScanFlags::IN_ESCAPE);
            state.last = c;
            return Ok(Step::Emit);
        }

        if in_string && escaping && c == STR_DELIM {
            state.flags.remove(ScanFlags::IN_ESCAPE);
            state.last = c;
            return Ok(Step::Emit);
        }

        if !escaping && !in_comment && c == STR_DELIM {
            state.flags.toggle(ScanFlags::IN_STRING);
            state.last = c;
            return Ok(Step::Emit);
        }

        if !in_string && c == SCOPE_CLOSE && self.pos.scope_depth() == 0 {
            return Err(TranslateError::UnbalancedScope {
                line: self.pos.line(),
                column: self.pos.column(),
            });
        }

        if !in_string && !in_comment && c == TERMINATOR {
            state.flags.insert(ScanFlags::TERMINATED);
            state.last = c;
            return Ok(Step::Emit);
        }

        if !in_string && state.is_terminated() && last == TAG_FIT && c == TAG_CLOSE {
            return Ok(Step::Close);
        }

        if !in_string {
            match c {
                SCOPE_OPEN => self.pos.open_scope(),
                SCOPE_CLOSE => self.pos.close_scope(),
                _ => {}
            }
        }
        state.flags.remove(ScanFlags::IN_ESCAPE);
        state.last = c;
        Ok(Step::Emit)
    }
}
