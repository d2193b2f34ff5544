//! Byte cursor over the hybrid source and the position/scope tracker.
//!
//! [`Cursor`] is a plain read position over an in-memory byte slice. It is
//! [`Copy`], so the tag sniff can look ahead without committing.
//!
//! [`ParseCursor`] carries everything that outlives a single span: the
//! 1-based line and column of the next byte and the brace depth of the code
//! seen so far. It is created once per translation and passed by `&mut`.

/// Read position over the source bytes.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Byte at the current position, `None` at end of input.
    #[inline]
    pub fn current(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Byte one position ahead of current.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos + 1).copied()
    }

    /// Byte two positions ahead of current.
    #[inline]
    pub fn peek2(&self) -> Option<u8> {
        self.buf.get(self.pos + 2).copied()
    }

    /// Advance by one byte. Saturates at end of input.
    #[inline]
    pub fn advance(&mut self) {
        if self.pos < self.buf.len() {
            self.pos += 1;
        }
    }

    /// Advance by `n` bytes. Saturates at end of input.
    #[inline]
    pub fn advance_n(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.buf.len());
    }

    /// Advance to the next `<` or `\n`, returning the bytes skipped.
    ///
    /// The cursor stops *on* the found byte. If neither byte occurs, the
    /// cursor moves to end of input and the whole remainder is returned.
    pub fn skip_to_tag_or_newline(&mut self) -> &'a [u8] {
        let start = self.pos;
        let remaining = &self.buf[start..];
        let offset = memchr::memchr2(b'<', b'\n', remaining).unwrap_or(remaining.len());
        self.pos += offset;
        &self.buf[start..self.pos]
    }
}

/// Line/column position plus the running brace depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseCursor {
    line: u32,
    column: u32,
    scope_depth: i32,
}

impl Default for ParseCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseCursor {
    /// Position of the first byte of a document: line 1, column 1, depth 0.
    pub fn new() -> Self {
        Self {
            line: 1,
            column: 1,
            scope_depth: 0,
        }
    }

    /// 1-based line of the next byte.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-based column of the next byte.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Unmatched `{` count across all code spans seen so far.
    pub fn scope_depth(&self) -> i32 {
        self.scope_depth
    }

    /// Account for one consumed byte.
    #[inline]
    pub fn advance(&mut self, byte: u8) {
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Account for a run of consumed bytes.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "documents over 4 GiB are not supported; counters saturate"
    )]
    pub fn advance_over(&mut self, bytes: &[u8]) {
        match memchr::memrchr(b'\n', bytes) {
            Some(last_nl) => {
                let newlines = memchr::memchr_iter(b'\n', bytes).count() as u32;
                self.line = self.line.saturating_add(newlines);
                self.column = (bytes.len() - last_nl) as u32;
            }
            None => {
                self.column = self.column.saturating_add(bytes.len() as u32);
            }
        }
    }

    /// Record a `{`.
    pub fn open_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Record a `}`. Callers check for depth zero first.
    pub fn close_scope(&mut self) {
        self.scope_depth -= 1;
    }
}
