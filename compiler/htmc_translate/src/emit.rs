//! C emitter: fixed boilerplate, literal-output calls, literal escaping.
//!
//! Every translated document has the same shape:
//!
//! ```text
//! #include "libhtmc/libhtmc.h"
//!
//! int htmc_main(htmc_handover_t *handover) {
//! htmc_bind(handover);
//! htmc_puts("<escaped literal>");
//! <code span, verbatim>
//! ...
//! return 0;
//! }
//! ```
//!
//! `htmc_puts` routes the literal through the handover's formatted-output
//! slot with a fixed `%s` format, so `%` in markup is never a conversion.

macro_rules! entry_symbol {
    () => {
        "htmc_main"
    };
}

/// Entry symbol every artifact exports. Part of the loader ABI.
pub const ENTRY_SYMBOL: &str = entry_symbol!();

/// Translation-unit prologue.
pub const HEADER: &str = concat!(
    "#include \"libhtmc/libhtmc.h\"\n\n",
    "int ",
    entry_symbol!(),
    "(htmc_handover_t *handover) {\n",
    "htmc_bind(handover);\n",
);

/// Translation-unit epilogue.
pub const FOOTER: &str = "return 0;\n}\n";

/// Opening bracket of a literal-output call.
pub const LITERAL_BEGIN: &str = "htmc_puts(\"";

/// Closing bracket of a literal-output call.
pub const LITERAL_END: &str = "\");\n";

/// Spaces substituted for a tab inside literal text.
const TAB_EXPANSION: &[u8] = b"    ";

/// Append `byte` to `out` as C string-literal content.
///
/// | input | output |
/// |---|---|
/// | `"` | `\"` |
/// | `\` | `\\` |
/// | LF | `\n` |
/// | CR | `\r` |
/// | TAB | four spaces |
/// | other `< 0x20` | dropped |
/// | anything else | unchanged |
#[inline]
fn escape_byte(out: &mut Vec<u8>, byte: u8) {
    match byte {
        b'"' => out.extend_from_slice(b"\\\""),
        b'\\' => out.extend_from_slice(b"\\\\"),
        b'\n' => out.extend_from_slice(b"\\n"),
        b'\r' => out.extend_from_slice(b"\\r"),
        b'\t' => out.extend_from_slice(TAB_EXPANSION),
        0..=0x1F => {}
        _ => out.push(byte),
    }
}

/// Append a whole literal run to `out`, escaped.
pub(crate) fn escape_into(out: &mut Vec<u8>, bytes: &[u8]) {
    out.reserve(bytes.len());
    for &b in bytes {
        escape_byte(out, b);
    }
}

/// Accumulates the translated C source.
#[derive(Debug, Default)]
pub struct Emitter {
    out: Vec<u8>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the fixed prologue.
    pub fn header(&mut self) {
        self.out.extend_from_slice(HEADER.as_bytes());
    }

    /// Emit the fixed epilogue.
    pub fn footer(&mut self) {
        self.out.extend_from_slice(FOOTER.as_bytes());
    }

    /// Emit one literal-output call wrapping the escaped `bytes`.
    pub fn literal(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(LITERAL_BEGIN.as_bytes());
        escape_into(&mut self.out, bytes);
        self.out.extend_from_slice(LITERAL_END.as_bytes());
    }

    /// Emit a code span verbatim, followed by a line break.
    pub fn code(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
        self.out.push(b'\n');
    }

    /// Bytes emitted so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}
