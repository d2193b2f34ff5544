//! htmc source-to-source translator.
//!
//! Converts hybrid htmc documents (literal markup with embedded `<?c … ?>`
//! code spans) into a single C translation unit that the toolchain driver
//! compiles into a loadable artifact.
//!
//! # Architecture
//!
//! ```text
//! hybrid bytes
//!     │
//!     ▼
//! TagScanner ──► Span::Literal ──► Emitter::literal (escaped)
//!     │
//!     └──► CodeCollector ──► Span::Code ──► Emitter::code (verbatim)
//! ```
//!
//! The scanner is a lazy iterator over [`Span`]s. All scan state lives in a
//! per-translation [`ParseCursor`]; nothing is global, so independent
//! translations never alias each other.
//!
//! # Failure Contract
//!
//! [`translate`] buffers the complete output before writing it. When
//! translation fails nothing is written to the destination; callers must
//! still treat the operation as failed and discard any stale output file.

mod collector;
mod cursor;
mod emit;
mod error;
mod scanner;
mod translate;

pub use collector::{CodeCollector, CodeScanState, ScanFlags};
pub use cursor::{Cursor, ParseCursor};
pub use emit::{Emitter, ENTRY_SYMBOL, FOOTER, HEADER, LITERAL_BEGIN, LITERAL_END};
pub use error::TranslateError;
pub use scanner::{Span, SpanKind, TagScanner, LANG_MARKER, TAG_CLOSE, TAG_FIT, TAG_OPEN};
pub use translate::{translate, translate_bytes, TranslateStats};
