//! Translation errors.

use thiserror::Error;

/// A fatal translation failure.
///
/// Recoverable conditions (a `<` that does not open a code tag) never
/// surface here; the scanner re-emits those bytes as literal text.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Input ended inside a code span opened at `line:column`.
    #[error("unterminated code span opened at {line}:{column} (expected `?>` after a `;`)")]
    UnterminatedCode { line: u32, column: u32 },

    /// A `}` would close a scope the document never opened.
    #[error("unmatched `}}` at {line}:{column} closes the enclosing scope")]
    UnbalancedScope { line: u32, column: u32 },

    /// Reading the source or writing the target failed.
    #[error("I/O error during translation: {0}")]
    Io(#[from] std::io::Error),
}

impl TranslateError {
    /// Source line the error points at, if it has one.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::UnterminatedCode { line, .. } | Self::UnbalancedScope { line, .. } => Some(*line),
            Self::Io(_) => None,
        }
    }
}
