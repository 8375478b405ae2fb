//! Error types for the [`export`](super) module.

use derive_more::{Display, Error};

/// An export error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The stage of an export that failed.
///
/// Only these are fatal. Lookups that can degrade (chapter history,
/// installed extensions, categories) are logged and skipped instead.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("could not load bookmarked novels")]
    Novels,
    /// Chapters, settings, category links or the pin of a novel could not
    /// be read.
    #[display("could not read state of novel {_0}")]
    NovelState(#[error(not(source))] String),
    #[display("could not load repositories")]
    Repositories,
    #[display("could not encode archive")]
    Encode,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Encode)
    }
}
