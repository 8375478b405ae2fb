//! Error types for the [`restore`](super) module.

use derive_more::{Display, Error};
use shelf_archive::VersionTag;
use shelf_archive::error::ErrorKind as ArchiveErrorKind;

/// A restore error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for restore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that end a restore.
///
/// ### Before any change to the library
/// - [`ErrorKind::Archive`]
/// - [`ErrorKind::MissingVersionTag`]
/// - [`ErrorKind::InvalidVersionTag`]
/// - [`ErrorKind::IncompatibleVersion`]
///
/// ### After earlier stages were committed
/// - [`ErrorKind::Categories`]
/// - [`ErrorKind::Listing`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes are not a readable archive.
    #[display("unreadable archive")]
    Archive,
    #[display("archive has no version tag")]
    MissingVersionTag,
    #[display("invalid archive version tag: {_0}")]
    InvalidVersionTag(#[error(not(source))] String),
    #[display("archive version {found} is not compatible with {supported}")]
    IncompatibleVersion { found: VersionTag, supported: VersionTag },
    #[display("could not restore categories")]
    Categories,
    #[display("could not load extension listing")]
    Listing,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Categories | Self::Listing)
    }
}

impl From<&ArchiveErrorKind> for ErrorKind {
    fn from(kind: &ArchiveErrorKind) -> Self {
        match kind {
            ArchiveErrorKind::MissingVersionTag => Self::MissingVersionTag,
            ArchiveErrorKind::InvalidVersionTag(tag) => Self::InvalidVersionTag(tag.clone()),
            ArchiveErrorKind::IncompatibleMajorVersion { found, supported } => {
                Self::IncompatibleVersion { found: *found, supported: *supported }
            },
            _ => Self::Archive,
        }
    }
}

/// The step of a novel's reconciliation that failed.
///
/// A novel failure never ends a restore; it is recorded in the
/// [`RestoreSummary`](super::RestoreSummary) and the next novel is tried.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NovelErrorKind {
    #[display("could not look up novel")]
    Lookup,
    #[display("could not insert novel")]
    Insert,
    #[display("could not restore chapter state")]
    Chapters,
    #[display("could not restore reading history")]
    History,
    #[display("could not restore novel settings")]
    Settings,
    #[display("could not restore novel categories")]
    Categories,
    #[display("could not restore pin")]
    Pin,
}

pub type NovelError = exn::Exn<NovelErrorKind>;
pub type NovelResult<T> = std::result::Result<T, NovelError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ArchiveErrorKind::MissingVersionTag, ErrorKind::MissingVersionTag)]
    #[case(ArchiveErrorKind::InvalidVersionTag("x".to_string()), ErrorKind::InvalidVersionTag("x".to_string()))]
    #[case(ArchiveErrorKind::MalformedContainer, ErrorKind::Archive)]
    #[case(ArchiveErrorKind::Envelope, ErrorKind::Archive)]
    #[case(ArchiveErrorKind::Decompression, ErrorKind::Archive)]
    fn test_from_archive_kind(#[case] kind: ArchiveErrorKind, #[case] expected: ErrorKind) {
        assert_eq!(ErrorKind::from(&kind), expected);
    }

    #[test]
    fn test_incompatible_version_display() {
        let kind = ErrorKind::from(&ArchiveErrorKind::IncompatibleMajorVersion {
            found: VersionTag::new(2, 0, 0),
            supported: VersionTag::new(1, 2, 0),
        });
        assert_eq!(kind.to_string(), "archive version 2.0.0 is not compatible with 1.2.0");
    }
}
