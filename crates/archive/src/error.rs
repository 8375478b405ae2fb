//! Archive Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use crate::version::VersionTag;
use derive_more::{Display, Error};

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// None of them are worth retrying with the same input.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The header or the structured payload could not be read.
    #[display("malformed archive container")]
    MalformedContainer,
    /// The payload is not a valid stream for its compression format.
    #[display("archive payload could not be decompressed")]
    Decompression,
    /// The header was readable but carries no version tag.
    #[display("archive has no version tag")]
    MissingVersionTag,
    /// The version tag is not a dotted numeric string.
    #[display("invalid version tag: {_0}")]
    InvalidVersionTag(#[error(not(source))] String),
    /// The archive was written by an incompatible major version.
    #[display("incompatible archive version {found}, expected {supported}")]
    IncompatibleMajorVersion { found: VersionTag, supported: VersionTag },
    /// Failed to initialize an encoder/decoder for the compression format.
    Encoder,
    /// Writing the archive failed (serialization or compression).
    #[display("failed to encode archive")]
    Encoding,
    /// The text envelope around the archive could not be removed.
    #[display("invalid text envelope")]
    Envelope,
    /// The requested format is not supported.
    #[display("unsupported format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The requested format is supported but not enabled.
    #[display("disabled format: {_0}")]
    DisabledFormat(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Returns `true` if the bytes can never be restored, whatever the
    /// configuration.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::MalformedContainer | Self::Decompression | Self::Envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exn::ResultExt;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::MalformedContainer.to_string(), "malformed archive container");
        assert_eq!(ErrorKind::InvalidVersionTag("one".to_string()).to_string(), "invalid version tag: one");
        assert_eq!(
            ErrorKind::IncompatibleMajorVersion {
                found: VersionTag::new(2, 0, 0),
                supported: VersionTag::new(1, 2, 0),
            }
            .to_string(),
            "incompatible archive version 2.0.0, expected 1.2.0"
        );
    }

    #[test]
    fn error_kind_corrupt() {
        assert!(ErrorKind::Decompression.is_corrupt());
        assert!(!ErrorKind::MissingVersionTag.is_corrupt());
        assert!(!ErrorKind::DisabledFormat("zstd".to_string()).is_corrupt());
    }

    #[test]
    fn error_from_result() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "bad magic"));
        let err: Result<()> = result.or_raise(|| ErrorKind::Decompression);
        assert_eq!(*err.unwrap_err(), ErrorKind::Decompression);
    }
}
