//! Backup Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. The [`export`](crate::export) and
//! [`restore`](crate::restore) modules have their own, more detailed kinds
//! which are raised into [`ErrorKind::Export`] and [`ErrorKind::Restore`] at
//! the public boundary.

use derive_more::{Display, Error};

/// A backup error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for backup operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("export failed")]
    Export,
    #[display("restore failed")]
    Restore,
    /// The extension source could not refresh or report its listing.
    #[display("extension source unavailable")]
    Source,
    #[display("could not install extension {_0}")]
    Install(#[error(not(source))] i64),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Source | Self::Install(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Install(7).to_string(), "could not install extension 7");
        assert!(ErrorKind::Source.is_retryable());
        assert!(!ErrorKind::Restore.is_retryable());
    }
}
