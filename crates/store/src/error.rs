//! Store Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A uniqueness or foreign key constraint rejected the write. The row (or
    /// a conflicting one) already exists.
    #[display("constraint violation")]
    Constraint,
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Stored data could not be converted to or from its model.
    #[display("invalid stored data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }
}

/// Wrap a `sqlx` error, telling constraint violations apart from everything else.
pub(crate) fn raise_sqlx(err: sqlx::Error) -> Error {
    let kind = match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            ErrorKind::Constraint
        },
        _ => ErrorKind::Database,
    };
    exn::Exn::from(err).raise(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::Constraint.to_string(), "constraint violation");
        assert_eq!(ErrorKind::NotFound("novel 4".to_string()).to_string(), "not found: novel 4");
        assert_eq!(ErrorKind::InvalidData("genres").to_string(), "invalid stored data: genres");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Database.is_retryable());
        assert!(!ErrorKind::Constraint.is_retryable());
    }

    #[test]
    fn sqlx_row_not_found_is_database() {
        let err = raise_sqlx(sqlx::Error::RowNotFound);
        assert_eq!(*err, ErrorKind::Database);
    }
}
