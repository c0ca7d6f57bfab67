//! Unified error types for the inventory ledger.
//!
//! Every engine operation returns [`Result`]. Callers that need a stable tag (for example an
//! HTTP layer choosing a status code) use [`Error::kind`] instead of matching on variants.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors produced by the ledger core.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced product, technician, client or visit does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up (e.g. `"product"`)
        entity: &'static str,
        /// Identifier the caller supplied
        id: String,
    },

    /// Malformed or out-of-range input.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable reason
        message: String,
    },

    /// The requested quantity exceeds what is held at the location.
    #[error(
        "Insufficient stock of {product} at {location}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        /// Product code
        product: String,
        /// Location token (`general` or a technician id)
        location: String,
        /// Quantity currently held at the location
        available: i64,
        /// Quantity the operation asked for
        requested: i64,
    },

    /// A uniqueness rule was violated (e.g. duplicate product code).
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable reason
        message: String,
    },

    /// Settings could not be read or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Storage failure. The backend detail stays in the source chain, not in the message.
    #[error("Internal storage error")]
    Database(#[from] DbErr),

    /// I/O failure outside the database driver.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Machine-readable error tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::NotFound`]
    NotFound,
    /// See [`Error::InvalidArgument`]
    InvalidArgument,
    /// See [`Error::InsufficientStock`]
    InsufficientStock,
    /// See [`Error::Conflict`]
    Conflict,
    /// Storage, configuration or I/O failure
    Internal,
}

impl ErrorKind {
    /// Stable snake-case name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidArgument => "invalid_argument",
            Self::InsufficientStock => "insufficient_stock",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Tag used by callers to map the failure onto their own transport.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Turns a unique-constraint violation into [`Error::Conflict`], anything else into
    /// [`Error::Database`].
    pub(crate) fn from_unique_violation(err: DbErr, message: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Conflict {
                message: message.into(),
            },
            _ => Self::Database(err),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(
            Error::not_found("product", 7).kind().as_str(),
            "not_found"
        );
        assert_eq!(Error::invalid("bad").kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            Error::Database(DbErr::Custom("disk gone".to_string())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_database_message_hides_backend_detail() {
        let err = Error::Database(DbErr::Custom("SQLITE_BUSY: database is locked".to_string()));
        assert_eq!(err.to_string(), "Internal storage error");
    }

    #[test]
    fn test_insufficient_stock_message() {
        let err = Error::InsufficientStock {
            product: "ATM-001".to_string(),
            location: "general".to_string(),
            available: 2,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock of ATM-001 at general: available 2, requested 5"
        );
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    }
}
