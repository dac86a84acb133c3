//! Error types for connection management.

use crate::driver::DriverError;

/// The three ways a manager operation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The channel could not be opened, re-opened, or closed.
    Connection,
    /// A statement failed on a live channel.
    Query,
    /// Caller-supplied arguments were rejected before any I/O.
    Validation,
}

/// Errors returned by [`ConnectionManager`](crate::ConnectionManager).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Opening or closing the driver connection failed.
    ///
    /// Never retried internally; the next call attempts a fresh connect.
    #[error("database connection error: {0}")]
    Connection(#[source] DriverError),

    /// A statement failed. The open transaction has already been rolled
    /// back when this is returned.
    #[error("query failed: {0}")]
    Query(#[source] DriverError),

    /// Arguments were structurally invalid, e.g. an empty batch.
    #[error("invalid arguments: {0}")]
    Validation(String),
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::Query(_) => ErrorKind::Query,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Returns `true` if calling again may succeed.
    ///
    /// Only connection failures qualify: the next call reconnects. Query
    /// failures are not retried because the statement may not be idempotent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns the underlying message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(e) | Self::Query(e) => e.message(),
            Self::Validation(msg) => msg,
        }
    }
}
