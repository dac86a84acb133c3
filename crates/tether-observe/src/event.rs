//! Lifecycle event kinds and payloads.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The kind of a [`LifecycleEvent`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A new driver connection was opened.
    Connected,
    /// `connect()` found a live handle and kept it.
    ConnectionReused,
    /// Opening a driver connection failed.
    ConnectFailed,
    /// A handle sat unused past the idle timeout and was closed.
    IdleEvicted,
    /// An operation found no live handle and is opening a new one.
    Reconnecting,
    /// A statement failed on a live handle.
    QueryFailed,
    /// The open transaction was rolled back after a failure.
    RolledBack,
    /// The rollback issued after a failure itself failed.
    RollbackFailed,
    /// A write helper committed and reported its affected row count.
    RowsWritten,
    /// The handle was closed.
    Closed,
    /// Closing the handle failed; the handle was released regardless.
    CloseFailed,
}

impl EventKind {
    /// Returns the canonical string label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "CONNECTED",
            Self::ConnectionReused => "CONNECTION_REUSED",
            Self::ConnectFailed => "CONNECT_FAILED",
            Self::IdleEvicted => "IDLE_EVICTED",
            Self::Reconnecting => "RECONNECTING",
            Self::QueryFailed => "QUERY_FAILED",
            Self::RolledBack => "ROLLED_BACK",
            Self::RollbackFailed => "ROLLBACK_FAILED",
            Self::RowsWritten => "ROWS_WRITTEN",
            Self::Closed => "CLOSED",
            Self::CloseFailed => "CLOSE_FAILED",
        }
    }

    /// Returns `true` for kinds that report a failure.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            Self::ConnectFailed | Self::QueryFailed | Self::RollbackFailed | Self::CloseFailed
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = ParseEventKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECTED" => Ok(Self::Connected),
            "CONNECTION_REUSED" => Ok(Self::ConnectionReused),
            "CONNECT_FAILED" => Ok(Self::ConnectFailed),
            "IDLE_EVICTED" => Ok(Self::IdleEvicted),
            "RECONNECTING" => Ok(Self::Reconnecting),
            "QUERY_FAILED" => Ok(Self::QueryFailed),
            "ROLLED_BACK" => Ok(Self::RolledBack),
            "ROLLBACK_FAILED" => Ok(Self::RollbackFailed),
            "ROWS_WRITTEN" => Ok(Self::RowsWritten),
            "CLOSED" => Ok(Self::Closed),
            "CLOSE_FAILED" => Ok(Self::CloseFailed),
            _ => Err(ParseEventKindError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown event kind string.
#[derive(Debug, Clone)]
pub struct ParseEventKindError(pub String);

impl std::fmt::Display for ParseEventKindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown event kind: {}", self.0)
    }
}

impl std::error::Error for ParseEventKindError {}

/// The write helper that produced a [`LifecycleEvent::RowsWritten`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOperation {
    /// `insert_one` or `insert_many`.
    Insert,
    /// `update`.
    Update,
    /// `delete`.
    Delete,
    /// A raw non-query statement run through `query`.
    Statement,
}

impl WriteOperation {
    /// Returns the lowercase label for this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Statement => "statement",
        }
    }
}

/// Something that happened to the managed connection.
///
/// Emitted by the connection manager to its injected observer. Payloads
/// carry only what a log line or a test assertion needs; credentials other
/// than host and database name never appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleEvent {
    /// A new driver connection was opened.
    Connected {
        /// Host from the stored credentials.
        host: String,
        /// Database name from the stored credentials.
        database: String,
    },

    /// `connect()` found a live handle and kept it.
    ConnectionReused,

    /// Opening a driver connection failed.
    ConnectFailed {
        /// The driver's error message.
        message: String,
    },

    /// The handle was idle longer than the timeout and has been closed.
    IdleEvicted {
        /// How long the handle had been idle.
        idle_for: Duration,
    },

    /// No live handle was found; a new one is being opened.
    Reconnecting,

    /// A statement failed on a live handle.
    QueryFailed {
        /// The driver's error message.
        message: String,
    },

    /// The open transaction was rolled back.
    RolledBack,

    /// Rolling back failed.
    RollbackFailed {
        /// The driver's error message.
        message: String,
    },

    /// A write helper committed.
    RowsWritten {
        /// Which helper ran.
        operation: WriteOperation,
        /// Target table, empty for raw statements.
        table: String,
        /// Rows the driver reported as affected.
        rows: u64,
    },

    /// The handle was closed.
    Closed,

    /// Closing the handle failed.
    CloseFailed {
        /// The driver's error message.
        message: String,
    },
}

impl LifecycleEvent {
    /// Returns the payload-free kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connected { .. } => EventKind::Connected,
            Self::ConnectionReused => EventKind::ConnectionReused,
            Self::ConnectFailed { .. } => EventKind::ConnectFailed,
            Self::IdleEvicted { .. } => EventKind::IdleEvicted,
            Self::Reconnecting => EventKind::Reconnecting,
            Self::QueryFailed { .. } => EventKind::QueryFailed,
            Self::RolledBack => EventKind::RolledBack,
            Self::RollbackFailed { .. } => EventKind::RollbackFailed,
            Self::RowsWritten { .. } => EventKind::RowsWritten,
            Self::Closed => EventKind::Closed,
            Self::CloseFailed { .. } => EventKind::CloseFailed,
        }
    }
}
