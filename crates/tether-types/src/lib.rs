//! Shared value types for the Tether workspace.
//!
//! This crate holds the types that cross crate boundaries: the dynamically
//! typed SQL [`Value`], result [`Row`]s, ordered insert/update [`Record`]s,
//! column selections, and connection [`Credentials`].
//!
//! Nothing here performs I/O. The driver traits and the connection manager
//! live in `tether-db`; lifecycle events live in `tether-observe`.

use serde::{Deserialize, Serialize};

mod record;
mod value;

pub use record::Record;
pub use value::{Row, Value};

/// Connection parameters handed to a driver on every connect.
///
/// Drivers interpret the fields as they see fit. A network server driver
/// uses all four; the SQLite driver treats `database` as a file path and
/// ignores the rest.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Database server host.
    pub host: String,
    /// Login user.
    pub user: String,
    /// Login password. Redacted from `Debug` output.
    pub password: String,
    /// Database (schema) name, or file path for file-backed drivers.
    pub database: String,
}

impl Credentials {
    /// Builds a credential set from its four parts.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Column selection for `SELECT` helpers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Columns {
    /// Every column (`*`).
    #[default]
    All,
    /// An explicit, ordered list of column expressions.
    List(Vec<String>),
}

impl Columns {
    /// Renders the selection as it appears between `SELECT` and `FROM`.
    pub fn to_sql(&self) -> String {
        match self {
            Self::All => "*".to_string(),
            Self::List(names) => names.join(", "),
        }
    }

    /// Returns `true` for an explicit list with no entries.
    pub fn is_empty_list(&self) -> bool {
        matches!(self, Self::List(names) if names.is_empty())
    }
}

impl From<&str> for Columns {
    fn from(s: &str) -> Self {
        if s.trim() == "*" {
            Self::All
        } else {
            Self::List(vec![s.to_string()])
        }
    }
}

impl From<Vec<String>> for Columns {
    fn from(names: Vec<String>) -> Self {
        Self::List(names)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(names: Vec<&str>) -> Self {
        Self::List(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Columns {
    fn from(names: &[&str]) -> Self {
        Self::List(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Columns {
    fn from(names: [&str; N]) -> Self {
        Self::List(names.iter().map(|s| s.to_string()).collect())
    }
}
