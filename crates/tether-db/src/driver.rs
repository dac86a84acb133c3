//! The driver seam.
//!
//! A [`Driver`] opens connections; a [`DriverConnection`] runs statements
//! and ends transactions. The connection manager owns exactly one
//! `DriverConnection` at a time and never hands it out.

use tether_types::{Credentials, Row, Value};

/// Opens driver connections.
pub trait Driver {
    /// The connection type this driver produces.
    type Connection: DriverConnection;

    /// Opens a new connection.
    fn connect(&self, credentials: &Credentials) -> Result<Self::Connection, DriverError>;

    /// The positional placeholder this driver's SQL dialect expects.
    fn placeholder(&self) -> &'static str {
        "?"
    }
}

/// One open database channel.
pub trait DriverConnection {
    /// Returns `true` if the channel can still run statements.
    fn is_live(&self) -> bool;

    /// Runs a single statement with positional parameters.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Cursor, DriverError>;

    /// Runs one statement once per parameter set, in order.
    ///
    /// Stops at the first failure. Rows written before the failure stay in
    /// the open transaction until the caller commits or rolls back.
    fn execute_batch(&mut self, sql: &str, rows: &[&[Value]]) -> Result<BatchResult, DriverError> {
        let mut result = BatchResult::default();
        for params in rows {
            let cursor = self.execute(sql, params)?;
            result.absorb(&cursor);
        }
        Ok(result)
    }

    /// Commits the open transaction, if any.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// Rolls back the open transaction, if any.
    fn rollback(&mut self) -> Result<(), DriverError>;

    /// Closes the channel.
    fn close(self) -> Result<(), DriverError>
    where
        Self: Sized;
}

/// The materialised outcome of one statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cursor {
    columns: Vec<String>,
    rows: Vec<Row>,
    row_count: u64,
    last_insert_id: Option<i64>,
}

impl Cursor {
    /// A cursor over a result set. `row_count` is the number of rows.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            row_count: rows.len() as u64,
            columns,
            rows,
            last_insert_id: None,
        }
    }

    /// A cursor for a statement that produced no result set.
    pub fn with_changes(row_count: u64, last_insert_id: Option<i64>) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count,
            last_insert_id,
        }
    }

    /// Returns `true` if the statement produced a result set, even an empty one.
    pub fn has_result_set(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Result set column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Borrows the fetched rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows affected by a write, or rows returned by a query.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Identifier assigned by the database to the inserted row, if any.
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    /// Consumes the cursor, returning every row.
    pub fn fetch_all(self) -> Vec<Row> {
        self.rows
    }
}

/// Summary of a batch execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchResult {
    /// Total rows affected across the batch.
    pub rows_affected: u64,
    /// Identifier assigned to the last inserted row, if any.
    pub last_insert_id: Option<i64>,
}

impl BatchResult {
    /// Folds one statement's cursor into the running totals.
    pub fn absorb(&mut self, cursor: &Cursor) {
        self.rows_affected += cursor.row_count();
        if let Some(id) = cursor.last_insert_id() {
            self.last_insert_id = Some(id);
        }
    }
}

/// An error reported by a driver.
#[derive(Debug)]
pub struct DriverError {
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DriverError {
    /// An error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// An error wrapping the driver's native error type.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The driver's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
