//! The single-connection lifecycle manager.
//!
//! Every public operation runs the same sequence before it touches the
//! driver:
//!
//! 1. **Idle check.** If a handle is held and has been unused for longer
//!    than the idle timeout, it is closed.
//! 2. **Reconnect if needed.** If no live handle is held, a new one is
//!    opened with the stored credentials.
//!
//! There is no background timer. A handle past its timeout stays open
//! until the next call observes it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tether_observe::{LifecycleEvent, Observer, TracingObserver, WriteOperation};
use tether_types::{Columns, Credentials, Record, Row, Value};

use crate::clock::{Clock, IdleTimeout, SystemClock};
use crate::driver::{BatchResult, Cursor, Driver, DriverConnection, DriverError};
use crate::error::Error;
use crate::query;

/// Whether the manager currently holds a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// A handle is held. It was live when last used.
    Connected,
    /// No handle is held; the next operation will connect.
    Disconnected,
}

/// What [`ConnectionManager::query`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The statement returned a result set.
    Rows(Vec<Row>),
    /// The statement returned no result set; this many rows were affected.
    Affected(u64),
}

/// Configures and opens a [`ConnectionManager`].
pub struct ConnectionManagerBuilder<D: Driver> {
    driver: D,
    credentials: Credentials,
    idle_timeout: IdleTimeout,
    observer: Arc<dyn Observer>,
    clock: Arc<dyn Clock>,
}

impl<D: Driver> ConnectionManagerBuilder<D> {
    /// Sets the idle timeout. Zero disables eviction.
    pub fn idle_timeout(mut self, idle_timeout: impl Into<IdleTimeout>) -> Self {
        self.idle_timeout = idle_timeout.into();
        self
    }

    /// Sets the lifecycle observer. Defaults to [`TracingObserver`].
    pub fn observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Sets the time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Builds the manager and opens the first connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the first connect fails.
    pub fn connect(self) -> Result<ConnectionManager<D>, Error> {
        let now = self.clock.now();
        let mut manager = ConnectionManager {
            driver: self.driver,
            credentials: self.credentials,
            idle_timeout: self.idle_timeout,
            handle: None,
            last_active: now,
            observer: self.observer,
            clock: self.clock,
        };
        manager.connect()?;
        Ok(manager)
    }
}

/// Owns one driver connection and keeps it fresh.
///
/// Not internally synchronised: every operation takes `&mut self`. Wrap the
/// manager in a `Mutex` to share it.
///
/// # Injection boundary
///
/// `table`, column names, and `where_clause` arguments are spliced into the
/// SQL text as given. Only record values are bound as parameters.
pub struct ConnectionManager<D: Driver> {
    driver: D,
    credentials: Credentials,
    idle_timeout: IdleTimeout,
    handle: Option<D::Connection>,
    last_active: Instant,
    observer: Arc<dyn Observer>,
    clock: Arc<dyn Clock>,
}

impl<D: Driver> ConnectionManager<D> {
    /// Starts building a manager with the default settings: 300 second idle
    /// timeout, `tracing` observer, system clock.
    pub fn builder(driver: D, credentials: Credentials) -> ConnectionManagerBuilder<D> {
        ConnectionManagerBuilder {
            driver,
            credentials,
            idle_timeout: IdleTimeout::DEFAULT,
            observer: Arc::new(TracingObserver),
            clock: Arc::new(SystemClock),
        }
    }

    /// Opens a manager with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the first connect fails.
    pub fn open(driver: D, credentials: Credentials) -> Result<Self, Error> {
        Self::builder(driver, credentials).connect()
    }

    /// The credentials used for every connect.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The idle timeout fixed at construction.
    pub fn idle_timeout(&self) -> IdleTimeout {
        self.idle_timeout
    }

    /// Whether a handle is held, without running the idle check or checking
    /// liveness.
    pub fn state(&self) -> ConnectionState {
        if self.handle.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Time since the handle was last used successfully.
    pub fn idle_for(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.last_active)
    }

    fn emit(&self, event: LifecycleEvent) {
        self.observer.on_event(&event);
    }

    fn touch(&mut self) {
        self.last_active = self.clock.now();
    }

    /// Opens a connection unless a live one is already held.
    ///
    /// A held handle that no longer reports itself live is closed and
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if the driver cannot connect. The
    /// manager is left disconnected.
    pub fn connect(&mut self) -> Result<(), Error> {
        if self.handle.as_ref().is_some_and(|h| h.is_live()) {
            self.emit(LifecycleEvent::ConnectionReused);
            return Ok(());
        }
        self.reconnect()
    }

    /// Replaces whatever handle is held with a fresh one, without checking
    /// whether the old one is live.
    fn reconnect(&mut self) -> Result<(), Error> {
        // Close failures on a dead handle are reported by release_handle.
        let _ = self.release_handle();

        match self.driver.connect(&self.credentials) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.touch();
                self.emit(LifecycleEvent::Connected {
                    host: self.credentials.host.clone(),
                    database: self.credentials.database.clone(),
                });
                Ok(())
            }
            Err(e) => {
                self.emit(LifecycleEvent::ConnectFailed {
                    message: e.message().to_string(),
                });
                Err(Error::Connection(e))
            }
        }
    }

    /// Runs the idle check, then reports whether a live handle is held.
    ///
    /// May close an idle handle. Never reconnects.
    pub fn is_connected(&mut self) -> bool {
        self.evict_if_idle();
        self.handle.as_ref().is_some_and(|h| h.is_live())
    }

    fn evict_if_idle(&mut self) {
        if self.handle.is_none() {
            return;
        }
        let idle_for = self.idle_for();
        if self.idle_timeout.is_exceeded_by(idle_for) {
            self.emit(LifecycleEvent::IdleEvicted { idle_for });
            // The handle is gone either way; a close failure is already reported.
            let _ = self.release_handle();
        }
    }

    /// Takes the handle and closes it, reporting the outcome.
    fn release_handle(&mut self) -> Result<(), DriverError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        match handle.close() {
            Ok(()) => {
                self.emit(LifecycleEvent::Closed);
                Ok(())
            }
            Err(e) => {
                self.emit(LifecycleEvent::CloseFailed {
                    message: e.message().to_string(),
                });
                Err(e)
            }
        }
    }

    fn ensure_connected(&mut self) -> Result<&mut D::Connection, Error> {
        if !self.is_connected() {
            self.emit(LifecycleEvent::Reconnecting);
            self.reconnect()?;
        }
        self.handle
            .as_mut()
            .ok_or_else(|| Error::Connection(DriverError::new("no connection after connect")))
    }

    /// Rolls back after a failed statement and wraps the failure.
    fn fail_query(&mut self, err: DriverError) -> Error {
        self.emit(LifecycleEvent::QueryFailed {
            message: err.message().to_string(),
        });
        if let Some(handle) = self.handle.as_mut() {
            match handle.rollback() {
                Ok(()) => self.emit(LifecycleEvent::RolledBack),
                Err(e) => self.emit(LifecycleEvent::RollbackFailed {
                    message: e.message().to_string(),
                }),
            }
        }
        Error::Query(err)
    }

    /// The choke point: idle check, reconnect, run, then touch or roll back.
    fn run<T>(
        &mut self,
        op: impl FnOnce(&mut D::Connection) -> Result<T, DriverError>,
    ) -> Result<T, Error> {
        let handle = self.ensure_connected()?;
        match op(handle) {
            Ok(value) => {
                self.touch();
                Ok(value)
            }
            Err(e) => Err(self.fail_query(e)),
        }
    }

    /// Runs one statement with positional parameters.
    ///
    /// Does not commit. On failure the open transaction is rolled back
    /// before the error is returned; the statement is never retried.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] if no connection could be opened,
    /// [`Error::Query`] if the statement failed.
    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Cursor, Error> {
        self.run(|conn| conn.execute(sql, params))
    }

    /// Commits the open transaction on the held handle.
    ///
    /// Does not run the idle check: a pending transaction belongs to the
    /// handle that is held right now.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] if no handle is held, [`Error::Query`] if the
    /// commit failed (the transaction is rolled back).
    pub fn commit(&mut self) -> Result<(), Error> {
        let Some(handle) = self.handle.as_mut() else {
            return Err(Error::Connection(DriverError::new(
                "no open connection to commit",
            )));
        };
        match handle.commit() {
            Ok(()) => {
                self.touch();
                Ok(())
            }
            Err(e) => Err(self.fail_query(e)),
        }
    }

    fn written(&self, operation: WriteOperation, table: &str, rows: u64) {
        self.emit(LifecycleEvent::RowsWritten {
            operation,
            table: table.to_string(),
            rows,
        });
    }

    /// Inserts one record and commits.
    ///
    /// Returns the identifier the database assigned to the new row, or
    /// `None` if the table has none.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty table name or record; otherwise
    /// as [`execute`](Self::execute).
    pub fn insert_one(&mut self, table: &str, record: &Record) -> Result<Option<i64>, Error> {
        let sql = query::insert(table, record.names(), self.driver.placeholder())?;
        let cursor = self.execute(&sql, record.values())?;
        self.commit()?;
        self.written(WriteOperation::Insert, table, cursor.row_count());
        Ok(cursor.last_insert_id())
    }

    /// Inserts records in order with one statement, then commits.
    ///
    /// Every record must have the first record's fields in the same order.
    /// If any row fails, the whole batch is rolled back.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty batch or mismatched records,
    /// before any driver call; otherwise as [`execute`](Self::execute).
    pub fn insert_many(&mut self, table: &str, records: &[Record]) -> Result<BatchResult, Error> {
        let Some(first) = records.first() else {
            return Err(Error::Validation(format!(
                "no records to insert into {table}"
            )));
        };
        if let Some(idx) = records.iter().position(|r| !r.same_shape(first)) {
            return Err(Error::Validation(format!(
                "record {idx} does not have the same fields as record 0"
            )));
        }
        let sql = query::insert(table, first.names(), self.driver.placeholder())?;
        let rows: Vec<&[Value]> = records.iter().map(Record::values).collect();

        let result = self.run(|conn| conn.execute_batch(&sql, &rows))?;
        self.commit()?;
        self.written(WriteOperation::Insert, table, result.rows_affected);
        Ok(result)
    }

    /// Updates rows matching `where_clause` and commits.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty table, value set, or predicate;
    /// otherwise as [`execute`](Self::execute).
    pub fn update(
        &mut self,
        table: &str,
        values: &Record,
        where_clause: &str,
    ) -> Result<u64, Error> {
        let sql = query::update(table, values.names(), where_clause, self.driver.placeholder())?;
        let cursor = self.execute(&sql, values.values())?;
        self.commit()?;
        self.written(WriteOperation::Update, table, cursor.row_count());
        Ok(cursor.row_count())
    }

    /// Deletes rows matching `where_clause` and commits.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty table or predicate; otherwise as
    /// [`execute`](Self::execute).
    pub fn delete(&mut self, table: &str, where_clause: &str) -> Result<u64, Error> {
        let sql = query::delete(table, where_clause)?;
        let cursor = self.execute(&sql, &[])?;
        self.commit()?;
        self.written(WriteOperation::Delete, table, cursor.row_count());
        Ok(cursor.row_count())
    }

    /// Selects rows. No match yields an empty `Vec`; failures are returned,
    /// never folded into an empty result.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an empty table or column list; otherwise
    /// as [`execute`](Self::execute).
    pub fn get(
        &mut self,
        table: &str,
        columns: impl Into<Columns>,
        where_clause: Option<&str>,
    ) -> Result<Vec<Row>, Error> {
        let sql = query::select(table, &columns.into(), where_clause)?;
        Ok(self.execute(&sql, &[])?.fetch_all())
    }

    /// Runs any statement and commits.
    ///
    /// A statement that returns a result set yields its rows; any other
    /// yields its affected row count.
    ///
    /// Because the commit always follows, a `BEGIN` sent here is committed
    /// before the call returns. Drive explicit transactions with
    /// [`execute`](Self::execute) and [`commit`](Self::commit) instead.
    ///
    /// # Errors
    ///
    /// As [`execute`](Self::execute) and [`commit`](Self::commit).
    pub fn query(&mut self, sql: &str, params: &[Value]) -> Result<QueryOutcome, Error> {
        let cursor = self.execute(sql, params)?;
        self.commit()?;
        if cursor.has_result_set() {
            Ok(QueryOutcome::Rows(cursor.fetch_all()))
        } else {
            self.written(WriteOperation::Statement, "", cursor.row_count());
            Ok(QueryOutcome::Affected(cursor.row_count()))
        }
    }

    /// Closes the held handle. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] if the driver failed to close. The handle is
    /// released regardless and the manager is disconnected.
    pub fn close(&mut self) -> Result<(), Error> {
        self.release_handle().map_err(Error::Connection)
    }
}

impl<D: Driver> Drop for ConnectionManager<D> {
    fn drop(&mut self) {
        // Failures are reported to the observer by release_handle.
        let _ = self.release_handle();
    }
}

impl<D: Driver> std::fmt::Debug for ConnectionManager<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("credentials", &self.credentials)
            .field("idle_timeout", &self.idle_timeout)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
