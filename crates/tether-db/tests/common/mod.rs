//! A scripted in-process driver that counts every call it receives.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};

use tether_db::{Cursor, Driver, DriverConnection, DriverError};
use tether_types::{Credentials, Row, Value};

/// Counters and failure switches shared by the driver and its connections.
#[derive(Debug)]
pub struct MockState {
    pub connects: usize,
    pub closes: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub live_checks: usize,
    pub executed: Vec<(String, Vec<Value>)>,
    /// Fail every connect attempt while set.
    pub fail_connect: bool,
    /// Fail any statement containing this text.
    pub fail_sql: Option<String>,
    /// Fail every commit while set.
    pub fail_commit: bool,
    /// Fail every rollback while set.
    pub fail_rollback: bool,
    /// Fail every close while set. The connection is consumed regardless.
    pub fail_close: bool,
    /// Liveness reported by the current connection. Reset on connect.
    pub live: bool,
    /// Rows returned for every `SELECT`.
    pub select_rows: Vec<Row>,
    /// Row count reported for `UPDATE`/`DELETE`/other statements.
    pub affected: u64,
    next_id: i64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            connects: 0,
            closes: 0,
            commits: 0,
            rollbacks: 0,
            live_checks: 0,
            executed: Vec::new(),
            fail_connect: false,
            fail_sql: None,
            fail_commit: false,
            fail_rollback: false,
            fail_close: false,
            live: true,
            select_rows: Vec::new(),
            affected: 0,
            next_id: 0,
        }
    }
}

impl MockState {
    /// Every driver call of any kind.
    pub fn total_calls(&self) -> usize {
        self.connects
            + self.closes
            + self.commits
            + self.rollbacks
            + self.live_checks
            + self.executed.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock should not be poisoned")
    }
}

impl Driver for MockDriver {
    type Connection = MockConnection;

    fn connect(&self, _credentials: &Credentials) -> Result<MockConnection, DriverError> {
        let mut state = self.state();
        state.connects += 1;
        if state.fail_connect {
            return Err(DriverError::new("connection refused"));
        }
        state.live = true;
        Ok(MockConnection {
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Debug)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock should not be poisoned")
    }
}

impl DriverConnection for MockConnection {
    fn is_live(&self) -> bool {
        let mut state = self.state();
        state.live_checks += 1;
        state.live
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Cursor, DriverError> {
        let mut state = self.state();
        state.executed.push((sql.to_string(), params.to_vec()));

        if let Some(pattern) = &state.fail_sql {
            if sql.contains(pattern.as_str()) {
                return Err(DriverError::new(format!("statement rejected: {pattern}")));
            }
        }

        if sql.starts_with("SELECT") {
            return Ok(Cursor::with_rows(
                vec!["col".to_string()],
                state.select_rows.clone(),
            ));
        }
        if sql.starts_with("INSERT") {
            state.next_id += 1;
            return Ok(Cursor::with_changes(1, Some(state.next_id)));
        }
        Ok(Cursor::with_changes(state.affected, None))
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        let mut state = self.state();
        state.commits += 1;
        if state.fail_commit {
            return Err(DriverError::new("commit failed"));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        let mut state = self.state();
        state.rollbacks += 1;
        if state.fail_rollback {
            return Err(DriverError::new("rollback failed"));
        }
        Ok(())
    }

    fn close(self) -> Result<(), DriverError> {
        let mut state = self.state();
        state.closes += 1;
        if state.fail_close {
            return Err(DriverError::new("close failed"));
        }
        Ok(())
    }
}
