//! SQLite driver built on `rusqlite`.
//!
//! Connections open in WAL mode with foreign keys on and a busy timeout.
//! Writes behave as on a client with autocommit off: the first statement
//! that may modify the database opens a transaction, and nothing is
//! durable until [`commit`](DriverConnection::commit). Statements SQLite
//! refuses inside a transaction (`VACUUM`, `ATTACH`, `DETACH`) and explicit
//! transaction control run without the implicit `BEGIN`.

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags, ToSql};
use tether_types::{Credentials, Row, Value};

use crate::driver::{BatchResult, Cursor, Driver, DriverConnection, DriverError};

/// Runtime tunables for SQLite connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteSettings {
    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
        }
    }
}

/// Opens SQLite connections. `Credentials::database` is the file path;
/// `:memory:` opens a private in-memory database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver {
    settings: SqliteSettings,
}

impl SqliteDriver {
    /// A driver with the given settings.
    pub fn new(settings: SqliteSettings) -> Self {
        Self { settings }
    }

    /// The settings applied to every connection.
    pub fn settings(&self) -> SqliteSettings {
        self.settings
    }
}

impl From<rusqlite::Error> for DriverError {
    fn from(e: rusqlite::Error) -> Self {
        DriverError::with_source(e.to_string(), e)
    }
}

fn init_connection(conn: &Connection, settings: SqliteSettings) -> rusqlite::Result<()> {
    // In-memory databases report "memory", which is expected.
    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    if journal_mode != "wal" && journal_mode != "memory" {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!(
                "failed to set WAL journal mode, got: {}",
                journal_mode
            )),
        ));
    }
    conn.execute_batch(&format!(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {};",
        settings.busy_timeout_ms
    ))
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;

    fn connect(&self, credentials: &Credentials) -> Result<SqliteConnection, DriverError> {
        if credentials.database.trim().is_empty() {
            return Err(DriverError::new("sqlite database path is empty"));
        }
        if !credentials.host.is_empty() || !credentials.user.is_empty() {
            tracing::debug!(
                host = %credentials.host,
                user = %credentials.user,
                "sqlite driver ignores host and user"
            );
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let conn = Connection::open_with_flags(&credentials.database, flags)?;
        init_connection(&conn, self.settings)?;

        tracing::debug!(path = %credentials.database, "opened sqlite connection");
        Ok(SqliteConnection { conn })
    }
}

/// One open SQLite connection.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: Connection,
}

struct Bind<'a>(&'a Value);

impl ToSql for Bind<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(match self.0 {
            Value::Null => ValueRef::Null,
            Value::Integer(v) => ValueRef::Integer(*v),
            Value::Real(v) => ValueRef::Real(*v),
            Value::Text(v) => ValueRef::Text(v.as_bytes()),
            Value::Blob(v) => ValueRef::Blob(v),
        }))
    }
}

fn to_value(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// How a statement interacts with the implicit transaction and rowids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementClass {
    /// `INSERT` or `REPLACE`: assigns a rowid to each new row.
    Insert,
    /// Cannot run inside a transaction, or manages one itself.
    Standalone,
    Other,
}

impl StatementClass {
    const STANDALONE: [&'static str; 9] = [
        "VACUUM", "ATTACH", "DETACH", "BEGIN", "COMMIT", "END", "ROLLBACK", "SAVEPOINT", "RELEASE",
    ];

    fn of(sql: &str) -> Self {
        let keyword = leading_keyword(sql);
        if keyword.eq_ignore_ascii_case("INSERT") || keyword.eq_ignore_ascii_case("REPLACE") {
            Self::Insert
        } else if Self::STANDALONE.iter().any(|k| keyword.eq_ignore_ascii_case(k)) {
            Self::Standalone
        } else {
            Self::Other
        }
    }
}

/// The first keyword of `sql`, skipping whitespace and comments.
fn leading_keyword(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail);
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail);
        } else {
            break;
        }
    }
    let end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    &rest[..end]
}

impl SqliteConnection {
    /// Opens the implicit transaction before a statement that may write.
    fn begin_if_writing(&self, readonly: bool, class: StatementClass) -> rusqlite::Result<()> {
        if !readonly && class != StatementClass::Standalone && self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn run_changes(
        &self,
        stmt: &mut rusqlite::Statement<'_>,
        params: &[Value],
        class: StatementClass,
    ) -> rusqlite::Result<Cursor> {
        let changed = stmt.execute(params_from_iter(params.iter().map(Bind)))?;
        let id = (changed > 0 && class == StatementClass::Insert)
            .then(|| self.conn.last_insert_rowid());
        Ok(Cursor::with_changes(changed as u64, id))
    }
}

impl DriverConnection for SqliteConnection {
    fn is_live(&self) -> bool {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok()
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Cursor, DriverError> {
        let class = StatementClass::of(sql);
        let mut stmt = self.conn.prepare(sql)?;
        self.begin_if_writing(stmt.readonly(), class)?;

        let column_count = stmt.column_count();
        if column_count == 0 {
            return Ok(self.run_changes(&mut stmt, params, class)?);
        }

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut rows = stmt.query(params_from_iter(params.iter().map(Bind)))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(to_value(row.get_ref(idx)?));
            }
            out.push(Row::new(values));
        }
        Ok(Cursor::with_rows(columns, out))
    }

    fn execute_batch(&mut self, sql: &str, rows: &[&[Value]]) -> Result<BatchResult, DriverError> {
        let class = StatementClass::of(sql);
        let mut stmt = self.conn.prepare_cached(sql)?;
        self.begin_if_writing(stmt.readonly(), class)?;

        let mut result = BatchResult::default();
        for params in rows {
            let cursor = self.run_changes(&mut stmt, params, class)?;
            result.absorb(&cursor);
        }
        Ok(result)
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn close(self) -> Result<(), DriverError> {
        self.conn.close().map_err(|(_, e)| DriverError::from(e))
    }
}
