//! Single-connection database access with idle reclamation.
//!
//! [`ConnectionManager`] owns exactly one driver connection. It closes the
//! connection after it sits unused past an idle timeout and transparently
//! reconnects on the next call. CRUD helpers (`insert_one`, `insert_many`,
//! `update`, `delete`, `get`, `query`) all funnel through one execution
//! path that enforces this policy before touching the driver.
//!
//! # Design decisions
//!
//! - **Lazy eviction**: there is no background thread. The idle check runs
//!   at the start of every call, so a connection may outlive its timeout
//!   if nothing calls the manager.
//! - **Reconnect the channel, never the statement**: a failed statement is
//!   rolled back and returned as [`Error::Query`]. Re-running it could
//!   duplicate a non-idempotent write.
//! - **Zero or negative idle timeout disables eviction** rather than
//!   evicting on every call.
//! - **Driver as a trait**: [`Driver`] and [`DriverConnection`] describe
//!   the collaborator. [`SqliteDriver`] is the bundled implementation.
//! - **Observer, not global logging**: lifecycle events go to an injected
//!   [`tether_observe::Observer`]; the crate never installs a subscriber.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tether_db::{ConnectionManager, SqliteDriver};
//! use tether_types::{Credentials, Record};
//!
//! let creds = Credentials::new("", "", "", "app.db");
//! let mut db = ConnectionManager::builder(SqliteDriver::default(), creds)
//!     .idle_timeout(std::time::Duration::from_secs(60))
//!     .connect()?;
//!
//! let id = db.insert_one("users", &Record::new().field("name", "Alice").field("age", 30))?;
//! let rows = db.get("users", "*", Some("age > 18"))?;
//! db.close()?;
//! # let _ = (id, rows);
//! # Ok::<(), tether_db::Error>(())
//! ```

mod clock;
mod driver;
mod error;
mod manager;
mod query;
mod sqlite;

pub use clock::{Clock, IdleTimeout, ManualClock, SystemClock};
pub use driver::{BatchResult, Cursor, Driver, DriverConnection, DriverError};
pub use error::{Error, ErrorKind};
pub use manager::{ConnectionManager, ConnectionManagerBuilder, ConnectionState, QueryOutcome};
pub use sqlite::{SqliteConnection, SqliteDriver, SqliteSettings};
