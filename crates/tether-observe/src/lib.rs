//! Lifecycle observation for Tether connection managers.
//!
//! A connection manager never configures process-wide logging. Instead it
//! reports what happens to its connection through an [`Observer`] supplied
//! at construction:
//!
//! | Kind | Emitted when |
//! |------|--------------|
//! | `CONNECTED` / `CONNECT_FAILED` | a driver connect succeeds or fails |
//! | `CONNECTION_REUSED` | `connect()` finds a live handle |
//! | `IDLE_EVICTED` | the idle check closes a stale handle |
//! | `RECONNECTING` | an operation finds no live handle |
//! | `QUERY_FAILED`, `ROLLED_BACK`, `ROLLBACK_FAILED` | a statement fails |
//! | `ROWS_WRITTEN` | a write helper commits |
//! | `CLOSED` / `CLOSE_FAILED` | the handle is closed |
//!
//! [`TracingObserver`] forwards to `tracing` and is the default.
//! [`RecordingObserver`] keeps an in-memory log for tests and diagnostics.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use tether_observe::{EventKind, LifecycleEvent, Observer, RecordingObserver};
//!
//! let recorder = Arc::new(RecordingObserver::new());
//! recorder.on_event(&LifecycleEvent::Reconnecting);
//! assert_eq!(recorder.count(EventKind::Reconnecting), 1);
//! ```

mod event;
mod observer;
mod store;

pub use event::{EventKind, LifecycleEvent, ParseEventKindError, WriteOperation};
pub use observer::{NoopObserver, Observer, TracingObserver};
pub use store::{EventFilter, RecordedEvent, RecordingObserver};

#[cfg(test)]
mod tests;
