//! The observer seam and its stock implementations.

use crate::event::LifecycleEvent;

/// Receives lifecycle events from a connection manager.
///
/// Injected at construction. Implementations must not call back into the
/// manager that emitted the event.
pub trait Observer: Send + Sync {
    /// Called synchronously, in order, for every event.
    fn on_event(&self, event: &LifecycleEvent);
}

impl<T: Observer + ?Sized> Observer for std::sync::Arc<T> {
    fn on_event(&self, event: &LifecycleEvent) {
        (**self).on_event(event);
    }
}

/// Forwards events to the `tracing` facade.
///
/// Whatever subscriber the host process installed decides where the
/// records end up; this type never installs one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Connected { host, database } => {
                tracing::info!(host = %host, database = %database, "connected to database");
            }
            LifecycleEvent::ConnectionReused => {
                tracing::debug!("using existing database connection");
            }
            LifecycleEvent::ConnectFailed { message } => {
                tracing::error!(error = %message, "failed to connect to database");
            }
            LifecycleEvent::IdleEvicted { idle_for } => {
                tracing::info!(
                    idle_ms = idle_for.as_millis() as u64,
                    "connection idle past timeout, closing"
                );
            }
            LifecycleEvent::Reconnecting => {
                tracing::info!("reconnecting to database");
            }
            LifecycleEvent::QueryFailed { message } => {
                tracing::error!(error = %message, "query failed");
            }
            LifecycleEvent::RolledBack => {
                tracing::debug!("transaction rolled back");
            }
            LifecycleEvent::RollbackFailed { message } => {
                tracing::warn!(error = %message, "rollback after failed query also failed");
            }
            LifecycleEvent::RowsWritten {
                operation,
                table,
                rows,
            } => {
                tracing::info!(
                    operation = operation.as_str(),
                    table = %table,
                    rows,
                    "write committed"
                );
            }
            LifecycleEvent::Closed => {
                tracing::info!("database connection closed");
            }
            LifecycleEvent::CloseFailed { message } => {
                tracing::warn!(error = %message, "error while closing database connection");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_event(&self, _event: &LifecycleEvent) {}
}
