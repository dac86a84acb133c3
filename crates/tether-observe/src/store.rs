//! In-memory event log.
//!
//! [`RecordingObserver`] keeps the events it receives in an append-only
//! list with a monotonically increasing sequence number. Reads go through
//! [`RecordingObserver::query`], which filters by kind and sequence with a
//! result limit, or the shorthand accessors [`events`](RecordingObserver::events)
//! and [`count`](RecordingObserver::count).

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::event::{EventKind, LifecycleEvent};
use crate::observer::Observer;

/// One entry in a [`RecordingObserver`] log.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Position in the log, starting at 1.
    pub seq: u64,
    /// The event's kind.
    pub kind: EventKind,
    /// The full event.
    pub event: LifecycleEvent,
    /// Wall-clock time the event was recorded.
    pub occurred_at: DateTime<Utc>,
}

/// Filter criteria for [`RecordingObserver::query`].
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Only events of this kind.
    pub kind: Option<EventKind>,
    /// Only events with `seq` strictly greater than this.
    pub after_seq: Option<u64>,
    /// Maximum number of events to return (default: all).
    pub limit: Option<usize>,
}

#[derive(Debug, Default)]
struct Log {
    next_seq: u64,
    entries: VecDeque<RecordedEvent>,
}

/// An observer that records events for later inspection.
///
/// Share it with the manager through an `Arc` and keep a clone to read
/// from.
///
/// A log from [`new`](Self::new) is unbounded: it grows with every event
/// until [`clear`](Self::clear) is called. Long-running processes should
/// use [`bounded`](Self::bounded).
#[derive(Debug, Default)]
pub struct RecordingObserver {
    log: Mutex<Log>,
    capacity: Option<usize>,
}

impl RecordingObserver {
    /// Creates an empty, unbounded log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty log that keeps at most `max` events, dropping the
    /// oldest first. A `max` of zero records nothing.
    pub fn bounded(max: usize) -> Self {
        Self {
            log: Mutex::default(),
            capacity: Some(max),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        // Every mutation leaves the log consistent, so a poisoned log is intact.
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns a snapshot of every event, oldest first.
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.lock().entries.iter().map(|e| e.event.clone()).collect()
    }

    /// Returns the kinds of every event, oldest first.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.lock().entries.iter().map(|e| e.kind).collect()
    }

    /// Counts events of the given kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.lock().entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Returns events matching `filter`, oldest first.
    pub fn query(&self, filter: &EventFilter) -> Vec<RecordedEvent> {
        let log = self.lock();
        let limit = filter.limit.unwrap_or(usize::MAX);
        log.entries
            .iter()
            .filter(|e| filter.kind.map_or(true, |k| e.kind == k))
            .filter(|e| filter.after_seq.map_or(true, |s| e.seq > s))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Drops every recorded event. Sequence numbers keep increasing.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

impl Observer for RecordingObserver {
    fn on_event(&self, event: &LifecycleEvent) {
        let mut log = self.lock();
        log.next_seq += 1;
        let seq = log.next_seq;
        if let Some(max) = self.capacity {
            if max == 0 {
                return;
            }
            while log.entries.len() >= max {
                log.entries.pop_front();
            }
        }
        log.entries.push_back(RecordedEvent {
            seq,
            kind: event.kind(),
            event: event.clone(),
            occurred_at: Utc::now(),
        });
    }
}
