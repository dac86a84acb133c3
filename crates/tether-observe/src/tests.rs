//! Unit tests for lifecycle events and the recording observer.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::event::{EventKind, LifecycleEvent, WriteOperation};
use crate::observer::{NoopObserver, Observer, TracingObserver};
use crate::store::{EventFilter, RecordingObserver};

fn written(rows: u64) -> LifecycleEvent {
    LifecycleEvent::RowsWritten {
        operation: WriteOperation::Insert,
        table: "users".to_string(),
        rows,
    }
}

// ── EventKind ────────────────────────────────────────────────────────

#[test]
fn kind_labels_parse_back() {
    for kind in [
        EventKind::Connected,
        EventKind::ConnectionReused,
        EventKind::ConnectFailed,
        EventKind::IdleEvicted,
        EventKind::Reconnecting,
        EventKind::QueryFailed,
        EventKind::RolledBack,
        EventKind::RollbackFailed,
        EventKind::RowsWritten,
        EventKind::Closed,
        EventKind::CloseFailed,
    ] {
        let parsed = EventKind::from_str(kind.as_str()).expect("label should parse");
        assert_eq!(parsed, kind);
        assert_eq!(kind.to_string(), kind.as_str());
    }
}

#[test]
fn unknown_kind_is_rejected() {
    let err = EventKind::from_str("EXPLODED").expect_err("unknown label should fail");
    assert_eq!(err.to_string(), "unknown event kind: EXPLODED");
}

#[test]
fn failure_kinds() {
    assert!(EventKind::ConnectFailed.is_failure());
    assert!(EventKind::RollbackFailed.is_failure());
    assert!(!EventKind::RolledBack.is_failure());
    assert!(!EventKind::IdleEvicted.is_failure());
}

#[test]
fn event_reports_its_kind() {
    assert_eq!(written(1).kind(), EventKind::RowsWritten);
    assert_eq!(
        LifecycleEvent::IdleEvicted {
            idle_for: Duration::from_secs(301)
        }
        .kind(),
        EventKind::IdleEvicted
    );
}

#[test]
fn event_serializes_with_tag() {
    let json = serde_json::to_value(written(3)).expect("event should serialize");
    assert_eq!(json["event"], "ROWS_WRITTEN");
    assert_eq!(json["operation"], "insert");
    assert_eq!(json["table"], "users");
    assert_eq!(json["rows"], 3);
}

// ── RecordingObserver ────────────────────────────────────────────────

#[test]
fn recorder_keeps_order_and_counts() {
    let recorder = RecordingObserver::new();
    assert!(recorder.is_empty());

    recorder.on_event(&LifecycleEvent::Reconnecting);
    recorder.on_event(&LifecycleEvent::Connected {
        host: "localhost".into(),
        database: "app".into(),
    });
    recorder.on_event(&written(2));
    recorder.on_event(&written(5));

    assert_eq!(recorder.len(), 4);
    assert_eq!(
        recorder.kinds(),
        vec![
            EventKind::Reconnecting,
            EventKind::Connected,
            EventKind::RowsWritten,
            EventKind::RowsWritten,
        ]
    );
    assert_eq!(recorder.count(EventKind::RowsWritten), 2);
    assert_eq!(recorder.count(EventKind::Closed), 0);
    assert_eq!(recorder.events()[3], written(5));
}

#[test]
fn query_filters_by_kind_seq_and_limit() {
    let recorder = RecordingObserver::new();
    for rows in 1..=5 {
        recorder.on_event(&written(rows));
        recorder.on_event(&LifecycleEvent::RolledBack);
    }

    let writes = recorder.query(&EventFilter {
        kind: Some(EventKind::RowsWritten),
        ..Default::default()
    });
    assert_eq!(writes.len(), 5);
    assert!(writes.iter().all(|e| e.kind == EventKind::RowsWritten));

    let later = recorder.query(&EventFilter {
        kind: Some(EventKind::RowsWritten),
        after_seq: Some(4),
        limit: Some(2),
    });
    let seqs: Vec<u64> = later.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![5, 7]);
    assert_eq!(later[0].event, written(3));
}

#[test]
fn clear_keeps_sequence_monotonic() {
    let recorder = RecordingObserver::new();
    recorder.on_event(&LifecycleEvent::Closed);
    recorder.on_event(&LifecycleEvent::Closed);
    recorder.clear();
    assert!(recorder.is_empty());

    recorder.on_event(&LifecycleEvent::Closed);
    let all = recorder.query(&EventFilter::default());
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].seq, 3, "sequence should not restart after clear");
}

#[test]
fn bounded_log_drops_oldest() {
    let recorder = RecordingObserver::bounded(3);
    for rows in 1..=5 {
        recorder.on_event(&written(rows));
    }

    assert_eq!(recorder.len(), 3);
    let seqs: Vec<u64> = recorder
        .query(&EventFilter::default())
        .iter()
        .map(|e| e.seq)
        .collect();
    assert_eq!(seqs, vec![3, 4, 5]);
    assert_eq!(recorder.events()[0], written(3));

    let silent = RecordingObserver::bounded(0);
    silent.on_event(&LifecycleEvent::Closed);
    assert!(silent.is_empty());
}

#[test]
fn arc_forwards_to_inner_observer() {
    let recorder = Arc::new(RecordingObserver::new());
    let shared: Arc<dyn Observer> = recorder.clone();
    shared.on_event(&LifecycleEvent::ConnectionReused);
    assert_eq!(recorder.count(EventKind::ConnectionReused), 1);
}

#[test]
fn stock_observers_accept_every_event() {
    let events = [
        LifecycleEvent::Connected {
            host: "h".into(),
            database: "d".into(),
        },
        LifecycleEvent::ConnectionReused,
        LifecycleEvent::ConnectFailed {
            message: "refused".into(),
        },
        LifecycleEvent::IdleEvicted {
            idle_for: Duration::from_millis(10),
        },
        LifecycleEvent::Reconnecting,
        LifecycleEvent::QueryFailed {
            message: "syntax".into(),
        },
        LifecycleEvent::RolledBack,
        LifecycleEvent::RollbackFailed {
            message: "gone".into(),
        },
        written(1),
        LifecycleEvent::Closed,
        LifecycleEvent::CloseFailed {
            message: "io".into(),
        },
    ];
    for event in &events {
        TracingObserver.on_event(event);
        NoopObserver.on_event(event);
    }
}
