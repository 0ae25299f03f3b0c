//! Testing utilities for Herald.
//!
//! # Features
//!
//! - [`RecordingSink`]: A diagnostic sink that keeps everything it receives
//! - [`CallLog`]: An ordered record of listener calls, with helpers that
//!   build listeners writing into it

use crate::sinks::error_chain;
use herald_core::{Diagnostic, DiagnosticSink, Listener, Payload, Severity, TypedListener};
use std::sync::{Arc, Mutex};

// ============================================================================
// Recording Sink
// ============================================================================

/// Which kind of diagnostic was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// [`Diagnostic::MissingHub`]
    MissingHub,
    /// [`Diagnostic::RegisterMismatch`]
    RegisterMismatch,
    /// [`Diagnostic::InvokeMismatch`]
    InvokeMismatch,
    /// [`Diagnostic::ListenerFailed`]
    ListenerFailed,
    /// [`Diagnostic::InvokeTrace`]
    InvokeTrace,
}

impl DiagnosticKind {
    /// The kind of `diagnostic`.
    pub fn of(diagnostic: &Diagnostic) -> Self {
        match diagnostic {
            Diagnostic::MissingHub { .. } => DiagnosticKind::MissingHub,
            Diagnostic::RegisterMismatch(_) => DiagnosticKind::RegisterMismatch,
            Diagnostic::InvokeMismatch(_) => DiagnosticKind::InvokeMismatch,
            Diagnostic::ListenerFailed { .. } => DiagnosticKind::ListenerFailed,
            Diagnostic::InvokeTrace { .. } => DiagnosticKind::InvokeTrace,
        }
    }
}

/// A recorded diagnostic, flattened so it can be cloned and compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    /// Kind of the diagnostic.
    pub kind: DiagnosticKind,
    /// Its severity.
    pub severity: Severity,
    /// Label of the key involved.
    pub key: String,
    /// The message with its full source chain.
    pub message: String,
}

/// A sink that records every diagnostic it receives.
///
/// Clones share one record, so a clone can be handed to the hub and the
/// first one inspected afterwards.
///
/// # Example
///
/// ```rust,ignore
/// let sink = RecordingSink::new();
/// let hub = DispatchHub::builder().sink(sink.clone()).build();
///
/// hub.register_typed(&health, &on_text);
/// assert_eq!(sink.count_of(DiagnosticKind::RegisterMismatch), 1);
/// ```
#[derive(Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of the recorded diagnostics.
    pub fn records(&self) -> Vec<Recorded> {
        self.records.lock().unwrap().clone()
    }

    /// Kinds of the recorded diagnostics, in order.
    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.records.lock().unwrap().iter().map(|r| r.kind).collect()
    }

    /// Number of recorded diagnostics.
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Number of recorded diagnostics of `kind`.
    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Clear all recorded diagnostics.
    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        let record = Recorded {
            kind: DiagnosticKind::of(diagnostic),
            severity: diagnostic.severity(),
            key: diagnostic.key().to_owned(),
            message: error_chain(diagnostic),
        };
        self.records.lock().unwrap().push(record);
    }
}

// ============================================================================
// Call Log
// ============================================================================

/// An ordered log of listener calls.
///
/// # Example
///
/// ```rust,ignore
/// let log = CallLog::new();
/// hub.register(&score, &log.listener("A"));
/// hub.register(&score, &log.listener("B"));
/// hub.invoke(&score);
/// assert_eq!(log.entries(), vec!["A", "B"]);
/// ```
pub struct CallLog<E = &'static str> {
    entries: Arc<Mutex<Vec<E>>>,
}

impl<E: Clone + Send + 'static> CallLog<E> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append an entry.
    pub fn record(&self, entry: E) {
        self.entries.lock().unwrap().push(entry);
    }

    /// Get a clone of the entries.
    pub fn entries(&self) -> Vec<E> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear the log.
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// A new untyped listener that records `entry` each time it is called.
    pub fn listener(&self, entry: E) -> Listener
    where
        E: Sync,
    {
        let log = self.clone();
        Listener::new(move || log.record(entry.clone()))
    }

    /// A new typed listener that records `map(value)` each time it is called.
    pub fn typed_listener<T, F>(&self, map: F) -> TypedListener<T>
    where
        E: Sync,
        T: Payload,
        F: Fn(&T) -> E + Send + Sync + 'static,
    {
        let log = self.clone();
        TypedListener::new(move |value: &T| log.record(map(value)))
    }
}

impl<E: Clone + Send + 'static> Default for CallLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for CallLog<E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{ListenerError, Operation};

    #[test]
    fn test_recording_sink_flattens() {
        let sink = RecordingSink::new();
        let clone = sink.clone();
        clone.report(&Diagnostic::ListenerFailed {
            key: "Score".into(),
            error: ListenerError::Failed("disk full".into()),
        });
        clone.report(&Diagnostic::MissingHub {
            operation: Operation::Invoke,
            key: "Score".into(),
        });

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].severity, Severity::Error);
        assert_eq!(
            records[0].message,
            "listener for `Score` failed: listener returned an error: disk full"
        );
        assert_eq!(
            sink.kinds(),
            vec![DiagnosticKind::ListenerFailed, DiagnosticKind::MissingHub]
        );
        assert_eq!(sink.count_of(DiagnosticKind::MissingHub), 1);

        sink.clear();
        assert!(clone.is_empty());
    }

    #[test]
    fn test_call_log_listeners() {
        let log: CallLog = CallLog::new();
        let a = log.listener("A");
        let b = log.listener("B");
        a.call().unwrap();
        b.call().unwrap();
        a.call().unwrap();
        assert_eq!(log.entries(), vec!["A", "B", "A"]);

        let values: CallLog<i32> = CallLog::new();
        let doubled = values.typed_listener(|v: &i32| v * 2);
        doubled.call(&21).unwrap();
        assert_eq!(values.entries(), vec![42]);
    }
}
