//! Invoke tracing and diagnostic routing.

mod common;

use common::{Counter, recording_hub, recording_hub_with};
use herald::{
    Diagnostic, DispatchHub, DispatchKey, HubConfig, KeyFlags, Severity, TypedKey,
    testing::DiagnosticKind,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

#[test]
fn test_flagged_key_traces_invokes() {
    let (hub, sink) = recording_hub();
    let quiet = DispatchKey::new("Quiet");
    let loud = DispatchKey::new("Loud").with_flags(KeyFlags::TRACE_INVOKES);

    hub.invoke(&quiet);
    hub.invoke(&loud);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, DiagnosticKind::InvokeTrace);
    assert_eq!(records[0].severity, Severity::Debug);
    assert_eq!(records[0].message, "event `Loud` invoked");
}

#[test]
fn test_trace_renders_payload() {
    let (hub, sink) = recording_hub();
    let health = TypedKey::with_default("Health", 100_i32).with_flags(KeyFlags::TRACE_INVOKES);
    let counter = Counter::new();
    hub.register_to(&health, &counter.typed());

    hub.invoke_with(&health, 5);
    hub.invoke_default(&health);

    let messages: Vec<_> = sink.records().into_iter().map(|r| r.message).collect();
    assert_eq!(
        messages,
        vec!["event `Health` invoked with 5", "event `Health` invoked with 100"]
    );
    assert_eq!(counter.get(), 2);
}

#[test]
fn test_aborted_invoke_is_not_traced() {
    let (hub, sink) = recording_hub();
    let key = DispatchKey::new("Strict").with_flags(KeyFlags::TRACE_INVOKES);
    hub.register_typed(&key, &Counter::new().typed::<u8>());

    hub.invoke_typed(&key, 1_i64);
    hub.invoke(&key);
    assert_eq!(
        sink.kinds(),
        vec![DiagnosticKind::InvokeMismatch, DiagnosticKind::InvokeMismatch]
    );

    sink.clear();
    hub.invoke_typed(&key, 1_u8);
    assert_eq!(sink.kinds(), vec![DiagnosticKind::InvokeTrace]);
}

#[test]
fn test_default_invoke_is_traced_with_payload() {
    let (hub, sink) = recording_hub();
    let health = TypedKey::with_default("Health", 100_i32).with_flags(KeyFlags::TRACE_INVOKES);

    // Traced even before anything listens.
    hub.invoke(&health);
    hub.register_to(&health, &Counter::new().typed());
    hub.invoke(&health);

    let messages: Vec<_> = sink.records().into_iter().map(|r| r.message).collect();
    assert_eq!(
        messages,
        vec!["event `Health` invoked with 100", "event `Health` invoked with 100"]
    );
}

#[test]
fn test_trace_toggled_at_runtime() {
    let (hub, sink) = recording_hub();
    let key = DispatchKey::new("Toggle");

    hub.invoke(&key);
    key.set_trace_invokes(true);
    hub.invoke(&key.clone());
    key.set_trace_invokes(false);
    hub.invoke(&key);

    assert_eq!(sink.count_of(DiagnosticKind::InvokeTrace), 1);
}

#[test]
fn test_trace_all() {
    let (hub, sink) = recording_hub_with(HubConfig::new().with_trace_all(true));
    hub.invoke(&DispatchKey::new("A"));
    hub.invoke_with(&TypedKey::<bool>::new("B"), true);

    assert_eq!(
        sink.kinds(),
        vec![DiagnosticKind::InvokeTrace, DiagnosticKind::InvokeTrace]
    );
}

#[test]
fn test_closure_sink() {
    let seen = Arc::new(AtomicUsize::new(0));
    let hub = {
        let seen = seen.clone();
        DispatchHub::builder()
            .sink(move |diagnostic: &Diagnostic| {
                if diagnostic.severity() == Severity::Error {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
            })
            .build()
    };

    let key = DispatchKey::new("Mixed");
    hub.register_typed(&key, &Counter::new().typed::<u8>());
    hub.register_typed(&key, &Counter::new().typed::<i8>());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[cfg(feature = "tracing")]
#[test]
fn test_default_sink_logs_through_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let hub = DispatchHub::new();
        let key = DispatchKey::new("Logged").with_flags(KeyFlags::TRACE_INVOKES);
        hub.register(&key, &common::failing("nope"));
        hub.invoke(&key);
        hub.invoke_typed(&key, 1_u32);
    });
}
