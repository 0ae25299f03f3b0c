#![allow(dead_code)]

use herald::{
    DispatchHub, HubConfig, Listener, Payload, TypedListener,
    testing::{CallLog, RecordingSink},
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Hubs
// ============================================================================

/// A shared hub whose diagnostics land in the returned sink.
pub fn recording_hub() -> (Arc<DispatchHub>, RecordingSink) {
    recording_hub_with(HubConfig::new())
}

pub fn recording_hub_with(config: HubConfig) -> (Arc<DispatchHub>, RecordingSink) {
    let sink = RecordingSink::new();
    let hub = DispatchHub::builder()
        .config(config)
        .sink(sink.clone())
        .build_shared();
    (hub, sink)
}

// ============================================================================
// Listeners
// ============================================================================

/// Counts how many times its listeners ran.
#[derive(Clone, Default)]
pub struct Counter {
    pub calls: Arc<AtomicUsize>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn listener(&self) -> Listener {
        let calls = self.calls.clone();
        Listener::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    }

    pub fn typed<T: Payload>(&self) -> TypedListener<T> {
        let calls = self.calls.clone();
        TypedListener::new(move |_: &T| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// An object whose lifetime bounds the listeners attached to it.
pub struct Widget {
    pub name: &'static str,
    pub log: CallLog,
}

impl Widget {
    pub fn new(name: &'static str, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            name,
            log: log.clone(),
        })
    }

    pub fn on_event(self: &Arc<Self>) -> Listener {
        Listener::bound(self, |widget: &Widget| widget.log.record(widget.name))
    }
}

/// A listener that always returns an error.
pub fn failing(message: &'static str) -> Listener {
    Listener::new(move || Err::<(), _>(message))
}

/// A listener that always panics.
pub fn panicking(message: &'static str) -> Listener {
    Listener::new(move || -> () { panic!("{message}") })
}
