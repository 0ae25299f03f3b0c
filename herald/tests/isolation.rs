//! Listener failures are reported and never stop the pass.

mod common;

use common::{Counter, failing, panicking, recording_hub};
use herald::{
    DispatchKey, Listener, Severity, TypedKey, TypedListener,
    testing::{CallLog, DiagnosticKind},
};
use std::{error::Error, fmt};

#[derive(Debug)]
struct OutOfAmmo {
    weapon: &'static str,
}

impl fmt::Display for OutOfAmmo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is out of ammo", self.weapon)
    }
}

impl Error for OutOfAmmo {}

#[test]
fn test_error_does_not_stop_later_listeners() {
    let (hub, sink) = recording_hub();
    let key = DispatchKey::new("Fire");
    let log = CallLog::new();

    hub.register(&key, &log.listener("before"));
    hub.register(&key, &failing("jammed"));
    hub.register(&key, &log.listener("after"));

    let report = hub.invoke(&key);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(log.entries(), vec!["before", "after"]);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, DiagnosticKind::ListenerFailed);
    assert_eq!(records[0].severity, Severity::Error);
    assert_eq!(
        records[0].message,
        "listener for `Fire` failed: listener returned an error: jammed"
    );
}

#[test]
fn test_panic_is_isolated() {
    let (hub, sink) = recording_hub();
    let key = DispatchKey::new("Fire");
    let counter = Counter::new();

    hub.register(&key, &panicking("kaboom"));
    hub.register(&key, &counter.listener());

    let report = hub.invoke(&key);
    assert_eq!(report.failed, 1);
    assert_eq!(report.delivered, 1);
    assert_eq!(counter.get(), 1);
    assert_eq!(
        sink.records()[0].message,
        "listener for `Fire` failed: listener panicked: kaboom"
    );

    // The hub is still usable and the panicking listener stays registered.
    let report = hub.invoke(&key);
    assert_eq!(report.failed, 1);
    assert_eq!(counter.get(), 2);
    assert_eq!(hub.listener_count(&key), 2);
}

#[test]
fn test_typed_error_carries_source_chain() {
    let (hub, sink) = recording_hub();
    let key = TypedKey::<&'static str>::new("Weapon");

    let picky = TypedListener::new(|weapon: &&'static str| {
        if weapon.starts_with('r') {
            Err(OutOfAmmo { weapon: *weapon })
        } else {
            Ok(())
        }
    });
    hub.register_to(&key, &picky);

    let report = hub.invoke_with(&key, "pistol");
    assert_eq!(report.delivered, 1);

    let report = hub.invoke_with(&key, "rifle");
    assert_eq!(report.failed, 1);
    assert_eq!(
        sink.records()[0].message,
        "listener for `Weapon` failed: listener returned an error: rifle is out of ammo"
    );
}

#[test]
fn test_every_listener_failing() {
    let (hub, sink) = recording_hub();
    let key = DispatchKey::new("Chaos");

    hub.register(&key, &failing("one"));
    hub.register(&key, &panicking("two"));
    hub.register(&key, &Listener::new(|| Err::<(), _>(OutOfAmmo { weapon: "three" })));

    let report = hub.invoke(&key);
    assert_eq!(report.failed, 3);
    assert_eq!(report.delivered, 0);
    assert_eq!(sink.count_of(DiagnosticKind::ListenerFailed), 3);
}
