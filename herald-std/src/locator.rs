//! Process-wide hub slot.
//!
//! Passing an `Arc<DispatchHub>` explicitly is the primary API. The locator
//! exists for hosts whose producers and consumers cannot be handed the hub
//! directly. It holds at most one hub, weakly, so a lookup never yields a hub
//! that has been torn down.
//!
//! # Example
//!
//! ```rust,ignore
//! let hub = DispatchHub::builder().build_shared();
//! let _installed = locator::install(&hub)?;
//!
//! // Anywhere else in the process:
//! locator::invoke(&score);
//! ```
//!
//! Producers and consumers going through the locator report a
//! [`Diagnostic::MissingHub`] warning to the fallback sink when no hub is
//! installed.

use crate::{
    hub::{DispatchHub, DispatchReport, RegisterOutcome},
    sinks::default_sink,
};
use herald_core::{
    Diagnostic, DiagnosticSink, DispatchKey, Listener, LocatorError, Operation, Payload, TypedKey,
    TypedListener,
};
use std::sync::{Arc, PoisonError, RwLock, Weak};

static SLOT: RwLock<Option<Weak<DispatchHub>>> = RwLock::new(None);
static FALLBACK: RwLock<Option<Arc<dyn DiagnosticSink>>> = RwLock::new(None);

/// Keeps a hub installed in the slot. Dropping it empties the slot.
#[must_use = "dropping the guard uninstalls the hub"]
#[derive(Debug)]
pub struct LocatorGuard {
    hub: Weak<DispatchHub>,
}

impl LocatorGuard {
    /// Empty the slot now.
    pub fn uninstall(self) {}
}

impl Drop for LocatorGuard {
    fn drop(&mut self) {
        let mut slot = SLOT.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|installed| installed.ptr_eq(&self.hub)) {
            *slot = None;
        }
    }
}

/// Install `hub` as the process-wide hub.
///
/// Fails if another live hub is installed. A slot whose hub has been
/// dropped counts as empty.
pub fn install(hub: &Arc<DispatchHub>) -> Result<LocatorGuard, LocatorError> {
    let mut slot = SLOT.write().unwrap_or_else(PoisonError::into_inner);
    if slot.as_ref().and_then(Weak::upgrade).is_some() {
        return Err(LocatorError::AlreadyInstalled);
    }
    let hub = Arc::downgrade(hub);
    *slot = Some(hub.clone());
    Ok(LocatorGuard { hub })
}

/// The installed hub, if one is installed and still alive.
pub fn current() -> Option<Arc<DispatchHub>> {
    SLOT.read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .and_then(Weak::upgrade)
}

/// Whether a live hub is installed.
pub fn is_installed() -> bool {
    current().is_some()
}

/// Replace the sink that receives diagnostics raised while no hub is installed.
///
/// Without one, [`default_sink`] is used.
pub fn set_fallback_sink(sink: Arc<dyn DiagnosticSink>) {
    *FALLBACK.write().unwrap_or_else(PoisonError::into_inner) = Some(sink);
}

/// Restore the default fallback sink.
pub fn reset_fallback_sink() {
    *FALLBACK.write().unwrap_or_else(PoisonError::into_inner) = None;
}

fn fallback_sink() -> Arc<dyn DiagnosticSink> {
    FALLBACK
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_else(default_sink)
}

fn with_hub<R>(operation: Operation, key: &DispatchKey, f: impl FnOnce(&DispatchHub) -> R) -> Option<R> {
    match current() {
        Some(hub) => Some(f(&hub)),
        None => {
            fallback_sink().report(&Diagnostic::MissingHub {
                operation,
                key: key.label().to_owned(),
            });
            None
        }
    }
}

/// Invoke an untyped key on the installed hub.
pub fn invoke(key: &DispatchKey) -> Option<DispatchReport> {
    with_hub(Operation::Invoke, key, |hub| hub.invoke(key))
}

/// Invoke `key` as a typed channel carrying `value` on the installed hub.
pub fn invoke_typed<T: Payload>(key: &DispatchKey, value: T) -> Option<DispatchReport> {
    with_hub(Operation::Invoke, key, |hub| hub.invoke_typed(key, value))
}

/// Invoke a typed key with `value` on the installed hub.
pub fn invoke_with<T: Payload>(key: &TypedKey<T>, value: T) -> Option<DispatchReport> {
    with_hub(Operation::Invoke, key, |hub| hub.invoke_with(key, value))
}

/// Invoke a typed key with its default payload on the installed hub.
pub fn invoke_default<T: Payload>(key: &TypedKey<T>) -> Option<DispatchReport> {
    with_hub(Operation::Invoke, key, |hub| hub.invoke_default(key))
}

/// Register an untyped listener on the installed hub.
pub fn register(key: &DispatchKey, listener: &Listener) -> Option<RegisterOutcome> {
    with_hub(Operation::Register, key, |hub| hub.register(key, listener))
}

/// Register a typed listener on the installed hub.
pub fn register_typed<T: Payload>(
    key: &DispatchKey,
    listener: &TypedListener<T>,
) -> Option<RegisterOutcome> {
    with_hub(Operation::Register, key, |hub| hub.register_typed(key, listener))
}

/// Register a listener under a typed key on the installed hub.
pub fn register_to<T: Payload>(key: &TypedKey<T>, listener: &TypedListener<T>) -> Option<RegisterOutcome> {
    with_hub(Operation::Register, key, |hub| hub.register_to(key, listener))
}

/// Unregister an untyped listener from the installed hub.
///
/// With no hub installed there is nothing to unregister from, so this is
/// silent.
pub fn unregister(key: &DispatchKey, listener: &Listener) -> bool {
    current().is_some_and(|hub| hub.unregister(key, listener))
}

/// Unregister a typed listener from the installed hub.
pub fn unregister_typed<T: Payload>(key: &DispatchKey, listener: &TypedListener<T>) -> bool {
    current().is_some_and(|hub| hub.unregister_typed(key, listener))
}

/// Unregister a listener from a typed key on the installed hub.
pub fn unregister_from<T: Payload>(key: &TypedKey<T>, listener: &TypedListener<T>) -> bool {
    current().is_some_and(|hub| hub.unregister_from(key, listener))
}
