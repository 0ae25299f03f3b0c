//! The dispatch hub: registry and dispatcher for event channels.
//!
//! The hub maps each [`DispatchKey`] to an ordered sequence of listeners.
//! A key is either unbound, bound untyped (listeners take no payload), or
//! bound typed with one payload type `T`. The binding is established by the
//! first registration and released when the sequence empties. Using a key as
//! a channel other than the one it is bound (or declared) as is rejected and
//! reported to the diagnostic sink.
//!
//! # Invoke passes
//!
//! An invoke visits the slots that existed when it started, in registration
//! order. The table lock is released around every listener call, so a
//! listener may register, unregister or invoke anything, including its own
//! key:
//!
//! - a listener removed before the pass reaches it is not called;
//! - no listener is called twice in one pass;
//! - listeners registered during the pass are not called until the next one;
//! - owner-bound listeners whose owner is gone are pruned when reached.
//!
//! A listener failure (an `Err` return or a panic) is reported and the pass
//! continues. Nothing is ever returned to the invoker as an error.

mod builder;
mod sequence;
mod tables;

pub use builder::HubBuilder;

use crate::config::HubConfig;
use herald_core::{
    AnyPayload, BoxError, Channel, ChannelMismatch, Diagnostic, DiagnosticSink, DispatchKey, KeyId,
    Listener, ListenerError, Payload, TypedKey, TypedListener,
};
use sequence::{Sequence, Visit};
use std::{
    fmt,
    marker::PhantomData,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tables::{Binding, Tables};

/// What a registration call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The listener was appended to the key's sequence.
    Added,
    /// The same listener was already registered; nothing changed.
    AlreadyRegistered,
    /// The key is bound to a different channel; a diagnostic was reported.
    Rejected,
}

impl RegisterOutcome {
    /// Whether the listener is registered after the call.
    pub fn is_registered(self) -> bool {
        !matches!(self, RegisterOutcome::Rejected)
    }
}

/// Summary of one invoke pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that ran to completion.
    pub delivered: usize,
    /// Listeners that returned an error or panicked.
    pub failed: usize,
    /// Owner-bound listeners dropped because their owner no longer exists.
    pub pruned: usize,
}

impl DispatchReport {
    /// Number of listeners that were called.
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Registry and dispatcher for event channels.
///
/// All methods take `&self`; the tables are guarded by a single mutex that
/// is never held while a listener runs.
///
/// # Example
/// ```ignore
/// let hub = DispatchHub::new();
/// let score = DispatchKey::new("Score");
/// let on_score = Listener::new(|| println!("scored"));
///
/// hub.register(&score, &on_score);
/// hub.invoke(&score);
/// hub.unregister(&score, &on_score);
/// ```
pub struct DispatchHub {
    tables: Mutex<Tables>,
    sink: Arc<dyn DiagnosticSink>,
    config: HubConfig,
}

impl DispatchHub {
    /// Create a hub with the default config and sink.
    pub fn new() -> Self {
        HubBuilder::new().build()
    }

    /// Start building a hub.
    pub fn builder() -> HubBuilder {
        HubBuilder::new()
    }

    pub(crate) fn from_parts(config: HubConfig, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            tables: Mutex::new(Tables::with_capacity(config.initial_capacity)),
            sink,
            config,
        }
    }

    /// The hub's configuration.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Listeners never run under the lock, so a poisoned table is still consistent.
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(&diagnostic);
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register an untyped listener under `key`.
    ///
    /// Registering the same handle twice is a no-op. A key that is bound or
    /// declared typed rejects the registration.
    pub fn register(&self, key: &DispatchKey, listener: &Listener) -> RegisterOutcome {
        let bound = {
            let mut guard = self.lock();
            let tables = &mut *guard;
            admit(tables, key, Channel::Untyped).map(|()| {
                tables
                    .untyped_or_insert(key.id(), self.config.sequence_capacity)
                    .push(listener.clone())
            })
        };
        self.settle(bound)
    }

    /// Register a listener for payload type `T` under `key`.
    ///
    /// The first typed registration binds the key to `T`. Any other payload
    /// type, or an untyped binding, rejects the registration.
    pub fn register_typed<T: Payload>(
        &self,
        key: &DispatchKey,
        listener: &TypedListener<T>,
    ) -> RegisterOutcome {
        let attempted = Channel::typed::<T>();
        let bound = {
            let mut guard = self.lock();
            let tables = &mut *guard;
            admit(tables, key, attempted).and_then(|()| {
                let entry = tables.typed_or_insert::<T>(key.id(), self.config.sequence_capacity);
                let tag = entry.tag();
                match entry.sequence_mut::<T>() {
                    Some(seq) => Ok(seq.push(listener.clone())),
                    None => Err(mismatch(key, Channel::Typed(tag), attempted)),
                }
            })
        };
        self.settle(bound)
    }

    /// Register a listener under a typed key.
    pub fn register_to<T: Payload>(
        &self,
        key: &TypedKey<T>,
        listener: &TypedListener<T>,
    ) -> RegisterOutcome {
        self.register_typed(key.key(), listener)
    }

    fn settle(&self, bound: Result<bool, ChannelMismatch>) -> RegisterOutcome {
        match bound {
            Ok(true) => RegisterOutcome::Added,
            Ok(false) => RegisterOutcome::AlreadyRegistered,
            Err(mismatch) => {
                self.report(Diagnostic::RegisterMismatch(mismatch));
                RegisterOutcome::Rejected
            }
        }
    }

    /// Remove an untyped listener from `key`. Returns whether it was registered.
    pub fn unregister(&self, key: &DispatchKey, listener: &Listener) -> bool {
        self.unbind(key.id(), listener)
    }

    /// Remove a typed listener from `key`. Returns whether it was registered.
    pub fn unregister_typed<T: Payload>(&self, key: &DispatchKey, listener: &TypedListener<T>) -> bool {
        self.unbind(key.id(), listener)
    }

    /// Remove a listener from a typed key.
    pub fn unregister_from<T: Payload>(&self, key: &TypedKey<T>, listener: &TypedListener<T>) -> bool {
        self.unbind(key.id(), listener)
    }

    fn unbind<L: Binding>(&self, id: KeyId, listener: &L) -> bool {
        let mut guard = self.lock();
        let tables = &mut *guard;
        let Some(seq) = L::sequence(tables, id) else {
            return false;
        };
        let removed = seq.remove(listener);
        if seq.is_empty() && seq.is_idle() {
            L::release(tables, id);
        }
        removed
    }

    // ------------------------------------------------------------------
    // Invocation
    // ------------------------------------------------------------------

    /// Invoke `key` without a value.
    ///
    /// An untyped key calls every listener in registration order. A typed key
    /// built with a default payload delivers that default. A typed key
    /// without one is a mismatch.
    pub fn invoke(&self, key: &DispatchKey) -> DispatchReport {
        if let Some(default) = key.default_payload() {
            return self.dispatch_erased(key, default);
        }
        self.run_pass::<Listener>(key, Channel::Untyped, || None, |listener| {
            listener.try_call()
        })
    }

    /// Invoke `key` as a typed channel carrying `value`.
    pub fn invoke_typed<T: Payload>(&self, key: &DispatchKey, value: T) -> DispatchReport {
        self.dispatch(key, &value)
    }

    /// Invoke a typed key with an explicit value.
    pub fn invoke_with<T: Payload>(&self, key: &TypedKey<T>, value: T) -> DispatchReport {
        self.dispatch(key.key(), &value)
    }

    /// Invoke a typed key with its declared default payload.
    ///
    /// A key without a default is ignored.
    pub fn invoke_default<T: Payload>(&self, key: &TypedKey<T>) -> DispatchReport {
        match key.default_value() {
            Some(value) => self.dispatch(key.key(), value),
            None => DispatchReport::default(),
        }
    }

    fn dispatch<T: Payload>(&self, key: &DispatchKey, value: &T) -> DispatchReport {
        self.run_pass::<TypedListener<T>>(
            key,
            Channel::typed::<T>(),
            || Some(format!("{value:?}")),
            |listener| listener.try_call(value),
        )
    }

    /// Deliver a default payload whose type is only known at runtime.
    fn dispatch_erased(&self, key: &DispatchKey, value: &dyn AnyPayload) -> DispatchReport {
        let deliver = self.lock().deliver(key.id());
        match deliver {
            Some(deliver) => deliver(self, key, value),
            // No typed sequence means no listeners; only the checks remain.
            None => self.run_pass::<Listener>(
                key,
                Channel::Typed(value.payload_tag()),
                || Some(format!("{value:?}")),
                |_| None,
            ),
        }
    }

    fn traces(&self, key: &DispatchKey) -> bool {
        self.config.trace_all || key.trace_invokes()
    }

    fn run_pass<L: Binding>(
        &self,
        key: &DispatchKey,
        attempted: Channel,
        describe: impl FnOnce() -> Option<String>,
        call: impl Fn(&L) -> Option<Result<(), BoxError>>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let id = key.id();

        let begun = {
            let mut guard = self.lock();
            let tables = &mut *guard;
            admit(tables, key, attempted).map(|()| L::sequence(tables, id).map(Sequence::begin_pass))
        };
        let len = match begun {
            Ok(len) => len,
            Err(mismatch) => {
                self.report(Diagnostic::InvokeMismatch(mismatch));
                return report;
            }
        };
        let _pass = len.map(|_| PassGuard::<L> {
            hub: self,
            id,
            _marker: PhantomData,
        });
        if self.traces(key) {
            self.report(Diagnostic::InvokeTrace {
                key: key.label().to_owned(),
                payload: describe(),
            });
        }
        let Some(len) = len else {
            return report;
        };

        for index in 0..len {
            let visit = match L::sequence(&mut self.lock(), id) {
                Some(seq) => seq.visit(index),
                None => break,
            };
            let listener = match visit {
                Visit::Call(listener) => listener,
                Visit::Pruned => {
                    report.pruned += 1;
                    continue;
                }
                Visit::Skip => continue,
            };
            match self.guarded(|| call(&listener)) {
                Some(Ok(())) => report.delivered += 1,
                Some(Err(error)) => {
                    report.failed += 1;
                    self.report(Diagnostic::ListenerFailed {
                        key: key.label().to_owned(),
                        error,
                    });
                }
                // The owner went away after the liveness check.
                None => {
                    report.pruned += 1;
                    if let Some(seq) = L::sequence(&mut self.lock(), id) {
                        seq.remove(&listener);
                    }
                }
            }
        }
        report
    }

    fn guarded(
        &self,
        call: impl FnOnce() -> Option<Result<(), BoxError>>,
    ) -> Option<Result<(), ListenerError>> {
        if !self.config.catch_panics {
            return call().map(|result| result.map_err(ListenerError::Failed));
        }
        match panic::catch_unwind(AssertUnwindSafe(call)) {
            Ok(attempt) => attempt.map(|result| result.map_err(ListenerError::Failed)),
            Err(payload) => Some(Err(ListenerError::from_panic(&*payload))),
        }
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// The channel `key` is currently bound as, or `None` when unbound.
    pub fn channel(&self, key: &DispatchKey) -> Option<Channel> {
        self.lock().channel(key.id())
    }

    /// Number of listeners registered under `key`.
    pub fn listener_count(&self, key: &DispatchKey) -> usize {
        self.lock().listener_count(key.id())
    }

    /// Whether `listener` is registered under `key`.
    pub fn is_registered(&self, key: &DispatchKey, listener: &Listener) -> bool {
        Listener::sequence(&mut self.lock(), key.id()).is_some_and(|seq| seq.contains(listener))
    }

    /// Whether the typed `listener` is registered under `key`.
    pub fn is_registered_typed<T: Payload>(
        &self,
        key: &DispatchKey,
        listener: &TypedListener<T>,
    ) -> bool {
        TypedListener::<T>::sequence(&mut self.lock(), key.id())
            .is_some_and(|seq| seq.contains(listener))
    }

    /// Number of bound keys.
    pub fn key_count(&self) -> usize {
        self.lock().key_count()
    }

    /// Whether no key is bound.
    pub fn is_empty(&self) -> bool {
        self.key_count() == 0
    }

    /// Drop every registration. Keys with a pass in progress are released
    /// when the pass ends.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for DispatchHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DispatchHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchHub")
            .field("keys", &self.key_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Ends a pass on drop, so an unwinding listener cannot leave a sequence
/// stuck in tombstone mode.
struct PassGuard<'h, L: Binding> {
    hub: &'h DispatchHub,
    id: KeyId,
    _marker: PhantomData<fn() -> L>,
}

impl<L: Binding> Drop for PassGuard<'_, L> {
    fn drop(&mut self) {
        let mut guard = self.hub.lock();
        let tables = &mut *guard;
        let release = match L::sequence(tables, self.id) {
            Some(seq) => {
                seq.end_pass();
                seq.is_empty() && seq.is_idle()
            }
            None => false,
        };
        if release {
            L::release(tables, self.id);
        }
    }
}

/// Runs a typed pass for a payload behind `&dyn AnyPayload`.
pub(crate) type Deliver = fn(&DispatchHub, &DispatchKey, &dyn AnyPayload) -> DispatchReport;

fn deliver_erased<T: Payload>(
    hub: &DispatchHub,
    key: &DispatchKey,
    value: &dyn AnyPayload,
) -> DispatchReport {
    match value.downcast_ref::<T>() {
        Some(value) => hub.dispatch(key, value),
        None => {
            hub.report(Diagnostic::InvokeMismatch(mismatch(
                key,
                Channel::typed::<T>(),
                Channel::Typed(value.payload_tag()),
            )));
            DispatchReport::default()
        }
    }
}

fn mismatch(key: &DispatchKey, bound: Channel, attempted: Channel) -> ChannelMismatch {
    ChannelMismatch {
        key: key.label().to_owned(),
        bound,
        attempted,
    }
}

/// Check `attempted` against the key's declared payload and its current binding.
fn admit(tables: &Tables, key: &DispatchKey, attempted: Channel) -> Result<(), ChannelMismatch> {
    if let Some(tag) = key.declared_payload() {
        let declared = Channel::Typed(tag);
        if declared != attempted {
            return Err(mismatch(key, declared, attempted));
        }
    }
    match tables.channel(key.id()) {
        Some(bound) if bound != attempted => Err(mismatch(key, bound, attempted)),
        _ => Ok(()),
    }
}
