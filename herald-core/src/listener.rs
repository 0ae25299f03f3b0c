//! # Listener handles
//!
//! Closures have no identity of their own, so the hub never stores bare
//! closures. A listener is wrapped once in a handle ([`Listener`] or
//! [`TypedListener<T>`]); clones of that handle share one identity, and that
//! identity is what registration, coalescing and unregistration compare.
//!
//! A listener body may return `()` or `Result<(), E>` for any error that
//! converts into [`BoxError`] (see [`ListenerOutcome`]).
//!
//! # Owner-bound listeners
//!
//! [`Listener::bound`] ties a listener to an `Arc<O>` it does not keep alive.
//! Once the owner is dropped the handle reports itself dead and the hub
//! prunes it on the next invoke pass.

use crate::{error::BoxError, payload::Payload};
use std::{
    fmt,
    marker::PhantomData,
    sync::{Arc, Weak},
};

/// Conversion from a listener's return value into a call result.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid listener return type",
    label = "listeners return `()` or `Result<(), E>`",
    note = "The error type must convert into `BoxError`."
)]
pub trait ListenerOutcome {
    /// Convert into a call result.
    fn into_result(self) -> Result<(), BoxError>;
}

impl ListenerOutcome for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> ListenerOutcome for Result<(), E> {
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// Identity and liveness shared by both listener handle kinds.
pub trait ListenerHandle: Clone + Send + Sync + 'static {
    /// Whether `self` and `other` are the same registration identity.
    fn same(&self, other: &Self) -> bool;

    /// Whether the listener's owner still exists.
    fn is_alive(&self) -> bool;
}

/// A call result, or `None` when the listener's owner is gone.
type Attempt = Option<Result<(), BoxError>>;

trait Callback: Send + Sync + 'static {
    fn call(&self) -> Attempt;

    fn is_alive(&self) -> bool {
        true
    }
}

trait TypedCallback<T>: Send + Sync + 'static {
    fn call(&self, value: &T) -> Attempt;

    fn is_alive(&self) -> bool {
        true
    }
}

struct FnCallback<F, R> {
    f: F,
    _marker: PhantomData<fn() -> R>,
}

impl<F, R> Callback for FnCallback<F, R>
where
    F: Fn() -> R + Send + Sync + 'static,
    R: ListenerOutcome + 'static,
{
    fn call(&self) -> Attempt {
        Some((self.f)().into_result())
    }
}

impl<T, F, R> TypedCallback<T> for FnCallback<F, R>
where
    T: Payload,
    F: Fn(&T) -> R + Send + Sync + 'static,
    R: ListenerOutcome + 'static,
{
    fn call(&self, value: &T) -> Attempt {
        Some((self.f)(value).into_result())
    }
}

struct BoundCallback<O, F, R> {
    owner: Weak<O>,
    f: F,
    _marker: PhantomData<fn() -> R>,
}

impl<O, F, R> Callback for BoundCallback<O, F, R>
where
    O: Send + Sync + 'static,
    F: Fn(&O) -> R + Send + Sync + 'static,
    R: ListenerOutcome + 'static,
{
    fn call(&self) -> Attempt {
        let owner = self.owner.upgrade()?;
        Some((self.f)(&owner).into_result())
    }

    fn is_alive(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

impl<T, O, F, R> TypedCallback<T> for BoundCallback<O, F, R>
where
    T: Payload,
    O: Send + Sync + 'static,
    F: Fn(&O, &T) -> R + Send + Sync + 'static,
    R: ListenerOutcome + 'static,
{
    fn call(&self, value: &T) -> Attempt {
        let owner = self.owner.upgrade()?;
        Some((self.f)(&owner, value).into_result())
    }

    fn is_alive(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

fn addr<T: ?Sized>(arc: &Arc<T>) -> *const () {
    Arc::as_ptr(arc) as *const ()
}

/// Handle to a zero-argument listener on an untyped channel.
///
/// # Example
///
/// ```rust,ignore
/// let on_score = Listener::new(|| println!("scored"));
/// hub.register(&score, &on_score);
/// hub.unregister(&score, &on_score);
/// ```
#[derive(Clone)]
pub struct Listener {
    callback: Arc<dyn Callback>,
}

impl Listener {
    /// Wrap a closure in a new listener identity.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: ListenerOutcome + 'static,
    {
        Self {
            callback: Arc::new(FnCallback {
                f,
                _marker: PhantomData,
            }),
        }
    }

    /// Wrap a closure that runs against `owner` for as long as it exists.
    ///
    /// The listener holds only a weak reference to the owner.
    pub fn bound<O, F, R>(owner: &Arc<O>, f: F) -> Self
    where
        O: Send + Sync + 'static,
        F: Fn(&O) -> R + Send + Sync + 'static,
        R: ListenerOutcome + 'static,
    {
        let callback: Arc<dyn Callback> = Arc::new(BoundCallback {
            owner: Arc::downgrade(owner),
            f,
            _marker: PhantomData,
        });
        Self { callback }
    }

    /// Call the listener directly, outside of any hub.
    ///
    /// A bound listener whose owner is gone does nothing and returns `Ok`.
    pub fn call(&self) -> Result<(), BoxError> {
        self.try_call().unwrap_or(Ok(()))
    }

    /// Call the listener, or return `None` without calling it when its
    /// owner is gone.
    pub fn try_call(&self) -> Option<Result<(), BoxError>> {
        self.callback.call()
    }
}

impl ListenerHandle for Listener {
    fn same(&self, other: &Self) -> bool {
        addr(&self.callback) == addr(&other.callback)
    }

    fn is_alive(&self) -> bool {
        self.callback.is_alive()
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&addr(&self.callback)).finish()
    }
}

/// Handle to a one-argument listener on a typed channel carrying `T`.
pub struct TypedListener<T: Payload> {
    callback: Arc<dyn TypedCallback<T>>,
}

impl<T: Payload> TypedListener<T> {
    /// Wrap a closure in a new listener identity.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
        R: ListenerOutcome + 'static,
    {
        let callback: Arc<dyn TypedCallback<T>> = Arc::new(FnCallback {
            f,
            _marker: PhantomData,
        });
        Self { callback }
    }

    /// Wrap a closure that runs against `owner` for as long as it exists.
    pub fn bound<O, F, R>(owner: &Arc<O>, f: F) -> Self
    where
        O: Send + Sync + 'static,
        F: Fn(&O, &T) -> R + Send + Sync + 'static,
        R: ListenerOutcome + 'static,
    {
        let callback: Arc<dyn TypedCallback<T>> = Arc::new(BoundCallback {
            owner: Arc::downgrade(owner),
            f,
            _marker: PhantomData,
        });
        Self { callback }
    }

    /// Call the listener directly, outside of any hub.
    ///
    /// A bound listener whose owner is gone does nothing and returns `Ok`.
    pub fn call(&self, value: &T) -> Result<(), BoxError> {
        self.try_call(value).unwrap_or(Ok(()))
    }

    /// Call the listener with `value`, or return `None` without calling it
    /// when its owner is gone.
    pub fn try_call(&self, value: &T) -> Option<Result<(), BoxError>> {
        self.callback.call(value)
    }
}

impl<T: Payload> Clone for TypedListener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T: Payload> ListenerHandle for TypedListener<T> {
    fn same(&self, other: &Self) -> bool {
        addr(&self.callback) == addr(&other.callback)
    }

    fn is_alive(&self) -> bool {
        self.callback.is_alive()
    }
}

impl<T: Payload> PartialEq for TypedListener<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl<T: Payload> Eq for TypedListener<T> {}

impl<T: Payload> fmt::Debug for TypedListener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedListener").field(&addr(&self.callback)).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_identity_is_per_handle() {
        let a = Listener::new(|| ());
        let b = Listener::new(|| ());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_fallible_listener() {
        let ok = Listener::new(|| Ok::<(), std::io::Error>(()));
        assert!(ok.call().is_ok());

        let failing = Listener::new(|| Err::<(), _>("nope"));
        let err = failing.call().unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn test_typed_listener_receives_value() {
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = seen.clone();
        let listener = TypedListener::new(move |v: &usize| {
            sink.store(*v, Ordering::SeqCst);
        });
        listener.call(&7).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_bound_listener_dies_with_owner() {
        struct Counter(AtomicUsize);

        let owner = Arc::new(Counter(AtomicUsize::new(0)));
        let listener = Listener::bound(&owner, |c: &Counter| {
            c.0.fetch_add(1, Ordering::SeqCst);
        });
        let typed = TypedListener::bound(&owner, |c: &Counter, v: &usize| {
            c.0.fetch_add(*v, Ordering::SeqCst);
        });

        assert!(listener.is_alive());
        listener.call().unwrap();
        typed.call(&10).unwrap();
        assert_eq!(owner.0.load(Ordering::SeqCst), 11);

        drop(owner);
        assert!(!listener.is_alive());
        assert!(!typed.is_alive());
        assert!(listener.call().is_ok());
        assert!(listener.try_call().is_none());
        assert!(typed.try_call(&1).is_none());
    }
}
