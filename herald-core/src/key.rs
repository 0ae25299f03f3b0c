//! Dispatch keys: identity tokens for event channels.
//!
//! A [`DispatchKey`] names one channel. Its identity is a process-unique
//! [`KeyId`] allocated at construction and shared by every clone, so two keys
//! built with the same label are still different channels.
//!
//! A [`TypedKey<T>`] is a dispatch key whose payload type is declared up
//! front, optionally with a default payload for invocations without a value.

use crate::payload::{AnyPayload, Payload, PayloadTag};
use bitflags::bitflags;
use std::{
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    ops::Deref,
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicU64, Ordering},
    },
};

static NEXT_KEY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId(u64);

impl KeyId {
    fn next() -> Self {
        KeyId(NEXT_KEY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Debug flags on a key. The only state a key may change after creation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyFlags: u8 {
        /// Emit an invoke trace diagnostic every time the key is invoked.
        const TRACE_INVOKES = 1 << 0;
    }
}

struct KeyInner {
    id: KeyId,
    label: Cow<'static, str>,
    declared: Option<PayloadTag>,
    default: Option<Arc<dyn AnyPayload>>,
    flags: AtomicU8,
}

/// Identity token for one named event channel.
///
/// Cloning is cheap and preserves identity. Equality and hashing use the
/// [`KeyId`] only; the label is for diagnostics.
///
/// # Example
///
/// ```rust,ignore
/// let score = DispatchKey::new("Score");
/// hub.register(&score, &on_score);
/// hub.invoke(&score);
/// ```
#[derive(Clone)]
pub struct DispatchKey {
    inner: Arc<KeyInner>,
}

impl DispatchKey {
    /// Create a new key with no declared payload type.
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self::build(label.into(), None, None)
    }

    fn build(
        label: Cow<'static, str>,
        declared: Option<PayloadTag>,
        default: Option<Arc<dyn AnyPayload>>,
    ) -> Self {
        Self {
            inner: Arc::new(KeyInner {
                id: KeyId::next(),
                label,
                declared,
                default,
                flags: AtomicU8::new(KeyFlags::empty().bits()),
            }),
        }
    }

    /// Set the initial debug flags.
    pub fn with_flags(self, flags: KeyFlags) -> Self {
        self.set_flags(flags);
        self
    }

    /// The key's identity.
    pub fn id(&self) -> KeyId {
        self.inner.id
    }

    /// The human-readable label.
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// The payload type fixed at construction, if this key was built as typed.
    pub fn declared_payload(&self) -> Option<PayloadTag> {
        self.inner.declared
    }

    /// The default payload delivered when the key is invoked without a value.
    ///
    /// Only keys built with [`TypedKey::with_default`] have one.
    pub fn default_payload(&self) -> Option<&dyn AnyPayload> {
        self.inner.default.as_deref()
    }

    /// Current debug flags.
    pub fn flags(&self) -> KeyFlags {
        KeyFlags::from_bits_truncate(self.inner.flags.load(Ordering::Acquire))
    }

    /// Replace the debug flags. Visible to every clone of this key.
    pub fn set_flags(&self, flags: KeyFlags) {
        self.inner.flags.store(flags.bits(), Ordering::Release);
    }

    /// Whether invoke tracing is on for this key.
    pub fn trace_invokes(&self) -> bool {
        self.flags().contains(KeyFlags::TRACE_INVOKES)
    }

    /// Turn invoke tracing on or off.
    pub fn set_trace_invokes(&self, enabled: bool) {
        let mut flags = self.flags();
        flags.set(KeyFlags::TRACE_INVOKES, enabled);
        self.set_flags(flags);
    }
}

impl PartialEq for DispatchKey {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for DispatchKey {}

impl Hash for DispatchKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchKey")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("declared", &self.inner.declared)
            .finish()
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.label)
    }
}

/// A dispatch key whose payload type is `T`.
///
/// Dereferences to the underlying [`DispatchKey`], so it can be passed
/// anywhere a plain key is expected.
pub struct TypedKey<T: Payload> {
    key: DispatchKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Payload> TypedKey<T> {
    /// Create a typed key without a default payload.
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self::build(label.into(), None)
    }

    /// Create a typed key with a default payload, delivered when the key is
    /// invoked without an explicit value.
    pub fn with_default(label: impl Into<Cow<'static, str>>, default: T) -> Self {
        let default: Arc<dyn AnyPayload> = Arc::new(default);
        Self::build(label.into(), Some(default))
    }

    fn build(label: Cow<'static, str>, default: Option<Arc<dyn AnyPayload>>) -> Self {
        Self {
            key: DispatchKey::build(label, Some(PayloadTag::of::<T>()), default),
            _marker: PhantomData,
        }
    }

    /// Set the initial debug flags.
    pub fn with_flags(self, flags: KeyFlags) -> Self {
        self.key.set_flags(flags);
        self
    }

    /// The underlying untyped key.
    pub fn key(&self) -> &DispatchKey {
        &self.key
    }

    /// The default payload, if one was declared.
    pub fn default_value(&self) -> Option<&T> {
        self.key.default_payload()?.downcast_ref()
    }
}

impl<T: Payload> Clone for TypedKey<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Payload> Deref for TypedKey<T> {
    type Target = DispatchKey;

    fn deref(&self) -> &Self::Target {
        &self.key
    }
}

impl<T: Payload> AsRef<DispatchKey> for TypedKey<T> {
    fn as_ref(&self) -> &DispatchKey {
        &self.key
    }
}

impl<T: Payload> PartialEq for TypedKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T: Payload> Eq for TypedKey<T> {}

impl<T: Payload> fmt::Debug for TypedKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedKey")
            .field("key", &self.key)
            .field("default", &self.default_value())
            .finish()
    }
}
