//! Payload marker trait and runtime payload tags.

use std::{
    any::{Any, TypeId, type_name},
    fmt,
    hash::{Hash, Hasher},
};

/// A marker trait for values carried by typed channels.
///
/// Payloads must be `Send + Sync + 'static` so the hub can be shared across
/// threads, and `Debug` so invoke traces can render them.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Payload",
    label = "must be `Send + Sync + Debug + 'static`",
    note = "Typed channels carry thread-safe, debuggable values."
)]
pub trait Payload: Send + Sync + fmt::Debug + 'static {}

impl<T: Send + Sync + fmt::Debug + 'static> Payload for T {}

/// A payload whose concrete type is only known at runtime.
///
/// Held by keys that carry a default payload.
pub trait AnyPayload: Send + Sync + fmt::Debug + 'static {
    /// The tag of the concrete payload type.
    fn payload_tag(&self) -> PayloadTag;

    /// The payload as `Any`, for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Payload> AnyPayload for T {
    fn payload_tag(&self) -> PayloadTag {
        PayloadTag::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn AnyPayload {
    /// The payload as a `T`, if that is its type.
    pub fn downcast_ref<T: Payload>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

/// Runtime tag identifying the payload type of a typed channel.
///
/// Two tags are equal when they describe the same Rust type. The name is
/// only carried for diagnostics.
#[derive(Clone, Copy)]
pub struct PayloadTag {
    id: TypeId,
    name: &'static str,
}

impl PayloadTag {
    /// The tag for payload type `T`.
    pub fn of<T: Payload>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Whether this tag describes `T`.
    pub fn is<T: Payload>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// The type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for PayloadTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PayloadTag {}

impl Hash for PayloadTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for PayloadTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PayloadTag").field(&self.name).finish()
    }
}

impl fmt::Display for PayloadTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The binding state of a key: fire-only or fire-with-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Listeners take no payload.
    Untyped,
    /// Listeners take one payload of the tagged type.
    Typed(PayloadTag),
}

impl Channel {
    /// The channel for payload type `T`.
    pub fn typed<T: Payload>() -> Self {
        Channel::Typed(PayloadTag::of::<T>())
    }

    /// The payload tag, if any.
    pub fn payload(&self) -> Option<PayloadTag> {
        match self {
            Channel::Untyped => None,
            Channel::Typed(tag) => Some(*tag),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Untyped => f.write_str("untyped"),
            Channel::Typed(tag) => write!(f, "typed<{tag}>"),
        }
    }
}
