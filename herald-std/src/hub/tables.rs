//! The hub's two registration tables.

use super::{
    Deliver, deliver_erased,
    sequence::{ErasedSequence, Sequence},
};
use herald_core::{Channel, KeyId, Listener, ListenerHandle, Payload, PayloadTag, TypedListener};
use std::collections::HashMap;

/// A typed sequence stored under its payload tag.
///
/// The tag is compared before every downcast, so a sequence is only ever
/// reinterpreted as the type it was created with.
pub(crate) struct TypedEntry {
    tag: PayloadTag,
    sequence: Box<dyn ErasedSequence>,
    deliver: Deliver,
}

impl TypedEntry {
    pub(crate) fn new<T: Payload>(capacity: usize) -> Self {
        Self {
            tag: PayloadTag::of::<T>(),
            sequence: Box::new(Sequence::<TypedListener<T>>::with_capacity(capacity)),
            deliver: deliver_erased::<T>,
        }
    }

    pub(crate) fn tag(&self) -> PayloadTag {
        self.tag
    }

    pub(crate) fn sequence_mut<T: Payload>(&mut self) -> Option<&mut Sequence<TypedListener<T>>> {
        if !self.tag.is::<T>() {
            return None;
        }
        self.sequence.as_any_mut().downcast_mut()
    }

    fn len(&self) -> usize {
        self.sequence.len()
    }
}

/// Key → untyped sequence, and key → typed sequence. A key lives in at most one.
pub(crate) struct Tables {
    untyped: HashMap<KeyId, Sequence<Listener>>,
    typed: HashMap<KeyId, TypedEntry>,
}

impl Tables {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            untyped: HashMap::with_capacity(capacity),
            typed: HashMap::with_capacity(capacity),
        }
    }

    /// The channel `id` is currently bound as, if any.
    pub(crate) fn channel(&self, id: KeyId) -> Option<Channel> {
        if self.untyped.contains_key(&id) {
            return Some(Channel::Untyped);
        }
        self.typed.get(&id).map(|entry| Channel::Typed(entry.tag()))
    }

    /// Pass runner for a typed key's default payload.
    pub(crate) fn deliver(&self, id: KeyId) -> Option<Deliver> {
        self.typed.get(&id).map(|entry| entry.deliver)
    }

    pub(crate) fn listener_count(&self, id: KeyId) -> usize {
        match self.untyped.get(&id) {
            Some(seq) => seq.len(),
            None => self.typed.get(&id).map_or(0, TypedEntry::len),
        }
    }

    pub(crate) fn key_count(&self) -> usize {
        self.untyped.len() + self.typed.len()
    }

    /// Drop every registration. Sequences with an active pass stay bound,
    /// empty, until the pass ends.
    pub(crate) fn clear(&mut self) {
        self.untyped.retain(|_, seq| {
            seq.clear();
            !seq.is_idle()
        });
        self.typed.retain(|_, entry| {
            entry.sequence.clear();
            !entry.sequence.is_idle()
        });
    }

    pub(crate) fn untyped_or_insert(&mut self, id: KeyId, capacity: usize) -> &mut Sequence<Listener> {
        self.untyped
            .entry(id)
            .or_insert_with(|| Sequence::with_capacity(capacity))
    }

    pub(crate) fn typed_or_insert<T: Payload>(&mut self, id: KeyId, capacity: usize) -> &mut TypedEntry {
        self.typed
            .entry(id)
            .or_insert_with(|| TypedEntry::new::<T>(capacity))
    }
}

/// A listener kind and the table it lives in.
pub(crate) trait Binding: ListenerHandle {
    fn sequence(tables: &mut Tables, id: KeyId) -> Option<&mut Sequence<Self>>;

    fn release(tables: &mut Tables, id: KeyId);
}

impl Binding for Listener {
    fn sequence(tables: &mut Tables, id: KeyId) -> Option<&mut Sequence<Self>> {
        tables.untyped.get_mut(&id)
    }

    fn release(tables: &mut Tables, id: KeyId) {
        tables.untyped.remove(&id);
    }
}

impl<T: Payload> Binding for TypedListener<T> {
    fn sequence(tables: &mut Tables, id: KeyId) -> Option<&mut Sequence<Self>> {
        tables
            .typed
            .get_mut(&id)
            .and_then(|entry| entry.sequence_mut::<T>())
    }

    fn release(tables: &mut Tables, id: KeyId) {
        tables.typed.remove(&id);
    }
}
