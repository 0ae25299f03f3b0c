//! Ordered listener sequence that tolerates mutation during a pass.
//!
//! Slots are visited by index. While at least one pass is active, removal
//! leaves a tombstone so indices never shift under an iterating pass.
//! Tombstones are compacted when the last pass ends.

use herald_core::ListenerHandle;
use std::any::Any;

pub(crate) struct Sequence<L> {
    slots: Vec<Option<L>>,
    live: usize,
    passes: usize,
}

impl<L: ListenerHandle> Sequence<L> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            live: 0,
            passes: 0,
        }
    }

    pub(crate) fn contains(&self, listener: &L) -> bool {
        self.position(listener).is_some()
    }

    fn position(&self, listener: &L) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|l| l.same(listener)))
    }

    /// Append unless already present. Returns whether the listener was added.
    pub(crate) fn push(&mut self, listener: L) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.slots.push(Some(listener));
        self.live += 1;
        true
    }

    /// Remove the entry for `listener`. Returns whether one was found.
    pub(crate) fn remove(&mut self, listener: &L) -> bool {
        match self.position(listener) {
            Some(index) => {
                self.vacate(index);
                true
            }
            None => false,
        }
    }

    fn vacate(&mut self, index: usize) {
        if self.passes > 0 {
            self.slots[index] = None;
        } else {
            self.slots.remove(index);
        }
        self.live -= 1;
    }

    /// The listener at `index`, unless the slot is a tombstone.
    ///
    /// A listener whose owner is gone is vacated and reported as pruned.
    pub(crate) fn visit(&mut self, index: usize) -> Visit<L> {
        match self.slots.get(index) {
            Some(Some(listener)) if listener.is_alive() => Visit::Call(listener.clone()),
            Some(Some(_)) => {
                self.vacate(index);
                Visit::Pruned
            }
            Some(None) | None => Visit::Skip,
        }
    }

    /// Start a pass. Returns the number of slots the pass will visit.
    pub(crate) fn begin_pass(&mut self) -> usize {
        self.passes += 1;
        self.slots.len()
    }

    pub(crate) fn end_pass(&mut self) {
        self.passes = self.passes.saturating_sub(1);
        if self.passes == 0 && self.slots.len() != self.live {
            self.slots.retain(Option::is_some);
        }
    }

    /// Drop every listener, tombstoning instead while a pass is active.
    pub(crate) fn clear(&mut self) {
        if self.passes > 0 {
            self.slots.iter_mut().for_each(|slot| *slot = None);
        } else {
            self.slots.clear();
        }
        self.live = 0;
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.passes == 0
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.live == 0
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

pub(crate) enum Visit<L> {
    Call(L),
    Pruned,
    Skip,
}

/// Type-erased view of a typed sequence, stored next to its payload tag.
pub(crate) trait ErasedSequence: Send + 'static {
    fn len(&self) -> usize;
    fn clear(&mut self);
    fn is_idle(&self) -> bool;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<L: ListenerHandle> ErasedSequence for Sequence<L> {
    fn len(&self) -> usize {
        self.live
    }

    fn clear(&mut self) {
        Sequence::clear(self);
    }

    fn is_idle(&self) -> bool {
        self.passes == 0
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::Listener;
    use std::sync::Arc;

    fn call(visit: Visit<Listener>) -> Option<Listener> {
        match visit {
            Visit::Call(l) => Some(l),
            _ => None,
        }
    }

    #[test]
    fn test_push_coalesces() {
        let a = Listener::new(|| ());
        let mut seq = Sequence::with_capacity(4);
        assert!(seq.push(a.clone()));
        assert!(!seq.push(a.clone()));
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_remove_when_idle_shifts() {
        let a = Listener::new(|| ());
        let b = Listener::new(|| ());
        let mut seq = Sequence::with_capacity(4);
        seq.push(a.clone());
        seq.push(b.clone());

        assert!(seq.remove(&a));
        assert!(!seq.remove(&a));
        assert_eq!(seq.slot_count(), 1);
        assert_eq!(call(seq.visit(0)), Some(b));
    }

    #[test]
    fn test_remove_during_pass_tombstones() {
        let a = Listener::new(|| ());
        let b = Listener::new(|| ());
        let c = Listener::new(|| ());
        let mut seq = Sequence::with_capacity(4);
        seq.push(a.clone());
        seq.push(b.clone());
        seq.push(c.clone());

        let len = seq.begin_pass();
        assert_eq!(len, 3);
        assert!(seq.remove(&b));
        assert_eq!(seq.slot_count(), 3);
        assert_eq!(seq.len(), 2);
        assert!(matches!(seq.visit(1), Visit::Skip));
        assert_eq!(call(seq.visit(2)), Some(c.clone()));

        seq.end_pass();
        assert!(seq.is_idle());
        assert_eq!(seq.slot_count(), 2);
        assert_eq!(call(seq.visit(1)), Some(c));
    }

    #[test]
    fn test_nested_passes_defer_compaction() {
        let a = Listener::new(|| ());
        let mut seq = Sequence::with_capacity(4);
        seq.push(a.clone());

        seq.begin_pass();
        seq.begin_pass();
        seq.remove(&a);
        seq.end_pass();
        assert_eq!(seq.slot_count(), 1);
        seq.end_pass();
        assert_eq!(seq.slot_count(), 0);
        assert!(seq.is_empty());
    }

    #[test]
    fn test_visit_prunes_dead_owner() {
        let owner = Arc::new(());
        let bound = Listener::bound(&owner, |_: &()| ());
        let mut seq = Sequence::with_capacity(4);
        seq.push(bound);
        drop(owner);

        seq.begin_pass();
        assert!(matches!(seq.visit(0), Visit::Pruned));
        assert!(seq.is_empty());
        seq.end_pass();
        assert_eq!(seq.slot_count(), 0);
    }
}
