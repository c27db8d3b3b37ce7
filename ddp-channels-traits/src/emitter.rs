//! Reference implementation of the [`Emitter`] trait.

use std::cell::RefCell;

use hashbrown::HashMap;
use indexmap::IndexMap;
use slotmap::SlotMap;

use crate::{Emitter, Event, Listener, ListenerId};

struct Inner<E: Event> {
    /// Kind each live listener id was registered for
    ids:     SlotMap<ListenerId, E::Kind>,
    by_kind: HashMap<E::Kind, IndexMap<ListenerId, Listener<E>>>,
}

impl<E: Event> Default for Inner<E> {
    fn default() -> Self {
        Self {
            ids:     SlotMap::with_key(),
            by_kind: HashMap::new(),
        }
    }
}

/// A single threaded listener registry.
///
/// Listeners of the same kind are called in registration order. Listeners may
/// add or remove listeners while being called; such changes take effect from
/// the next [`emit`](Self::emit) on.
pub struct ListenerMap<E: Event> {
    inner: RefCell<Inner<E>>,
}

impl<E: Event> Default for ListenerMap<E> {
    fn default() -> Self {
        Self {
            inner: RefCell::new(Inner::default()),
        }
    }
}

impl<E: Event> std::fmt::Debug for ListenerMap<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_map()
            .entries(inner.by_kind.iter().map(|(kind, l)| (kind, l.len())))
            .finish()
    }
}

impl<E: Event> ListenerMap<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call every listener registered for the kind of `event`.
    pub fn emit(&self, event: &E) {
        let kind = event.kind();
        // Don't hold the borrow while calling listeners, they might want to
        // modify the registry.
        let listeners: Vec<_> = self
            .inner
            .borrow()
            .by_kind
            .get(&kind)
            .map(|l| l.values().cloned().collect())
            .unwrap_or_default();
        tracing::trace!(?kind, count = listeners.len(), "emit");
        for listener in listeners {
            listener(event);
        }
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.inner
            .borrow()
            .by_kind
            .get(&kind)
            .map_or(0, IndexMap::len)
    }

    /// Total number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner.borrow().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all listeners. Later attempts to remove any of them return
    /// `false`.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.ids.clear();
        inner.by_kind.clear();
    }
}

impl<E: Event> Emitter<E> for ListenerMap<E> {
    fn add_listener(&self, kind: E::Kind, listener: Listener<E>) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.ids.insert(kind);
        inner.by_kind.entry(kind).or_default().insert(id, listener);
        id
    }

    fn remove_listener(&self, kind: E::Kind, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.ids.get(id) != Some(&kind) {
            return false
        }
        inner.ids.remove(id);
        let Some(listeners) = inner.by_kind.get_mut(&kind) else {
            unreachable!("listener id without a listener")
        };
        listeners.shift_remove(&id);
        if listeners.is_empty() {
            inner.by_kind.remove(&kind);
        }
        true
    }
}
