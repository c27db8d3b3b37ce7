//! Bookkeeping of listener registrations.

use std::rc::Rc;

use ddp_channels_traits::{Emitter, Event};

/// Identity projection, for owners that are emitters themselves.
pub fn itself<T: ?Sized>(this: &T) -> &T {
    this
}

/// The listener registrations owned by one event stream.
///
/// Every registration added through [`Self::listen`] is removed again by
/// [`Self::release`], regardless of how many kinds or emitters are involved.
#[derive(Default)]
pub struct ListenerSet {
    removers: Vec<Box<dyn FnOnce()>>,
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("registrations", &self.removers.len())
            .finish()
    }
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events of `kind` on the emitter `project`
    /// returns for `owner`.
    ///
    /// The set keeps `owner` alive until it is released, so the listener can
    /// always be removed from the same emitter it was added to.
    pub fn listen<O, Em, E>(
        &mut self,
        owner: &Rc<O>,
        project: fn(&O) -> &Em,
        kind: E::Kind,
        listener: impl Fn(&E) + 'static,
    ) where
        O: ?Sized + 'static,
        Em: Emitter<E> + ?Sized + 'static,
        E: Event + 'static,
    {
        let id = project(owner).add_listener(kind, Rc::new(listener));
        tracing::trace!(?kind, ?id, "listener added");
        let owner = owner.clone();
        self.removers.push(Box::new(move || {
            let removed = project(&owner).remove_listener(kind, id);
            tracing::trace!(?kind, ?id, removed, "listener removed");
        }));
    }

    /// Number of registrations in this set.
    pub fn len(&self) -> usize {
        self.removers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.removers.is_empty()
    }

    /// Remove every registration, in the order they were added.
    pub fn release(self) {
        for remove in self.removers {
            remove();
        }
    }
}
