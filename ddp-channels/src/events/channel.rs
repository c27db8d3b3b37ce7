//! Turning callback registrations into streams.
//!
//! [`event_channel`] runs a setup function that registers listeners, and hands
//! those listeners a [`Sender`]. Everything sent ends up in the returned
//! [`Receiver`], in the order it was sent. Closing or dropping the receiver
//! releases the listeners the setup function registered.
//!
//! [`Channel`] wraps a setup function without running it. It is an
//! [`EventSource`]: every [`subscribe`](EventSource::subscribe) runs the
//! setup function again and yields an independent receiver.

use std::{
    cell::RefCell,
    collections::VecDeque,
    pin::Pin,
    rc::{Rc, Weak},
    task::{Context, Poll, Waker},
};

use derive_where::derive_where;
use futures_core::{FusedStream, Stream};

use super::{listeners::ListenerSet, EventSource};

#[derive(Debug)]
struct Shared<T> {
    queue:  VecDeque<T>,
    waker:  Option<Waker>,
    closed: bool,
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self {
            queue:  VecDeque::new(),
            waker:  None,
            closed: false,
        }
    }
}

/// The sending half of an event channel, handed to listeners.
///
/// Senders don't keep the channel alive.
#[derive(Debug)]
#[derive_where(Clone)]
pub struct Sender<T> {
    shared: Weak<RefCell<Shared<T>>>,
}

impl<T> Sender<T> {
    /// Queue `value` for the receiver and wake it up.
    ///
    /// Returns `false`, dropping `value`, if the receiver is closed.
    pub fn send(&self, value: T) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false
        };
        let waker = {
            let mut shared = shared.borrow_mut();
            if shared.closed {
                return false
            }
            shared.queue.push_back(value);
            shared.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        true
    }

    /// Whether the receiving end has been closed or dropped.
    pub fn is_closed(&self) -> bool {
        self.shared
            .upgrade()
            .map_or(true, |shared| shared.borrow().closed)
    }
}

/// The event stream of an event channel.
///
/// A receiver never ends on its own. It yields `None` only after
/// [`close`](Self::close) has been called.
#[derive(Debug)]
pub struct Receiver<T> {
    shared:    Rc<RefCell<Shared<T>>>,
    listeners: Option<ListenerSet>,
}

impl<T> Receiver<T> {
    /// Stop receiving events.
    ///
    /// Removes the listeners registered for this receiver and discards queued
    /// events. Calling this more than once does nothing.
    pub fn close(&mut self) {
        let Some(listeners) = self.listeners.take() else {
            return
        };
        let queued = {
            let mut shared = self.shared.borrow_mut();
            shared.closed = true;
            shared.waker = None;
            std::mem::take(&mut shared.queue)
        };
        listeners.release();
        drop(queued);
    }

    pub fn is_closed(&self) -> bool {
        self.listeners.is_none()
    }

    /// Number of listener registrations this receiver currently holds.
    pub fn registrations(&self) -> usize {
        self.listeners.as_ref().map_or(0, ListenerSet::len)
    }

    /// Number of events queued and not yet taken.
    pub fn queued(&self) -> usize {
        self.shared.borrow().queue.len()
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> Stream for Receiver<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut shared = self.shared.borrow_mut();
        if let Some(item) = shared.queue.pop_front() {
            return Poll::Ready(Some(item))
        }
        if shared.closed {
            return Poll::Ready(None)
        }
        let registered = shared
            .waker
            .as_ref()
            .is_some_and(|waker| waker.will_wake(cx.waker()));
        if !registered {
            shared.waker = Some(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl<T> FusedStream for Receiver<T> {
    fn is_terminated(&self) -> bool {
        self.is_closed()
    }
}

/// Create an event channel.
///
/// `setup` is called immediately with the sending half, and returns the
/// listeners it registered. Those listeners are owned by the returned
/// receiver.
pub fn event_channel<T, F>(setup: F) -> Receiver<T>
where
    F: FnOnce(Sender<T>) -> ListenerSet,
{
    let shared = Rc::new(RefCell::new(Shared::default()));
    let sender = Sender {
        shared: Rc::downgrade(&shared),
    };
    let listeners = setup(sender);
    Receiver {
        shared,
        listeners: Some(listeners),
    }
}

/// A not yet activated event channel.
#[derive_where(Clone)]
pub struct Channel<T> {
    setup: Rc<dyn Fn(Sender<T>) -> ListenerSet>,
}

impl<T> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").finish_non_exhaustive()
    }
}

impl<T> Channel<T> {
    pub fn new(setup: impl Fn(Sender<T>) -> ListenerSet + 'static) -> Self {
        Self {
            setup: Rc::new(setup),
        }
    }
}

impl<T: 'static> EventSource<T> for Channel<T> {
    type Source = Receiver<T>;

    fn subscribe(&self) -> Self::Source {
        event_channel(|sender| (self.setup)(sender))
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use ddp_channels_traits::{ClientEvent, ListenerMap};
    use futures_test::task::{new_count_waker, noop_context};
    use futures_util::{FutureExt, StreamExt};

    use super::{event_channel, Channel, Receiver};
    use crate::events::{
        listeners::{itself, ListenerSet},
        EventSource,
    };

    fn logged_out_channel(emitter: &Rc<ListenerMap<ClientEvent>>) -> Receiver<u32> {
        let emitter = emitter.clone();
        event_channel(move |tx| {
            let mut listeners = ListenerSet::new();
            let count = std::cell::Cell::new(0);
            listeners.listen(&emitter, itself, ClientEvent::LoggedOut, move |_: &ClientEvent| {
                count.set(count.get() + 1);
                tx.send(count.get());
            });
            listeners
        })
    }

    #[test]
    fn events_are_queued_in_order() {
        let emitter = Rc::new(ListenerMap::new());
        let mut rx = logged_out_channel(&emitter);
        assert_eq!(rx.registrations(), 1);
        assert!(rx.next().now_or_never().is_none());

        for _ in 0..3 {
            emitter.emit(&ClientEvent::LoggedOut);
        }
        emitter.emit(&ClientEvent::LoggedIn);
        assert_eq!(rx.queued(), 3);
        futures_executor::block_on(async {
            for expected in 1..=3 {
                assert_eq!(rx.next().await, Some(expected));
            }
        });
        assert!(rx.next().now_or_never().is_none());
    }

    #[test]
    fn send_wakes_the_consumer_once() {
        let emitter = Rc::new(ListenerMap::new());
        let mut rx = logged_out_channel(&emitter);
        let (waker, count) = new_count_waker();
        let mut cx = std::task::Context::from_waker(&waker);
        assert!(rx.poll_next_unpin(&mut cx).is_pending());

        emitter.emit(&ClientEvent::LoggedOut);
        emitter.emit(&ClientEvent::LoggedOut);
        assert_eq!(count.get(), 1);
        assert_eq!(rx.poll_next_unpin(&mut cx), std::task::Poll::Ready(Some(1)));
    }

    #[test]
    fn close_is_idempotent_and_releases_listeners() {
        let emitter = Rc::new(ListenerMap::new());
        let mut rx = logged_out_channel(&emitter);
        emitter.emit(&ClientEvent::LoggedOut);

        rx.close();
        assert!(emitter.is_empty());
        assert_eq!(rx.registrations(), 0);
        assert_eq!(rx.queued(), 0);
        rx.close();
        assert!(rx.is_closed());

        emitter.emit(&ClientEvent::LoggedOut);
        let mut cx = noop_context();
        assert_eq!(rx.poll_next_unpin(&mut cx), std::task::Poll::Ready(None));
        assert!(futures_core::FusedStream::is_terminated(&rx));
    }

    #[test]
    fn drop_releases_listeners_and_silences_senders() {
        let emitter = Rc::new(ListenerMap::<ClientEvent>::new());
        let mut sender = None;
        let rx = event_channel(|tx| {
            sender = Some(tx);
            let mut listeners = ListenerSet::new();
            listeners.listen(&emitter, itself, ClientEvent::LoggedIn, |_: &ClientEvent| ());
            listeners
        });
        let sender = sender.unwrap();
        assert!(!sender.is_closed());
        assert!(sender.send(1));
        drop(rx);
        assert!(emitter.is_empty());
        assert!(sender.is_closed());
        assert!(!sender.send(2));
    }

    #[test]
    fn channel_subscriptions_are_independent() {
        let emitter = Rc::new(ListenerMap::<ClientEvent>::new());
        let channel = {
            let emitter = emitter.clone();
            Channel::new(move |tx| {
                let mut listeners = ListenerSet::new();
                listeners.listen(&emitter, itself, ClientEvent::LoggedIn, move |_: &ClientEvent| {
                    tx.send(());
                });
                listeners
            })
        };
        // Nothing is registered until subscribed
        assert!(emitter.is_empty());

        let mut a = channel.subscribe();
        let mut b = channel.subscribe();
        assert_eq!(emitter.len(), 2);
        emitter.emit(&ClientEvent::LoggedIn);
        a.close();
        emitter.emit(&ClientEvent::LoggedIn);

        assert_eq!(emitter.len(), 1);
        assert_eq!(a.queued(), 0);
        assert_eq!(b.queued(), 2);
        assert_eq!(b.next().now_or_never(), Some(Some(())));
    }
}
