//! Traits for talking to a DDP client
//!
//! `ddp-channels` doesn't speak DDP itself. It drives an external client
//! through the traits defined here: a [`Client`] that can call methods, log
//! in and out, and manage subscriptions, plus the [`Emitter`] capability that
//! lets callers add and remove listeners on the client, on its transport, and
//! on each [`Subscription`].
//!
//! The model is single threaded. Listeners are `Rc` closures, and are called
//! on whatever task drives the client's event emission.

use std::{fmt::Debug, future::Future, hash::Hash, rc::Rc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod emitter;
pub mod events;

#[doc(inline)]
pub use emitter::ListenerMap;
#[doc(inline)]
pub use events::{
    ClientEvent, ClientEventKind, Document, SubscriptionEvent, SubscriptionEventKind,
    TransportEvent, TransportEventKind,
};

slotmap::new_key_type! {
    /// Token returned by [`Emitter::add_listener`], used to remove the
    /// listener again.
    pub struct ListenerId;
}

/// A callback registered on an [`Emitter`].
pub type Listener<E> = Rc<dyn Fn(&E)>;

/// An event an [`Emitter`] can emit.
///
/// Listeners are registered per kind, the kind of an event decides which
/// listeners it is delivered to.
pub trait Event {
    /// The discriminant listeners are registered against.
    type Kind: Copy + Eq + Hash + Debug + 'static;

    /// Returns the kind of this event.
    fn kind(&self) -> Self::Kind;
}

/// Something listeners can be attached to.
///
/// Registration is infallible. Removal of a listener that is not (or no
/// longer) registered must not fail, it just returns `false`.
pub trait Emitter<E: Event> {
    /// Register `listener` to be called for every event of `kind`, in the
    /// order the events are emitted.
    fn add_listener(&self, kind: E::Kind, listener: Listener<E>) -> ListenerId;

    /// Remove a listener previously added with [`Self::add_listener`].
    /// Returns whether a listener was actually removed.
    fn remove_listener(&self, kind: E::Kind, id: ListenerId) -> bool;
}

impl<E: Event, T: Emitter<E> + ?Sized> Emitter<E> for Rc<T> {
    #[inline]
    fn add_listener(&self, kind: E::Kind, listener: Listener<E>) -> ListenerId {
        (**self).add_listener(kind, listener)
    }

    #[inline]
    fn remove_listener(&self, kind: E::Kind, id: ListenerId) -> bool {
        (**self).remove_listener(kind, id)
    }
}

/// The configuration a [`Client`] is constructed with.
///
/// Everything except the endpoint is fixed: the client must not connect or
/// reconnect on its own, it must keep local copies of collections, and it
/// speaks DDP version 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    pub auto_connect:         bool,
    pub auto_reconnect:       bool,
    pub maintain_collections: bool,
    pub ddp_version:          String,
    pub endpoint:             String,
}

/// The only DDP protocol version clients are constructed with.
pub const DDP_VERSION: &str = "1";

impl ClientOptions {
    /// Options for a client talking to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            auto_connect:         false,
            auto_reconnect:       false,
            maintain_collections: true,
            ddp_version:          DDP_VERSION.to_owned(),
            endpoint:             endpoint.into(),
        }
    }
}

/// Credentials for a password login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCredentials {
    pub email:    String,
    pub password: String,
}

impl Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("email", &self.email)
            .field("password", &"...")
            .finish()
    }
}

/// A handle to a server side data subscription.
///
/// Handles are cheap to clone, all clones refer to the same subscription
/// and share its listeners.
pub trait Subscription: Emitter<SubscriptionEvent> + Clone + 'static {
    /// The id of the subscription, as accepted by [`Client::unsubscribe`].
    fn id(&self) -> &str;
    /// The name of the publication this subscription was made to.
    fn name(&self) -> &str;
}

/// A DDP client.
///
/// The client itself emits [`ClientEvent`]s, connection and collection
/// events are emitted by its [transport](Self::transport).
pub trait Client: Emitter<ClientEvent> + 'static {
    /// The transport level sub-object.
    type Transport: Emitter<TransportEvent> + 'static;
    /// Handle type returned by [`Self::subscribe`].
    type Subscription: Subscription;
    /// Errors the client reports for failed operations.
    type Error: std::error::Error + 'static;

    type CallFut<'a>: Future<Output = Result<Value, Self::Error>> + 'a
    where
        Self: 'a;
    type LoginFut<'a>: Future<Output = Result<Value, Self::Error>> + 'a
    where
        Self: 'a;
    type LogoutFut<'a>: Future<Output = Result<(), Self::Error>> + 'a
    where
        Self: 'a;

    fn transport(&self) -> &Self::Transport;

    /// Id of the currently logged in user, if any.
    fn user_id(&self) -> Option<String>;

    /// Start connecting. Completion is signaled by a
    /// [`TransportEvent::Connected`] event.
    fn connect(&self);

    /// Close the connection. Completion is signaled by a
    /// [`TransportEvent::Disconnected`] event.
    fn disconnect(&self);

    /// Invoke a remote method.
    fn call<'a>(&'a self, method: &'a str, params: Vec<Value>) -> Self::CallFut<'a>;

    fn login_with_password(&self, credentials: PasswordCredentials) -> Self::LoginFut<'_>;

    fn logout(&self) -> Self::LogoutFut<'_>;

    /// Subscribe to a publication. The returned handle emits
    /// [`SubscriptionEvent::Ready`] once the initial data set arrived.
    fn subscribe(&self, name: &str, params: Vec<Value>) -> Self::Subscription;

    fn unsubscribe(&self, id: &str);
}

/// Creates clients from [`ClientOptions`].
pub trait ClientFactory {
    type Client: Client;

    fn create(&self, options: &ClientOptions) -> Self::Client;
}

impl<C: Client, F: Fn(&ClientOptions) -> C> ClientFactory for F {
    type Client = C;

    #[inline]
    fn create(&self, options: &ClientOptions) -> Self::Client {
        self(options)
    }
}
