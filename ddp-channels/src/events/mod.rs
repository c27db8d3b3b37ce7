//! Event streams over a DDP client
//!
//! The [`EventSource`] trait is how consumers get events out of this crate.
//! [`Connection`](crate::Connection) hands out [`Channel`]s for connection,
//! authentication, collection and subscription events. A channel doesn't
//! listen to anything by itself: calling [`EventSource::subscribe`] registers
//! listeners on the client and returns a [`Receiver`] stream. Closing or
//! dropping the receiver removes exactly those listeners again.
//!
//! Each channel yields its own record type. All of them convert into
//! [`Event`], for consumers that merge several streams into one.

use ddp_channels_traits::{Document, TransportEvent};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

pub mod channel;
pub mod listeners;

#[doc(inline)]
pub use channel::{event_channel, Channel, Receiver, Sender};
#[doc(inline)]
pub use listeners::ListenerSet;

/// Event source
///
/// An event source is something you can get a stream of events from.
pub trait EventSource<Event> {
    /// Type of event stream you get from this event source.
    type Source: futures_core::Stream<Item = Event> + 'static;

    /// Get a stream of events from the event source.
    fn subscribe(&self) -> Self::Source;
}

/// Transport connection state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// A user logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LoggedIn {
    /// The client's user id at the time the event fired.
    pub user_id: Option<String>,
}

/// The user logged out. Serializes as `"logout"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggedOut;

impl Serialize for LoggedOut {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("logout")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentEventKind {
    Added,
    Changed,
    Removed,
}

/// A mutation of a document in the collection a stream was created for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionEvent {
    pub collection: String,
    pub event:      DocumentEventKind,
    pub id:         String,
    pub fields:     Option<Map<String, Value>>,
}

impl CollectionEvent {
    /// Build a record from a transport event, if it is a mutation of a
    /// document in `collection`.
    pub fn filter(collection: &str, event: &TransportEvent) -> Option<Self> {
        let (kind, Document {
            collection: doc_collection,
            id,
            fields,
        }) = match event {
            TransportEvent::Added(doc) => (DocumentEventKind::Added, doc),
            TransportEvent::Changed(doc) => (DocumentEventKind::Changed, doc),
            TransportEvent::Removed(doc) => (DocumentEventKind::Removed, doc),
            TransportEvent::Connected | TransportEvent::Disconnected => return None,
        };
        (doc_collection == collection).then(|| Self {
            collection: collection.to_owned(),
            event:      kind,
            id:         id.clone(),
            fields:     fields.clone(),
        })
    }
}

/// A subscription became ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionReady {
    /// Name of the subscribed publication.
    pub subscription: String,
}

/// A subscription failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionError {
    pub subscription: String,
    pub error:        Value,
}

/// Any record yielded by the streams of this crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "camelCase")]
pub enum Event {
    Connected,
    Disconnected,
    LoggedIn(LoggedIn),
    LoggedOut,
    Collection(CollectionEvent),
    Ready(SubscriptionReady),
    Error(SubscriptionError),
}

impl From<ConnectionStatus> for Event {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Connected => Self::Connected,
            ConnectionStatus::Disconnected => Self::Disconnected,
        }
    }
}

impl From<LoggedIn> for Event {
    fn from(e: LoggedIn) -> Self {
        Self::LoggedIn(e)
    }
}

impl From<LoggedOut> for Event {
    fn from(_: LoggedOut) -> Self {
        Self::LoggedOut
    }
}

impl From<CollectionEvent> for Event {
    fn from(e: CollectionEvent) -> Self {
        Self::Collection(e)
    }
}

impl From<SubscriptionReady> for Event {
    fn from(e: SubscriptionReady) -> Self {
        Self::Ready(e)
    }
}

impl From<SubscriptionError> for Event {
    fn from(e: SubscriptionError) -> Self {
        Self::Error(e)
    }
}
