//! Raw events emitted by a DDP client and its sub-objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Event;

/// A document mutation, as carried by `added`, `changed` and `removed`
/// messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub collection: String,
    pub id:         String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields:     Option<Map<String, Value>>,
}

/// Events emitted by the client's transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Added(Document),
    Changed(Document),
    Removed(Document),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportEventKind {
    Connected,
    Disconnected,
    Added,
    Changed,
    Removed,
}

impl Event for TransportEvent {
    type Kind = TransportEventKind;

    fn kind(&self) -> Self::Kind {
        match self {
            Self::Connected => TransportEventKind::Connected,
            Self::Disconnected => TransportEventKind::Disconnected,
            Self::Added(_) => TransportEventKind::Added,
            Self::Changed(_) => TransportEventKind::Changed,
            Self::Removed(_) => TransportEventKind::Removed,
        }
    }
}

impl TransportEvent {
    /// The document carried by a mutation event.
    pub fn document(&self) -> Option<&Document> {
        match self {
            Self::Added(doc) | Self::Changed(doc) | Self::Removed(doc) => Some(doc),
            Self::Connected | Self::Disconnected => None,
        }
    }
}

/// Authentication events emitted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEvent {
    LoggedIn,
    LoggedOut,
}

/// Client events carry no payload, so they are their own kind.
pub type ClientEventKind = ClientEvent;

impl Event for ClientEvent {
    type Kind = ClientEventKind;

    #[inline]
    fn kind(&self) -> Self::Kind {
        *self
    }
}

/// Events emitted by a subscription handle.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    Ready,
    /// The server rejected or stopped the subscription.
    Error(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionEventKind {
    Ready,
    Error,
}

impl Event for SubscriptionEvent {
    type Kind = SubscriptionEventKind;

    fn kind(&self) -> Self::Kind {
        match self {
            Self::Ready => SubscriptionEventKind::Ready,
            Self::Error(_) => SubscriptionEventKind::Error,
        }
    }
}
