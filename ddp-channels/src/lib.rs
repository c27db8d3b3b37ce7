//! Event streams for DDP clients
//!
//! A DDP client reports what happens through callbacks: the transport
//! connects and disconnects, users log in and out, documents are added,
//! changed and removed, subscriptions become ready or fail. This crate turns
//! each of those callback sources into a stream that can be cancelled on its
//! own, and wraps the client's request/response operations into a
//! [`Connection`].
//!
//! The client itself is not implemented here. [`Connection`] creates one
//! through a [`ClientFactory`](ddp_channels_traits::ClientFactory), and talks
//! to it through the traits in [`ddp_channels_traits`].
//!
//! Everything is single threaded: clients and channels are `Rc` based, and
//! streams are meant to be driven by a local executor.

pub mod config;
pub mod connection;
pub mod error;
pub mod events;

#[doc(inline)]
pub use config::ConnectionOptions;
#[doc(inline)]
pub use connection::Connection;
pub use ddp_channels_traits as traits;
#[doc(inline)]
pub use error::{ApplicationError, ConfigurationError, Error};
#[doc(inline)]
pub use events::{Channel, Event, EventSource, Receiver};
