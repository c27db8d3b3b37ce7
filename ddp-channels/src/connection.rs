//! The connection facade.

use std::rc::Rc;

use ddp_channels_traits::{
    Client, ClientEvent, ClientFactory, PasswordCredentials, Subscription, SubscriptionEvent,
    SubscriptionEventKind, TransportEvent, TransportEventKind,
};
use serde_json::Value;
use tracing::debug;

use crate::{
    config::ConnectionOptions,
    error::{ApplicationError, ConfigurationError, Error},
    events::{
        listeners::itself, Channel, CollectionEvent, ConnectionStatus, ListenerSet, LoggedIn,
        LoggedOut, SubscriptionError, SubscriptionReady,
    },
};

/// Error type of the client created by `F`.
pub type ClientError<F> = <<F as ClientFactory>::Client as Client>::Error;

/// One DDP session.
///
/// Owns at most one client, created by [`Self::start`] through the factory the
/// connection was built with. Everything that needs the client fails with
/// [`Error::NotInitialized`] before that.
pub struct Connection<F: ClientFactory> {
    options: ConnectionOptions,
    factory: F,
    client:  Option<Rc<F::Client>>,
}

impl<F: ClientFactory> std::fmt::Debug for Connection<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("options", &self.options)
            .field("started", &self.client.is_some())
            .finish()
    }
}

impl<F: ClientFactory> Connection<F> {
    pub fn new(options: ConnectionOptions, factory: F) -> Self {
        Self {
            options,
            factory,
            client: None,
        }
    }

    /// Create a connection from untyped options. Fails unless `options` is an
    /// object with a string `endpoint`.
    pub fn from_value(options: &Value, factory: F) -> Result<Self, ConfigurationError> {
        Ok(Self::new(ConnectionOptions::validate(options)?, factory))
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    pub fn endpoint(&self) -> &str {
        &self.options.endpoint
    }

    pub fn is_started(&self) -> bool {
        self.client.is_some()
    }

    /// The current client, if started.
    pub fn client(&self) -> Option<&Rc<F::Client>> {
        self.client.as_ref()
    }

    fn started(&self) -> Result<&Rc<F::Client>, Error<ClientError<F>>> {
        self.client.as_ref().ok_or(Error::NotInitialized)
    }

    /// Create the client. Nothing is sent over the network.
    ///
    /// Calling this again replaces the client. The old one is not
    /// disconnected, call [`Self::disconnect`] first if it was connected.
    /// Channels created from the old client keep listening to it.
    pub fn start(&mut self) -> &Rc<F::Client> {
        debug!(
            endpoint = %self.options.endpoint,
            replaced = self.client.is_some(),
            "Creating DDP client"
        );
        let client = self.factory.create(&self.options.client_options());
        self.client.insert(Rc::new(client))
    }

    /// Start connecting the transport. Watch [`Self::connected`] for the
    /// outcome.
    pub fn connect(&self) -> Result<(), Error<ClientError<F>>> {
        debug!(endpoint = %self.options.endpoint, "Connecting");
        self.started()?.connect();
        Ok(())
    }

    pub fn disconnect(&self) -> Result<(), Error<ClientError<F>>> {
        debug!(endpoint = %self.options.endpoint, "Disconnecting");
        self.started()?.disconnect();
        Ok(())
    }

    /// Invoke a remote method.
    ///
    /// Results marked as application errors (see [`ApplicationError`]) are
    /// returned as [`Error::Application`], client failures as
    /// [`Error::Transport`].
    pub async fn call(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, Error<ClientError<F>>> {
        let client = self.started()?;
        let result = client
            .call(method, params)
            .await
            .map_err(Error::Transport)?;
        Ok(ApplicationError::check(result)?)
    }

    /// Log in with an email and password. The client's result is passed
    /// through as is.
    pub async fn login_with_password(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Value, Error<ClientError<F>>> {
        let credentials = PasswordCredentials {
            email:    email.into(),
            password: password.into(),
        };
        self.started()?
            .login_with_password(credentials)
            .await
            .map_err(Error::Transport)
    }

    pub async fn logout(&self) -> Result<(), Error<ClientError<F>>> {
        self.started()?.logout().await.map_err(Error::Transport)
    }

    /// Subscribe to a publication. The subscription becomes active
    /// asynchronously, see [`Self::ready`].
    pub fn subscribe(
        &self,
        name: &str,
        params: Vec<Value>,
    ) -> Result<<F::Client as Client>::Subscription, Error<ClientError<F>>> {
        Ok(self.started()?.subscribe(name, params))
    }

    pub fn unsubscribe(&self, id: &str) -> Result<(), Error<ClientError<F>>> {
        self.started()?.unsubscribe(id);
        Ok(())
    }

    /// Id of the logged in user.
    pub fn user_id(&self) -> Result<Option<String>, Error<ClientError<F>>> {
        Ok(self.started()?.user_id())
    }

    fn status_channel(
        &self,
        kind: TransportEventKind,
        status: ConnectionStatus,
    ) -> Result<Channel<ConnectionStatus>, Error<ClientError<F>>> {
        let client = self.started()?.clone();
        Ok(Channel::new(move |tx| {
            let mut listeners = ListenerSet::new();
            listeners.listen(
                &client,
                <F::Client as Client>::transport,
                kind,
                move |_: &TransportEvent| {
                    tx.send(status);
                },
            );
            listeners
        }))
    }

    /// Yields [`ConnectionStatus::Connected`] every time the transport
    /// connects.
    pub fn connected(&self) -> Result<Channel<ConnectionStatus>, Error<ClientError<F>>> {
        self.status_channel(TransportEventKind::Connected, ConnectionStatus::Connected)
    }

    /// Yields [`ConnectionStatus::Disconnected`] every time the transport
    /// disconnects.
    pub fn disconnected(&self) -> Result<Channel<ConnectionStatus>, Error<ClientError<F>>> {
        self.status_channel(
            TransportEventKind::Disconnected,
            ConnectionStatus::Disconnected,
        )
    }

    /// Yields the user id every time a login succeeds.
    pub fn logged_in(&self) -> Result<Channel<LoggedIn>, Error<ClientError<F>>> {
        let client = self.started()?.clone();
        Ok(Channel::new(move |tx| {
            let mut listeners = ListenerSet::new();
            // Listeners are stored in the client, don't let them own it.
            let weak = Rc::downgrade(&client);
            listeners.listen(
                &client,
                itself,
                ClientEvent::LoggedIn,
                move |_: &ClientEvent| {
                    let user_id = weak.upgrade().and_then(|client| client.user_id());
                    tx.send(LoggedIn { user_id });
                },
            );
            listeners
        }))
    }

    pub fn logged_out(&self) -> Result<Channel<LoggedOut>, Error<ClientError<F>>> {
        let client = self.started()?.clone();
        Ok(Channel::new(move |tx| {
            let mut listeners = ListenerSet::new();
            listeners.listen(
                &client,
                itself,
                ClientEvent::LoggedOut,
                move |_: &ClientEvent| {
                    tx.send(LoggedOut);
                },
            );
            listeners
        }))
    }

    /// Yields the added, changed and removed events of documents in
    /// `collection`. Mutations of other collections are skipped.
    pub fn collection(
        &self,
        collection: impl Into<String>,
    ) -> Result<Channel<CollectionEvent>, Error<ClientError<F>>> {
        let client = self.started()?.clone();
        let collection: Rc<str> = collection.into().into();
        Ok(Channel::new(move |tx| {
            let mut listeners = ListenerSet::new();
            for kind in [
                TransportEventKind::Added,
                TransportEventKind::Changed,
                TransportEventKind::Removed,
            ] {
                let tx = tx.clone();
                let collection = collection.clone();
                listeners.listen(
                    &client,
                    <F::Client as Client>::transport,
                    kind,
                    move |event: &TransportEvent| {
                        if let Some(record) = CollectionEvent::filter(&collection, event) {
                            tx.send(record);
                        }
                    },
                );
            }
            listeners
        }))
    }

    /// Yields every time `subscription` becomes ready.
    ///
    /// Only needs the subscription handle, so unlike the other channels this
    /// can't fail.
    pub fn ready(
        &self,
        subscription: &<F::Client as Client>::Subscription,
    ) -> Channel<SubscriptionReady> {
        let subscription = Rc::new(subscription.clone());
        Channel::new(move |tx| {
            let mut listeners = ListenerSet::new();
            let name = subscription.name().to_owned();
            listeners.listen(
                &subscription,
                itself,
                SubscriptionEventKind::Ready,
                move |_: &SubscriptionEvent| {
                    tx.send(SubscriptionReady {
                        subscription: name.clone(),
                    });
                },
            );
            listeners
        })
    }

    /// Yields the errors `subscription` reports.
    pub fn error(
        &self,
        subscription: &<F::Client as Client>::Subscription,
    ) -> Channel<SubscriptionError> {
        let subscription = Rc::new(subscription.clone());
        Channel::new(move |tx| {
            let mut listeners = ListenerSet::new();
            let name = subscription.name().to_owned();
            listeners.listen(
                &subscription,
                itself,
                SubscriptionEventKind::Error,
                move |event: &SubscriptionEvent| {
                    let SubscriptionEvent::Error(error) = event else {
                        return
                    };
                    tx.send(SubscriptionError {
                        subscription: name.clone(),
                        error:        error.clone(),
                    });
                },
            );
            listeners
        })
    }
}
