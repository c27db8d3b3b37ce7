//! An in-process DDP client, events are fired by hand.
#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use ddp_channels::traits::{
    Client, ClientEvent, ClientOptions, Emitter, Listener, ListenerId, ListenerMap,
    PasswordCredentials, Subscription, SubscriptionEvent, SubscriptionEventKind, TransportEvent,
};
use futures_util::{future::LocalBoxFuture, FutureExt};
use serde_json::Value;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("mock transport failure: {0}")]
pub struct MockError(pub String);

type Reply = Result<Value, MockError>;

#[derive(Debug)]
pub struct MockClient {
    pub options:      ClientOptions,
    pub events:       ListenerMap<ClientEvent>,
    pub transport:    ListenerMap<TransportEvent>,
    pub user_id:      RefCell<Option<String>>,
    pub connects:     Cell<usize>,
    pub disconnects:  Cell<usize>,
    pub calls:        RefCell<Vec<(String, Vec<Value>)>>,
    pub logins:       RefCell<Vec<PasswordCredentials>>,
    pub logout_error: RefCell<Option<MockError>>,
    pub unsubscribed: RefCell<Vec<String>>,
    next_id:          Cell<u32>,
    replies:          (smol::channel::Sender<Reply>, smol::channel::Receiver<Reply>),
}

impl MockClient {
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            events: ListenerMap::new(),
            transport: ListenerMap::new(),
            user_id: RefCell::new(None),
            connects: Cell::new(0),
            disconnects: Cell::new(0),
            calls: RefCell::new(Vec::new()),
            logins: RefCell::new(Vec::new()),
            logout_error: RefCell::new(None),
            unsubscribed: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            replies: smol::channel::unbounded(),
        }
    }

    /// Queue the reply for the next `call` or `login_with_password`.
    pub fn reply(&self, reply: Reply) {
        self.replies.0.try_send(reply).unwrap();
    }

    pub fn fire(&self, event: TransportEvent) {
        self.transport.emit(&event);
    }

    pub fn log_in(&self, user_id: &str) {
        *self.user_id.borrow_mut() = Some(user_id.to_owned());
        self.events.emit(&ClientEvent::LoggedIn);
    }

    pub fn log_out(&self) {
        *self.user_id.borrow_mut() = None;
        self.events.emit(&ClientEvent::LoggedOut);
    }

    fn next_reply(&self) -> LocalBoxFuture<'static, Reply> {
        let replies = self.replies.1.clone();
        async move {
            replies
                .recv()
                .await
                .unwrap_or_else(|_| Err(MockError("reply channel closed".into())))
        }
        .boxed_local()
    }
}

pub fn mock_factory(options: &ClientOptions) -> MockClient {
    MockClient::new(options.clone())
}

impl Emitter<ClientEvent> for MockClient {
    fn add_listener(&self, kind: ClientEvent, listener: Listener<ClientEvent>) -> ListenerId {
        self.events.add_listener(kind, listener)
    }

    fn remove_listener(&self, kind: ClientEvent, id: ListenerId) -> bool {
        self.events.remove_listener(kind, id)
    }
}

#[derive(Debug)]
struct SubscriptionInner {
    id:     String,
    name:   String,
    params: Vec<Value>,
    events: ListenerMap<SubscriptionEvent>,
}

#[derive(Debug, Clone)]
pub struct MockSubscription(Rc<SubscriptionInner>);

impl MockSubscription {
    pub fn fire(&self, event: SubscriptionEvent) {
        self.0.events.emit(&event);
    }

    pub fn params(&self) -> &[Value] {
        &self.0.params
    }

    pub fn listener_count(&self, kind: SubscriptionEventKind) -> usize {
        self.0.events.listener_count(kind)
    }
}

impl Emitter<SubscriptionEvent> for MockSubscription {
    fn add_listener(
        &self,
        kind: SubscriptionEventKind,
        listener: Listener<SubscriptionEvent>,
    ) -> ListenerId {
        self.0.events.add_listener(kind, listener)
    }

    fn remove_listener(&self, kind: SubscriptionEventKind, id: ListenerId) -> bool {
        self.0.events.remove_listener(kind, id)
    }
}

impl Subscription for MockSubscription {
    fn id(&self) -> &str {
        &self.0.id
    }

    fn name(&self) -> &str {
        &self.0.name
    }
}

impl Client for MockClient {
    type CallFut<'a> = LocalBoxFuture<'a, Reply>;
    type Error = MockError;
    type LoginFut<'a> = LocalBoxFuture<'a, Reply>;
    type LogoutFut<'a> = futures_util::future::Ready<Result<(), MockError>>;
    type Subscription = MockSubscription;
    type Transport = ListenerMap<TransportEvent>;

    fn transport(&self) -> &Self::Transport {
        &self.transport
    }

    fn user_id(&self) -> Option<String> {
        self.user_id.borrow().clone()
    }

    fn connect(&self) {
        self.connects.set(self.connects.get() + 1);
    }

    fn disconnect(&self) {
        self.disconnects.set(self.disconnects.get() + 1);
    }

    fn call<'a>(&'a self, method: &'a str, params: Vec<Value>) -> Self::CallFut<'a> {
        self.calls.borrow_mut().push((method.to_owned(), params));
        self.next_reply()
    }

    fn login_with_password(&self, credentials: PasswordCredentials) -> Self::LoginFut<'_> {
        self.logins.borrow_mut().push(credentials);
        self.next_reply()
    }

    fn logout(&self) -> Self::LogoutFut<'_> {
        let result = match self.logout_error.borrow_mut().take() {
            Some(error) => Err(error),
            None => Ok(()),
        };
        futures_util::future::ready(result)
    }

    fn subscribe(&self, name: &str, params: Vec<Value>) -> Self::Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        MockSubscription(Rc::new(SubscriptionInner {
            id: format!("sub{id}"),
            name: name.to_owned(),
            params,
            events: ListenerMap::new(),
        }))
    }

    fn unsubscribe(&self, id: &str) {
        self.unsubscribed.borrow_mut().push(id.to_owned());
    }
}
