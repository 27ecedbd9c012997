//! Publish/subscribe surface for server-initiated events.
//!
//! Handlers are registered per [`EventKind`] and run on the connection task
//! in the order they were registered. They must not block; long work belongs
//! in a spawned task or behind [`EventBus::channel`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::message::HandshakeInfo;
use crate::AppError;

/// Event categories a handler can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Transport connected and `hello` sent.
    Init,
    /// Handshake complete.
    Ready,
    /// Reserved key pressed.
    KeyPress,
    /// Screen became visible.
    Listen,
    /// Screen was hidden.
    Ignore,
    /// Menu interaction.
    MenuEvent,
    /// Unsolicited rejection or connection failure.
    Error,
    /// Unsolicited `success` with no pending call.
    Success,
}

/// An event delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Transport connected and `hello` sent.
    Init,
    /// Handshake complete with the negotiated display information.
    Ready(HandshakeInfo),
    /// Name of the pressed key.
    KeyPress(String),
    /// Id of the screen now visible.
    Listen(String),
    /// Id of the screen now hidden.
    Ignore(String),
    /// Full raw `menuevent` line.
    MenuEvent(String),
    /// Unmatched `huh?`, handshake failure or connection loss.
    Error(AppError),
    /// `success` that matched no pending call.
    Success,
}

impl ClientEvent {
    /// Category of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Init => EventKind::Init,
            Self::Ready(_) => EventKind::Ready,
            Self::KeyPress(_) => EventKind::KeyPress,
            Self::Listen(_) => EventKind::Listen,
            Self::Ignore(_) => EventKind::Ignore,
            Self::MenuEvent(_) => EventKind::MenuEvent,
            Self::Error(_) => EventKind::Error,
            Self::Success => EventKind::Success,
        }
    }
}

/// Token returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    handler: Handler,
}

/// Registry of event handlers shared between a client and its connection task.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("EventBus")
            .field("subscriptions", &count)
            .finish()
    }
}

impl EventBus {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of `kind`.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                id,
                kind,
                handler: Arc::new(handler),
            });
        id
    }

    /// Remove a handler. Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    /// Forward events of `kind` into an unbounded channel.
    ///
    /// The subscription lives until [`EventBus::unsubscribe`] is called with
    /// the returned id; events sent after the receiver is dropped are discarded.
    pub fn channel(&self, kind: EventKind) -> (SubscriptionId, mpsc::UnboundedReceiver<ClientEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(kind, move |event| {
            let _ = tx.send(event.clone());
        });
        (id, rx)
    }

    /// Deliver `event` to every handler registered for its kind.
    ///
    /// Handlers run outside the registry lock, so they may subscribe or
    /// unsubscribe re-entrantly.
    pub fn emit(&self, event: &ClientEvent) {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| Arc::clone(&s.handler))
            .collect();

        if handlers.is_empty() {
            debug!(?kind, "events: no subscribers");
        }

        for handler in handlers {
            handler(event);
        }
    }
}
