//! Response router.
//!
//! Classifies each inbound line and decides what it completes or emits. The
//! router performs no I/O: [`Router::route`] returns [`Action`]s that the
//! connection task carries out in order, which keeps every correlation
//! decision testable without a socket.
//!
//! | Token 0     | Action                                                        |
//! |-------------|---------------------------------------------------------------|
//! | `connect`   | record geometry, send `client_set name`                       |
//! | `success`   | handshake: enter `Ready`; else complete oldest command or emit |
//! | `huh?`      | handshake: fatal; else reject oldest command or emit `error`  |
//! | `noop`      | complete oldest no-op call (never emits)                      |
//! | `key`       | emit `keypress`                                               |
//! | `listen`    | emit `listen`                                                 |
//! | `ignore`    | emit `ignore`                                                 |
//! | `menuevent` | emit `menuevent` with the raw line                            |
//! | *(other)*   | logged at `DEBUG` and dropped                                 |

use tracing::{debug, info, warn};

use crate::client::events::ClientEvent;
use crate::client::pending::{Completion, PendingCall, PendingQueue};
use crate::client::session::{Handshake, SessionState};
use crate::protocol::command::{AckQueue, Command};
use crate::protocol::message::ServerMessage;
use crate::AppError;

/// Side effect requested by the router.
#[derive(Debug)]
pub enum Action {
    /// Write `command`, enqueueing `completion` in the same step.
    Send {
        /// Request to write.
        command: Command,
        /// Continuation for its acknowledgement, if tracked.
        completion: Option<Completion>,
    },
    /// Deliver an event to subscribers.
    Emit(ClientEvent),
    /// Publish a new session state.
    State(SessionState),
    /// Tear the connection down with `reason`.
    Shutdown(AppError),
}

/// Correlation state for one connection: handshake progress plus both
/// pending-call queues.
#[derive(Debug)]
pub struct Router {
    name: String,
    handshake: Handshake,
    commands: PendingQueue,
    noops: PendingQueue,
}

impl Router {
    /// Router for a client announcing itself as `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handshake: Handshake::default(),
            commands: PendingQueue::new(),
            noops: PendingQueue::new(),
        }
    }

    /// Current handshake progress.
    #[must_use]
    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// Outstanding calls on `queue`.
    #[must_use]
    pub fn pending(&self, queue: AckQueue) -> usize {
        self.queue(queue).len()
    }

    /// Register the completion for a request about to be written.
    pub fn enqueue(&mut self, queue: AckQueue, verb: &'static str, completion: Completion) {
        self.queue_mut(queue).push(PendingCall { verb, completion });
    }

    /// Withdraw the newest call on `queue` after its write failed.
    pub fn withdraw(&mut self, queue: AckQueue) -> Option<PendingCall> {
        self.queue_mut(queue).pop_newest()
    }

    /// Fail every outstanding call on both queues.
    pub fn fail_pending(&mut self, err: &AppError) {
        self.commands.fail_all(err);
        self.noops.fail_all(err);
    }

    /// Route one framed line.
    pub fn route(&mut self, line: &str) -> Vec<Action> {
        match ServerMessage::parse(line) {
            ServerMessage::Connect(info) => {
                if self.handshake != Handshake::AwaitingConnect {
                    warn!(line, "router: unexpected connect, ignoring");
                    return Vec::new();
                }
                info!(
                    width = info.width,
                    height = info.height,
                    server = %info.server_version,
                    protocol = %info.protocol_version,
                    "router: server connect received"
                );
                self.handshake = Handshake::AwaitingNameAck(info);
                vec![Action::Send {
                    command: Command::ClientSetName(self.name.clone()),
                    completion: None,
                }]
            }

            ServerMessage::Success => self.on_success(),

            ServerMessage::Huh(raw) => self.on_huh(raw),

            ServerMessage::Noop => {
                match self.noops.pop_oldest() {
                    Some(call) => call.completion.finish(Ok(())),
                    None => debug!("router: noop with no pending call"),
                }
                Vec::new()
            }

            ServerMessage::Key(key) => vec![Action::Emit(ClientEvent::KeyPress(key))],
            ServerMessage::Listen(screen) => vec![Action::Emit(ClientEvent::Listen(screen))],
            ServerMessage::Ignore(screen) => vec![Action::Emit(ClientEvent::Ignore(screen))],
            ServerMessage::MenuEvent(raw) => vec![Action::Emit(ClientEvent::MenuEvent(raw))],

            ServerMessage::Unknown(raw) => {
                debug!(line = %raw, "router: unrecognised server message");
                Vec::new()
            }
        }
    }

    fn on_success(&mut self) -> Vec<Action> {
        match std::mem::replace(&mut self.handshake, Handshake::Complete) {
            Handshake::AwaitingNameAck(info) => {
                info!("router: handshake complete");
                vec![
                    Action::State(SessionState::Ready(info.clone())),
                    Action::Emit(ClientEvent::Ready(info)),
                ]
            }
            Handshake::Complete => match self.commands.pop_oldest() {
                Some(call) => {
                    debug!(verb = call.verb, "router: success");
                    match call.completion.resolve(Ok(())) {
                        Some((command, completion)) => vec![Action::Send {
                            command,
                            completion: Some(completion),
                        }],
                        None => Vec::new(),
                    }
                }
                None => vec![Action::Emit(ClientEvent::Success)],
            },
            other => {
                warn!(handshake = ?other, "router: success before connect, ignoring");
                self.handshake = other;
                Vec::new()
            }
        }
    }

    fn on_huh(&mut self, raw: String) -> Vec<Action> {
        match self.handshake {
            Handshake::AwaitingConnect | Handshake::AwaitingNameAck(_) => {
                warn!(line = %raw, "router: server rejected handshake");
                self.handshake = Handshake::Failed;
                vec![Action::Shutdown(AppError::HandshakeFailed(raw))]
            }
            Handshake::Complete => match self.commands.pop_oldest() {
                Some(call) => {
                    debug!(verb = call.verb, line = %raw, "router: rejected");
                    call.completion.finish(Err(AppError::ServerRejected(raw)));
                    Vec::new()
                }
                None => vec![Action::Emit(ClientEvent::Error(AppError::ServerRejected(
                    raw,
                )))],
            },
            Handshake::Failed => Vec::new(),
        }
    }

    fn queue(&self, queue: AckQueue) -> &PendingQueue {
        match queue {
            AckQueue::Command => &self.commands,
            AckQueue::Noop => &self.noops,
        }
    }

    fn queue_mut(&mut self, queue: AckQueue) -> &mut PendingQueue {
        match queue {
            AckQueue::Command => &mut self.commands,
            AckQueue::Noop => &mut self.noops,
        }
    }
}
