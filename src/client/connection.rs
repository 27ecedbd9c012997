//! Connection task.
//!
//! One task per client owns the framed socket, the [`Router`] and both
//! pending-call queues. Callers hand it [`Outgoing`] requests over a bounded
//! channel; inbound lines and outbound requests are handled one at a time in
//! the same loop, so pushing a completion and writing its request line can
//! never interleave with another request. That ordering is the only thing
//! that lets acknowledgements be matched to commands.
//!
//! When the loop ends (EOF, I/O error, handshake rejection, or every
//! [`Link`] dropped) the session becomes `Closed`, outstanding acks resolve
//! to [`AppError::ConnectionClosed`], and an `error` event is emitted. An
//! explicit cancellation closes quietly.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::events::{ClientEvent, EventBus};
use crate::client::pending::{Ack, Completion};
use crate::client::router::{Action, Router};
use crate::client::session::SessionState;
use crate::protocol::codec::LcddCodec;
use crate::protocol::command::Command;
use crate::{AppError, Result};

/// Capacity of the outbound request channel.
pub const OUTGOING_CAPACITY: usize = 64;

/// A request handed to the connection task.
#[derive(Debug)]
pub struct Outgoing {
    /// Request to write.
    pub command: Command,
    /// Continuation for its acknowledgement; `None` for untracked lines.
    pub completion: Option<Completion>,
}

/// Cloneable handle for submitting requests to a running connection.
#[derive(Debug, Clone)]
pub struct Link {
    tx: mpsc::Sender<Outgoing>,
    state: watch::Receiver<SessionState>,
}

impl Link {
    /// Pair a request sender with the session state it is gated on.
    #[must_use]
    pub fn new(tx: mpsc::Sender<Outgoing>, state: watch::Receiver<SessionState>) -> Self {
        Self { tx, state }
    }

    /// Submit a tracked command, optionally chaining `next` after its success.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] before the handshake completes,
    /// [`AppError::ConnectionClosed`] once the connection task has stopped.
    pub async fn submit(&self, command: Command, next: Option<Command>) -> Result<Ack> {
        self.state.borrow().ensure_ready()?;

        let (reply, ack) = Ack::channel();
        let completion = match next {
            Some(next) => Completion::Chain { next, reply },
            None => Completion::Reply(reply),
        };

        self.send(Outgoing {
            command,
            completion: Some(completion),
        })
        .await?;
        Ok(ack)
    }

    /// Submit a command whose reply is not tracked.
    ///
    /// # Errors
    ///
    /// Same as [`Link::submit`].
    pub async fn submit_untracked(&self, command: Command) -> Result<()> {
        self.state.borrow().ensure_ready()?;
        self.send(Outgoing {
            command,
            completion: None,
        })
        .await
    }

    async fn send(&self, outgoing: Outgoing) -> Result<()> {
        self.tx
            .send(outgoing)
            .await
            .map_err(|_| AppError::ConnectionClosed)
    }
}

/// Connection task: drives one LCDd session until it ends.
///
/// The handshake's `hello` must already have been written to `framed`.
pub async fn run_connection<T>(
    mut framed: Framed<T, LcddCodec>,
    mut router: Router,
    mut outgoing_rx: mpsc::Receiver<Outgoing>,
    events: Arc<EventBus>,
    state: Arc<watch::Sender<SessionState>>,
    cancel: CancellationToken,
) where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let reason = loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("connection: cancellation received, stopping");
                break None;
            }

            item = framed.next() => {
                match item {
                    None => {
                        info!("connection: server closed the connection");
                        break Some(AppError::ConnectionClosed);
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "connection: read failed, stopping");
                        break Some(err);
                    }
                    Some(Ok(line)) => {
                        debug!(line = %line, "connection: received");
                        let actions = router.route(&line);
                        if let Err(err) = apply(&mut framed, &mut router, actions, &events, &state).await {
                            break Some(err);
                        }
                    }
                }
            }

            request = outgoing_rx.recv() => {
                match request {
                    None => {
                        debug!("connection: all links dropped, stopping");
                        break None;
                    }
                    Some(outgoing) => {
                        if let Err(err) = write(&mut framed, &mut router, outgoing).await {
                            break Some(err);
                        }
                    }
                }
            }
        }
    };

    state.send_replace(SessionState::Closed);
    router.fail_pending(&AppError::ConnectionClosed);
    outgoing_rx.close();
    while let Ok(outgoing) = outgoing_rx.try_recv() {
        if let Some(completion) = outgoing.completion {
            completion.finish(Err(AppError::ConnectionClosed));
        }
    }

    if let Some(err) = reason {
        events.emit(&ClientEvent::Error(err));
    }
    info!("connection: closed");
}

/// Carry out router actions in order.
async fn apply<T>(
    framed: &mut Framed<T, LcddCodec>,
    router: &mut Router,
    actions: Vec<Action>,
    events: &EventBus,
    state: &watch::Sender<SessionState>,
) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    for action in actions {
        match action {
            Action::Send {
                command,
                completion,
            } => write(framed, router, Outgoing { command, completion }).await?,
            Action::Emit(event) => events.emit(&event),
            Action::State(next) => {
                state.send_replace(next);
            }
            Action::Shutdown(err) => return Err(err),
        }
    }
    Ok(())
}

/// Enqueue the completion and write the request line as one step.
async fn write<T>(
    framed: &mut Framed<T, LcddCodec>,
    router: &mut Router,
    outgoing: Outgoing,
) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let Outgoing {
        command,
        completion,
    } = outgoing;
    let tracked = match (command.ack_queue(), completion) {
        (Some(queue), Some(completion)) => {
            router.enqueue(queue, command.verb(), completion);
            Some(queue)
        }
        (None, Some(completion)) => {
            completion.finish(Ok(()));
            None
        }
        (_, None) => None,
    };

    let line = command.to_line();
    debug!(line = %line, "connection: sending");

    if let Err(err) = framed.send(line).await {
        warn!(error = %err, verb = command.verb(), "connection: write failed");
        if let Some(call) = tracked.and_then(|q| router.withdraw(q)) {
            call.completion.finish(Err(err.clone()));
        }
        return Err(err);
    }

    Ok(())
}
