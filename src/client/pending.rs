//! Pending-call queues.
//!
//! LCDd acknowledgements carry no request identifier: the only way to match
//! a `success` or `huh?` to the command that caused it is arrival order. Each
//! queue therefore holds completions in exactly the order their request
//! lines were written, and is only ever drained from the front.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::debug;

use crate::protocol::command::Command;
use crate::{AppError, Result};

/// Typical queue depth; the deque grows past it if a caller floods the server.
const INITIAL_CAPACITY: usize = 16;

/// Future resolving when the server acknowledges a command.
///
/// Resolves to `Ok(())` on `success`/`noop`, to
/// [`AppError::ServerRejected`] on `huh?`, and to
/// [`AppError::ConnectionClosed`] if the connection ends first. Dropping an
/// `Ack` does not cancel the command; the acknowledgement is simply discarded.
#[derive(Debug)]
#[must_use = "an Ack does nothing unless awaited; drop it explicitly to ignore the reply"]
pub struct Ack {
    rx: oneshot::Receiver<Result<()>>,
}

impl Ack {
    /// Create a linked sender/`Ack` pair.
    pub(crate) fn channel() -> (oneshot::Sender<Result<()>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }
}

impl Future for Ack {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(AppError::ConnectionClosed)))
    }
}

/// What to do when a queued call is acknowledged.
#[derive(Debug)]
pub enum Completion {
    /// Deliver the outcome to the caller.
    Reply(oneshot::Sender<Result<()>>),
    /// On success, issue `next` and deliver *its* outcome to the caller.
    /// On failure, deliver the failure and skip `next`.
    Chain {
        /// Follow-up command issued after a successful acknowledgement.
        next: Command,
        /// Caller's reply channel.
        reply: oneshot::Sender<Result<()>>,
    },
}

impl Completion {
    /// Deliver `outcome` directly to the caller.
    ///
    /// For a `Chain`, a success is *not* final; use [`Completion::resolve`]
    /// in that case.
    pub fn finish(self, outcome: Result<()>) {
        let reply = match self {
            Self::Reply(reply) | Self::Chain { reply, .. } => reply,
        };
        if reply.send(outcome).is_err() {
            debug!("pending: caller dropped its ack before completion");
        }
    }

    /// Apply an acknowledgement, returning a follow-up request when the
    /// completion chains into another command.
    pub fn resolve(self, outcome: Result<()>) -> Option<(Command, Completion)> {
        match (self, outcome) {
            (Self::Chain { next, reply }, Ok(())) => Some((next, Self::Reply(reply))),
            (completion, outcome) => {
                completion.finish(outcome);
                None
            }
        }
    }
}

/// One outstanding request awaiting acknowledgement.
#[derive(Debug)]
pub struct PendingCall {
    /// Verb of the request, for diagnostics.
    pub verb: &'static str,
    /// Continuation run when the acknowledgement arrives.
    pub completion: Completion,
}

/// Strict FIFO of pending calls.
#[derive(Debug)]
pub struct PendingQueue {
    calls: VecDeque<PendingCall>,
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingQueue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: VecDeque::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Append a call; must happen in the same step as writing its request.
    pub fn push(&mut self, call: PendingCall) {
        self.calls.push_back(call);
    }

    /// Remove the most recently pushed call (used when its write failed).
    pub fn pop_newest(&mut self) -> Option<PendingCall> {
        self.calls.pop_back()
    }

    /// Remove the oldest call.
    pub fn pop_oldest(&mut self) -> Option<PendingCall> {
        self.calls.pop_front()
    }

    /// Number of outstanding calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether nothing is outstanding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Fail every outstanding call with `err`, oldest first.
    pub fn fail_all(&mut self, err: &AppError) {
        for call in self.calls.drain(..) {
            call.completion.finish(Err(err.clone()));
        }
    }
}
