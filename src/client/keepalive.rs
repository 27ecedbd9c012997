//! Keep-alive timer.
//!
//! Sends `noop` at a fixed interval so idle sessions are not dropped by
//! intermediaries. The timer submits through the same [`Link`] as every
//! other command, so its no-ops are ordered with user requests and drain the
//! no-op queue like a user-issued [`Client::noop`](crate::client::Client::noop).

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::client::connection::Link;
use crate::protocol::command::Command;
use crate::AppError;

/// Keep-alive setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeepAlive {
    /// No timer.
    #[default]
    Disabled,
    /// Timer at [`KeepAlive::DEFAULT_INTERVAL`].
    Default,
    /// Timer at a custom interval.
    Every(Duration),
}

impl KeepAlive {
    /// Interval used by [`KeepAlive::Default`].
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

    /// Effective interval, or `None` when disabled.
    #[must_use]
    pub fn interval(self) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Default => Some(Self::DEFAULT_INTERVAL),
            Self::Every(interval) if interval.is_zero() => None,
            Self::Every(interval) => Some(interval),
        }
    }
}

impl From<bool> for KeepAlive {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Default
        } else {
            Self::Disabled
        }
    }
}

impl From<Duration> for KeepAlive {
    fn from(interval: Duration) -> Self {
        if interval.is_zero() {
            Self::Disabled
        } else {
            Self::Every(interval)
        }
    }
}

/// Builder for a keep-alive timer bound to one connection.
///
/// Call [`spawn`](Self::spawn) to start the background task.
pub struct KeepAliveTimer {
    interval: Duration,
    link: Link,
    cancel: CancellationToken,
}

impl KeepAliveTimer {
    /// Construct a timer (does not start it yet).
    #[must_use]
    pub fn new(interval: Duration, link: Link) -> Self {
        Self {
            interval,
            link,
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn the timer on `runtime` and return a handle that stops it on drop.
    #[must_use]
    pub fn spawn(self, runtime: &Handle) -> KeepAliveHandle {
        let cancel = self.cancel.clone();
        let interval = self.interval;
        let join_handle = runtime.spawn(
            Self::run(self.interval, self.link, self.cancel)
                .instrument(info_span!("keep_alive", interval_secs = interval.as_secs_f64())),
        );

        KeepAliveHandle {
            join_handle: Some(join_handle),
            cancel,
        }
    }

    async fn run(interval: Duration, link: Link, cancel: CancellationToken) {
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("keep-alive started");

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    debug!("keep-alive cancelled");
                    return;
                }

                _ = ticker.tick() => {
                    match link.submit(Command::Noop, None).await {
                        // The reply drains the no-op queue; nobody waits on it.
                        Ok(ack) => drop(ack),
                        Err(AppError::NotReady) => debug!("keep-alive: session not ready, skipping"),
                        Err(err) => {
                            debug!(%err, "keep-alive: connection gone, stopping");
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Handle returned from [`KeepAliveTimer::spawn`].
///
/// Dropping the handle stops the timer.
#[derive(Debug)]
pub struct KeepAliveHandle {
    join_handle: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl Drop for KeepAliveHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl KeepAliveHandle {
    /// Stop the timer and wait for its task to exit.
    pub async fn await_completion(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.await;
        }
    }
}
