//! LCDd session client.
//!
//! A [`Client`] owns one TCP connection to LCDd. After [`Client::connect`]
//! the handshake runs in the background; once the session is `Ready`
//! (observe [`EventKind::Ready`] or await [`Client::wait_ready`]) the command
//! methods may be used.
//!
//! Every tracked command method returns `Result<Ack>`:
//!
//! - the outer `Result` reports validation and gating failures immediately,
//!   before anything is written or queued;
//! - the [`Ack`] resolves once the server acknowledges the request.
//!
//! ```rust,ignore
//! let client = Client::new(ClientConfig::new("localhost", 13666));
//! client.connect().await?;
//! client.wait_ready().await?;
//! client.add_key(["Enter"], KeyMode::Shared).await?.await?;
//! ```
//!
//! Pending acks have no timeout; wrap them in [`tokio::time::timeout`] if
//! bounded latency is needed.

pub mod connection;
pub mod events;
pub mod keepalive;
pub mod pending;
pub mod router;
pub mod session;
pub mod transport;
pub mod widgets;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use futures_util::SinkExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use crate::config::ClientConfig;
use crate::protocol::codec::LcddCodec;
use crate::protocol::command::{
    BacklightState, Command, KeyMode, OutputState, ScreenAttributes, WidgetType,
};
use crate::protocol::message::HandshakeInfo;
use crate::{AppError, Result};

use self::connection::{run_connection, Link, OUTGOING_CAPACITY};
use self::events::{ClientEvent, EventBus, EventKind, SubscriptionId};
use self::keepalive::{KeepAlive, KeepAliveHandle, KeepAliveTimer};
use self::router::Router;
use self::session::SessionState;

pub use self::pending::Ack;

/// Optional parts of a `widget_add` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetOptions {
    /// Frame the widget is placed in (`-in <frame>`).
    pub frame: Option<String>,
    /// Parameters applied with `widget_set` once the widget exists.
    pub params: Option<Vec<String>>,
}

impl WidgetOptions {
    /// No frame, no parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the widget inside `frame`.
    #[must_use]
    pub fn in_frame(mut self, frame: impl Into<String>) -> Self {
        self.frame = Some(frame.into());
        self
    }

    /// Set these parameters right after the widget is created.
    #[must_use]
    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = Some(params.into_iter().map(Into::into).collect());
        self
    }
}

/// Running connection owned by a client.
#[derive(Debug)]
struct Connected {
    link: Link,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Debug, Default)]
struct KeepAliveSlot {
    setting: KeepAlive,
    handle: Option<KeepAliveHandle>,
}

/// Client for one LCDd session.
#[derive(Debug)]
pub struct Client {
    config: ClientConfig,
    events: Arc<EventBus>,
    state: Arc<watch::Sender<SessionState>>,
    connect_started: AtomicBool,
    connected: OnceLock<Connected>,
    keep_alive: Mutex<KeepAliveSlot>,
}

impl Client {
    /// Create a disconnected client. Nothing is sent until [`Client::connect`].
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let keep_alive = KeepAliveSlot {
            setting: config.keep_alive(),
            handle: None,
        };
        let (state, _) = watch::channel(SessionState::Disconnected);

        Self {
            config,
            events: Arc::new(EventBus::new()),
            state: Arc::new(state),
            connect_started: AtomicBool::new(false),
            connected: OnceLock::new(),
            keep_alive: Mutex::new(keep_alive),
        }
    }

    // ── Connection lifecycle ────────────────────────────────────────────────

    /// Connect to LCDd, send `hello` and start the handshake.
    ///
    /// Returns once `hello` is written; the `ready` event follows when the
    /// server accepts the client name. Emits `init` before returning.
    ///
    /// # Errors
    ///
    /// - [`AppError::AlreadyConnected`] if called more than once.
    /// - [`AppError::Io`] if the server cannot be reached; the client is then
    ///   `Closed` for good and an `error` event is emitted.
    pub async fn connect(&self) -> Result<()> {
        if self.connect_started.swap(true, Ordering::SeqCst) {
            return Err(AppError::AlreadyConnected);
        }

        match transport::connect(&self.config.host, self.config.port).await {
            Ok(stream) => self.start(stream).await,
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn start<T>(&self, stream: T) -> Result<()>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let mut framed = Framed::new(stream, LcddCodec::new());
        if let Err(err) = framed.send(Command::Hello.to_line()).await {
            return Err(self.fail(err));
        }
        self.state.send_replace(SessionState::Handshaking);
        info!(host = %self.config.host, port = self.config.port, "client: hello sent");
        self.events.emit(&ClientEvent::Init);

        let (tx, rx) = mpsc::channel(OUTGOING_CAPACITY);
        let link = Link::new(tx, self.state.subscribe());
        let cancel = CancellationToken::new();
        let span = info_span!(
            "lcdd_connection",
            host = %self.config.host,
            port = self.config.port
        );
        // Published before the task starts so `ready` handlers can issue commands.
        let published = self.connected.set(Connected {
            link,
            cancel: cancel.clone(),
            task: Mutex::new(None),
        });
        if published.is_err() {
            return Err(AppError::AlreadyConnected);
        }

        let task = tokio::spawn(
            run_connection(
                framed,
                Router::new(self.config.name.clone()),
                rx,
                Arc::clone(&self.events),
                Arc::clone(&self.state),
                cancel,
            )
            .instrument(span),
        );

        if let Some(connected) = self.connected.get() {
            *connected
                .task
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(task);
        }

        let setting = self.keep_alive();
        self.set_keep_alive(setting)
    }

    fn fail(&self, err: AppError) -> AppError {
        self.state.send_replace(SessionState::Closed);
        self.events.emit(&ClientEvent::Error(err.clone()));
        err
    }

    /// Close the connection and stop the keep-alive timer.
    ///
    /// Outstanding acks resolve to [`AppError::ConnectionClosed`]. No `error`
    /// event is emitted for an explicit close.
    pub async fn close(&self) {
        let handle = self
            .keep_alive
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handle
            .take();
        if let Some(handle) = handle {
            handle.await_completion().await;
        }

        match self.connected.get() {
            Some(connected) => {
                connected.cancel.cancel();
                let task = connected
                    .task
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(task) = task {
                    let _ = task.await;
                }
            }
            None => {
                self.connect_started.store(true, Ordering::SeqCst);
                self.state.send_replace(SessionState::Closed);
            }
        }
    }

    /// Wait until the handshake completes.
    ///
    /// # Errors
    ///
    /// [`AppError::ConnectionClosed`] if the session closes first.
    pub async fn wait_ready(&self) -> Result<HandshakeInfo> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|s| matches!(s, SessionState::Ready(_) | SessionState::Closed))
            .await
            .map_err(|_| AppError::ConnectionClosed)?;
        match &*state {
            SessionState::Ready(info) => Ok(info.clone()),
            _ => Err(AppError::ConnectionClosed),
        }
    }

    // ── State & configuration ───────────────────────────────────────────────

    /// Configuration this client was created with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Whether commands may be issued.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.borrow().is_ready()
    }

    /// Display geometry and versions, once `Ready`.
    #[must_use]
    pub fn handshake_info(&self) -> Option<HandshakeInfo> {
        self.state.borrow().handshake().cloned()
    }

    /// Display width in characters (0 before the handshake).
    #[must_use]
    pub fn width(&self) -> u16 {
        self.handshake_info().map_or(0, |info| info.width)
    }

    /// Display height in characters (0 before the handshake).
    #[must_use]
    pub fn height(&self) -> u16 {
        self.handshake_info().map_or(0, |info| info.height)
    }

    /// Current keep-alive setting.
    #[must_use]
    pub fn keep_alive(&self) -> KeepAlive {
        self.keep_alive
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .setting
    }

    /// Change the keep-alive setting.
    ///
    /// Replaces (and stops) any running timer. Accepts a [`KeepAlive`], a
    /// `bool` (`true` selects the default interval) or a [`Duration`]
    /// (zero disables). Before [`Client::connect`] the setting is only
    /// stored; the timer starts with the connection.
    ///
    /// # Errors
    ///
    /// [`AppError::Config`] if a timer must start outside a tokio runtime.
    ///
    /// [`Duration`]: std::time::Duration
    pub fn set_keep_alive(&self, setting: impl Into<KeepAlive>) -> Result<()> {
        let setting = setting.into();
        let mut slot = self
            .keep_alive
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        slot.setting = setting;
        slot.handle = None;

        let (Some(interval), Some(connected)) = (setting.interval(), self.connected.get()) else {
            return Ok(());
        };

        let runtime = Handle::try_current()
            .map_err(|err| AppError::Config(format!("keep-alive needs a tokio runtime: {err}")))?;
        slot.handle = Some(KeepAliveTimer::new(interval, connected.link.clone()).spawn(&runtime));
        Ok(())
    }

    // ── Events ──────────────────────────────────────────────────────────────

    /// Event registry shared with the connection task.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Register `handler` for events of `kind`.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, handler)
    }

    /// Remove a handler registered with [`Client::on`].
    pub fn off(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ── Commands ────────────────────────────────────────────────────────────

    fn link(&self) -> Result<&Link> {
        match self.connected.get() {
            Some(connected) => Ok(&connected.link),
            None => {
                self.state.borrow().ensure_ready()?;
                Err(AppError::NotReady)
            }
        }
    }

    async fn submit(&self, command: Command) -> Result<Ack> {
        self.link()?.submit(command, None).await
    }

    /// Reserve keys: `client_add_key <mode> <names...>`.
    ///
    /// # Errors
    ///
    /// [`AppError::MissingArgument`] if `keys` is empty (nothing is sent);
    /// otherwise [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per
    /// session state.
    pub async fn add_key<I, S>(&self, keys: I, mode: KeyMode) -> Result<Ack>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = key_names(keys)?;
        self.submit(Command::AddKey { mode, keys }).await
    }

    /// [`Client::add_key`] with the mode given by name (`shared`, `exclusive`).
    ///
    /// # Errors
    ///
    /// [`AppError::InvalidKeyMode`] for an unknown mode (nothing is sent),
    /// otherwise as [`Client::add_key`].
    pub async fn add_key_named<I, S>(&self, keys: I, mode: &str) -> Result<Ack>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mode: KeyMode = mode.parse()?;
        self.add_key(keys, mode).await
    }

    /// Release keys: `client_del_key <names...>`.
    ///
    /// # Errors
    ///
    /// Same as [`Client::add_key`].
    pub async fn delete_key<I, S>(&self, keys: I) -> Result<Ack>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = key_names(keys)?;
        self.submit(Command::DelKey(keys)).await
    }

    /// `noop`; acknowledged from the no-op queue only.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn noop(&self) -> Result<Ack> {
        self.submit(Command::Noop).await
    }

    /// `info`, written without tracking its reply.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn info(&self) -> Result<()> {
        self.link()?.submit_untracked(Command::Info).await
    }

    /// Set general purpose outputs: `output <state>`.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn output(&self, state: OutputState) -> Result<Ack> {
        self.submit(Command::Output(state)).await
    }

    /// Set the client backlight: `backlight <state>`.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn set_backlight(&self, state: BacklightState) -> Result<Ack> {
        self.submit(Command::Backlight(state)).await
    }

    /// Create a screen: `screen_add <id>`.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn add_screen(&self, id: impl Into<String>) -> Result<Ack> {
        self.submit(Command::ScreenAdd(id.into())).await
    }

    /// Create a screen and then apply `attrs`.
    ///
    /// `screen_set` is only written after `screen_add` succeeds; the returned
    /// ack resolves with the outcome of the `screen_set`, or with the
    /// `screen_add` error if creation failed. Empty `attrs` behave like
    /// [`Client::add_screen`].
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn add_screen_with(
        &self,
        id: impl Into<String>,
        attrs: ScreenAttributes,
    ) -> Result<Ack> {
        let id = id.into();
        if attrs.is_empty() {
            return self.add_screen(id).await;
        }
        let next = Command::ScreenSet {
            id: id.clone(),
            attrs,
        };
        self.link()?.submit(Command::ScreenAdd(id), Some(next)).await
    }

    /// Update screen attributes: `screen_set <id> -<key> <value>...`.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn set_screen(&self, id: impl Into<String>, attrs: ScreenAttributes) -> Result<Ack> {
        self.submit(Command::ScreenSet {
            id: id.into(),
            attrs,
        })
        .await
    }

    /// Remove a screen: `screen_del <id>`.
    ///
    /// No local existence check is made; the server decides.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn del_screen(&self, id: impl Into<String>) -> Result<Ack> {
        self.submit(Command::ScreenDel(id.into())).await
    }

    /// Create a widget: `widget_add <screen> <widget> <type> [-in <frame>]`.
    ///
    /// With `options.params`, `widget_set` follows once the add succeeds and
    /// the ack reports its outcome, as for [`Client::add_screen_with`].
    ///
    /// # Errors
    ///
    /// [`AppError::MissingArgument`] if `options.params` is present but
    /// empty; otherwise per session state.
    pub async fn add_widget(
        &self,
        screen: impl Into<String>,
        widget: impl Into<String>,
        kind: WidgetType,
        options: WidgetOptions,
    ) -> Result<Ack> {
        let params = options.params.map(widget_params).transpose()?;
        let (screen, widget) = (screen.into(), widget.into());
        let next = params.map(|params| Command::WidgetSet {
            screen: screen.clone(),
            widget: widget.clone(),
            params,
        });
        let add = Command::WidgetAdd {
            screen,
            widget,
            kind,
            frame: options.frame,
        };
        self.link()?.submit(add, next).await
    }

    /// [`Client::add_widget`] with the widget type given by name.
    ///
    /// # Errors
    ///
    /// [`AppError::InvalidWidgetType`] for a name outside the widget
    /// vocabulary (nothing is sent), otherwise as [`Client::add_widget`].
    pub async fn add_widget_named(
        &self,
        screen: impl Into<String>,
        widget: impl Into<String>,
        kind: &str,
        options: WidgetOptions,
    ) -> Result<Ack> {
        let kind: WidgetType = kind.parse()?;
        self.add_widget(screen, widget, kind, options).await
    }

    /// Update widget parameters: `widget_set <screen> <widget> <params...>`.
    ///
    /// # Errors
    ///
    /// [`AppError::MissingArgument`] if `params` is empty (nothing is sent);
    /// otherwise per session state.
    pub async fn set_widget<I, S>(
        &self,
        screen: impl Into<String>,
        widget: impl Into<String>,
        params: I,
    ) -> Result<Ack>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params = widget_params(params.into_iter().map(Into::into).collect())?;
        self.submit(Command::WidgetSet {
            screen: screen.into(),
            widget: widget.into(),
            params,
        })
        .await
    }

    /// Remove a widget: `widget_del <screen> <widget>`.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn del_widget(
        &self,
        screen: impl Into<String>,
        widget: impl Into<String>,
    ) -> Result<Ack> {
        self.submit(Command::WidgetDel {
            screen: screen.into(),
            widget: widget.into(),
        })
        .await
    }
}

fn key_names<I, S>(keys: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
    if keys.is_empty() {
        return Err(AppError::MissingArgument("at least one key name is required".into()));
    }
    Ok(keys)
}

fn widget_params(params: Vec<String>) -> Result<Vec<String>> {
    if params.is_empty() {
        return Err(AppError::MissingArgument("widget parameters must not be empty".into()));
    }
    Ok(params)
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(connected) = self.connected.get() {
            connected.cancel.cancel();
        }
    }
}
