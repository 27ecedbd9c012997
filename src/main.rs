#![forbid(unsafe_code)]

//! `lcdd-demo`: exercises an LCDd server through the client library.
//!
//! Connects, reserves a few keys, puts up a demo screen with title, string,
//! scroller and icon widgets, toggles outputs and the backlight, and then
//! logs key presses and screen visibility changes until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use lcdd_client::client::Ack;
use lcdd_client::client::events::{ClientEvent, EventKind};
use lcdd_client::client::widgets::{Position, Region, Scroll};
use lcdd_client::protocol::command::{
    BacklightState, Direction, IconName, KeyMode, OutputState, ScreenAttributes,
};
use lcdd_client::{AppError, Client, ClientConfig, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "lcdd-demo", about = "LCDd client demo", version, long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the LCDd host.
    #[arg(long)]
    host: Option<String>,

    /// Override the LCDd port.
    #[arg(long)]
    port: Option<u16>,

    /// Override the client name shown by LCDd.
    #[arg(long)]
    name: Option<String>,

    /// Keep-alive interval in seconds (0 disables).
    #[arg(long)]
    keep_alive: Option<u64>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Cli {
    fn resolve_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load_from_path(path)?,
            None => ClientConfig::default(),
        };

        if let Some(ref host) = self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ref name) = self.name {
            config.name.clone_from(name);
        }
        if let Some(seconds) = self.keep_alive {
            config.keep_alive_seconds = seconds;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    let config = args.resolve_config()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(config))
}

async fn run(config: ClientConfig) -> Result<()> {
    let client = Arc::new(Client::new(config));

    client.on(EventKind::Init, |_| info!("initialisation started"));
    client.on(EventKind::KeyPress, |event| {
        if let ClientEvent::KeyPress(key) = event {
            info!(key = %key, "key pressed");
        }
    });
    client.on(EventKind::Listen, |event| {
        if let ClientEvent::Listen(screen) = event {
            info!(screen = %screen, "screen is now visible");
        }
    });
    client.on(EventKind::Ignore, |event| {
        if let ClientEvent::Ignore(screen) = event {
            info!(screen = %screen, "screen is now hidden");
        }
    });
    client.on(EventKind::Error, |event| {
        if let ClientEvent::Error(err) = event {
            warn!(%err, "client error");
        }
    });

    client.connect().await?;
    let info = client.wait_ready().await?;
    info!(
        width = info.width,
        height = info.height,
        server = %info.server_version,
        "client is ready"
    );

    add_keys(&client).await?;
    tokio::spawn(report("noop", client.noop().await?));
    client.info().await?;
    schedule_outputs(&client);
    show_demo_screen(&client).await?;

    let released = Arc::clone(&client);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(15)).await;
        if let Err(err) = delete_keys(&released).await {
            warn!(%err, "failed to release keys");
        }
    });

    shutdown_signal().await;
    info!("shutdown signal received");
    client.close().await;
    Ok(())
}

async fn add_keys(client: &Client) -> Result<()> {
    tokio::spawn(report("bind A", client.add_key(["A"], KeyMode::Exclusive).await?));
    tokio::spawn(report("bind Enter", client.add_key(["Enter"], KeyMode::Shared).await?));
    tokio::spawn(report(
        "bind C D E",
        client.add_key(["C", "D", "E"], KeyMode::Exclusive).await?,
    ));
    Ok(())
}

async fn delete_keys(client: &Client) -> Result<()> {
    tokio::spawn(report("release A", client.delete_key(["A"]).await?));
    tokio::spawn(report("release Enter", client.delete_key(["Enter"]).await?));
    tokio::spawn(report(
        "release C D E",
        client.delete_key(["C", "D", "E"]).await?,
    ));
    Ok(())
}

fn schedule_outputs(client: &Arc<Client>) {
    let client = Arc::clone(client);
    tokio::spawn(async move {
        let steps: [(u64, Step); 5] = [
            (0, Step::Output(OutputState::On)),
            (2, Step::Output(OutputState::Off)),
            (2, Step::Output(OutputState::Mask(8))),
            (2, Step::Backlight(BacklightState::On)),
            (1, Step::Backlight(BacklightState::Off)),
        ];
        for (delay, step) in steps {
            tokio::time::sleep(Duration::from_secs(delay)).await;
            let submitted = match step {
                Step::Output(state) => client.output(state).await,
                Step::Backlight(state) => client.set_backlight(state).await,
            };
            match submitted {
                Ok(ack) => report("output", ack).await,
                Err(err) => {
                    warn!(%err, "output sequence stopped");
                    return;
                }
            }
        }
    });
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Output(OutputState),
    Backlight(BacklightState),
}

async fn show_demo_screen(client: &Client) -> Result<()> {
    let attrs = ScreenAttributes::new()
        .name("Test Screen")
        .priority("alert");

    if let Err(err) = client.add_screen_with("Test1", attrs).await?.await {
        error!(%err, "failed to add screen Test1");
        return Ok(());
    }

    let acks = [
        client
            .add_title_widget("Test1", "Title1", "Demo Screen 1")
            .await?,
        client
            .add_string_widget("Test1", "Widget1", Position::new(1, 2), "Test Text")
            .await?,
        client
            .add_scroller_widget(
                "Test1",
                "Widget2",
                Region::new(2, 3, 20, 4),
                Scroll::new(Direction::Horizontal, 4),
                "This is text that is too long to display normally...",
            )
            .await?,
        client
            .add_icon_widget("Test1", "Widget3", Position::new(1, 4), IconName::PlayReverse)
            .await?,
    ];
    for ack in acks {
        tokio::spawn(report("widget", ack));
    }
    Ok(())
}

async fn report(what: &'static str, ack: Ack) {
    match ack.await {
        Ok(()) => info!(what, "succeeded"),
        Err(err) => warn!(what, %err, "failed"),
    }
}

/// Wait for Ctrl-C or (on unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
