//! TCP transport to the LCDd server.

use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::{AppError, Result};

/// Open the TCP connection to `host:port`.
///
/// No retry is attempted: a refused or failed connect is terminal for the
/// client that requested it.
///
/// # Errors
///
/// Returns [`AppError::Io`] if the connection cannot be established.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream> {
    let stream = TcpStream::connect((host, port)).await.map_err(|err| {
        warn!(host, port, %err, "transport: connect failed");
        AppError::Io(format!("failed to connect to {host}:{port}: {err}"))
    })?;

    // Commands are single short lines; do not let Nagle hold them back.
    stream.set_nodelay(true)?;

    info!(host, port, "transport: connected");
    Ok(stream)
}
