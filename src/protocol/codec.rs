//! Line codec for the LCDd text protocol.
//!
//! Wraps [`tokio_util::codec::AnyDelimiterCodec`] with a maximum line length
//! so a misbehaving server cannot make the client buffer an unterminated line
//! forever.
//!
//! # Usage
//!
//! Use [`LcddCodec`] as the codec parameter for
//! [`tokio_util::codec::Framed`]. Inbound, a single read may carry several
//! server messages or only part of one; the codec yields each complete
//! `\n`-terminated line once and keeps the trailing fragment buffered for the
//! next read. Outbound, each command string is written as `item\n`.
//!
//! A bad inbound line never ends the stream: `Framed` stops after the first
//! decoder error, so oversized lines are dropped here and invalid UTF-8 is
//! replaced rather than reported.

use std::borrow::Cow;

use bytes::BytesMut;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, Encoder};
use tracing::{debug, warn};

use crate::{AppError, Result};

/// Maximum inbound line length accepted by the codec: 8 KiB.
///
/// LCDd replies are short; longer lines are discarded up to the next newline.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Newline framing for both directions of an LCDd connection.
///
/// # Decoder
///
/// Yields complete lines without the terminator (a trailing `\r` is also
/// stripped). Bytes that are not valid UTF-8 become `U+FFFD`. Blank lines
/// and lines longer than [`MAX_LINE_BYTES`] are logged and skipped.
///
/// # Encoder
///
/// Appends `\n` to every outbound command.
#[derive(Debug)]
pub struct LcddCodec(AnyDelimiterCodec);

impl LcddCodec {
    /// Create a new `LcddCodec` with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(AnyDelimiterCodec::new_with_max_length(
            b"\n".to_vec(),
            b"\n".to_vec(),
            MAX_LINE_BYTES,
        ))
    }
}

impl Default for LcddCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LcddCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            match self.0.decode(src) {
                Ok(Some(bytes)) => {
                    if let Some(line) = to_line(&bytes) {
                        return Ok(Some(line));
                    }
                }
                Ok(None) => return Ok(None),
                Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => discard_oversized(),
                Err(err) => return Err(map_codec_error(err)),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            match self.0.decode_eof(src) {
                Ok(Some(bytes)) => {
                    if let Some(line) = to_line(&bytes) {
                        return Ok(Some(line));
                    }
                }
                Ok(None) => return Ok(None),
                Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => discard_oversized(),
                Err(err) => return Err(map_codec_error(err)),
            }
        }
    }
}

impl Encoder<String> for LcddCodec {
    type Error = AppError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        self.0.encode(item, dst).map_err(map_codec_error)
    }
}

// The inner codec keeps discarding until the next newline on the following call.
fn discard_oversized() {
    warn!(max_bytes = MAX_LINE_BYTES, "codec: line too long, discarding");
}

fn to_line(bytes: &[u8]) -> Option<String> {
    let decoded = String::from_utf8_lossy(bytes);
    if let Cow::Owned(ref replaced) = decoded {
        debug!(line = %replaced, "codec: replaced invalid UTF-8");
    }

    let line = decoded.strip_suffix('\r').unwrap_or(&decoded);
    if line.trim().is_empty() {
        None
    } else {
        Some(line.to_owned())
    }
}

fn map_codec_error(e: AnyDelimiterCodecError) -> AppError {
    match e {
        AnyDelimiterCodecError::MaxChunkLengthExceeded => {
            AppError::Io(format!("line exceeded {MAX_LINE_BYTES} bytes"))
        }
        AnyDelimiterCodecError::Io(io_err) => AppError::Io(io_err.to_string()),
    }
}
