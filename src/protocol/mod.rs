//! LCDd wire protocol.
//!
//! Everything here is I/O-free: framing of the inbound byte stream, the
//! classification of server lines, and the serialisation of client commands.
//!
//! - `codec`: newline framing over [`AnyDelimiterCodec`](tokio_util::codec::AnyDelimiterCodec).
//! - `message`: classification of one framed server line.
//! - `command`: client commands and their argument vocabularies.

pub mod codec;
pub mod command;
pub mod message;
