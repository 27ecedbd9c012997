//! Classification of framed server lines.
//!
//! # Known inbound messages
//!
//! | Token 0     | Maps to                                     |
//! |-------------|---------------------------------------------|
//! | `connect`   | [`ServerMessage::Connect`]                  |
//! | `success`   | [`ServerMessage::Success`]                  |
//! | `huh?`      | [`ServerMessage::Huh`] (raw line kept)      |
//! | `noop`      | [`ServerMessage::Noop`]                     |
//! | `key`       | [`ServerMessage::Key`]                      |
//! | `listen`    | [`ServerMessage::Listen`]                   |
//! | `ignore`    | [`ServerMessage::Ignore`]                   |
//! | `menuevent` | [`ServerMessage::MenuEvent`] (raw line kept)|
//! | *(other)*   | [`ServerMessage::Unknown`]                  |

use tracing::warn;

/// Display geometry and versions announced by the server's `connect` line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandshakeInfo {
    /// Display width in characters.
    pub width: u16,
    /// Display height in characters.
    pub height: u16,
    /// Character cell width in pixels.
    pub cell_width: u16,
    /// Character cell height in pixels.
    pub cell_height: u16,
    /// LCDproc server version (`LCDproc` key).
    pub server_version: String,
    /// Protocol version (`protocol` key).
    pub protocol_version: String,
}

impl HandshakeInfo {
    /// Parse the key/value tokens following `connect`.
    ///
    /// Unknown keys are ignored. A numeric field that fails to parse stays 0.
    #[must_use]
    pub fn from_tokens(tokens: &[&str]) -> Self {
        let mut info = Self::default();

        for pair in tokens.windows(2) {
            let (key, value) = (pair[0], pair[1]);
            match key {
                "wid" => info.width = parse_dimension(key, value),
                "hgt" => info.height = parse_dimension(key, value),
                "cellwid" => info.cell_width = parse_dimension(key, value),
                "cellhgt" => info.cell_height = parse_dimension(key, value),
                "LCDproc" => info.server_version = value.to_owned(),
                "protocol" => info.protocol_version = value.to_owned(),
                _ => {}
            }
        }

        info
    }
}

fn parse_dimension(key: &str, value: &str) -> u16 {
    value.parse().unwrap_or_else(|err| {
        warn!(key, value, %err, "connect: malformed dimension, using 0");
        0
    })
}

/// One server line, classified by its leading token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Handshake reply with display geometry and versions.
    Connect(HandshakeInfo),
    /// Generic acknowledgement.
    Success,
    /// Rejection; carries the full raw line.
    Huh(String),
    /// Acknowledgement of a `noop` command.
    Noop,
    /// A reserved key was pressed.
    Key(String),
    /// A client screen became visible.
    Listen(String),
    /// A client screen was hidden.
    Ignore(String),
    /// Menu interaction; carries the full raw line.
    MenuEvent(String),
    /// Anything the client does not understand.
    Unknown(String),
}

impl ServerMessage {
    /// Classify one framed line.
    ///
    /// Never fails: unrecognised input maps to [`ServerMessage::Unknown`].
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let arg = || tokens.get(1).copied().unwrap_or_default().to_owned();

        match tokens.first().copied() {
            Some("connect") => Self::Connect(HandshakeInfo::from_tokens(&tokens[1..])),
            Some("success") => Self::Success,
            Some("huh?") => Self::Huh(line.to_owned()),
            Some("noop") => Self::Noop,
            Some("key") => Self::Key(arg()),
            Some("listen") => Self::Listen(arg()),
            Some("ignore") => Self::Ignore(arg()),
            Some("menuevent") => Self::MenuEvent(line.to_owned()),
            _ => Self::Unknown(line.to_owned()),
        }
    }
}
