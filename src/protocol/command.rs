//! Client commands and their argument vocabularies.
//!
//! Every [`Command`] serialises to exactly one protocol line (without the
//! terminating newline, which [`LcddCodec`](crate::protocol::codec::LcddCodec)
//! appends). Text arguments pass through [`wrap_text`] so that values
//! containing spaces reach the server as a single brace-quoted token.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::AppError;

/// Brace-wrap `text` when the server would otherwise split it.
///
/// Empty text becomes `{}`. Text containing whitespace is wrapped unless it
/// is already enclosed in braces. Anything else is returned unchanged.
#[must_use]
pub fn wrap_text(text: &str) -> String {
    if text.is_empty() {
        return "{}".to_owned();
    }

    let wrapped = text.starts_with('{') && text.ends_with('}');
    if !wrapped && text.contains(char::is_whitespace) {
        format!("{{{text}}}")
    } else {
        text.to_owned()
    }
}

/// Key reservation mode for `client_add_key`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KeyMode {
    /// The key is shared with other clients.
    #[default]
    Shared,
    /// The key is delivered to this client only.
    Exclusive,
}

impl KeyMode {
    /// Wire flag for this mode.
    #[must_use]
    pub fn as_flag(self) -> &'static str {
        match self {
            Self::Shared => "-shared",
            Self::Exclusive => "-exclusively",
        }
    }
}

impl FromStr for KeyMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "shared" | "-shared" => Ok(Self::Shared),
            "exclusive" | "exclusively" | "-exclusively" => Ok(Self::Exclusive),
            other => Err(AppError::InvalidKeyMode(format!("<{other}>"))),
        }
    }
}

/// Widget types understood by `widget_add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetType {
    /// Screen title bar.
    Title,
    /// Static text at a position.
    String,
    /// Horizontal bar graph.
    HBar,
    /// Vertical bar graph.
    VBar,
    /// Single named icon.
    Icon,
    /// Scrolling text region.
    Scroller,
    /// Container holding other widgets.
    Frame,
    /// Big numeric digit.
    Num,
}

impl WidgetType {
    /// Wire name of this widget type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::String => "string",
            Self::HBar => "hbar",
            Self::VBar => "vbar",
            Self::Icon => "icon",
            Self::Scroller => "scroller",
            Self::Frame => "frame",
            Self::Num => "num",
        }
    }
}

impl FromStr for WidgetType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "string" => Ok(Self::String),
            "hbar" => Ok(Self::HBar),
            "vbar" => Ok(Self::VBar),
            "icon" => Ok(Self::Icon),
            "scroller" => Ok(Self::Scroller),
            "frame" => Ok(Self::Frame),
            "num" => Ok(Self::Num),
            other => Err(AppError::InvalidWidgetType(format!("<{other}>"))),
        }
    }
}

impl Display for WidgetType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! icon_names {
    ($($variant:ident => $wire:literal),+ $(,)?) => {
        /// Icons an `icon` widget can display.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[allow(missing_docs)]
        pub enum IconName {
            $($variant),+
        }

        impl IconName {
            /// Every icon, in protocol order.
            pub const ALL: &'static [IconName] = &[$(IconName::$variant),+];

            /// Wire name of this icon.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl FromStr for IconName {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(AppError::InvalidIconName(format!("<{other}>"))),
                }
            }
        }
    };
}

icon_names! {
    BlockFilled => "BLOCK_FILLED",
    HeartOpen => "HEART_OPEN",
    HeartFilled => "HEART_FILLED",
    ArrowUp => "ARROW_UP",
    ArrowDown => "ARROW_DOWN",
    ArrowLeft => "ARROW_LEFT",
    ArrowRight => "ARROW_RIGHT",
    CheckboxOff => "CHECKBOX_OFF",
    CheckboxOn => "CHECKBOX_ON",
    CheckboxGray => "CHECKBOX_GRAY",
    SelectorAtLeft => "SELECTOR_AT_LEFT",
    SelectorAtRight => "SELECTOR_AT_RIGHT",
    Ellipsis => "ELLIPSIS",
    Stop => "STOP",
    Pause => "PAUSE",
    Play => "PLAY",
    PlayReverse => "PLAYR",
    FastForward => "FF",
    FastReverse => "FR",
    Next => "NEXT",
    Prev => "PREV",
    Rec => "REC",
}

/// Scroll direction for scrollers and frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Scroll left to right.
    Horizontal,
    /// Scroll top to bottom.
    Vertical,
    /// Continuous horizontal marquee.
    Marquee,
}

impl Direction {
    /// Wire letter of this direction.
    #[must_use]
    pub fn as_flag(self) -> &'static str {
        match self {
            Self::Horizontal => "h",
            Self::Vertical => "v",
            Self::Marquee => "m",
        }
    }
}

impl FromStr for Direction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "horizontal" | "h" => Ok(Self::Horizontal),
            "vertical" | "v" => Ok(Self::Vertical),
            "marquee" | "m" => Ok(Self::Marquee),
            other => Err(AppError::InvalidDirection(format!("<{other}>"))),
        }
    }
}

/// General purpose output state for `output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// All outputs on.
    On,
    /// All outputs off.
    Off,
    /// Explicit output bit mask.
    Mask(u32),
}

impl Display for OutputState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Mask(bits) => write!(f, "{bits}"),
        }
    }
}

/// Client backlight state for `backlight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklightState {
    /// Backlight on.
    On,
    /// Backlight off.
    Off,
    /// Invert the current state.
    Toggle,
    /// Blink the backlight.
    Blink,
    /// Flash the backlight.
    Flash,
}

impl Display for BacklightState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Toggle => "toggle",
            Self::Blink => "blink",
            Self::Flash => "flash",
        })
    }
}

/// Ordered `screen_set` attributes.
///
/// Attributes are written in insertion order as `-key value`, with values
/// passed through [`wrap_text`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenAttributes(Vec<(String, String)>);

impl ScreenAttributes {
    /// Empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arbitrary attribute.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// Screen display name.
    #[must_use]
    pub fn name(self, name: impl Into<String>) -> Self {
        self.set("name", name)
    }

    /// Screen priority (`hidden`, `background`, `info`, `foreground`, `alert`, `input`).
    #[must_use]
    pub fn priority(self, priority: impl Into<String>) -> Self {
        self.set("priority", priority)
    }

    /// Screen duration in eighths of a second.
    #[must_use]
    pub fn duration(self, eighths: u32) -> Self {
        self.set("duration", eighths.to_string())
    }

    /// Whether the server draws the heartbeat (`on`, `off`, `open`).
    #[must_use]
    pub fn heartbeat(self, state: impl Into<String>) -> Self {
        self.set("heartbeat", state)
    }

    /// Whether any attribute was set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ScreenAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Which pending-call queue acknowledges a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckQueue {
    /// Acknowledged by `success` / `huh?`.
    Command,
    /// Acknowledged by a bare `noop`.
    Noop,
}

/// One client → server request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Session opener.
    Hello,
    /// Announce the client name.
    ClientSetName(String),
    /// Reserve keys.
    AddKey {
        /// Reservation mode.
        mode: KeyMode,
        /// Key names, in order.
        keys: Vec<String>,
    },
    /// Release keys.
    DelKey(Vec<String>),
    /// Do nothing; acknowledged with `noop`.
    Noop,
    /// Ask for driver information.
    Info,
    /// Set general purpose outputs.
    Output(OutputState),
    /// Set the client backlight.
    Backlight(BacklightState),
    /// Create a screen.
    ScreenAdd(String),
    /// Update screen attributes.
    ScreenSet {
        /// Screen id.
        id: String,
        /// Attributes to apply.
        attrs: ScreenAttributes,
    },
    /// Remove a screen.
    ScreenDel(String),
    /// Create a widget.
    WidgetAdd {
        /// Owning screen id.
        screen: String,
        /// Widget id.
        widget: String,
        /// Widget type.
        kind: WidgetType,
        /// Containing frame, if any.
        frame: Option<String>,
    },
    /// Update widget parameters.
    WidgetSet {
        /// Owning screen id.
        screen: String,
        /// Widget id.
        widget: String,
        /// Already-formatted parameters, joined with spaces on the wire.
        params: Vec<String>,
    },
    /// Remove a widget.
    WidgetDel {
        /// Owning screen id.
        screen: String,
        /// Widget id.
        widget: String,
    },
}

impl Command {
    /// Queue whose acknowledgement completes this command.
    ///
    /// `None` for handshake lines and `info`, which are written untracked.
    #[must_use]
    pub fn ack_queue(&self) -> Option<AckQueue> {
        match self {
            Self::Hello | Self::ClientSetName(_) | Self::Info => None,
            Self::Noop => Some(AckQueue::Noop),
            _ => Some(AckQueue::Command),
        }
    }

    /// Protocol verb (token 0 of the line).
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Hello => "hello",
            Self::ClientSetName(_) => "client_set",
            Self::AddKey { .. } => "client_add_key",
            Self::DelKey(_) => "client_del_key",
            Self::Noop => "noop",
            Self::Info => "info",
            Self::Output(_) => "output",
            Self::Backlight(_) => "backlight",
            Self::ScreenAdd(_) => "screen_add",
            Self::ScreenSet { .. } => "screen_set",
            Self::ScreenDel(_) => "screen_del",
            Self::WidgetAdd { .. } => "widget_add",
            Self::WidgetSet { .. } => "widget_set",
            Self::WidgetDel { .. } => "widget_del",
        }
    }

    /// Serialise to one protocol line without the trailing newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())?;
        match self {
            Self::Hello | Self::Noop | Self::Info => Ok(()),
            Self::ClientSetName(name) => write!(f, " name {}", wrap_text(name)),
            Self::AddKey { mode, keys } => write!(f, " {} {}", mode.as_flag(), keys.join(" ")),
            Self::DelKey(keys) => write!(f, " {}", keys.join(" ")),
            Self::Output(state) => write!(f, " {state}"),
            Self::Backlight(state) => write!(f, " {state}"),
            Self::ScreenAdd(id) | Self::ScreenDel(id) => write!(f, " {id}"),
            Self::ScreenSet { id, attrs } => {
                write!(f, " {id}")?;
                for (key, value) in attrs.iter() {
                    write!(f, " -{key} {}", wrap_text(value))?;
                }
                Ok(())
            }
            Self::WidgetAdd {
                screen,
                widget,
                kind,
                frame,
            } => {
                write!(f, " {screen} {widget} {kind}")?;
                match frame {
                    Some(frame) => write!(f, " -in {frame}"),
                    None => Ok(()),
                }
            }
            Self::WidgetSet {
                screen,
                widget,
                params,
            } => write!(f, " {screen} {widget} {}", params.join(" ")),
            Self::WidgetDel { screen, widget } => write!(f, " {screen} {widget}"),
        }
    }
}
