//! Typed widget helpers.
//!
//! Thin argument-shaping layers over [`Client::add_widget`] and
//! [`Client::set_widget`]. Each `add_*` helper creates the widget and applies
//! its parameters in one logical operation (the `widget_set` is chained after
//! a successful `widget_add`); each `set_*` helper updates an existing widget.
//!
//! Parameter layouts follow the LCDd protocol:
//!
//! | Widget   | `widget_set` parameters                               |
//! |----------|-------------------------------------------------------|
//! | title    | `{text}`                                              |
//! | string   | `x y {text}`                                          |
//! | hbar     | `x y length`                                          |
//! | vbar     | `x y length`                                          |
//! | icon     | `x y ICON`                                            |
//! | scroller | `left top right bottom direction speed {text}`        |
//! | frame    | `left top right bottom width height direction speed`  |
//! | num      | `x digit`                                             |

use crate::protocol::command::{wrap_text, Direction, IconName, WidgetType};
use crate::{AppError, Result};

use super::{Ack, Client, WidgetOptions};

/// Largest value a `num` widget can show (10 draws a colon).
pub const MAX_NUM_DIGIT: u8 = 10;

/// A character position, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
}

impl Position {
    /// Position at column `x`, row `y`.
    #[must_use]
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// A rectangular display region, inclusive corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Leftmost column.
    pub left: u16,
    /// Top row.
    pub top: u16,
    /// Rightmost column.
    pub right: u16,
    /// Bottom row.
    pub bottom: u16,
}

impl Region {
    /// Region spanning `(left, top)` to `(right, bottom)`.
    #[must_use]
    pub fn new(left: u16, top: u16, right: u16, bottom: u16) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Scrolling behaviour of scrollers and frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scroll {
    /// Scroll direction.
    pub direction: Direction,
    /// Frames per step; lower is faster.
    pub speed: u16,
}

impl Scroll {
    /// Scroll in `direction` at `speed`.
    #[must_use]
    pub fn new(direction: Direction, speed: u16) -> Self {
        Self { direction, speed }
    }
}

/// Virtual size of a frame's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    /// Content width in characters.
    pub width: u16,
    /// Content height in characters.
    pub height: u16,
}

fn title_params(text: &str) -> Vec<String> {
    vec![wrap_text(text)]
}

fn string_params(at: Position, text: &str) -> Vec<String> {
    vec![at.x.to_string(), at.y.to_string(), wrap_text(text)]
}

fn bar_params(at: Position, length: u16) -> Vec<String> {
    vec![at.x.to_string(), at.y.to_string(), length.to_string()]
}

fn icon_params(at: Position, icon: IconName) -> Vec<String> {
    vec![at.x.to_string(), at.y.to_string(), icon.as_str().to_owned()]
}

fn scroller_params(region: Region, scroll: Scroll, text: &str) -> Vec<String> {
    let mut params = region_params(region);
    params.push(scroll.direction.as_flag().to_owned());
    params.push(scroll.speed.to_string());
    params.push(wrap_text(text));
    params
}

fn frame_params(region: Region, size: FrameSize, scroll: Scroll) -> Result<Vec<String>> {
    // LCDd frames only scroll vertically.
    if scroll.direction != Direction::Vertical {
        return Err(AppError::InvalidDirection(format!(
            "frames only scroll vertically, got {:?}",
            scroll.direction
        )));
    }
    let mut params = region_params(region);
    params.push(size.width.to_string());
    params.push(size.height.to_string());
    params.push(scroll.direction.as_flag().to_owned());
    params.push(scroll.speed.to_string());
    Ok(params)
}

fn num_params(x: u16, digit: u8) -> Result<Vec<String>> {
    if digit > MAX_NUM_DIGIT {
        return Err(AppError::InvalidNumberRange(format!(
            "num widget value {digit} outside 0..={MAX_NUM_DIGIT}"
        )));
    }
    Ok(vec![x.to_string(), digit.to_string()])
}

fn region_params(region: Region) -> Vec<String> {
    vec![
        region.left.to_string(),
        region.top.to_string(),
        region.right.to_string(),
        region.bottom.to_string(),
    ]
}

impl Client {
    async fn add_with(
        &self,
        screen: &str,
        widget: &str,
        kind: WidgetType,
        params: Vec<String>,
    ) -> Result<Ack> {
        self.add_widget(screen, widget, kind, WidgetOptions::new().params(params))
            .await
    }

    /// Add a title widget showing `text`.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn add_title_widget(&self, screen: &str, widget: &str, text: &str) -> Result<Ack> {
        self.add_with(screen, widget, WidgetType::Title, title_params(text))
            .await
    }

    /// Change a title widget's text.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn set_title_widget(&self, screen: &str, widget: &str, text: &str) -> Result<Ack> {
        self.set_widget(screen, widget, title_params(text)).await
    }

    /// Add a string widget showing `text` at `at`.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn add_string_widget(
        &self,
        screen: &str,
        widget: &str,
        at: Position,
        text: &str,
    ) -> Result<Ack> {
        self.add_with(screen, widget, WidgetType::String, string_params(at, text))
            .await
    }

    /// Move or change a string widget.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn set_string_widget(
        &self,
        screen: &str,
        widget: &str,
        at: Position,
        text: &str,
    ) -> Result<Ack> {
        self.set_widget(screen, widget, string_params(at, text))
            .await
    }

    /// Add a horizontal bar of `length` pixels at `at`.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn add_hbar_widget(
        &self,
        screen: &str,
        widget: &str,
        at: Position,
        length: u16,
    ) -> Result<Ack> {
        self.add_with(screen, widget, WidgetType::HBar, bar_params(at, length))
            .await
    }

    /// Move or resize a horizontal bar.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn set_hbar_widget(
        &self,
        screen: &str,
        widget: &str,
        at: Position,
        length: u16,
    ) -> Result<Ack> {
        self.set_widget(screen, widget, bar_params(at, length)).await
    }

    /// Add a vertical bar of `length` pixels at `at`.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn add_vbar_widget(
        &self,
        screen: &str,
        widget: &str,
        at: Position,
        length: u16,
    ) -> Result<Ack> {
        self.add_with(screen, widget, WidgetType::VBar, bar_params(at, length))
            .await
    }

    /// Move or resize a vertical bar.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn set_vbar_widget(
        &self,
        screen: &str,
        widget: &str,
        at: Position,
        length: u16,
    ) -> Result<Ack> {
        self.set_widget(screen, widget, bar_params(at, length)).await
    }

    /// Add an icon widget.
    ///
    /// Icon names arriving as text are checked by parsing them into
    /// [`IconName`], which fails with [`AppError::InvalidIconName`].
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn add_icon_widget(
        &self,
        screen: &str,
        widget: &str,
        at: Position,
        icon: IconName,
    ) -> Result<Ack> {
        self.add_with(screen, widget, WidgetType::Icon, icon_params(at, icon))
            .await
    }

    /// Move or change an icon widget.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn set_icon_widget(
        &self,
        screen: &str,
        widget: &str,
        at: Position,
        icon: IconName,
    ) -> Result<Ack> {
        self.set_widget(screen, widget, icon_params(at, icon)).await
    }

    /// Add a scroller showing `text` inside `region`.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn add_scroller_widget(
        &self,
        screen: &str,
        widget: &str,
        region: Region,
        scroll: Scroll,
        text: &str,
    ) -> Result<Ack> {
        let params = scroller_params(region, scroll, text);
        self.add_with(screen, widget, WidgetType::Scroller, params)
            .await
    }

    /// Change a scroller.
    ///
    /// # Errors
    ///
    /// [`AppError::NotReady`] / [`AppError::ConnectionClosed`] per session state.
    pub async fn set_scroller_widget(
        &self,
        screen: &str,
        widget: &str,
        region: Region,
        scroll: Scroll,
        text: &str,
    ) -> Result<Ack> {
        self.set_widget(screen, widget, scroller_params(region, scroll, text))
            .await
    }

    /// Add a frame occupying `region` with a virtual `size`.
    ///
    /// # Errors
    ///
    /// [`AppError::InvalidDirection`] unless `scroll` is vertical (nothing is
    /// sent); otherwise per session state.
    pub async fn add_frame(
        &self,
        screen: &str,
        widget: &str,
        region: Region,
        size: FrameSize,
        scroll: Scroll,
    ) -> Result<Ack> {
        let params = frame_params(region, size, scroll)?;
        self.add_with(screen, widget, WidgetType::Frame, params)
            .await
    }

    /// Change a frame.
    ///
    /// # Errors
    ///
    /// Same as [`Client::add_frame`].
    pub async fn set_frame(
        &self,
        screen: &str,
        widget: &str,
        region: Region,
        size: FrameSize,
        scroll: Scroll,
    ) -> Result<Ack> {
        let params = frame_params(region, size, scroll)?;
        self.set_widget(screen, widget, params).await
    }

    /// Add a big-number widget at column `x` showing `digit`.
    ///
    /// # Errors
    ///
    /// [`AppError::InvalidNumberRange`] if `digit` exceeds
    /// [`MAX_NUM_DIGIT`] (nothing is sent); otherwise per session state.
    pub async fn add_num_widget(
        &self,
        screen: &str,
        widget: &str,
        x: u16,
        digit: u8,
    ) -> Result<Ack> {
        let params = num_params(x, digit)?;
        self.add_with(screen, widget, WidgetType::Num, params).await
    }

    /// Change a big-number widget.
    ///
    /// # Errors
    ///
    /// Same as [`Client::add_num_widget`].
    pub async fn set_num_widget(
        &self,
        screen: &str,
        widget: &str,
        x: u16,
        digit: u8,
    ) -> Result<Ack> {
        let params = num_params(x, digit)?;
        self.set_widget(screen, widget, params).await
    }
}
