//! Notifications emitted by the store after an action has been applied.

use core_events::{Region, Rgb};
use smallvec::SmallVec;

/// Most actions emit zero, one or two notifications.
pub type Notifications = SmallVec<[Notification; 2]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Cells to paint starting at `(line, col)` with the current attributes.
    Put {
        line: u32,
        col: u32,
        cells: Vec<String>,
    },
    CursorMoved {
        line: u32,
        col: u32,
    },
    HighlightChanged,
    ClearAll,
    ClearEol {
        line: u32,
        col: u32,
    },
    Resized {
        lines: u32,
        cols: u32,
    },
    ForegroundChanged(Rgb),
    BackgroundChanged(Rgb),
    ModeChanged(String),
    BusyChanged(bool),
    FontPxSpecified(u32),
    FontFaceSpecified(String),
    FontSizeChanged {
        width: u32,
        height: u32,
    },
    /// Text to forward to the editor in its input notation.
    Input(String),
    FocusChanged(bool),
    Scrolled {
        delta: i64,
        region: Region,
    },
    ScrollRegionChanged(Region),
    TitleChanged(String),
    IconChanged(String),
    MouseEnabled(bool),
    Bell {
        visual: bool,
    },
    ScreenSizeChanged {
        width: u32,
        height: u32,
    },
    ScreenBoundsChanged {
        lines: u32,
        cols: u32,
    },
    Disconnected,
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::Put { .. } => "put",
            Notification::CursorMoved { .. } => "cursor",
            Notification::HighlightChanged => "highlight",
            Notification::ClearAll => "clear-all",
            Notification::ClearEol { .. } => "clear-eol",
            Notification::Resized { .. } => "resize",
            Notification::ForegroundChanged(_) => "update-fg",
            Notification::BackgroundChanged(_) => "update-bg",
            Notification::ModeChanged(_) => "mode",
            Notification::BusyChanged(_) => "busy",
            Notification::FontPxSpecified(_) => "font-px-specified",
            Notification::FontFaceSpecified(_) => "font-face-specified",
            Notification::FontSizeChanged { .. } => "font-size-changed",
            Notification::Input(_) => "input",
            Notification::FocusChanged(_) => "focus-changed",
            Notification::Scrolled { .. } => "screen-scrolled",
            Notification::ScrollRegionChanged(_) => "scroll-region-updated",
            Notification::TitleChanged(_) => "title-changed",
            Notification::IconChanged(_) => "icon-changed",
            Notification::MouseEnabled(true) => "mouse-enabled",
            Notification::MouseEnabled(false) => "mouse-disabled",
            Notification::Bell { .. } => "bell",
            Notification::ScreenSizeChanged { .. } => "update-screen-size",
            Notification::ScreenBoundsChanged { .. } => "update-screen-bounds",
            Notification::Disconnected => "disconnected",
        }
    }
}
