//! Closed set of redraw and input actions.
//!
//! Actions are plain data. Constructors perform no validation beyond what the
//! argument types enforce; semantic checks (region bounds, zero font metrics)
//! belong to the store that applies them.

use std::fmt;

use crate::{ModMask, MouseButton};

/// 24-bit colour stored as `0x00RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0x000000);
    pub const WHITE: Rgb = Rgb(0xffffff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Colour from the RPC integer form. Negative values mean "use the
    /// default" and yield `None`.
    pub fn from_rpc(value: i64) -> Option<Self> {
        if value < 0 {
            None
        } else {
            Some(Rgb((value as u64 & 0xff_ffff) as u32))
        }
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// Partial highlight update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightSet {
    pub fg: Option<Rgb>,
    pub bg: Option<Rgb>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub reverse: Option<bool>,
    pub underline: Option<bool>,
    pub undercurl: Option<bool>,
}

impl HighlightSet {
    pub fn is_empty(&self) -> bool {
        *self == HighlightSet::default()
    }
}

/// Inclusive rectangle of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Region {
    pub const fn new(top: u32, bottom: u32, left: u32, right: u32) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Region covering a whole `lines` x `cols` grid.
    pub const fn full(lines: u32, cols: u32) -> Self {
        Self {
            top: 0,
            bottom: lines.saturating_sub(1),
            left: 0,
            right: cols.saturating_sub(1),
        }
    }

    pub const fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top) + 1
    }

    pub const fn width(&self) -> u32 {
        self.right.saturating_sub(self.left) + 1
    }

    pub const fn contains(&self, line: u32, col: u32) -> bool {
        line >= self.top && line <= self.bottom && col >= self.left && col <= self.right
    }
}

/// Grid cell under the pointer together with the button and modifiers held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseCell {
    pub line: u32,
    pub col: u32,
    pub button: MouseButton,
    pub mods: ModMask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WheelDirection {
    Up,
    Down,
    Left,
    Right,
}

impl WheelDirection {
    pub fn notation_name(self) -> &'static str {
        match self {
            WheelDirection::Up => "Up",
            WheelDirection::Down => "Down",
            WheelDirection::Left => "Left",
            WheelDirection::Right => "Right",
        }
    }
}

/// One quantized wheel movement of `count` steps at a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WheelStep {
    pub direction: WheelDirection,
    pub count: u32,
    pub line: u32,
    pub col: u32,
    pub mods: ModMask,
}

/// Every event that can change the screen or reach the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Cell contents written at the cursor, one string per cell.
    PutText { cells: Vec<String> },
    Cursor { line: u32, col: u32 },
    Highlight(HighlightSet),
    ClearAll,
    ClearEol,
    Resize { lines: u32, cols: u32 },
    UpdateFg(Rgb),
    UpdateBg(Rgb),
    Mode(String),
    BusyStart,
    BusyStop,
    /// Measured cell metrics in device pixels.
    UpdateFontSize { width: u32, height: u32 },
    UpdateFontPx(u32),
    UpdateFontFace(String),
    /// Text in the editor's input notation.
    Input(String),
    Focus(bool),
    DragStart(MouseCell),
    DragUpdate(MouseCell),
    DragEnd(MouseCell),
    WheelScroll(WheelStep),
    SetTitle(String),
    SetIcon(String),
    SetScrollRegion(Region),
    /// Positive moves content up.
    ScrollScreen(i64),
    UpdateScreenSize { width: u32, height: u32 },
    UpdateScreenBounds { lines: u32, cols: u32 },
    EnableMouse,
    DisableMouse,
    Bell { visual: bool },
    /// The editor process went away.
    Disconnected,
}

/// Fieldless discriminant of [`Action`], used for logging and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    PutText,
    Cursor,
    Highlight,
    ClearAll,
    ClearEol,
    Resize,
    UpdateFg,
    UpdateBg,
    Mode,
    BusyStart,
    BusyStop,
    UpdateFontSize,
    UpdateFontPx,
    UpdateFontFace,
    Input,
    Focus,
    DragStart,
    DragUpdate,
    DragEnd,
    WheelScroll,
    SetTitle,
    SetIcon,
    SetScrollRegion,
    ScrollScreen,
    UpdateScreenSize,
    UpdateScreenBounds,
    EnableMouse,
    DisableMouse,
    Bell,
    Disconnected,
}

impl ActionKind {
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::PutText => "put-text",
            ActionKind::Cursor => "cursor",
            ActionKind::Highlight => "highlight",
            ActionKind::ClearAll => "clear-all",
            ActionKind::ClearEol => "clear-eol",
            ActionKind::Resize => "resize",
            ActionKind::UpdateFg => "update-fg",
            ActionKind::UpdateBg => "update-bg",
            ActionKind::Mode => "mode",
            ActionKind::BusyStart => "busy-start",
            ActionKind::BusyStop => "busy-stop",
            ActionKind::UpdateFontSize => "update-font-size",
            ActionKind::UpdateFontPx => "update-font-px",
            ActionKind::UpdateFontFace => "update-font-face",
            ActionKind::Input => "input",
            ActionKind::Focus => "focus",
            ActionKind::DragStart => "drag-start",
            ActionKind::DragUpdate => "drag-update",
            ActionKind::DragEnd => "drag-end",
            ActionKind::WheelScroll => "wheel-scroll",
            ActionKind::SetTitle => "set-title",
            ActionKind::SetIcon => "set-icon",
            ActionKind::SetScrollRegion => "set-scroll-region",
            ActionKind::ScrollScreen => "scroll-screen",
            ActionKind::UpdateScreenSize => "update-screen-size",
            ActionKind::UpdateScreenBounds => "update-screen-bounds",
            ActionKind::EnableMouse => "enable-mouse",
            ActionKind::DisableMouse => "disable-mouse",
            ActionKind::Bell => "bell",
            ActionKind::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::PutText { .. } => ActionKind::PutText,
            Action::Cursor { .. } => ActionKind::Cursor,
            Action::Highlight(_) => ActionKind::Highlight,
            Action::ClearAll => ActionKind::ClearAll,
            Action::ClearEol => ActionKind::ClearEol,
            Action::Resize { .. } => ActionKind::Resize,
            Action::UpdateFg(_) => ActionKind::UpdateFg,
            Action::UpdateBg(_) => ActionKind::UpdateBg,
            Action::Mode(_) => ActionKind::Mode,
            Action::BusyStart => ActionKind::BusyStart,
            Action::BusyStop => ActionKind::BusyStop,
            Action::UpdateFontSize { .. } => ActionKind::UpdateFontSize,
            Action::UpdateFontPx(_) => ActionKind::UpdateFontPx,
            Action::UpdateFontFace(_) => ActionKind::UpdateFontFace,
            Action::Input(_) => ActionKind::Input,
            Action::Focus(_) => ActionKind::Focus,
            Action::DragStart(_) => ActionKind::DragStart,
            Action::DragUpdate(_) => ActionKind::DragUpdate,
            Action::DragEnd(_) => ActionKind::DragEnd,
            Action::WheelScroll(_) => ActionKind::WheelScroll,
            Action::SetTitle(_) => ActionKind::SetTitle,
            Action::SetIcon(_) => ActionKind::SetIcon,
            Action::SetScrollRegion(_) => ActionKind::SetScrollRegion,
            Action::ScrollScreen(_) => ActionKind::ScrollScreen,
            Action::UpdateScreenSize { .. } => ActionKind::UpdateScreenSize,
            Action::UpdateScreenBounds { .. } => ActionKind::UpdateScreenBounds,
            Action::EnableMouse => ActionKind::EnableMouse,
            Action::DisableMouse => ActionKind::DisableMouse,
            Action::Bell { .. } => ActionKind::Bell,
            Action::Disconnected => ActionKind::Disconnected,
        }
    }

    // Constructors, one per kind.

    pub fn put_text<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Action::PutText {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    pub fn cursor(line: u32, col: u32) -> Self {
        Action::Cursor { line, col }
    }

    pub fn highlight(set: HighlightSet) -> Self {
        Action::Highlight(set)
    }

    pub fn clear_all() -> Self {
        Action::ClearAll
    }

    pub fn clear_eol() -> Self {
        Action::ClearEol
    }

    pub fn resize(lines: u32, cols: u32) -> Self {
        Action::Resize { lines, cols }
    }

    pub fn update_fg(color: Rgb) -> Self {
        Action::UpdateFg(color)
    }

    pub fn update_bg(color: Rgb) -> Self {
        Action::UpdateBg(color)
    }

    pub fn mode(mode: impl Into<String>) -> Self {
        Action::Mode(mode.into())
    }

    pub fn busy_start() -> Self {
        Action::BusyStart
    }

    pub fn busy_stop() -> Self {
        Action::BusyStop
    }

    pub fn update_font_size(width: u32, height: u32) -> Self {
        Action::UpdateFontSize { width, height }
    }

    pub fn update_font_px(px: u32) -> Self {
        Action::UpdateFontPx(px)
    }

    pub fn update_font_face(face: impl Into<String>) -> Self {
        Action::UpdateFontFace(face.into())
    }

    pub fn input(text: impl Into<String>) -> Self {
        Action::Input(text.into())
    }

    pub fn focus(focused: bool) -> Self {
        Action::Focus(focused)
    }

    pub fn drag_start(cell: MouseCell) -> Self {
        Action::DragStart(cell)
    }

    pub fn drag_update(cell: MouseCell) -> Self {
        Action::DragUpdate(cell)
    }

    pub fn drag_end(cell: MouseCell) -> Self {
        Action::DragEnd(cell)
    }

    pub fn wheel_scroll(step: WheelStep) -> Self {
        Action::WheelScroll(step)
    }

    pub fn set_title(title: impl Into<String>) -> Self {
        Action::SetTitle(title.into())
    }

    pub fn set_icon(path: impl Into<String>) -> Self {
        Action::SetIcon(path.into())
    }

    pub fn set_scroll_region(region: Region) -> Self {
        Action::SetScrollRegion(region)
    }

    pub fn scroll_screen(delta: i64) -> Self {
        Action::ScrollScreen(delta)
    }

    pub fn update_screen_size(width: u32, height: u32) -> Self {
        Action::UpdateScreenSize { width, height }
    }

    pub fn update_screen_bounds(lines: u32, cols: u32) -> Self {
        Action::UpdateScreenBounds { lines, cols }
    }

    pub fn enable_mouse() -> Self {
        Action::EnableMouse
    }

    pub fn disable_mouse() -> Self {
        Action::DisableMouse
    }

    pub fn bell(visual: bool) -> Self {
        Action::Bell { visual }
    }

    pub fn disconnected() -> Self {
        Action::Disconnected
    }
}
