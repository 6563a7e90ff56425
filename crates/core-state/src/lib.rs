//! Canonical screen state and the store that applies actions to it.
//!
//! [`Store::apply`] is the only way to change a [`ScreenState`]. It validates
//! first and mutates second, so an action is either applied in full or
//! rejected with [`StoreError::ProtocolViolation`] and no change at all. The
//! notifications it returns are delivered by the caller, in order, before the
//! next action is applied.
//!
//! Invariants held after every successful `apply`:
//! - `cursor.line < size.lines` and `cursor.col < size.cols`.
//! - `size.width == size.cols * font_attr.cell_width` and likewise for height;
//!   both fit in `u32`.
//! - `scroll_region` lies inside the grid; every grid change resets it to
//!   the full grid.
//!
//! Transient interaction state (drag origin, wheel accumulators, IME
//! composition) is owned by the renderer and the input encoder, not here.

pub mod notification;

pub use notification::{Notification, Notifications};

use core_events::notation::{DragPhase, mouse_notation, wheel_notation};
use core_events::{Action, ActionKind, HighlightSet, Region, Rgb};
use smallvec::smallvec;
use thiserror::Error;
use tracing::{debug, trace, warn};

pub const DEFAULT_LINES: u32 = 24;
pub const DEFAULT_COLS: u32 = 80;
pub const DEFAULT_FONT_FACE: &str = "monospace";
pub const DEFAULT_FONT_PX: u32 = 12;
/// Cell metrics used until the renderer reports a measurement.
pub const DEFAULT_CELL_WIDTH: u32 = 7;
pub const DEFAULT_CELL_HEIGHT: u32 = 14;
/// Largest accepted font size in pixels.
pub const MAX_FONT_PX: u32 = 4096;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("protocol violation in `{action}`: {reason}")]
    ProtocolViolation { action: ActionKind, reason: String },
}

impl StoreError {
    fn violation(action: &Action, reason: impl Into<String>) -> Self {
        StoreError::ProtocolViolation {
            action: action.kind(),
            reason: reason.into(),
        }
    }
}

/// Grid dimensions and the matching pixel extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub lines: u32,
    pub cols: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAttributes {
    pub fg: Rgb,
    pub bg: Rgb,
    pub bold: bool,
    pub italic: bool,
    pub reverse: bool,
    pub underline: bool,
    pub undercurl: bool,
    pub cell_width: u32,
    pub cell_height: u32,
    pub face: String,
    pub specified_px: u32,
}

impl FontAttributes {
    /// Foreground and background after applying `reverse`.
    pub fn paint_colors(&self) -> (Rgb, Rgb) {
        if self.reverse {
            (self.bg, self.fg)
        } else {
            (self.fg, self.bg)
        }
    }

    fn merge(&mut self, set: &HighlightSet) {
        if let Some(fg) = set.fg {
            self.fg = fg;
        }
        if let Some(bg) = set.bg {
            self.bg = bg;
        }
        if let Some(v) = set.bold {
            self.bold = v;
        }
        if let Some(v) = set.italic {
            self.italic = v;
        }
        if let Some(v) = set.reverse {
            self.reverse = v;
        }
        if let Some(v) = set.underline {
            self.underline = v;
        }
        if let Some(v) = set.undercurl {
            self.undercurl = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPos {
    pub line: u32,
    pub col: u32,
}

/// Last host surface size reported through `update-screen-size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenState {
    pub size: ScreenSize,
    pub font_attr: FontAttributes,
    pub default_fg: Rgb,
    pub default_bg: Rgb,
    pub cursor: CursorPos,
    pub mode: String,
    pub busy: bool,
    pub focused: bool,
    pub mouse_enabled: bool,
    /// False once the editor process has disconnected.
    pub attached: bool,
    pub scroll_region: Region,
    pub title: String,
    pub icon_path: String,
    pub last_bell: Option<bool>,
    pub viewport: Viewport,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_FACE, DEFAULT_FONT_PX)
    }
}

impl ScreenState {
    pub fn new(face: &str, px: u32) -> Self {
        let font_attr = FontAttributes {
            fg: Rgb::WHITE,
            bg: Rgb::BLACK,
            bold: false,
            italic: false,
            reverse: false,
            underline: false,
            undercurl: false,
            cell_width: DEFAULT_CELL_WIDTH,
            cell_height: DEFAULT_CELL_HEIGHT,
            face: face.to_string(),
            specified_px: px,
        };
        let size = ScreenSize {
            lines: DEFAULT_LINES,
            cols: DEFAULT_COLS,
            width: DEFAULT_COLS * DEFAULT_CELL_WIDTH,
            height: DEFAULT_LINES * DEFAULT_CELL_HEIGHT,
        };
        Self {
            size,
            font_attr,
            default_fg: Rgb::WHITE,
            default_bg: Rgb::BLACK,
            cursor: CursorPos::default(),
            mode: "normal".to_string(),
            busy: false,
            focused: false,
            mouse_enabled: false,
            attached: true,
            scroll_region: Region::full(DEFAULT_LINES, DEFAULT_COLS),
            title: String::new(),
            icon_path: String::new(),
            last_bell: None,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        }
    }

    fn set_grid(&mut self, lines: u32, cols: u32) {
        self.size.lines = lines;
        self.size.cols = cols;
        self.recompute_pixels();
        self.scroll_region = Region::full(lines, cols);
        self.clamp_cursor();
    }

    /// Saturates; `Store::validate` rejects grids whose extent overflows.
    fn recompute_pixels(&mut self) {
        self.size.width = self.size.cols.saturating_mul(self.font_attr.cell_width);
        self.size.height = self.size.lines.saturating_mul(self.font_attr.cell_height);
    }

    fn clamp_cursor(&mut self) {
        self.cursor.line = self.cursor.line.min(self.size.lines.saturating_sub(1));
        self.cursor.col = self.cursor.col.min(self.size.cols.saturating_sub(1));
    }
}

/// `(width, height)` in pixels of a grid, or `None` when it does not fit
/// in `u32`.
fn pixel_extent(lines: u32, cols: u32, cell_width: u32, cell_height: u32) -> Option<(u32, u32)> {
    Some((cols.checked_mul(cell_width)?, lines.checked_mul(cell_height)?))
}

/// Owns the [`ScreenState`] and applies actions to it.
#[derive(Debug, Default)]
pub struct Store {
    state: ScreenState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ScreenState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    /// Applies one action and returns the notifications it produced, in
    /// emission order.
    pub fn apply(&mut self, action: &Action) -> Result<Notifications, StoreError> {
        if let Err(err) = self.validate(action) {
            warn!(target: "store", action = %action.kind(), error = %err, "action_rejected");
            return Err(err);
        }
        let out = self.mutate(action);
        trace!(
            target: "store",
            action = %action.kind(),
            notifications = out.len(),
            "action_applied"
        );
        Ok(out)
    }

    fn validate(&self, action: &Action) -> Result<(), StoreError> {
        match action {
            Action::Resize { lines, cols } | Action::UpdateScreenBounds { lines, cols } => {
                if *lines == 0 || *cols == 0 {
                    return Err(StoreError::violation(
                        action,
                        format!("empty grid {lines}x{cols}"),
                    ));
                }
                let attr = &self.state.font_attr;
                if pixel_extent(*lines, *cols, attr.cell_width, attr.cell_height).is_none() {
                    return Err(StoreError::violation(
                        action,
                        format!("grid {lines}x{cols} overflows the pixel extent"),
                    ));
                }
            }
            Action::UpdateFontPx(0) => {
                return Err(StoreError::violation(action, "font px must be positive"));
            }
            Action::UpdateFontPx(px) if *px > MAX_FONT_PX => {
                return Err(StoreError::violation(
                    action,
                    format!("font px {px} exceeds {MAX_FONT_PX}"),
                ));
            }
            Action::UpdateFontFace(face) if face.trim().is_empty() => {
                return Err(StoreError::violation(action, "font face must not be empty"));
            }
            Action::UpdateFontSize { width, height } if *width == 0 || *height == 0 => {
                return Err(StoreError::violation(
                    action,
                    format!("cell metrics {width}x{height} must be positive"),
                ));
            }
            Action::UpdateFontSize { width, height } => {
                let size = &self.state.size;
                if pixel_extent(size.lines, size.cols, *width, *height).is_none() {
                    return Err(StoreError::violation(
                        action,
                        format!("cell metrics {width}x{height} overflow the pixel extent"),
                    ));
                }
            }
            Action::SetScrollRegion(r) => {
                let size = &self.state.size;
                if r.top > r.bottom || r.left > r.right {
                    return Err(StoreError::violation(
                        action,
                        format!("inverted region {r:?}"),
                    ));
                }
                if r.bottom >= size.lines || r.right >= size.cols {
                    return Err(StoreError::violation(
                        action,
                        format!("region {r:?} outside {}x{} grid", size.lines, size.cols),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn mutate(&mut self, action: &Action) -> Notifications {
        let s = &mut self.state;
        match action {
            Action::PutText { cells } => smallvec![Notification::Put {
                line: s.cursor.line,
                col: s.cursor.col,
                cells: cells.clone(),
            }],
            Action::Cursor { line, col } => {
                s.cursor = CursorPos {
                    line: *line,
                    col: *col,
                };
                s.clamp_cursor();
                smallvec![Notification::CursorMoved {
                    line: s.cursor.line,
                    col: s.cursor.col,
                }]
            }
            Action::Highlight(set) => {
                s.font_attr.merge(set);
                smallvec![Notification::HighlightChanged]
            }
            Action::ClearAll => smallvec![Notification::ClearAll],
            Action::ClearEol => smallvec![Notification::ClearEol {
                line: s.cursor.line,
                col: s.cursor.col,
            }],
            Action::Resize { lines, cols } => {
                s.set_grid(*lines, *cols);
                smallvec![Notification::Resized {
                    lines: *lines,
                    cols: *cols,
                }]
            }
            Action::UpdateFg(color) => {
                s.default_fg = *color;
                s.font_attr.fg = *color;
                smallvec![Notification::ForegroundChanged(*color)]
            }
            Action::UpdateBg(color) => {
                s.default_bg = *color;
                s.font_attr.bg = *color;
                smallvec![Notification::BackgroundChanged(*color), Notification::ClearAll]
            }
            Action::Mode(mode) => {
                s.mode.clone_from(mode);
                smallvec![Notification::ModeChanged(mode.clone())]
            }
            Action::BusyStart | Action::BusyStop => {
                s.busy = matches!(action, Action::BusyStart);
                smallvec![Notification::BusyChanged(s.busy)]
            }
            Action::UpdateFontSize { width, height } => {
                s.font_attr.cell_width = *width;
                s.font_attr.cell_height = *height;
                s.recompute_pixels();
                smallvec![Notification::FontSizeChanged {
                    width: *width,
                    height: *height,
                }]
            }
            Action::UpdateFontPx(px) => {
                s.font_attr.specified_px = *px;
                smallvec![Notification::FontPxSpecified(*px)]
            }
            Action::UpdateFontFace(face) => {
                s.font_attr.face.clone_from(face);
                smallvec![Notification::FontFaceSpecified(face.clone())]
            }
            Action::Input(text) => {
                if s.attached {
                    smallvec![Notification::Input(text.clone())]
                } else {
                    warn!(target: "store", len = text.len(), "input_after_disconnect_dropped");
                    Notifications::new()
                }
            }
            Action::Focus(focused) => {
                s.focused = *focused;
                smallvec![Notification::FocusChanged(*focused)]
            }
            Action::DragStart(cell) | Action::DragUpdate(cell) | Action::DragEnd(cell) => {
                let phase = match action {
                    Action::DragStart(_) => DragPhase::Press,
                    Action::DragUpdate(_) => DragPhase::Drag,
                    _ => DragPhase::Release,
                };
                Self::mouse_input(s, || mouse_notation(phase, cell))
            }
            Action::WheelScroll(step) => {
                if step.count == 0 {
                    return Notifications::new();
                }
                Self::mouse_input(s, || wheel_notation(step))
            }
            Action::SetTitle(title) => {
                s.title.clone_from(title);
                smallvec![Notification::TitleChanged(title.clone())]
            }
            Action::SetIcon(path) => {
                s.icon_path.clone_from(path);
                smallvec![Notification::IconChanged(path.clone())]
            }
            Action::SetScrollRegion(region) => {
                s.scroll_region = *region;
                smallvec![Notification::ScrollRegionChanged(*region)]
            }
            Action::ScrollScreen(delta) => {
                if *delta == 0 {
                    Notifications::new()
                } else {
                    smallvec![Notification::Scrolled {
                        delta: *delta,
                        region: s.scroll_region,
                    }]
                }
            }
            Action::UpdateScreenSize { width, height } => {
                s.viewport = Viewport {
                    width: *width,
                    height: *height,
                };
                smallvec![Notification::ScreenSizeChanged {
                    width: *width,
                    height: *height,
                }]
            }
            Action::UpdateScreenBounds { lines, cols } => {
                if s.size.lines == *lines && s.size.cols == *cols {
                    debug!(target: "store", lines, cols, "screen_bounds_unchanged");
                    return Notifications::new();
                }
                s.set_grid(*lines, *cols);
                smallvec![Notification::ScreenBoundsChanged {
                    lines: *lines,
                    cols: *cols,
                }]
            }
            Action::EnableMouse | Action::DisableMouse => {
                s.mouse_enabled = matches!(action, Action::EnableMouse);
                smallvec![Notification::MouseEnabled(s.mouse_enabled)]
            }
            Action::Bell { visual } => {
                s.last_bell = Some(*visual);
                smallvec![Notification::Bell { visual: *visual }]
            }
            Action::Disconnected => {
                s.attached = false;
                smallvec![Notification::Disconnected]
            }
        }
    }

    fn mouse_input(s: &ScreenState, encode: impl FnOnce() -> String) -> Notifications {
        if s.mouse_enabled && s.attached {
            smallvec![Notification::Input(encode())]
        } else {
            trace!(target: "store", mouse_enabled = s.mouse_enabled, "mouse_event_ignored");
            Notifications::new()
        }
    }
}
