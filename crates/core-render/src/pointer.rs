//! Mouse drag tracking and wheel quantization.
//!
//! Both produce actions only; whether they reach the editor is decided by
//! the store (mouse support must be enabled).

use core_config::MouseConfig;
use core_events::{Action, ModMask, MouseButton, MouseCell, WheelDirection, WheelStep};
use core_state::ScreenState;
use smallvec::SmallVec;

use crate::geometry::{CellMetrics, cell_at};

/// Pointer press, move or release in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerInput {
    pub x: i32,
    pub y: i32,
    pub button: MouseButton,
    /// Bitmask of buttons currently held (host convention, 0 = none).
    pub buttons: u8,
    pub mods: ModMask,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub x: i32,
    pub y: i32,
    pub delta_x: f64,
    pub delta_y: f64,
    pub mods: ModMask,
}

/// Tracks the button and last reported cell of an active drag.
#[derive(Debug, Default, Clone)]
pub struct DragTracker {
    active: Option<MouseCell>,
}

impl DragTracker {
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn down(&mut self, ev: &PointerInput, state: &ScreenState) -> Action {
        let cell = Self::cell(ev, ev.button, state);
        self.active = Some(cell);
        Action::drag_start(cell)
    }

    /// A drag update is produced only while a button is held and only when
    /// the pointer entered a different cell.
    pub fn moved(&mut self, ev: &PointerInput, state: &ScreenState) -> Option<Action> {
        if ev.buttons == 0 {
            return None;
        }
        let button = self.active.map(|c| c.button).unwrap_or(ev.button);
        let cell = Self::cell(ev, button, state);
        match self.active {
            Some(last) if last.line == cell.line && last.col == cell.col => None,
            _ => {
                self.active = Some(cell);
                Some(Action::drag_update(cell))
            }
        }
    }

    pub fn up(&mut self, ev: &PointerInput, state: &ScreenState) -> Action {
        let button = self.active.take().map(|c| c.button).unwrap_or(ev.button);
        Action::drag_end(Self::cell(ev, button, state))
    }

    fn cell(ev: &PointerInput, button: MouseButton, state: &ScreenState) -> MouseCell {
        let (line, col) = cell_at(state, ev.x, ev.y);
        MouseCell {
            line,
            col,
            button,
            mods: ev.mods,
        }
    }
}

/// Accumulates fractional wheel deltas until they amount to whole steps.
#[derive(Debug, Clone)]
pub struct WheelAccumulator {
    x: f64,
    y: f64,
    ctrl: bool,
    shift: bool,
    config: MouseConfig,
}

impl WheelAccumulator {
    pub fn new(config: MouseConfig) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            ctrl: false,
            shift: false,
            config,
        }
    }

    /// Feeds one wheel event. Returns up to two steps, vertical first.
    /// Changing Ctrl or Shift discards any partial accumulation.
    pub fn feed(&mut self, ev: &WheelInput, state: &ScreenState) -> SmallVec<[Action; 2]> {
        let ctrl = ev.mods.contains(ModMask::CTRL);
        let shift = ev.mods.contains(ModMask::SHIFT);
        if ctrl != self.ctrl || shift != self.shift {
            self.x = 0.0;
            self.y = 0.0;
            self.ctrl = ctrl;
            self.shift = shift;
        }
        self.x += ev.delta_x;
        self.y += ev.delta_y;

        let m = CellMetrics::of(state);
        let per_y = f64::from(m.height) * f64::from(self.config.wheel_lines_per_step.max(1));
        let per_x = f64::from(m.width) * f64::from(self.config.wheel_cols_per_step.max(1));
        let steps_y = (self.y / per_y).round() as i64;
        let steps_x = (self.x / per_x).round() as i64;

        let (line, col) = cell_at(state, ev.x, ev.y);
        let mut out = SmallVec::new();
        if steps_y != 0 {
            self.y = 0.0;
            let direction = if steps_y > 0 {
                WheelDirection::Down
            } else {
                WheelDirection::Up
            };
            out.push(Self::step(direction, steps_y, line, col, ev.mods));
        }
        if steps_x != 0 {
            self.x = 0.0;
            let direction = if steps_x > 0 {
                WheelDirection::Right
            } else {
                WheelDirection::Left
            };
            out.push(Self::step(direction, steps_x, line, col, ev.mods));
        }
        out
    }

    fn step(direction: WheelDirection, steps: i64, line: u32, col: u32, mods: ModMask) -> Action {
        Action::wheel_scroll(WheelStep {
            direction,
            count: steps.unsigned_abs().min(u64::from(u32::MAX)) as u32,
            line,
            col,
            mods,
        })
    }
}
