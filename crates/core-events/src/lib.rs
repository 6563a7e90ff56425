//! Redraw action model and the synchronous dispatcher that broadcasts it.
//!
//! Everything that changes the screen, whether it arrives from the editor
//! process or from host input, is expressed as an [`Action`] and pushed through
//! a single [`Dispatcher`]. The dispatcher runs exactly one action at a time;
//! the editor's input notation helpers shared by the encoder and the store live
//! in [`notation`].

pub mod action;
pub mod dispatcher;
pub mod notation;

pub use action::{Action, ActionKind, HighlightSet, MouseCell, Region, Rgb, WheelDirection, WheelStep};
pub use dispatcher::{DispatchError, Dispatcher, HandlerError, Token};

bitflags::bitflags! {
    /// Modifier keys held during a key or pointer event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ModMask: u16 { const CTRL=1; const ALT=2; const SHIFT=4; const META=8; }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    /// Button name used by the editor's mouse notation.
    pub fn notation_name(self) -> &'static str {
        match self {
            MouseButton::Left => "Left",
            MouseButton::Middle => "Middle",
            MouseButton::Right => "Right",
        }
    }

    /// Maps a host button index (0 primary, 1 auxiliary, 2 secondary).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(MouseButton::Left),
            1 => Some(MouseButton::Middle),
            2 => Some(MouseButton::Right),
            _ => None,
        }
    }
}
