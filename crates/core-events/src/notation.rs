//! Editor input notation (`<C-x>`, `<LeftMouse><3,4>`, ...).

use crate::ModMask;
use crate::action::{MouseCell, WheelStep};

/// Which part of a drag gesture a mouse notation describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Press,
    Drag,
    Release,
}

impl DragPhase {
    fn suffix(self) -> &'static str {
        match self {
            DragPhase::Press => "Mouse",
            DragPhase::Drag => "Drag",
            DragPhase::Release => "Release",
        }
    }
}

/// Modifier prefix in the fixed order `C-`, `A-`, `S-`.
pub fn modifier_prefix(mods: ModMask, with_shift: bool) -> String {
    let mut out = String::new();
    if mods.contains(ModMask::CTRL) {
        out.push_str("C-");
    }
    if mods.contains(ModMask::ALT) {
        out.push_str("A-");
    }
    if with_shift && mods.contains(ModMask::SHIFT) {
        out.push_str("S-");
    }
    out
}

/// `<` + modifiers + `name` + `>`.
pub fn key_notation(name: &str, mods: ModMask, with_shift: bool) -> String {
    format!("<{}{}>", modifier_prefix(mods, with_shift), name)
}

/// `<[C-][A-][S-]{Button}{Mouse|Drag|Release}><col,line>`
pub fn mouse_notation(phase: DragPhase, cell: &MouseCell) -> String {
    format!(
        "<{}{}{}><{},{}>",
        modifier_prefix(cell.mods, true),
        cell.button.notation_name(),
        phase.suffix(),
        cell.col,
        cell.line
    )
}

/// `<[C-][S-]ScrollWheel{Dir}><col,line>` repeated `count` times. Alt is not
/// part of wheel notation.
pub fn wheel_notation(step: &WheelStep) -> String {
    let mut mods = step.mods;
    mods.remove(ModMask::ALT);
    let one = format!(
        "<{}ScrollWheel{}><{},{}>",
        modifier_prefix(mods, true),
        step.direction.notation_name(),
        step.col,
        step.line
    );
    one.repeat(step.count as usize)
}
