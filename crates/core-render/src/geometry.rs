//! Grid <-> pixel mapping. Pure functions of the current cell metrics.

use core_events::Region;
use core_state::ScreenState;

use crate::surface::PixelRect;

/// Size of one grid cell in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub width: u32,
    pub height: u32,
}

impl CellMetrics {
    pub fn of(state: &ScreenState) -> Self {
        Self {
            width: state.font_attr.cell_width.max(1),
            height: state.font_attr.cell_height.max(1),
        }
    }

    /// Top-left pixel of a cell.
    pub fn position_of(&self, line: u32, col: u32) -> (u32, u32) {
        (col * self.width, line * self.height)
    }

    /// Pixel rectangle of `len` cells starting at `(line, col)`.
    pub fn span(&self, line: u32, col: u32, len: u32) -> PixelRect {
        let (x, y) = self.position_of(line, col);
        PixelRect::new(x, y, len * self.width, self.height)
    }

    /// Pixel rectangle of grid rows `[top, top + rows)` within columns
    /// `[region.left, region.right]`.
    pub fn rows(&self, region: &Region, top: u32, rows: u32) -> PixelRect {
        PixelRect::new(
            region.left * self.width,
            top * self.height,
            region.width() * self.width,
            rows * self.height,
        )
    }

    /// Whole lines and columns that fit in a pixel extent, never less than one.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        ((height / self.height).max(1), (width / self.width).max(1))
    }
}

/// Grid cell under a pointer position, clamped into the grid.
pub fn cell_at(state: &ScreenState, x: i32, y: i32) -> (u32, u32) {
    let m = CellMetrics::of(state);
    let line = (y.max(0) as u32 / m.height).min(state.size.lines.saturating_sub(1));
    let col = (x.max(0) as u32 / m.width).min(state.size.cols.saturating_sub(1));
    (line, col)
}

/// Top-left pixel of a grid cell.
pub fn position_of(state: &ScreenState, line: u32, col: u32) -> (u32, u32) {
    CellMetrics::of(state).position_of(line, col)
}

/// Pixel rectangle of the cursor cell, for the host's cursor overlay.
pub fn cursor_rect(state: &ScreenState) -> PixelRect {
    CellMetrics::of(state).span(state.cursor.line, state.cursor.col, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_at_clamps_and_floors() {
        let s = ScreenState::default(); // 7x14 cells, 80x24
        assert_eq!(cell_at(&s, 0, 0), (0, 0));
        assert_eq!(cell_at(&s, 13, 27), (1, 1));
        assert_eq!(cell_at(&s, 14, 28), (2, 2));
        assert_eq!(cell_at(&s, -5, -5), (0, 0));
        assert_eq!(cell_at(&s, 10_000, 10_000), (23, 79));
    }

    #[test]
    fn position_round_trips_through_cell_at() {
        let s = ScreenState::default();
        let (x, y) = position_of(&s, 5, 12);
        assert_eq!((x, y), (84, 70));
        assert_eq!(cell_at(&s, x as i32, y as i32), (5, 12));
    }

    #[test]
    fn cursor_rect_follows_cursor() {
        let mut s = ScreenState::default();
        s.cursor.line = 2;
        s.cursor.col = 3;
        assert_eq!(cursor_rect(&s), PixelRect::new(21, 28, 7, 14));
    }

    #[test]
    fn fit_never_returns_zero() {
        let m = CellMetrics {
            width: 10,
            height: 20,
        };
        assert_eq!(m.fit(805, 410), (20, 80));
        assert_eq!(m.fit(3, 3), (1, 1));
    }
}
