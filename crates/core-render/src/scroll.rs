//! Scroll-region blitting.
//!
//! `delta > 0` moves content up by `delta` rows, `delta < 0` moves it down.
//! Only rows `[top, bottom]` and columns `[left, right]` of the region are
//! touched. With `h = bottom - top + 1` and `d = |delta|`:
//!
//! - up: copy rows `[top + d, bottom]` to `[top, bottom - d]`, fill
//!   `(bottom - d, bottom]`;
//! - down: copy rows `[top, bottom - d]` to `[top + d, bottom]`, fill
//!   `[top, top + d)`;
//! - `d >= h`: fill the whole region.
//!
//! All rectangles are whole cells, so the copy is pixel exact.

use core_events::{Region, Rgb};
use tracing::trace;

use crate::geometry::CellMetrics;
use crate::surface::{Surface, SurfaceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOutcome {
    Noop,
    /// Copied `moved` rows and filled `vacated` rows.
    Blit { moved: u32, vacated: u32 },
    /// Distance covered the region; filled it.
    RegionFill,
}

pub fn scroll_region<S: Surface + ?Sized>(
    surface: &mut S,
    cell: CellMetrics,
    region: &Region,
    delta: i64,
    fill: Rgb,
) -> Result<ScrollOutcome, SurfaceError> {
    if delta == 0 {
        return Ok(ScrollOutcome::Noop);
    }
    let height = region.height();
    let d = delta.unsigned_abs();
    if d >= u64::from(height) {
        trace!(target: "render.scroll", delta, height, "scroll_region_fill");
        surface.fill_rect(cell.rows(region, region.top, height), fill)?;
        return Ok(ScrollOutcome::RegionFill);
    }
    let d = d as u32;
    let moved = height - d;
    let (src_top, dst_top, vacated_top) = if delta > 0 {
        (region.top + d, region.top, region.bottom + 1 - d)
    } else {
        (region.top, region.top + d, region.top)
    };
    let src = cell.rows(region, src_top, moved);
    let (_, dst_y) = cell.position_of(dst_top, region.left);
    surface.copy_rect(src, src.x, dst_y)?;
    surface.fill_rect(cell.rows(region, vacated_top, d), fill)?;
    trace!(target: "render.scroll", delta, moved, vacated = d, "scroll_region_blit");
    Ok(ScrollOutcome::Blit { moved, vacated: d })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{PixelBuffer, PixelRect};

    const CELL: CellMetrics = CellMetrics {
        width: 2,
        height: 3,
    };

    /// 6 lines x 4 cols; each row painted with a colour equal to its line + 1.
    fn striped() -> PixelBuffer {
        let mut buf = PixelBuffer::new(4 * CELL.width, 6 * CELL.height).unwrap();
        for line in 0..6 {
            buf.fill_rect(
                PixelRect::new(0, line * CELL.height, 4 * CELL.width, CELL.height),
                Rgb(line + 1),
            )
            .unwrap();
        }
        buf
    }

    fn line_color(buf: &PixelBuffer, line: u32, col: u32) -> u32 {
        let c = buf.pixel(col * CELL.width, line * CELL.height + 1).unwrap();
        c.0
    }

    fn column(buf: &PixelBuffer, col: u32) -> Vec<u32> {
        (0..6).map(|l| line_color(buf, l, col)).collect()
    }

    #[test]
    fn up_moves_rows_and_fills_bottom() {
        let mut buf = striped();
        let region = Region::new(1, 4, 0, 3);
        let out = scroll_region(&mut buf, CELL, &region, 2, Rgb(0xee)).unwrap();
        assert_eq!(out, ScrollOutcome::Blit { moved: 2, vacated: 2 });
        assert_eq!(column(&buf, 0), vec![1, 4, 5, 0xee, 0xee, 6]);
    }

    #[test]
    fn down_moves_rows_and_fills_top() {
        let mut buf = striped();
        let region = Region::new(1, 4, 0, 3);
        scroll_region(&mut buf, CELL, &region, -1, Rgb(0xee)).unwrap();
        assert_eq!(column(&buf, 0), vec![1, 0xee, 2, 3, 4, 6]);
    }

    #[test]
    fn columns_outside_region_untouched() {
        let mut buf = striped();
        let region = Region::new(0, 5, 1, 2);
        scroll_region(&mut buf, CELL, &region, 1, Rgb(0xee)).unwrap();
        assert_eq!(column(&buf, 0), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(column(&buf, 1), vec![2, 3, 4, 5, 6, 0xee]);
        assert_eq!(column(&buf, 3), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn distance_covering_region_fills_it() {
        let mut buf = striped();
        let region = Region::new(2, 3, 0, 3);
        let out = scroll_region(&mut buf, CELL, &region, -2, Rgb(0xee)).unwrap();
        assert_eq!(out, ScrollOutcome::RegionFill);
        assert_eq!(column(&buf, 2), vec![1, 2, 0xee, 0xee, 5, 6]);
    }

    #[test]
    fn zero_delta_is_noop() {
        let mut buf = striped();
        let before = buf.clone();
        let out = scroll_region(&mut buf, CELL, &Region::full(6, 4), 0, Rgb(0xee)).unwrap();
        assert_eq!(out, ScrollOutcome::Noop);
        assert_eq!(buf, before);
    }
}
