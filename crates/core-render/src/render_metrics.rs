//! Paint operation counters.
//!
//! Counts what the renderer actually issued against the surface so tests and
//! the replay binary can correlate redraw traffic with pixel work.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RenderMetrics {
    /// `put` runs painted.
    pub text_runs: AtomicU64,
    /// Cells covered by those runs after clipping.
    pub cells_painted: AtomicU64,
    /// Full-surface and end-of-line clears.
    pub clears: AtomicU64,
    /// Scrolls served by a copy plus a fill of the vacated band.
    pub scroll_blits: AtomicU64,
    /// Scrolls whose distance covered the whole region, served by one fill.
    pub scroll_region_fills: AtomicU64,
    /// Surface resizes issued.
    pub surface_resizes: AtomicU64,
    /// Font measurements taken.
    pub font_measurements: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderMetricsSnapshot {
    pub text_runs: u64,
    pub cells_painted: u64,
    pub clears: u64,
    pub scroll_blits: u64,
    pub scroll_region_fills: u64,
    pub surface_resizes: u64,
    pub font_measurements: u64,
}

impl RenderMetrics {
    pub(crate) fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RenderMetricsSnapshot {
        RenderMetricsSnapshot {
            text_runs: self.text_runs.load(Ordering::Relaxed),
            cells_painted: self.cells_painted.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
            scroll_blits: self.scroll_blits.load(Ordering::Relaxed),
            scroll_region_fills: self.scroll_region_fills.load(Ordering::Relaxed),
            surface_resizes: self.surface_resizes.load(Ordering::Relaxed),
            font_measurements: self.font_measurements.load(Ordering::Relaxed),
        }
    }
}
