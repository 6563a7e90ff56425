//! Paints store notifications onto a [`Surface`].
//!
//! The renderer reads the store's [`ScreenState`] but never mutates it. Work
//! that needs another trip through the store (font measurement, resize) is
//! returned as follow-up actions for the caller to queue; the renderer never
//! dispatches on its own.

use core_config::Config;
use core_events::{Action, Region};
use core_state::{Notification, ScreenState};
use smallvec::{SmallVec, smallvec};
use tracing::{debug, info, trace};

use crate::RenderError;
use crate::geometry::{self, CellMetrics};
use crate::pointer::{DragTracker, PointerInput, WheelAccumulator, WheelInput};
use crate::render_metrics::{RenderMetrics, RenderMetricsSnapshot};
use crate::scroll::{ScrollOutcome, scroll_region};
use crate::surface::{FontSpec, PixelRect, Surface};

/// Follow-up actions produced while painting.
pub type FollowUps = SmallVec<[Action; 2]>;

#[derive(Debug, Clone)]
pub struct RendererOptions {
    /// Cell height as a multiple of the measured cell width.
    pub line_height_factor: f32,
    pub mouse: core_config::MouseConfig,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RendererOptions {
    pub fn from_config(config: &Config) -> Self {
        let factor = config.file.font.line_height_factor;
        Self {
            line_height_factor: if factor.is_finite() && factor > 0.0 {
                factor
            } else {
                2.0
            },
            mouse: config.mouse(),
        }
    }
}

pub struct Renderer<S: Surface> {
    surface: S,
    options: RendererOptions,
    drag: DragTracker,
    wheel: WheelAccumulator,
    /// Last host pixel extent requested through `resize_px`.
    viewport: Option<(u32, u32)>,
    metrics: RenderMetrics,
}

impl<S: Surface> Renderer<S> {
    pub fn new(surface: S, options: RendererOptions) -> Self {
        let wheel = WheelAccumulator::new(options.mouse);
        Self {
            surface,
            options,
            drag: DragTracker::default(),
            wheel,
            viewport: None,
            metrics: RenderMetrics::default(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn metrics(&self) -> RenderMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Reacts to one store notification.
    pub fn on_notification(
        &mut self,
        note: &Notification,
        state: &ScreenState,
    ) -> Result<FollowUps, RenderError> {
        match note {
            Notification::Put { line, col, cells } => {
                self.draw_text(*line, *col, cells, state)?;
            }
            Notification::ClearAll => self.clear_all(state)?,
            Notification::ClearEol { line, col } => self.clear_eol(*line, *col, state)?,
            Notification::Scrolled { delta, region } => self.scroll(*delta, region, state)?,
            Notification::Resized { .. } | Notification::ScreenBoundsChanged { .. } => {
                self.fit_surface(state)?;
            }
            Notification::FontPxSpecified(_) | Notification::FontFaceSpecified(_) => {
                return Ok(smallvec![self.measure_font(state)]);
            }
            Notification::FontSizeChanged { .. } => return self.refit(state),
            _ => {}
        }
        Ok(FollowUps::new())
    }

    /// Paints a run of cells: background block first, then one glyph per
    /// cell in the foreground colour, then underline or undercurl.
    pub fn draw_text(
        &mut self,
        line: u32,
        col: u32,
        cells: &[String],
        state: &ScreenState,
    ) -> Result<(), RenderError> {
        if line >= state.size.lines || col >= state.size.cols {
            trace!(target: "render.text", line, col, "put_outside_grid");
            return Ok(());
        }
        let visible = cells.len().min((state.size.cols - col) as usize);
        if visible == 0 {
            return Ok(());
        }
        let m = CellMetrics::of(state);
        let attr = &state.font_attr;
        let (fg, bg) = attr.paint_colors();
        let run = m.span(line, col, visible as u32);
        self.surface.fill_rect(run, bg)?;

        let font = font_spec(state);
        for (i, text) in cells[..visible].iter().enumerate() {
            if text.is_empty() || text == " " {
                continue;
            }
            let (x, y) = m.position_of(line, col + i as u32);
            self.surface.fill_text(text, x, y, &font, fg)?;
        }

        let baseline = run.y + run.height - 1;
        if attr.underline {
            self.surface
                .fill_rect(PixelRect::new(run.x, baseline, run.width, 1), fg)?;
        } else if attr.undercurl {
            // Alternate between the last two pixel rows.
            for x in run.x..run.x + run.width {
                let y = if (x / 2) % 2 == 0 { baseline } else { baseline.saturating_sub(1) };
                self.surface.fill_rect(PixelRect::new(x, y, 1, 1), fg)?;
            }
        }
        RenderMetrics::bump(&self.metrics.text_runs, 1);
        RenderMetrics::bump(&self.metrics.cells_painted, visible as u64);
        Ok(())
    }

    pub fn clear_all(&mut self, state: &ScreenState) -> Result<(), RenderError> {
        let (w, h) = self.surface.size();
        self.surface
            .fill_rect(PixelRect::new(0, 0, w, h), state.font_attr.bg)?;
        RenderMetrics::bump(&self.metrics.clears, 1);
        Ok(())
    }

    pub fn clear_eol(&mut self, line: u32, col: u32, state: &ScreenState) -> Result<(), RenderError> {
        let m = CellMetrics::of(state);
        let rest = state.size.cols.saturating_sub(col);
        self.surface
            .fill_rect(m.span(line, col, rest), state.font_attr.bg)?;
        RenderMetrics::bump(&self.metrics.clears, 1);
        Ok(())
    }

    pub fn scroll(&mut self, delta: i64, region: &Region, state: &ScreenState) -> Result<(), RenderError> {
        let outcome = scroll_region(
            &mut self.surface,
            CellMetrics::of(state),
            region,
            delta,
            state.font_attr.bg,
        )?;
        match outcome {
            ScrollOutcome::Blit { .. } => RenderMetrics::bump(&self.metrics.scroll_blits, 1),
            ScrollOutcome::RegionFill => RenderMetrics::bump(&self.metrics.scroll_region_fills, 1),
            ScrollOutcome::Noop => {}
        }
        Ok(())
    }

    /// Host viewport changed to `width` x `height` pixels. The surface is
    /// snapped to whole cells; the returned pair updates the store.
    pub fn resize_px(&mut self, width: u32, height: u32, state: &ScreenState) -> Result<FollowUps, RenderError> {
        self.viewport = Some((width, height));
        let (lines, cols) = CellMetrics::of(state).fit(width, height);
        self.resize_grid(lines, cols, state)
    }

    /// Resizes the surface to exactly `lines` x `cols` cells.
    pub fn resize_grid(&mut self, lines: u32, cols: u32, state: &ScreenState) -> Result<FollowUps, RenderError> {
        let lines = lines.max(1);
        let cols = cols.max(1);
        let m = CellMetrics::of(state);
        let (width, height) = (cols.saturating_mul(m.width), lines.saturating_mul(m.height));
        if self.surface.size() != (width, height) {
            self.surface.resize(width, height)?;
            RenderMetrics::bump(&self.metrics.surface_resizes, 1);
        }
        info!(target: "render.surface", lines, cols, width, height, "surface_resized");
        Ok(smallvec![
            Action::update_screen_size(width, height),
            Action::update_screen_bounds(lines, cols),
        ])
    }

    /// Measures the cell size of the current font: the advance of `m`
    /// rounded up, height from the line height factor.
    pub fn measure_font(&mut self, state: &ScreenState) -> Action {
        let font = font_spec(state);
        let advance = self.surface.measure_text("m", &font);
        let width = (advance.ceil() as u32).max(1);
        let height = ((width as f32 * self.options.line_height_factor).ceil() as u32).max(1);
        RenderMetrics::bump(&self.metrics.font_measurements, 1);
        debug!(
            target: "render.font",
            face = %font.face,
            px = font.px,
            width,
            height,
            "font_measured"
        );
        Action::update_font_size(width, height)
    }

    /// Keeps the surface in step with the grid after the editor resized it.
    fn fit_surface(&mut self, state: &ScreenState) -> Result<(), RenderError> {
        let target = (state.size.width, state.size.height);
        if self.surface.size() != target {
            self.surface.resize(target.0, target.1)?;
            RenderMetrics::bump(&self.metrics.surface_resizes, 1);
            debug!(target: "render.surface", width = target.0, height = target.1, "surface_fitted");
        }
        Ok(())
    }

    /// Cell metrics changed: refit the last host viewport, or keep the grid
    /// when none was ever reported.
    fn refit(&mut self, state: &ScreenState) -> Result<FollowUps, RenderError> {
        match self.viewport {
            Some((w, h)) => self.resize_px(w, h, state),
            None => self.resize_grid(state.size.lines, state.size.cols, state),
        }
    }

    pub fn cell_at(&self, x: i32, y: i32, state: &ScreenState) -> (u32, u32) {
        geometry::cell_at(state, x, y)
    }

    pub fn position_of(&self, line: u32, col: u32, state: &ScreenState) -> (u32, u32) {
        geometry::position_of(state, line, col)
    }

    pub fn cursor_rect(&self, state: &ScreenState) -> PixelRect {
        geometry::cursor_rect(state)
    }

    pub fn mouse_down(&mut self, ev: &PointerInput, state: &ScreenState) -> Action {
        self.drag.down(ev, state)
    }

    pub fn mouse_move(&mut self, ev: &PointerInput, state: &ScreenState) -> Option<Action> {
        self.drag.moved(ev, state)
    }

    pub fn mouse_up(&mut self, ev: &PointerInput, state: &ScreenState) -> Action {
        self.drag.up(ev, state)
    }

    pub fn wheel(&mut self, ev: &WheelInput, state: &ScreenState) -> FollowUps {
        self.wheel.feed(ev, state)
    }
}

fn font_spec(state: &ScreenState) -> FontSpec {
    let attr = &state.font_attr;
    FontSpec {
        face: attr.face.clone(),
        px: attr.specified_px,
        bold: attr.bold,
        italic: attr.italic,
        line_height: attr.cell_height,
    }
}
