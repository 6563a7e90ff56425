//! Screen renderer: turns store notifications into pixel operations.
//!
//! Exposed components:
//! - `surface`: the [`Surface`] trait a host canvas implements, plus the
//!   in-memory [`PixelBuffer`] used headless and in tests.
//! - `renderer`: [`Renderer`], which paints `put`, clears and scrolls, owns
//!   font measurement and resize snapping, and maps pointer input to actions.
//! - `scroll`: the scroll-region blit.
//! - `geometry`: grid <-> pixel mapping and the cursor rectangle.
//! - `pointer`: drag tracking and wheel quantization.
//! - `render_metrics`: counters for issued paint operations.
//!
//! Invariants:
//! - Every paint rectangle is a whole number of cells at integer cell
//!   metrics, so blits never resample.
//! - The surface is `cols * cell_width` by `lines * cell_height` once a
//!   resize notification has been handled.
//! - The renderer never dispatches; follow-up actions are returned.

pub mod geometry;
pub mod pointer;
pub mod render_metrics;
pub mod renderer;
pub mod scroll;
pub mod surface;

pub use geometry::{CellMetrics, cell_at, cursor_rect, position_of};
pub use pointer::{PointerInput, WheelInput};
pub use renderer::{FollowUps, Renderer, RendererOptions};
pub use surface::{FontSpec, PixelBuffer, PixelRect, Surface, SurfaceError};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("surface operation failed: {0}")]
    Surface(#[from] SurfaceError),
}
