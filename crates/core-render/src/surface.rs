//! Pixel surface abstraction and the in-memory [`PixelBuffer`] backend.
//!
//! The renderer only talks to a [`Surface`]; a host window plugs in its own
//! canvas, tests and the replay binary use [`PixelBuffer`]. Coordinates are
//! device pixels with the origin at the top-left. Operations clip to the
//! surface bounds.

use std::io::{self, Write};

use core_events::Rgb;
use thiserror::Error;

/// Largest edge a [`PixelBuffer`] accepts.
pub const MAX_EDGE: u32 = 16_384;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("surface size {width}x{height} exceeds {max}px per edge")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("surface backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection with a `width` x `height` surface anchored at the origin.
    pub fn clip(&self, width: u32, height: u32) -> PixelRect {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.x.saturating_add(self.width).min(width);
        let y1 = self.y.saturating_add(self.height).min(height);
        PixelRect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSpec {
    pub face: String,
    pub px: u32,
    pub bold: bool,
    pub italic: bool,
    /// Height of the line box text is drawn into. Glyph pixels never land
    /// below `y + line_height`.
    pub line_height: u32,
}

pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError>;
    fn fill_rect(&mut self, rect: PixelRect, color: Rgb) -> Result<(), SurfaceError>;
    /// Copies `src` so its top-left lands on `(dst_x, dst_y)`. Overlapping
    /// source and destination must behave as if copied through a temporary.
    fn copy_rect(&mut self, src: PixelRect, dst_x: u32, dst_y: u32) -> Result<(), SurfaceError>;
    /// Draws `text` with its top-left corner at `(x, y)`.
    fn fill_text(
        &mut self,
        text: &str,
        x: u32,
        y: u32,
        font: &FontSpec,
        color: Rgb,
    ) -> Result<(), SurfaceError>;
    /// Advance width of `text` in pixels.
    fn measure_text(&self, text: &str, font: &FontSpec) -> f32;
}

/// `0x00RRGGBB` pixels in row-major order. Glyphs are drawn as solid blocks
/// so output is deterministic and independent of installed fonts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        check_edges(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        (x < self.width && y < self.height).then(|| Rgb(self.pixels[self.index(x, y)]))
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixels of `rect` (clipped) in row-major order.
    pub fn region(&self, rect: PixelRect) -> Vec<u32> {
        let r = rect.clip(self.width, self.height);
        let mut out = Vec::with_capacity(r.width as usize * r.height as usize);
        for y in r.y..r.y + r.height {
            let start = self.index(r.x, y);
            out.extend_from_slice(&self.pixels[start..start + r.width as usize]);
        }
        out
    }

    /// Binary PPM (P6).
    pub fn write_ppm<W: Write>(&self, mut out: W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for p in &self.pixels {
            let c = Rgb(*p);
            bytes.extend_from_slice(&[c.r(), c.g(), c.b()]);
        }
        out.write_all(&bytes)?;
        out.flush()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Glyph advance: three fifths of the font size, rounded up.
    pub fn advance(px: u32) -> u32 {
        px.saturating_mul(3).div_ceil(5)
    }
}

fn check_edges(width: u32, height: u32) -> Result<(), SurfaceError> {
    if width > MAX_EDGE || height > MAX_EDGE {
        return Err(SurfaceError::TooLarge {
            width,
            height,
            max: MAX_EDGE,
        });
    }
    Ok(())
}

impl Surface for PixelBuffer {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Resizing discards the contents, like a host canvas does.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        check_edges(width, height)?;
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width as usize * height as usize, 0);
        Ok(())
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Rgb) -> Result<(), SurfaceError> {
        let r = rect.clip(self.width, self.height);
        for y in r.y..r.y + r.height {
            let start = self.index(r.x, y);
            self.pixels[start..start + r.width as usize].fill(color.0);
        }
        Ok(())
    }

    fn copy_rect(&mut self, src: PixelRect, dst_x: u32, dst_y: u32) -> Result<(), SurfaceError> {
        let src = src.clip(self.width, self.height);
        let dst = PixelRect::new(dst_x, dst_y, src.width, src.height).clip(self.width, self.height);
        if dst.is_empty() {
            return Ok(());
        }
        let copied = self.region(PixelRect::new(src.x, src.y, dst.width, dst.height));
        for row in 0..dst.height {
            let from = (row * dst.width) as usize;
            let start = self.index(dst.x, dst.y + row);
            self.pixels[start..start + dst.width as usize]
                .copy_from_slice(&copied[from..from + dst.width as usize]);
        }
        Ok(())
    }

    fn fill_text(
        &mut self,
        text: &str,
        x: u32,
        y: u32,
        font: &FontSpec,
        color: Rgb,
    ) -> Result<(), SurfaceError> {
        let advance = Self::advance(font.px);
        // Glyph box: inset one pixel horizontally, upper quarter left as ascender gap.
        let inset = if font.bold { 0 } else { 1 };
        let bottom = y.saturating_add(font.px.min(font.line_height));
        let top = y.saturating_add(font.px / 4).min(bottom);
        if top == bottom {
            return Ok(());
        }
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let gx0 = x.saturating_add((i as u32).saturating_mul(advance));
            let gx1 = gx0.saturating_add(advance);
            let left = gx0.saturating_add(inset);
            let right = gx1.saturating_sub(inset).max(left.saturating_add(1));
            self.fill_rect(PixelRect::new(left, top, right - left, bottom - top), color)?;
        }
        Ok(())
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars().count() as f32 * Self::advance(font.px) as f32
    }
}
