//! Tight bounding boxes of non-transparent pixels.
//!
//! A pixel counts as visible when its alpha is greater than zero; there is no
//! threshold. Rectangles use exclusive max edges, so `max_x - min_x` is the
//! width of the retained region.
//!
//! [`CropBounds`] is the value stored per image once scanning is done. It is
//! either a rectangle or `Uncropped`, and `union` treats `Uncropped` as
//! absorbing: one member that must not be cropped keeps its whole alignment
//! group uncropped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::RgbaRaster;

/// A crop rectangle in original pixel coordinates (max edges exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropRect {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl CropRect {
    pub fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width of the retained region.
    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    /// Height of the retained region.
    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }

    /// Top-left corner; the shift of the local origin after cropping.
    pub fn origin(&self) -> (u32, u32) {
        (self.min_x, self.min_y)
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &CropRect) -> CropRect {
        CropRect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Check `0 <= min < max <= size` on both axes.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.min_x < self.max_x
            && self.min_y < self.max_y
            && self.max_x <= width
            && self.max_y <= height
    }

    /// True when the rectangle covers the whole `width` x `height` image.
    pub fn is_full(&self, width: u32, height: u32) -> bool {
        self.min_x == 0 && self.min_y == 0 && self.max_x == width && self.max_y == height
    }
}

/// The crop committed for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CropBounds {
    /// Retain only this rectangle.
    Rect(CropRect),
    /// Leave the image untouched.
    #[default]
    Uncropped,
}

impl CropBounds {
    /// Union with `Uncropped` absorbing: `union(Uncropped, x) = Uncropped`.
    pub fn union(self, other: CropBounds) -> CropBounds {
        match (self, other) {
            (CropBounds::Rect(a), CropBounds::Rect(b)) => CropBounds::Rect(a.union(&b)),
            _ => CropBounds::Uncropped,
        }
    }

    pub fn rect(&self) -> Option<&CropRect> {
        match self {
            CropBounds::Rect(rect) => Some(rect),
            CropBounds::Uncropped => None,
        }
    }

    pub fn is_uncropped(&self) -> bool {
        matches!(self, CropBounds::Uncropped)
    }
}

impl From<Option<CropRect>> for CropBounds {
    fn from(rect: Option<CropRect>) -> Self {
        rect.map_or(CropBounds::Uncropped, CropBounds::Rect)
    }
}

/// Outcome of scanning one raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundsResult {
    /// Visible pixels occupy a strict sub-rectangle.
    Rect(CropRect),
    /// Visible pixels touch every edge; nothing to trim.
    NoCropNeeded,
    /// No pixel has non-zero alpha.
    Empty,
}

impl BoundsResult {
    /// The crop this scan result commits to.
    pub fn to_crop_bounds(self) -> CropBounds {
        match self {
            BoundsResult::Rect(rect) => CropBounds::Rect(rect),
            BoundsResult::NoCropNeeded | BoundsResult::Empty => CropBounds::Uncropped,
        }
    }
}

/// A detected span larger than the raster itself.
///
/// This can only come from a corrupt raster or a scanning bug, so it aborts
/// the whole run rather than being clamped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Invalid bounds for {width}x{height} raster: min_x={min_x} max_x={max_x} min_y={min_y} max_y={max_y}"
)]
pub struct IntegrityError {
    pub width: u32,
    pub height: u32,
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

/// Scan a raster for the tight rectangle around all pixels with alpha > 0.
///
/// # Returns
///
/// - `BoundsResult::Empty` when the raster is fully transparent
/// - `BoundsResult::NoCropNeeded` when the rectangle is the whole raster
/// - `BoundsResult::Rect` otherwise
///
/// # Errors
///
/// Returns `IntegrityError` if the pixel buffer is shorter than the declared
/// dimensions, or if the detected span exceeds them.
pub fn scan_bounds(raster: &RgbaRaster) -> Result<BoundsResult, IntegrityError> {
    let width = raster.width;
    let height = raster.height;

    // Start inverted so the first visible pixel sets every edge.
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0u32;
    let mut max_y = 0u32;

    let stride = raster.stride();
    if raster.pixels.len() < stride * height as usize {
        return Err(IntegrityError {
            width,
            height,
            min_x: 0,
            max_x: (raster.pixels.len() / stride.max(1)) as u32,
            min_y: 0,
            max_y: height,
        });
    }

    for y in 0..height {
        let row = &raster.pixels[y as usize * stride..(y as usize + 1) * stride];
        let mut row_has_pixels = false;
        for (x, pixel) in row.chunks_exact(4).enumerate() {
            if pixel[3] > 0 {
                let x = x as u32;
                min_x = min_x.min(x);
                max_x = max_x.max(x + 1);
                row_has_pixels = true;
            }
        }
        if row_has_pixels {
            min_y = min_y.min(y);
            max_y = max_y.max(y + 1);
        }
    }

    if min_x >= max_x || min_y >= max_y {
        return Ok(BoundsResult::Empty);
    }

    if max_x - min_x > width || max_y - min_y > height || max_x > width || max_y > height {
        return Err(IntegrityError {
            width,
            height,
            min_x,
            max_x,
            min_y,
            max_y,
        });
    }

    let rect = CropRect::new(min_x, min_y, max_x, max_y);
    if rect.is_full(width, height) {
        Ok(BoundsResult::NoCropNeeded)
    } else {
        Ok(BoundsResult::Rect(rect))
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
