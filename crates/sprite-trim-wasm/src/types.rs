//! WASM-compatible wrapper types for image data.

use sprite_trim_core::bounds::{CropBounds, CropRect};
use sprite_trim_core::decode::RgbaRaster;
use wasm_bindgen::prelude::*;

/// A decoded RGBA image wrapper for JavaScript.
///
/// The pixel data lives in WASM memory; `pixels()` copies it out as a
/// `Uint8Array`.
#[wasm_bindgen]
pub struct JsRgbaImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsRgbaImage {
    /// Create a new JsRgbaImage from dimensions and RGBA pixel data.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsRgbaImage {
        JsRgbaImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBA pixel data as Uint8Array (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl JsRgbaImage {
    pub(crate) fn from_raster(img: RgbaRaster) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    pub(crate) fn to_raster(&self) -> RgbaRaster {
        RgbaRaster {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        }
    }
}

/// Crop rectangle exchanged with JavaScript (max edges exclusive).
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsCropRect {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

#[wasm_bindgen]
impl JsCropRect {
    #[wasm_bindgen(constructor)]
    pub fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> JsCropRect {
        JsCropRect {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x)
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y)
    }
}

impl From<CropRect> for JsCropRect {
    fn from(rect: CropRect) -> Self {
        JsCropRect::new(rect.min_x, rect.min_y, rect.max_x, rect.max_y)
    }
}

impl From<JsCropRect> for CropRect {
    fn from(rect: JsCropRect) -> Self {
        CropRect::new(rect.min_x, rect.min_y, rect.max_x, rect.max_y)
    }
}

/// `None` from JavaScript (`undefined`) means "no crop".
pub(crate) fn bounds_from_js(rect: Option<JsCropRect>) -> CropBounds {
    rect.map(CropRect::from).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_rgba_image_creation() {
        let img = JsRgbaImage::new(10, 5, vec![0u8; 10 * 5 * 4]);
        assert_eq!(img.width(), 10);
        assert_eq!(img.height(), 5);
        assert_eq!(img.byte_length(), 200);
    }

    #[test]
    fn test_raster_round_trip() {
        let raster = RgbaRaster::new(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let js = JsRgbaImage::from_raster(raster.clone());
        assert_eq!(js.pixels(), raster.pixels);
        assert_eq!(js.to_raster(), raster);
    }

    #[test]
    fn test_crop_rect_conversion() {
        let rect = CropRect::new(1, 2, 30, 40);
        let js: JsCropRect = rect.into();
        assert_eq!(js.width(), 29);
        assert_eq!(js.height(), 38);
        assert_eq!(CropRect::from(js), rect);
    }

    #[test]
    fn test_bounds_from_js() {
        assert_eq!(bounds_from_js(None), CropBounds::Uncropped);
        let js = JsCropRect::new(0, 0, 4, 4);
        assert_eq!(
            bounds_from_js(Some(js)),
            CropBounds::Rect(CropRect::new(0, 0, 4, 4))
        );
    }
}
