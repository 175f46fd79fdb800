//! WASM bindings for scanning, cropping and reconciling.

use crate::types::{bounds_from_js, JsCropRect, JsRgbaImage};
use sprite_trim_core::bounds::{scan_bounds as core_scan, BoundsResult};
use sprite_trim_core::transform::{crop_png as core_crop_png, reconcile, Symbol};
use wasm_bindgen::prelude::*;

/// Scan an image for the tight rectangle around its visible pixels.
///
/// # Returns
///
/// The rectangle to crop to, or `undefined` when there is nothing to crop
/// (fully transparent, or visible pixels touch every edge).
///
/// # Errors
///
/// Returns an error if the pixel buffer does not match the dimensions.
#[wasm_bindgen]
pub fn scan_bounds(image: &JsRgbaImage) -> Result<Option<JsCropRect>, JsValue> {
    let result = core_scan(&image.to_raster()).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(rect_of(result))
}

/// Crop PNG bytes to `rect`; returns the input unchanged when `rect` is
/// `undefined`.
#[wasm_bindgen]
pub fn crop_png(bytes: &[u8], rect: Option<JsCropRect>) -> Result<Vec<u8>, JsValue> {
    core_crop_png(bytes, bounds_from_js(rect)).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Reconcile one entity symbol object for an image cropped to `rect`.
///
/// # Arguments
///
/// * `symbol` - `{ imageAsset, x, y, pivotX, pivotY, rotation, scaleX, scaleY }`
/// * `rect` - The committed crop, or `undefined` for none
///
/// # Returns
///
/// A new symbol object with `x`, `y`, `pivotX` and `pivotY` updated.
#[wasm_bindgen]
pub fn reconcile_symbol(symbol: JsValue, rect: Option<JsCropRect>) -> Result<JsValue, JsValue> {
    let mut symbol: Symbol = serde_wasm_bindgen::from_value(symbol)
        .map_err(|e| JsValue::from_str(&format!("Invalid symbol: {}", e)))?;
    reconcile(&mut symbol, bounds_from_js(rect));
    serde_wasm_bindgen::to_value(&symbol).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn rect_of(result: BoundsResult) -> Option<JsCropRect> {
    match result {
        BoundsResult::Rect(rect) => Some(rect.into()),
        BoundsResult::NoCropNeeded | BoundsResult::Empty => None,
    }
}
