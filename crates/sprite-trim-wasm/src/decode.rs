//! PNG decode/encode WASM bindings.

use crate::types::JsRgbaImage;
use sprite_trim_core::{decode, encode};
use wasm_bindgen::prelude::*;

/// Decode PNG bytes into an RGBA image.
///
/// # Example
///
/// ```typescript
/// const image = decode_png(new Uint8Array(await file.arrayBuffer()));
/// console.log(`Decoded ${image.width}x${image.height}`);
/// ```
#[wasm_bindgen]
pub fn decode_png(bytes: &[u8]) -> Result<JsRgbaImage, JsValue> {
    decode::decode_png(bytes)
        .map(JsRgbaImage::from_raster)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encode an RGBA image to lossless PNG bytes.
#[wasm_bindgen]
pub fn encode_png(image: &JsRgbaImage) -> Result<Vec<u8>, JsValue> {
    encode::encode_raster(&image.to_raster()).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use sprite_trim_core::decode::RgbaRaster;

    #[test]
    fn test_core_round_trip() {
        let raster = RgbaRaster::new(1, 2, vec![10, 20, 30, 0, 40, 50, 60, 255]);
        let png = sprite_trim_core::encode::encode_raster(&raster).unwrap();
        let decoded = sprite_trim_core::decode::decode_png(&png).unwrap();
        assert_eq!(decoded, raster);
    }
}
