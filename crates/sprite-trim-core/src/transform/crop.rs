//! Sub-raster extraction for committed crop rectangles.
//!
//! Unlike interactive cropping there is no clamping here: a rectangle that
//! does not fit the raster means the plan and the file disagree, and the
//! image is reported instead of silently cropped to something else.

use thiserror::Error;

use crate::bounds::{CropBounds, CropRect};
use crate::decode::{decode_png, DecodeError, RgbaRaster, BYTES_PER_PIXEL};
use crate::encode::{encode_raster, EncodeError};

/// Errors that can occur while cropping one image.
#[derive(Debug, Error)]
pub enum CropError {
    /// The rectangle is empty or extends past the raster.
    #[error("Crop rectangle {rect:?} does not fit a {width}x{height} image")]
    OutOfBounds {
        rect: CropRect,
        width: u32,
        height: u32,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Cut `bounds` out of `image`.
///
/// Returns a copy of the input when `bounds` is `Uncropped`.
///
/// # Errors
///
/// Returns `CropError::OutOfBounds` if the rectangle is empty or does not fit
/// inside the image.
pub fn apply_crop(image: &RgbaRaster, bounds: CropBounds) -> Result<RgbaRaster, CropError> {
    let rect = match bounds {
        CropBounds::Uncropped => return Ok(image.clone()),
        CropBounds::Rect(rect) => rect,
    };

    if !rect.fits_within(image.width, image.height) {
        return Err(CropError::OutOfBounds {
            rect,
            width: image.width,
            height: image.height,
        });
    }

    let out_width = rect.width();
    let out_height = rect.height();
    let src_stride = image.stride();
    let row_len = out_width as usize * BYTES_PER_PIXEL;
    let left = rect.min_x as usize * BYTES_PER_PIXEL;

    let mut output = Vec::with_capacity(row_len * out_height as usize);

    // Copy pixel data row by row
    for y in rect.min_y..rect.max_y {
        let start = y as usize * src_stride + left;
        output.extend_from_slice(&image.pixels[start..start + row_len]);
    }

    Ok(RgbaRaster::new(out_width, out_height, output))
}

/// Decode PNG bytes, crop them and re-encode losslessly.
///
/// Returns the input bytes unchanged when `bounds` is `Uncropped`.
pub fn crop_png(bytes: &[u8], bounds: CropBounds) -> Result<Vec<u8>, CropError> {
    if bounds.is_uncropped() {
        return Ok(bytes.to_vec());
    }
    let raster = decode_png(bytes)?;
    let cropped = apply_crop(&raster, bounds)?;
    Ok(encode_raster(&cropped)?)
}
