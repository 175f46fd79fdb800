//! PNG decoding into RGBA8.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use super::{DecodeError, RgbaRaster};

/// PNG file signature.
const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Decode a PNG image from bytes into an RGBA8 raster.
///
/// Grayscale, palette and RGB images are expanded to RGBA; images without an
/// alpha channel come back fully opaque.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are not a PNG.
/// Returns `DecodeError::CorruptedFile` if the PNG cannot be decoded.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaRaster, DecodeError> {
    if !bytes.starts_with(&PNG_MAGIC) {
        return Err(DecodeError::InvalidFormat);
    }

    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(ImageFormat::Png);

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    Ok(RgbaRaster::from_rgba_image(img.into_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageEncoder, RgbImage};

    fn png_bytes_rgb(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50]));
        let mut out = Vec::new();
        image::codecs::png::PngEncoder::new(&mut out)
            .write_image(
                img.as_raw(),
                width,
                height,
                image::ExtendedColorType::Rgb8,
            )
            .unwrap();
        out
    }

    #[test]
    fn test_decode_rgb_png_is_opaque() {
        let bytes = png_bytes_rgb(6, 4);
        let raster = decode_png(&bytes).unwrap();

        assert_eq!(raster.width, 6);
        assert_eq!(raster.height, 4);
        assert_eq!(raster.pixels.len(), 6 * 4 * 4);
        assert!(raster.pixels.chunks_exact(4).all(|p| p[3] == 255));
        assert_eq!(&raster.pixels[0..3], &[200, 100, 50]);
    }

    #[test]
    fn test_decode_rejects_non_png() {
        let result = decode_png(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0]);
        assert!(matches!(result, Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(matches!(decode_png(&[]), Err(DecodeError::InvalidFormat)));
    }

    #[test]
    fn test_decode_truncated_png() {
        let bytes = png_bytes_rgb(8, 8);
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(
            decode_png(truncated),
            Err(DecodeError::CorruptedFile(_))
        ));
    }
}
