//! Image decoding for sprite-trim.
//!
//! This module provides functionality for:
//! - Decoding PNG sprite images into an RGBA8 raster
//!
//! # Architecture
//!
//! Every decoded image is normalized to 8-bit RGBA so the bounding box
//! scanner only ever sees one pixel layout. All operations are synchronous
//! and single-threaded.
//!
//! # Examples
//!
//! ```ignore
//! use sprite_trim_core::decode::decode_png;
//!
//! let png_bytes = std::fs::read("sprite.png").unwrap();
//! let raster = decode_png(&png_bytes).unwrap();
//! println!("Decoded {}x{} sprite", raster.width, raster.height);
//! ```

mod png;
mod types;

pub use png::decode_png;
pub use types::{DecodeError, RgbaRaster, BYTES_PER_PIXEL};
