//! Image encoding for sprite-trim.
//!
//! This module provides functionality for:
//! - Encoding cropped RGBA rasters back to lossless PNG
//!
//! # Examples
//!
//! ```ignore
//! use sprite_trim_core::encode::encode_png;
//!
//! let pixels = vec![0u8; 16 * 16 * 4]; // Transparent sprite
//! let png_bytes = encode_png(&pixels, 16, 16).unwrap();
//! println!("Encoded {} bytes", png_bytes.len());
//! ```

mod png;

pub use png::{encode_png, encode_raster, EncodeError};
