//! Operations applied once a crop has been committed.
//!
//! - `crop` cuts the committed rectangle out of the raster
//! - `reconcile` moves every placed instance so the artwork stays put
//!
//! # Coordinate System
//!
//! - Crop coordinates are integer pixels in the original image, max edges
//!   exclusive
//! - Rotation angles are in degrees, positive = clockwise on screen (y down)
//! - Origin is top-left corner

mod crop;
mod reconcile;

pub use crop::{apply_crop, crop_png, CropError};
pub use reconcile::{reconcile, LinearMap, Symbol};
