//! Sprite Trim Core - transparent margin trimming for sprite assets
//!
//! This crate finds the tight non-transparent bounds of sprite images, unifies
//! them across alignment groups, crops the images, and rewrites the transform
//! of every placed instance so the artwork does not move in the scene.
//!
//! # Module Structure
//!
//! - `decode` / `encode` - PNG to RGBA raster and back, losslessly
//! - `bounds` - Bounding box scan and the crop rectangle algebra
//! - `registry` - Per-GUID crop state and file pairing
//! - `align` - Alignment groups and consensus rectangles
//! - `transform` - Raster cropping and instance reconciliation
//! - `report` - Warnings and per-item errors
//! - `pipeline` - Phase-ordered driver tying the above together

pub mod align;
pub mod bounds;
pub mod decode;
pub mod encode;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod transform;

pub use align::{AlignMode, AlignmentGroup};
pub use bounds::{scan_bounds, BoundsResult, CropBounds, CropRect, IntegrityError};
pub use pipeline::{trim, CroppedImage, ImageInput, TrimError, TrimOptions, TrimOutcome, Trimmer};
pub use registry::{CropRegistry, GroupKey, ImageRecord, PendingPairs};
pub use report::{ItemError, RunReport, RunStatus, Warning};
pub use transform::{apply_crop, crop_png, reconcile, Symbol};

/// Status for a run that may have been aborted.
pub fn run_status(result: &Result<TrimOutcome, TrimError>) -> RunStatus {
    match result {
        Ok(outcome) => outcome.status(),
        Err(_) => RunStatus::Aborted,
    }
}
