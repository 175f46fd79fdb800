//! Keep placed instances visually fixed when their image is cropped.
//!
//! Cropping shifts an image's local origin by the crop rectangle's top-left
//! corner. Each instance is moved so its pivot stays at the same world
//! position under the instance's own rotation and scale:
//!
//! ```text
//! M            = R(rotation) * S(scaleX, scaleY)
//! global_pivot = M * pivot + position
//! pivot'       = pivot - origin
//! position'    = global_pivot - M * pivot'
//! ```
//!
//! The pivot is only rewritten when it was not exactly (0, 0); the position
//! is always rewritten.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::bounds::CropBounds;

/// One placement of an image inside an entity document.
///
/// Field names follow the entity file format. Missing numeric fields read as
/// zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Symbol {
    /// GUID of the placed image, if any.
    #[serde(rename = "imageAsset", skip_serializing_if = "Option::is_none")]
    pub image_asset: Option<String>,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "pivotX")]
    pub pivot_x: f64,
    #[serde(rename = "pivotY")]
    pub pivot_y: f64,
    /// Degrees, clockwise on screen.
    pub rotation: f64,
    /// Horizontal scale; `0` means unscaled.
    #[serde(rename = "scaleX")]
    pub scale_x: f64,
    /// Vertical scale; `0` means unscaled.
    #[serde(rename = "scaleY")]
    pub scale_y: f64,
}

impl Symbol {
    /// Referenced image GUID, treating an empty string as no reference.
    pub fn image_guid(&self) -> Option<&str> {
        self.image_asset.as_deref().filter(|guid| !guid.is_empty())
    }

    /// Scale with the `0 => 1` sentinel applied.
    pub fn effective_scale(&self) -> (f64, f64) {
        let clean = |s: f64| if s == 0.0 { 1.0 } else { s };
        (clean(self.scale_x), clean(self.scale_y))
    }

    /// The instance's local-to-world linear map.
    pub fn linear_map(&self) -> LinearMap {
        let (sx, sy) = self.effective_scale();
        LinearMap::rotation_scale(self.rotation, sx, sy)
    }
}

/// 2x2 linear map in column-major order: `[a c; b d]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMap {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl LinearMap {
    /// `R(degrees) * S(sx, sy)`: scale a local vector, then rotate it.
    pub fn rotation_scale(degrees: f64, sx: f64, sy: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            a: cos * sx,
            b: sin * sx,
            c: -sin * sy,
            d: cos * sy,
        }
    }

    #[inline]
    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (self.a * x + self.c * y, self.b * x + self.d * y)
    }
}

/// Rewrite `symbol` so its image still renders in the same place after being
/// cropped to `bounds`.
///
/// No-op when `bounds` is `Uncropped`. Only `x`, `y`, `pivotX` and `pivotY`
/// are ever modified.
pub fn reconcile(symbol: &mut Symbol, bounds: CropBounds) {
    let Some(rect) = bounds.rect() else {
        return;
    };
    let origin = (rect.min_x as f64, rect.min_y as f64);
    let m = symbol.linear_map();

    let pivot = (symbol.pivot_x, symbol.pivot_y);
    let (gx, gy) = m.apply(pivot);
    let global_pivot = (gx + symbol.x, gy + symbol.y);

    let new_pivot = (pivot.0 - origin.0, pivot.1 - origin.1);
    let (rx, ry) = m.apply(new_pivot);
    let new_position = (global_pivot.0 - rx, global_pivot.1 - ry);

    trace!(
        "event=reconcile asset={:?} position=({}, {})->({}, {}) pivot=({}, {})->({}, {})",
        symbol.image_asset,
        symbol.x,
        symbol.y,
        new_position.0,
        new_position.1,
        pivot.0,
        pivot.1,
        new_pivot.0,
        new_pivot.1
    );

    symbol.x = new_position.0;
    symbol.y = new_position.1;
    if !(pivot.0 == 0.0 && pivot.1 == 0.0) {
        symbol.pivot_x = new_pivot.0;
        symbol.pivot_y = new_pivot.1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::CropRect;

    const EPS: f64 = 1e-9;

    fn symbol(x: f64, y: f64, px: f64, py: f64, rotation: f64, sx: f64, sy: f64) -> Symbol {
        Symbol {
            image_asset: Some("guid".to_string()),
            x,
            y,
            pivot_x: px,
            pivot_y: py,
            rotation,
            scale_x: sx,
            scale_y: sy,
        }
    }

    fn crop_at(min_x: u32, min_y: u32) -> CropBounds {
        CropBounds::Rect(CropRect::new(min_x, min_y, min_x + 10, min_y + 10))
    }

    fn assert_close(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < EPS && (actual.1 - expected.1).abs() < EPS,
            "expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_uncropped_is_noop() {
        let original = symbol(12.5, -3.0, 4.0, 5.0, 33.0, 2.0, 0.5);
        let mut s = original.clone();
        reconcile(&mut s, CropBounds::Uncropped);
        assert_eq!(s, original);
    }

    #[test]
    fn test_pure_translation() {
        let mut s = symbol(100.0, 100.0, 20.0, 20.0, 0.0, 1.0, 1.0);
        reconcile(&mut s, CropBounds::Rect(CropRect::new(5, 10, 51, 54)));

        assert_close((s.x, s.y), (105.0, 110.0));
        assert_close((s.pivot_x, s.pivot_y), (15.0, 10.0));
    }

    #[test]
    fn test_zero_pivot_is_frozen() {
        let mut s = symbol(0.0, 0.0, 0.0, 0.0, 45.0, 2.0, 3.0);
        reconcile(&mut s, crop_at(7, 9));

        assert_eq!(s.pivot_x, 0.0);
        assert_eq!(s.pivot_y, 0.0);
        // Position still moves to where the cropped corner now sits.
        let expected = LinearMap::rotation_scale(45.0, 2.0, 3.0).apply((7.0, 9.0));
        assert_close((s.x, s.y), expected);
    }

    #[test]
    fn test_one_axis_zero_pivot_is_rewritten() {
        let mut s = symbol(0.0, 0.0, 0.0, 4.0, 0.0, 1.0, 1.0);
        reconcile(&mut s, crop_at(2, 1));
        assert_close((s.pivot_x, s.pivot_y), (-2.0, 3.0));
    }

    #[test]
    fn test_rotation_90() {
        let mut s = symbol(0.0, 0.0, 10.0, 0.0, 90.0, 1.0, 1.0);
        reconcile(&mut s, crop_at(2, 0));

        assert_close((s.x, s.y), (0.0, 2.0));
        assert_close((s.pivot_x, s.pivot_y), (8.0, 0.0));
    }

    #[test]
    fn test_scale_applies_before_rotation() {
        // Scale x by 2 then rotate 90: local (1, 0) -> (2, 0) -> (0, 2).
        let m = LinearMap::rotation_scale(90.0, 2.0, 5.0);
        assert_close(m.apply((1.0, 0.0)), (0.0, 2.0));
        assert_close(m.apply((0.0, 1.0)), (-5.0, 0.0));
    }

    #[test]
    fn test_zero_scale_means_unscaled() {
        let mut zero = symbol(3.0, 4.0, 6.0, 6.0, 30.0, 0.0, 0.0);
        let mut one = symbol(3.0, 4.0, 6.0, 6.0, 30.0, 1.0, 1.0);
        reconcile(&mut zero, crop_at(2, 3));
        reconcile(&mut one, crop_at(2, 3));

        assert_close((zero.x, zero.y), (one.x, one.y));
        assert_close((zero.pivot_x, zero.pivot_y), (one.pivot_x, one.pivot_y));
        // The stored sentinel is left alone.
        assert_eq!(zero.scale_x, 0.0);
        assert_eq!(zero.scale_y, 0.0);
    }

    #[test]
    fn test_negative_scale_mirrors_offset() {
        let mut s = symbol(50.0, 50.0, 10.0, 10.0, 0.0, -1.0, 1.0);
        reconcile(&mut s, crop_at(4, 0));
        assert_close((s.x, s.y), (46.0, 50.0));
    }

    #[test]
    fn test_only_position_and_pivot_change() {
        let mut s = symbol(1.0, 2.0, 3.0, 4.0, 17.0, 1.5, -2.0);
        reconcile(&mut s, crop_at(1, 1));
        assert_eq!(s.rotation, 17.0);
        assert_eq!(s.scale_x, 1.5);
        assert_eq!(s.scale_y, -2.0);
        assert_eq!(s.image_asset.as_deref(), Some("guid"));
    }

    #[test]
    fn test_symbol_serde_field_names() {
        let json = r#"{"imageAsset":"abc","x":1,"y":2,"pivotX":3,"pivotY":4,"rotation":5,"scaleX":6,"scaleY":7}"#;
        let s: Symbol = serde_json::from_str(json).unwrap();
        assert_eq!(s, symbol(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0).with_asset("abc"));
    }

    #[test]
    fn test_symbol_missing_fields_default_to_zero() {
        let s: Symbol = serde_json::from_str(r#"{"x": 9}"#).unwrap();
        assert_eq!(s.x, 9.0);
        assert_eq!(s.scale_x, 0.0);
        assert_eq!(s.image_guid(), None);
        assert_eq!(s.effective_scale(), (1.0, 1.0));
    }

    #[test]
    fn test_empty_image_asset_is_no_reference() {
        let mut s = Symbol::default();
        s.image_asset = Some(String::new());
        assert_eq!(s.image_guid(), None);
    }

    impl Symbol {
        fn with_asset(mut self, guid: &str) -> Self {
            self.image_asset = Some(guid.to_string());
            self
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
