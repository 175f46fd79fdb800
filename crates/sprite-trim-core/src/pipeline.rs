//! Phase-ordered driver over the scan, align, crop and reconcile steps.
//!
//! # Phases
//!
//! 1. Load: images are registered with [`Trimmer::add_image`]
//! 2. Scan: every image is decoded and its tight bounds recorded
//! 3. Align: group consensus rectangles are computed and committed
//! 4. Crop: rasters are cut; a failed crop is withdrawn
//! 5. Reconcile: instances are moved to match the crops that stuck
//!
//! Each phase must finish for all images before the next starts, since a
//! group's consensus depends on every member's scan. Calling a phase early
//! returns [`TrimError::PhaseOrder`]. Within a phase, a failure on one image
//! is recorded in the [`RunReport`] and the remaining images carry on; only an
//! [`IntegrityError`] aborts the run.

use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::align::{self, AlignMode, AlignmentGroup};
use crate::bounds::{scan_bounds, BoundsResult, CropBounds, CropRect, IntegrityError};
use crate::decode::{decode_png, RgbaRaster};
use crate::encode::encode_raster;
use crate::registry::{CropRegistry, GroupKey, ImageRecord};
use crate::report::{ItemError, RunReport, RunStatus, Warning};
use crate::transform::{apply_crop, reconcile, CropError, Symbol};

/// Run configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimOptions {
    /// How images are grouped before their crops are unified.
    pub align: AlignMode,
}

impl TrimOptions {
    pub fn new(align: AlignMode) -> Self {
        Self { align }
    }
}

/// One image handed to the trimmer.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub guid: String,
    /// Display name for logs and warnings.
    pub name: String,
    pub group: GroupKey,
    /// Encoded PNG bytes.
    pub bytes: Vec<u8>,
}

/// Cropped PNG bytes ready for the caller to persist.
#[derive(Debug, Clone)]
pub struct CroppedImage {
    pub guid: String,
    pub rect: CropRect,
    pub bytes: Vec<u8>,
}

/// Phase the trimmer has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Loading,
    Scanned,
    Aligned,
    Cropped,
}

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum TrimError {
    #[error("Integrity error while scanning image {guid}: {source}")]
    Integrity {
        guid: String,
        #[source]
        source: IntegrityError,
    },

    #[error("Cannot {action} while in phase {current:?}")]
    PhaseOrder { action: &'static str, current: Phase },
}

/// Result of a complete run.
#[derive(Debug)]
pub struct TrimOutcome {
    pub cropped: Vec<CroppedImage>,
    /// Final crop for every registered image, in registration order.
    pub crops: Vec<(String, CropBounds)>,
    /// Number of instances whose transform was rewritten.
    pub reconciled: usize,
    pub report: RunReport,
}

impl TrimOutcome {
    pub fn status(&self) -> RunStatus {
        self.report.status()
    }
}

/// Drives images through the trimming phases.
#[derive(Debug)]
pub struct Trimmer {
    options: TrimOptions,
    registry: CropRegistry,
    sources: HashMap<String, Vec<u8>>,
    rasters: HashMap<String, RgbaRaster>,
    report: RunReport,
    phase: Phase,
}

impl Trimmer {
    pub fn new(options: TrimOptions) -> Self {
        Self {
            options,
            registry: CropRegistry::new(),
            sources: HashMap::new(),
            rasters: HashMap::new(),
            report: RunReport::new(),
            phase: Phase::Loading,
        }
    }

    pub fn registry(&self) -> &CropRegistry {
        &self.registry
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Record a warning that arose outside the trimmer (e.g. while pairing
    /// files), so it is reported with the rest of the run.
    pub fn warn(&mut self, warning: Warning) {
        self.report.warn(warning);
    }

    /// Register an image. A duplicate GUID is reported and ignored.
    pub fn add_image(&mut self, input: ImageInput) -> Result<bool, TrimError> {
        self.expect_phase(Phase::Loading, "add an image")?;

        let record = ImageRecord::new(input.guid.clone(), input.name, input.group);
        if !self.registry.insert(record) {
            self.report.warn(Warning::DuplicateGuid { guid: input.guid });
            return Ok(false);
        }
        self.sources.insert(input.guid, input.bytes);
        Ok(true)
    }

    /// Decode and scan every registered image.
    ///
    /// Images that fail to decode are reported and left uncropped.
    pub fn scan(&mut self) -> Result<(), TrimError> {
        self.expect_phase(Phase::Loading, "scan")?;
        info!("event=scan_start images={}", self.registry.len());

        let guids: Vec<String> = self.registry.iter().map(|r| r.guid.clone()).collect();
        for guid in guids {
            let Some(bytes) = self.sources.remove(&guid) else {
                continue;
            };
            let raster = match decode_png(&bytes) {
                Ok(raster) => raster,
                Err(source) => {
                    self.report.error(ItemError::Decode { guid, source });
                    continue;
                }
            };

            let result = scan_bounds(&raster).map_err(|source| TrimError::Integrity {
                guid: guid.clone(),
                source,
            })?;
            if result == BoundsResult::Empty {
                self.report
                    .warn(Warning::TransparentImage { guid: guid.clone() });
            }

            if let Some(record) = self.registry.get_mut(&guid) {
                debug!(
                    "event=scan name={} size={}x{} result={:?}",
                    record.name, raster.width, raster.height, result
                );
                record.size = Some((raster.width, raster.height));
                record.crop = result.to_crop_bounds();
            }
            self.rasters.insert(guid, raster);
        }

        self.phase = Phase::Scanned;
        Ok(())
    }

    /// Group images and commit each group's consensus rectangle.
    pub fn align(&mut self) -> Result<Vec<AlignmentGroup>, TrimError> {
        self.expect_phase(Phase::Scanned, "align")?;
        let groups = align::align(&mut self.registry, self.options.align);
        info!(
            "event=align mode={:?} groups={} images={}",
            self.options.align,
            groups.len(),
            self.registry.len()
        );
        self.phase = Phase::Aligned;
        Ok(groups)
    }

    /// Crop every image with a committed rectangle.
    ///
    /// If cropping an image fails its rectangle is withdrawn, so instances
    /// referencing it are left alone by [`Trimmer::reconcile`].
    pub fn crop(&mut self) -> Result<Vec<CroppedImage>, TrimError> {
        self.expect_phase(Phase::Aligned, "crop")?;

        let mut cropped = Vec::new();
        let rasters = std::mem::take(&mut self.rasters);
        let guids: Vec<String> = self.registry.iter().map(|r| r.guid.clone()).collect();
        for guid in guids {
            let Some(record) = self.registry.get_mut(&guid) else {
                continue;
            };
            let CropBounds::Rect(rect) = record.crop else {
                continue;
            };
            let Some(raster) = rasters.get(&guid) else {
                continue;
            };

            info!(
                "event=crop name={} old={:?} new={:?}",
                record.name,
                record.size,
                record.cropped_size()
            );

            let encoded = apply_crop(raster, record.crop)
                .and_then(|img| encode_raster(&img).map_err(CropError::from));
            match encoded {
                Ok(bytes) => cropped.push(CroppedImage { guid, rect, bytes }),
                Err(source) => {
                    record.crop = CropBounds::Uncropped;
                    self.report.error(ItemError::Crop { guid, source });
                }
            }
        }

        self.phase = Phase::Cropped;
        Ok(cropped)
    }

    /// Rewrite every instance that references a registered image.
    ///
    /// Only allowed once cropping is done, so that instances follow the
    /// crops that actually happened. May be called once per entity.
    ///
    /// Instances without an image reference are skipped; instances pointing
    /// at an unknown GUID are reported and left unmodified. Returns the
    /// number of instances whose transform changed.
    pub fn reconcile<'a, I>(&mut self, symbols: I) -> Result<usize, TrimError>
    where
        I: IntoIterator<Item = &'a mut Symbol>,
    {
        self.expect_phase(Phase::Cropped, "reconcile instances")?;

        let mut updated = 0;
        for symbol in symbols {
            let Some(guid) = symbol.image_guid() else {
                continue;
            };
            match self.registry.crop_for(guid) {
                None => {
                    let guid = guid.to_string();
                    self.report.warn(Warning::MissingImage { guid });
                }
                Some(bounds) => {
                    if !bounds.is_uncropped() {
                        reconcile(symbol, bounds);
                        updated += 1;
                    }
                }
            }
        }
        Ok(updated)
    }

    /// Withdraw a committed crop after the caller failed to persist it.
    ///
    /// The image is reported and instances referencing it are left alone by
    /// a later [`Trimmer::reconcile`].
    pub fn withdraw(&mut self, guid: &str, reason: impl Into<String>) -> Result<(), TrimError> {
        self.expect_phase(Phase::Cropped, "withdraw a crop")?;
        if let Some(record) = self.registry.get_mut(guid) {
            record.crop = CropBounds::Uncropped;
        }
        self.report.error(ItemError::Persist {
            guid: guid.to_string(),
            reason: reason.into(),
        });
        Ok(())
    }

    /// Final crop of every image, in registration order.
    pub fn crops(&self) -> Vec<(String, CropBounds)> {
        self.registry
            .iter()
            .map(|r| (r.guid.clone(), r.crop))
            .collect()
    }

    pub fn into_report(self) -> RunReport {
        self.report
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), TrimError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(TrimError::PhaseOrder {
                action,
                current: self.phase,
            })
        }
    }
}

/// Run every phase over `inputs`, rewriting `symbols` in place.
pub fn trim<'a, I, S>(inputs: I, symbols: S, options: TrimOptions) -> Result<TrimOutcome, TrimError>
where
    I: IntoIterator<Item = ImageInput>,
    S: IntoIterator<Item = &'a mut Symbol>,
{
    let mut trimmer = Trimmer::new(options);
    for input in inputs {
        trimmer.add_image(input)?;
    }
    trimmer.scan()?;
    trimmer.align()?;
    let cropped = trimmer.crop()?;
    let reconciled = trimmer.reconcile(symbols)?;
    let crops = trimmer.crops();

    Ok(TrimOutcome {
        cropped,
        crops,
        reconciled,
        report: trimmer.into_report(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// PNG of `width` x `height` with an opaque block covering `rect`.
    fn sprite_png(width: u32, height: u32, rect: Option<CropRect>) -> Vec<u8> {
        let mut raster = RgbaRaster::transparent(width, height);
        if let Some(rect) = rect {
            for y in rect.min_y..rect.max_y {
                for x in rect.min_x..rect.max_x {
                    raster.put_pixel(x, y, [200, 10, 10, 255]);
                }
            }
        }
        encode_raster(&raster).unwrap()
    }

    fn input(guid: &str, dir: &str, bytes: Vec<u8>) -> ImageInput {
        ImageInput {
            guid: guid.to_string(),
            name: format!("{guid}.png"),
            group: GroupKey::new(dir),
            bytes,
        }
    }

    fn symbol(guid: &str, x: f64, y: f64, px: f64, py: f64) -> Symbol {
        Symbol {
            image_asset: Some(guid.to_string()),
            x,
            y,
            pivot_x: px,
            pivot_y: py,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    #[test]
    fn test_end_to_end_single_image() {
        let rect = CropRect::new(5, 10, 51, 54);
        let inputs = vec![input("hero", "sprites", sprite_png(64, 64, Some(rect)))];
        let mut symbols = vec![symbol("hero", 100.0, 100.0, 20.0, 20.0)];

        let outcome = trim(inputs, symbols.iter_mut(), TrimOptions::default()).unwrap();

        assert_eq!(outcome.status(), RunStatus::Clean);
        assert_eq!(outcome.cropped.len(), 1);
        assert_eq!(outcome.cropped[0].rect, rect);
        let cropped = decode_png(&outcome.cropped[0].bytes).unwrap();
        assert_eq!((cropped.width, cropped.height), (46, 44));

        assert_eq!(outcome.reconciled, 1);
        assert_eq!((symbols[0].x, symbols[0].y), (105.0, 110.0));
        assert_eq!((symbols[0].pivot_x, symbols[0].pivot_y), (15.0, 10.0));
    }

    #[test]
    fn test_aligned_group_shares_crop() {
        let inputs = vec![
            input("a", "run", sprite_png(16, 16, Some(CropRect::new(0, 0, 10, 10)))),
            input("b", "run", sprite_png(16, 16, Some(CropRect::new(2, 2, 8, 8)))),
            input("c", "idle", sprite_png(16, 16, Some(CropRect::new(4, 4, 6, 6)))),
        ];
        let outcome = trim(
            inputs,
            std::iter::empty(),
            TrimOptions::new(AlignMode::ByParent),
        )
        .unwrap();

        let crops: HashMap<_, _> = outcome.crops.into_iter().collect();
        let shared = CropBounds::Rect(CropRect::new(0, 0, 10, 10));
        assert_eq!(crops["a"], shared);
        assert_eq!(crops["b"], shared);
        assert_eq!(crops["c"], CropBounds::Rect(CropRect::new(4, 4, 6, 6)));
    }

    #[test]
    fn test_transparent_member_keeps_group_uncropped() {
        let inputs = vec![
            input("a", "run", sprite_png(16, 16, Some(CropRect::new(2, 2, 10, 10)))),
            input("blank", "run", sprite_png(16, 16, None)),
        ];
        let mut symbols = vec![symbol("a", 1.0, 2.0, 3.0, 4.0)];
        let outcome = trim(
            inputs,
            symbols.iter_mut(),
            TrimOptions::new(AlignMode::ByParent),
        )
        .unwrap();

        assert!(outcome.cropped.is_empty());
        assert!(outcome.crops.iter().all(|(_, c)| c.is_uncropped()));
        assert_eq!(outcome.reconciled, 0);
        assert_eq!(symbols[0], symbol("a", 1.0, 2.0, 3.0, 4.0));
        assert_eq!(
            outcome.report.warnings,
            vec![Warning::TransparentImage {
                guid: "blank".to_string()
            }]
        );
        assert_eq!(outcome.status(), RunStatus::CompletedWithWarnings);
    }

    #[test]
    fn test_full_coverage_image_is_not_cropped() {
        let inputs = vec![input("full", "d", sprite_png(8, 8, Some(CropRect::new(0, 0, 8, 8))))];
        let outcome = trim(inputs, std::iter::empty(), TrimOptions::default()).unwrap();
        assert!(outcome.cropped.is_empty());
        assert_eq!(outcome.status(), RunStatus::Clean);
    }

    #[test]
    fn test_missing_reference_is_warning() {
        let inputs = vec![input("a", "d", sprite_png(8, 8, Some(CropRect::new(1, 1, 4, 4))))];
        let mut symbols = vec![
            symbol("ghost", 1.0, 1.0, 1.0, 1.0),
            Symbol::default(),
            symbol("a", 0.0, 0.0, 2.0, 2.0),
        ];
        let outcome = trim(inputs, symbols.iter_mut(), TrimOptions::default()).unwrap();

        assert_eq!(outcome.reconciled, 1);
        assert_eq!(symbols[0], symbol("ghost", 1.0, 1.0, 1.0, 1.0));
        assert_eq!(
            outcome.report.warnings,
            vec![Warning::MissingImage {
                guid: "ghost".to_string()
            }]
        );
    }

    #[test]
    fn test_undecodable_image_is_isolated() {
        let inputs = vec![
            input("bad", "d", vec![1, 2, 3]),
            input("good", "e", sprite_png(8, 8, Some(CropRect::new(1, 1, 4, 4)))),
        ];
        let outcome = trim(inputs, std::iter::empty(), TrimOptions::default()).unwrap();

        assert_eq!(outcome.cropped.len(), 1);
        assert_eq!(outcome.cropped[0].guid, "good");
        assert_eq!(outcome.report.errors.len(), 1);
        assert_eq!(outcome.report.errors[0].guid(), "bad");
    }

    #[test]
    fn test_undecodable_image_uncrops_its_group() {
        let inputs = vec![
            input("bad", "d", vec![1, 2, 3]),
            input("good", "d", sprite_png(8, 8, Some(CropRect::new(1, 1, 4, 4)))),
        ];
        let outcome = trim(
            inputs,
            std::iter::empty(),
            TrimOptions::new(AlignMode::ByParent),
        )
        .unwrap();
        assert!(outcome.cropped.is_empty());
    }

    #[test]
    fn test_duplicate_guid_is_warning() {
        let mut trimmer = Trimmer::new(TrimOptions::default());
        let png = sprite_png(4, 4, None);
        assert!(trimmer.add_image(input("a", "d", png.clone())).unwrap());
        assert!(!trimmer.add_image(input("a", "e", png)).unwrap());
        assert_eq!(trimmer.registry().len(), 1);
        assert_eq!(trimmer.report().warnings.len(), 1);
    }

    #[test]
    fn test_phase_order_is_enforced() {
        let mut trimmer = Trimmer::new(TrimOptions::default());
        assert!(matches!(
            trimmer.align(),
            Err(TrimError::PhaseOrder { .. })
        ));
        assert!(matches!(trimmer.crop(), Err(TrimError::PhaseOrder { .. })));
        assert!(matches!(
            trimmer.reconcile(std::iter::empty()),
            Err(TrimError::PhaseOrder { .. })
        ));

        trimmer.scan().unwrap();
        assert!(matches!(
            trimmer.add_image(input("late", "d", vec![])),
            Err(TrimError::PhaseOrder { .. })
        ));
        assert!(matches!(trimmer.scan(), Err(TrimError::PhaseOrder { .. })));
    }

    #[test]
    fn test_reconcile_waits_for_crop() {
        let mut trimmer = Trimmer::new(TrimOptions::default());
        let png = sprite_png(8, 8, Some(CropRect::new(2, 3, 6, 7)));
        trimmer.add_image(input("a", "d", png)).unwrap();
        trimmer.scan().unwrap();
        trimmer.align().unwrap();

        let mut symbols = vec![symbol("a", 0.0, 0.0, 0.0, 0.0)];
        assert!(matches!(
            trimmer.reconcile(symbols.iter_mut()),
            Err(TrimError::PhaseOrder {
                current: Phase::Aligned,
                ..
            })
        ));
        assert_eq!(symbols[0], symbol("a", 0.0, 0.0, 0.0, 0.0));

        trimmer.crop().unwrap();
        assert_eq!(trimmer.reconcile(symbols.iter_mut()).unwrap(), 1);
        assert_eq!((symbols[0].x, symbols[0].y), (2.0, 3.0));
        assert_eq!((symbols[0].pivot_x, symbols[0].pivot_y), (0.0, 0.0));
    }

    #[test]
    fn test_failed_crop_is_withdrawn() {
        // The shared rectangle is too large for the smaller frame.
        let inputs = vec![
            input("big", "run", sprite_png(32, 32, Some(CropRect::new(4, 4, 20, 20)))),
            input("small", "run", sprite_png(16, 16, Some(CropRect::new(6, 6, 12, 12)))),
        ];
        let mut symbols = vec![symbol("small", 0.0, 0.0, 8.0, 8.0)];
        let outcome = trim(
            inputs,
            symbols.iter_mut(),
            TrimOptions::new(AlignMode::ByParent),
        )
        .unwrap();

        assert_eq!(outcome.cropped.len(), 1);
        assert_eq!(outcome.cropped[0].guid, "big");
        assert_eq!(outcome.report.errors.len(), 1);
        assert_eq!(outcome.report.errors[0].guid(), "small");
        assert!(matches!(
            outcome.report.errors[0],
            ItemError::Crop {
                source: CropError::OutOfBounds { .. },
                ..
            }
        ));

        let crops: HashMap<_, _> = outcome.crops.into_iter().collect();
        assert_eq!(crops["small"], CropBounds::Uncropped);
        assert_eq!(crops["big"], CropBounds::Rect(CropRect::new(4, 4, 20, 20)));

        assert_eq!(outcome.reconciled, 0);
        assert_eq!(symbols[0], symbol("small", 0.0, 0.0, 8.0, 8.0));
    }

    #[test]
    fn test_full_size_union_is_not_cropped() {
        let inputs = vec![
            input("a", "run", sprite_png(16, 16, Some(CropRect::new(0, 0, 10, 10)))),
            input("b", "run", sprite_png(16, 16, Some(CropRect::new(6, 6, 16, 16)))),
        ];
        let mut symbols = vec![symbol("b", 3.0, 3.0, 4.0, 4.0)];
        let outcome = trim(
            inputs,
            symbols.iter_mut(),
            TrimOptions::new(AlignMode::ByParent),
        )
        .unwrap();

        assert!(outcome.cropped.is_empty());
        assert!(outcome.crops.iter().all(|(_, c)| c.is_uncropped()));
        assert_eq!(outcome.reconciled, 0);
        assert_eq!(symbols[0], symbol("b", 3.0, 3.0, 4.0, 4.0));
        assert_eq!(outcome.status(), RunStatus::Clean);
    }

    #[test]
    fn test_withdraw_skips_reconcile() {
        let mut trimmer = Trimmer::new(TrimOptions::default());
        let png = sprite_png(8, 8, Some(CropRect::new(2, 3, 6, 7)));
        trimmer.add_image(input("a", "d", png)).unwrap();
        trimmer.scan().unwrap();
        trimmer.align().unwrap();
        assert_eq!(trimmer.crop().unwrap().len(), 1);

        trimmer.withdraw("a", "disk full").unwrap();
        let mut symbols = vec![symbol("a", 1.0, 1.0, 1.0, 1.0)];
        assert_eq!(trimmer.reconcile(symbols.iter_mut()).unwrap(), 0);
        assert_eq!(symbols[0], symbol("a", 1.0, 1.0, 1.0, 1.0));
        assert_eq!(trimmer.report().errors[0].guid(), "a");
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let options: TrimOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.align, AlignMode::None);
        let options: TrimOptions = serde_json::from_str(r#"{"align":"aligned"}"#).unwrap();
        assert_eq!(options.align, AlignMode::ByParent);
    }
}
