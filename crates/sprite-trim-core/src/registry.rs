//! Per-image crop state keyed by GUID.
//!
//! Images are loaded in two halves: the raster file and a metadata file that
//! carries the GUID. [`PendingPairs`] holds whichever half turned up first
//! until its partner arrives; [`CropRegistry`] owns the resolved records.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bounds::CropBounds;

/// Identity of the directory an image lives in.
///
/// Two keys are the same group only if they compare equal, so callers should
/// build them from a canonical path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Crop state of one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub guid: String,
    /// Human-readable name, used only in log and warning output.
    pub name: String,
    pub group: GroupKey,
    /// Pixel dimensions, known after the scan.
    pub size: Option<(u32, u32)>,
    pub crop: CropBounds,
}

impl ImageRecord {
    pub fn new(guid: impl Into<String>, name: impl Into<String>, group: GroupKey) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
            group,
            size: None,
            crop: CropBounds::Uncropped,
        }
    }

    /// Size after cropping, or the original size when uncropped.
    pub fn cropped_size(&self) -> Option<(u32, u32)> {
        match self.crop {
            CropBounds::Rect(rect) => Some((rect.width(), rect.height())),
            CropBounds::Uncropped => self.size,
        }
    }
}

/// Arena of image records indexed by GUID, in insertion order.
#[derive(Debug, Default)]
pub struct CropRegistry {
    records: Vec<ImageRecord>,
    index: HashMap<String, usize>,
}

impl CropRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record. Returns `false` and leaves the registry unchanged
    /// if the GUID is already present.
    pub fn insert(&mut self, record: ImageRecord) -> bool {
        if self.index.contains_key(&record.guid) {
            return false;
        }
        self.index.insert(record.guid.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, guid: &str) -> Option<&ImageRecord> {
        self.index.get(guid).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, guid: &str) -> Option<&mut ImageRecord> {
        self.index.get(guid).map(|&i| &mut self.records[i])
    }

    /// Committed crop for `guid`, or `None` if the GUID is unknown.
    pub fn crop_for(&self, guid: &str) -> Option<CropBounds> {
        self.get(guid).map(|record| record.crop)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug)]
enum PendingHalf<H> {
    Image(H),
    Guid(String),
}

/// Side-table pairing image files with their metadata by name.
///
/// `H` is whatever the caller uses to refer to an image file (a path, a
/// handle). Both `offer_*` methods return the resolved `(guid, handle)` once
/// the second half of a pair arrives.
#[derive(Debug)]
pub struct PendingPairs<H> {
    pending: HashMap<String, PendingHalf<H>>,
}

impl<H> Default for PendingPairs<H> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<H> PendingPairs<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer an image file under `name`.
    pub fn offer_image(&mut self, name: &str, handle: H) -> Option<(String, H)> {
        match self.pending.remove(name) {
            Some(PendingHalf::Guid(guid)) => Some((guid, handle)),
            Some(other) => {
                // Same image seen twice; keep the first.
                self.pending.insert(name.to_string(), other);
                None
            }
            None => {
                self.pending
                    .insert(name.to_string(), PendingHalf::Image(handle));
                None
            }
        }
    }

    /// Offer the GUID read from the metadata of the image called `name`.
    pub fn offer_guid(&mut self, name: &str, guid: String) -> Option<(String, H)> {
        match self.pending.remove(name) {
            Some(PendingHalf::Image(handle)) => Some((guid, handle)),
            Some(other) => {
                self.pending.insert(name.to_string(), other);
                None
            }
            None => {
                self.pending.insert(name.to_string(), PendingHalf::Guid(guid));
                None
            }
        }
    }

    /// Discard the table, returning the names that never paired (sorted).
    pub fn finish(self) -> Vec<String> {
        let mut names: Vec<String> = self.pending.into_keys().collect();
        names.sort();
        names
    }
}
