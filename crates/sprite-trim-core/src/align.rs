//! Alignment groups: images forced to share one crop rectangle.
//!
//! Under [`AlignMode::ByParent`] every image in the same directory joins one
//! group, so frames split out of one sheet keep a common coordinate frame.
//! Under [`AlignMode::None`] each image is its own group.
//!
//! Grouping is pure planning. It must run after every image has been scanned
//! and before any image is cropped.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::bounds::CropBounds;
use crate::registry::{CropRegistry, GroupKey};

/// How images are partitioned into alignment groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlignMode {
    /// Every image is cropped independently.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Images sharing a parent directory are cropped identically.
    #[serde(rename = "aligned")]
    ByParent,
}

impl AlignMode {
    /// Parse the names used by the front-ends (`none`, `aligned`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(AlignMode::None),
            "aligned" | "by_parent" | "by-parent" => Some(AlignMode::ByParent),
            _ => Option::None,
        }
    }
}

/// A set of images whose crops are forced to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentGroup {
    pub key: GroupKey,
    /// Member GUIDs in registry insertion order.
    pub members: Vec<String>,
}

/// Partition the registry into alignment groups.
///
/// Groups are returned in the order their first member was registered.
pub fn partition(registry: &CropRegistry, mode: AlignMode) -> Vec<AlignmentGroup> {
    match mode {
        AlignMode::None => registry
            .iter()
            .map(|record| AlignmentGroup {
                key: record.group.clone(),
                members: vec![record.guid.clone()],
            })
            .collect(),
        AlignMode::ByParent => {
            let mut groups: Vec<AlignmentGroup> = Vec::new();
            let mut by_key: HashMap<&GroupKey, usize> = HashMap::new();
            for record in registry.iter() {
                match by_key.get(&record.group) {
                    Some(&i) => groups[i].members.push(record.guid.clone()),
                    None => {
                        by_key.insert(&record.group, groups.len());
                        groups.push(AlignmentGroup {
                            key: record.group.clone(),
                            members: vec![record.guid.clone()],
                        });
                    }
                }
            }
            groups
        }
    }
}

/// Union of every member's crop; `Uncropped` if any member is.
///
/// Members missing from the registry count as uncropped.
pub fn consensus(registry: &CropRegistry, group: &AlignmentGroup) -> CropBounds {
    let mut members = group
        .members
        .iter()
        .map(|guid| registry.crop_for(guid).unwrap_or(CropBounds::Uncropped));

    let Some(first) = members.next() else {
        return CropBounds::Uncropped;
    };
    members.fold(first, CropBounds::union)
}

/// Partition, compute each group's consensus and write it back to every
/// member. Returns the groups that were formed.
///
/// A member whose known size is fully covered by the consensus ends up
/// `Uncropped`, the same as a scan that found nothing to trim.
pub fn align(registry: &mut CropRegistry, mode: AlignMode) -> Vec<AlignmentGroup> {
    let groups = partition(registry, mode);
    for group in &groups {
        let shared = consensus(registry, group);
        debug!(
            "event=align group={} members={} crop={:?}",
            group.key,
            group.members.len(),
            shared
        );
        for guid in &group.members {
            if let Some(record) = registry.get_mut(guid) {
                record.crop = normalize(shared, record.size);
            }
        }
    }
    groups
}

/// A rectangle covering the whole image is no crop at all.
fn normalize(crop: CropBounds, size: Option<(u32, u32)>) -> CropBounds {
    match (crop, size) {
        (CropBounds::Rect(rect), Some((width, height))) if rect.is_full(width, height) => {
            CropBounds::Uncropped
        }
        _ => crop,
    }
}
