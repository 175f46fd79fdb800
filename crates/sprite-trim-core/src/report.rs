//! Warnings and per-item errors collected over a run.
//!
//! Nothing in here stops a run. Items are reported with the identity of the
//! offending image (or file) and the caller decides what to show once all
//! items have been processed.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::decode::DecodeError;
use crate::transform::CropError;

/// Recoverable conditions that leave the affected item unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// No pixel of the image is visible; it (and its group) is not cropped.
    TransparentImage { guid: String },
    /// An instance points at a GUID with no registered image.
    MissingImage { guid: String },
    /// An image with no metadata file, or metadata with no image.
    UnpairedFile { name: String },
    /// A second image claimed an already-registered GUID.
    DuplicateGuid { guid: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::TransparentImage { guid } => {
                write!(f, "Found fully transparent image {guid}")
            }
            Warning::MissingImage { guid } => {
                write!(f, "Found image GUID {guid} that doesn't have a corresponding image")
            }
            Warning::UnpairedFile { name } => {
                write!(f, "Found {name} with no corresponding image or meta file")
            }
            Warning::DuplicateGuid { guid } => {
                write!(f, "GUID {guid} is used by more than one image")
            }
        }
    }
}

/// A per-image failure. The image is left untouched.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Failed to decode image {guid}: {source}")]
    Decode {
        guid: String,
        #[source]
        source: DecodeError,
    },

    #[error("Failed to crop image {guid}: {source}")]
    Crop {
        guid: String,
        #[source]
        source: CropError,
    },

    /// The caller could not persist the cropped bytes.
    #[error("Failed to save cropped image {guid}: {reason}")]
    Persist { guid: String, reason: String },
}

impl ItemError {
    /// GUID of the offending image.
    pub fn guid(&self) -> &str {
        match self {
            ItemError::Decode { guid, .. }
            | ItemError::Crop { guid, .. }
            | ItemError::Persist { guid, .. } => guid,
        }
    }
}

/// How a run ended, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Clean,
    CompletedWithWarnings,
    Aborted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::Clean => "completed cleanly",
            RunStatus::CompletedWithWarnings => "completed with warnings",
            RunStatus::Aborted => "aborted",
        })
    }
}

/// Everything that went wrong without stopping the run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub warnings: Vec<Warning>,
    pub errors: Vec<ItemError>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, warning: Warning) {
        log::warn!("event=warning detail=\"{warning}\"");
        self.warnings.push(warning);
    }

    pub fn error(&mut self, error: ItemError) {
        log::error!("event=item_error guid={} detail=\"{error}\"", error.guid());
        self.errors.push(error);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }

    pub fn status(&self) -> RunStatus {
        if self.is_clean() {
            RunStatus::Clean
        } else {
            RunStatus::CompletedWithWarnings
        }
    }
}
