//! Stateful project driver for the browser front-end.
//!
//! The front-end walks the project directory, pairs images with their
//! metadata and hands each image over with [`JsTrimmer::add_image`]. After
//! [`JsTrimmer::run`] it reads back the cropped bytes to write, calling
//! [`JsTrimmer::withdraw`] for any it fails to save, then passes each
//! entity's `symbols` array through [`JsTrimmer::reconcile_symbols`].
//!
//! ```typescript
//! const updated = trimmer.reconcile_symbols(entity.symbols);
//! entity.symbols.forEach((s, i) => Object.assign(s, updated[i]));
//! ```

use std::collections::HashMap;

use sprite_trim_core::pipeline::{ImageInput, TrimOptions, Trimmer};
use sprite_trim_core::registry::GroupKey;
use sprite_trim_core::report::Warning;
use sprite_trim_core::transform::Symbol;
use sprite_trim_core::{AlignMode, CropBounds};
use wasm_bindgen::prelude::*;

use crate::console_warn;
use crate::types::JsCropRect;

#[wasm_bindgen]
pub struct JsTrimmer {
    inner: Trimmer,
    cropped: HashMap<String, Vec<u8>>,
}

#[wasm_bindgen]
impl JsTrimmer {
    /// Create a trimmer for the given alignment mode (`"none"` or `"aligned"`).
    #[wasm_bindgen(constructor)]
    pub fn new(align: &str) -> Result<JsTrimmer, JsValue> {
        let mode = AlignMode::from_name(align)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown alignment mode: {}", align)))?;
        Ok(Self::with_mode(mode))
    }

    /// Register one image. Returns `false` if its GUID was already taken.
    pub fn add_image(
        &mut self,
        guid: &str,
        name: &str,
        group: &str,
        bytes: Vec<u8>,
    ) -> Result<bool, JsValue> {
        self.inner
            .add_image(ImageInput {
                guid: guid.to_string(),
                name: name.to_string(),
                group: GroupKey::new(group),
                bytes,
            })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Report a file that never found its image/meta partner.
    pub fn add_unpaired(&mut self, name: &str) {
        self.inner.warn(Warning::UnpairedFile {
            name: name.to_string(),
        });
    }

    /// Scan, align and crop every registered image.
    ///
    /// Fails only on an integrity error, which aborts the whole run.
    pub fn run(&mut self) -> Result<(), JsValue> {
        let to_js = |e: sprite_trim_core::TrimError| JsValue::from_str(&e.to_string());
        self.inner.scan().map_err(to_js)?;
        self.inner.align().map_err(to_js)?;
        let cropped = self.inner.crop().map_err(to_js)?;
        self.cropped = cropped
            .into_iter()
            .map(|image| (image.guid, image.bytes))
            .collect();
        Ok(())
    }

    /// GUIDs of images whose cropped bytes should be written back.
    pub fn cropped_guids(&self) -> Vec<String> {
        let mut guids: Vec<String> = self.cropped.keys().cloned().collect();
        guids.sort();
        guids
    }

    /// Cropped PNG bytes for `guid`, or `undefined` if it was not cropped.
    pub fn cropped_bytes(&self, guid: &str) -> Option<Vec<u8>> {
        self.cropped.get(guid).cloned()
    }

    /// Withdraw the crop of `guid` after its cropped bytes could not be
    /// written. Later calls to `reconcile_symbols` leave its instances alone.
    pub fn withdraw(&mut self, guid: &str, reason: &str) -> Result<(), JsValue> {
        self.inner
            .withdraw(guid, reason)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.cropped.remove(guid);
        Ok(())
    }

    /// Committed crop rectangle for `guid`, or `undefined`.
    pub fn crop_rect(&self, guid: &str) -> Option<JsCropRect> {
        match self.inner.registry().crop_for(guid)? {
            CropBounds::Rect(rect) => Some(rect.into()),
            CropBounds::Uncropped => None,
        }
    }

    /// Reconcile an entity's `symbols` array.
    ///
    /// Returns one transform object per input symbol, in order. Only the
    /// transform fields are carried, so merge each into its original
    /// (`Object.assign(original, updated)`) to keep the rest of the entity.
    pub fn reconcile_symbols(&mut self, symbols: JsValue) -> Result<JsValue, JsValue> {
        let mut symbols: Vec<Symbol> = serde_wasm_bindgen::from_value(symbols)
            .map_err(|e| JsValue::from_str(&format!("Invalid symbols: {}", e)))?;
        self.reconcile_all(&mut symbols)?;
        serde_wasm_bindgen::to_value(&symbols).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Human-readable warnings and errors collected so far.
    pub fn messages(&self) -> Vec<String> {
        let report = self.inner.report();
        report
            .warnings
            .iter()
            .map(ToString::to_string)
            .chain(report.errors.iter().map(ToString::to_string))
            .collect()
    }

    /// `"clean"` or `"completed_with_warnings"`.
    pub fn status(&self) -> String {
        match self.inner.report().status() {
            sprite_trim_core::RunStatus::Clean => "clean",
            sprite_trim_core::RunStatus::CompletedWithWarnings => "completed_with_warnings",
            sprite_trim_core::RunStatus::Aborted => "aborted",
        }
        .to_string()
    }
}

impl JsTrimmer {
    fn with_mode(mode: AlignMode) -> Self {
        Self {
            inner: Trimmer::new(TrimOptions::new(mode)),
            cropped: HashMap::new(),
        }
    }

    fn reconcile_all(&mut self, symbols: &mut [Symbol]) -> Result<usize, JsValue> {
        let before = self.inner.report().warnings.len();
        let updated = self
            .inner
            .reconcile(symbols.iter_mut())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        for warning in &self.inner.report().warnings[before..] {
            console_warn(&warning.to_string());
        }
        Ok(updated)
    }
}
