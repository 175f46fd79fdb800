//! Sprite Trim WASM - WebAssembly bindings for sprite-trim
//!
//! This crate exposes the sprite-trim-core functionality to the browser
//! front-end, which owns directory access and file writes.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for image data
//! - `decode` - PNG decode/encode bindings
//! - `transform` - Bounds scanning, cropping and instance reconciliation
//! - `trimmer` - Stateful whole-project driver
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsTrimmer } from '@sprite-trim/wasm';
//!
//! await init();
//!
//! const trimmer = new JsTrimmer('aligned');
//! trimmer.add_image(guid, 'run/01.png', 'run', new Uint8Array(await file.arrayBuffer()));
//! trimmer.run();
//! const symbols = trimmer.reconcile_symbols(entity.symbols);
//! ```

use wasm_bindgen::prelude::*;

mod decode;
mod transform;
mod trimmer;
mod types;

pub use decode::{decode_png, encode_png};
pub use transform::{crop_png, reconcile_symbol, scan_bounds};
pub use trimmer::JsTrimmer;
pub use types::{JsCropRect, JsRgbaImage};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Forward a message to the browser console as a warning.
pub(crate) fn console_warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}
