//! In-place rewriting of entity documents.
//!
//! Only `x`, `y`, `pivotX` and `pivotY` of symbols that actually moved are
//! touched. Everything else in the document, including key order, is written
//! back as it was read.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Number, Value};
use sprite_trim_core::{Symbol, Trimmer};

/// Reconcile every image symbol of a parsed entity document.
///
/// Symbols without a non-empty `imageAsset` are never parsed or touched.
/// Returns the number of symbols whose transform changed.
pub fn reconcile_document(doc: &mut Value, trimmer: &mut Trimmer) -> Result<usize> {
    let Some(entries) = doc.get_mut("symbols").and_then(Value::as_array_mut) else {
        return Ok(0);
    };

    let mut image_entries: Vec<(usize, &mut Value)> = entries
        .iter_mut()
        .enumerate()
        .filter(|(_, value)| references_image(value))
        .collect();

    let mut symbols = image_entries
        .iter()
        .map(|(i, value)| {
            Symbol::deserialize(&**value)
                .with_context(|| format!("Invalid symbol at index {i}"))
        })
        .collect::<Result<Vec<Symbol>>>()?;
    let originals = symbols.clone();

    trimmer.reconcile(symbols.iter_mut())?;

    let mut changed = 0;
    for (((_, entry), before), after) in image_entries.iter_mut().zip(&originals).zip(&symbols) {
        if before == after {
            continue;
        }
        let Some(object) = entry.as_object_mut() else {
            continue;
        };
        object.insert("x".to_string(), json_number(after.x));
        object.insert("y".to_string(), json_number(after.y));
        if (before.pivot_x, before.pivot_y) != (after.pivot_x, after.pivot_y) {
            object.insert("pivotX".to_string(), json_number(after.pivot_x));
            object.insert("pivotY".to_string(), json_number(after.pivot_y));
        }
        changed += 1;
    }
    Ok(changed)
}

fn references_image(value: &Value) -> bool {
    value
        .get("imageAsset")
        .and_then(Value::as_str)
        .is_some_and(|guid| !guid.is_empty())
}

/// Read, reconcile and (unless `dry_run`) rewrite one entity file.
pub fn update_entity_file(path: &Path, trimmer: &mut Trimmer, dry_run: bool) -> Result<usize> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read entity file: {}", path.display()))?;
    let mut doc: Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid entity file: {}", path.display()))?;

    let changed = reconcile_document(&mut doc, trimmer)
        .with_context(|| format!("Failed to update entity file: {}", path.display()))?;

    if changed > 0 && !dry_run {
        let output = serde_json::to_string_pretty(&doc)?;
        fs::write(path, output)
            .with_context(|| format!("Failed to write entity file: {}", path.display()))?;
    }
    Ok(changed)
}

/// Whole numbers are written without a fractional part.
fn json_number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::Number(Number::from(value as i64))
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}
