//! One trimming run over a project directory.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{error, info, warn};
use sprite_trim_core::{ImageInput, RunStatus, TrimOptions, Trimmer, Warning};

use crate::entity::update_entity_file;
use crate::project::{discover, find_project_file};

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub project: PathBuf,
    pub options: TrimOptions,
    /// Compute everything but write nothing.
    pub dry_run: bool,
}

/// What a finished run did.
#[derive(Debug)]
pub struct Summary {
    pub status: RunStatus,
    pub images: usize,
    pub cropped: usize,
    pub entities_updated: usize,
    pub symbols_reconciled: usize,
    /// Warnings and per-item errors, formatted for display.
    pub messages: Vec<String>,
    /// Number of per-item errors (a subset of `messages`).
    pub failures: usize,
}

/// Run the whole pipeline: discover, crop, save images, rewrite entities.
///
/// Returns an error only when the run had to abort.
pub fn run(config: &RunConfig) -> Result<Summary> {
    find_project_file(&config.project)?;

    info!("event=load project={}", config.project.display());
    let project = discover(&config.project)?;
    info!(
        "event=load_done images={} entities={}",
        project.images.len(),
        project.entities.len()
    );

    let mut trimmer = Trimmer::new(config.options);
    for name in project.unpaired {
        trimmer.warn(Warning::UnpairedFile { name });
    }

    let mut paths = HashMap::new();
    for image in project.images {
        let bytes = fs::read(&image.path)
            .with_context(|| format!("Failed to read image: {}", image.path.display()))?;
        let name = image
            .path
            .strip_prefix(&config.project)
            .unwrap_or(&image.path)
            .display()
            .to_string();
        if trimmer.add_image(ImageInput {
            guid: image.guid.clone(),
            name,
            group: image.group,
            bytes,
        })? {
            paths.insert(image.guid, image.path);
        }
    }
    let images = paths.len();
    if trimmer.registry().is_empty() {
        warn!("event=no_images project={}", config.project.display());
    }

    trimmer.scan()?;
    trimmer.align()?;
    let cropped = trimmer.crop()?;

    let mut saved = 0;
    for image in cropped {
        let Some(path) = paths.get(&image.guid) else {
            continue;
        };
        if config.dry_run {
            saved += 1;
            continue;
        }
        match fs::write(path, &image.bytes) {
            Ok(()) => saved += 1,
            Err(err) => trimmer.withdraw(&image.guid, err.to_string())?,
        }
    }

    let mut entities_updated = 0;
    let mut symbols_reconciled = 0;
    let mut entity_failures = Vec::new();
    for path in &project.entities {
        match update_entity_file(path, &mut trimmer, config.dry_run) {
            Ok(0) => {}
            Ok(changed) => {
                entities_updated += 1;
                symbols_reconciled += changed;
            }
            Err(err) => {
                error!("event=entity_error path={} detail=\"{err:#}\"", path.display());
                entity_failures.push(format!("{err:#}"));
            }
        }
    }

    let report = trimmer.into_report();
    let failures = report.errors.len() + entity_failures.len();
    let status = if entity_failures.is_empty() {
        report.status()
    } else {
        RunStatus::CompletedWithWarnings
    };
    let messages = report
        .warnings
        .iter()
        .map(ToString::to_string)
        .chain(report.errors.iter().map(ToString::to_string))
        .chain(entity_failures)
        .collect();

    Ok(Summary {
        status,
        images,
        cropped: saved,
        entities_updated,
        symbols_reconciled,
        messages,
        failures,
    })
}
