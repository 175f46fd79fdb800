//! Project directory discovery.
//!
//! A project root is a directory holding a `*.fraytools` file. Images are
//! `*.png` files paired with a `*.png.meta` JSON file carrying their GUID;
//! instances live in `*.entity` JSON files anywhere below the root.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::debug;
use serde::Deserialize;
use sprite_trim_core::{GroupKey, PendingPairs};
use walkdir::WalkDir;

const PROJECT_EXT: &str = ".fraytools";
const IMAGE_EXT: &str = ".png";
const META_EXT: &str = ".png.meta";
const ENTITY_EXT: &str = ".entity";

/// An image paired with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectImage {
    pub guid: String,
    pub path: PathBuf,
    pub group: GroupKey,
}

/// Everything of interest found below a project root.
#[derive(Debug, Default)]
pub struct ProjectFiles {
    pub images: Vec<ProjectImage>,
    pub entities: Vec<PathBuf>,
    /// Images without metadata, or metadata without an image.
    pub unpaired: Vec<String>,
}

#[derive(Deserialize)]
struct MetaFile {
    guid: String,
}

/// Check that `dir` is a project root and return its project file.
pub fn find_project_file(dir: &Path) -> Result<PathBuf> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_suffix(&path, PROJECT_EXT) {
            return Ok(path);
        }
    }
    bail!("Couldn't find {PROJECT_EXT} file in {}", dir.display())
}

/// All files below `root`, recursively, in a stable order.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Pair images with metadata and collect entity files below `root`.
pub fn discover(root: &Path) -> Result<ProjectFiles> {
    let mut project = ProjectFiles::default();
    let mut pairs: PendingPairs<PathBuf> = PendingPairs::new();

    for path in list_files(root)? {
        let resolved = if has_suffix(&path, META_EXT) {
            let guid = read_meta_guid(&path)?;
            let image_name = strip_suffix(&path, ".meta");
            pairs.offer_guid(&image_name, guid)
        } else if has_suffix(&path, IMAGE_EXT) {
            let name = path.to_string_lossy().into_owned();
            pairs.offer_image(&name, path)
        } else {
            if has_suffix(&path, ENTITY_EXT) {
                project.entities.push(path);
            }
            None
        };

        if let Some((guid, path)) = resolved {
            let group = group_key(&path)?;
            debug!("event=pair guid={guid} path={}", path.display());
            project.images.push(ProjectImage { guid, path, group });
        }
    }

    project.unpaired = pairs
        .finish()
        .into_iter()
        .map(|name| relative_name(root, &name))
        .collect();
    Ok(project)
}

fn read_meta_guid(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read meta file: {}", path.display()))?;
    let meta: MetaFile = serde_json::from_str(&text)
        .with_context(|| format!("Invalid meta file: {}", path.display()))?;
    Ok(meta.guid)
}

/// Identity of the image's directory, resolved through symlinks.
fn group_key(image: &Path) -> Result<GroupKey> {
    let parent = image.parent().unwrap_or(Path::new("."));
    let canonical = fs::canonicalize(parent)
        .with_context(|| format!("Failed to resolve directory: {}", parent.display()))?;
    Ok(GroupKey::new(canonical.to_string_lossy()))
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(suffix))
}

fn strip_suffix(path: &Path, suffix: &str) -> String {
    let full = path.to_string_lossy();
    full.strip_suffix(suffix).unwrap_or(&full).to_string()
}

fn relative_name(root: &Path, name: &str) -> String {
    Path::new(name)
        .strip_prefix(root)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| name.to_string())
}
