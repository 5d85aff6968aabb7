//! Dataset curation utilities
//!
//! The upload pipeline that produced the image folder appended a hex hash to
//! every filename ("1860-12-26_a-merry-christmas_Desconhecido_6733e6c8.png"),
//! and hand curation occasionally leaves images on disk that no catalog
//! entry references anymore. The utilities here keep the catalog file and
//! its image folder consistent: planned, previewable filename normalization
//! with a JSON rewrite, and orphan-image detection.
//!
//! Everything operates on raw `serde_json::Value` entries rather than
//! [`crate::CartoonRecord`], so a rewrite preserves fields this crate does
//! not model yet.

use crate::catalog::CatalogError;
use serde_json::Value;
use std::{
    collections::BTreeSet,
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// File extensions considered images when scanning the folder
const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

/// Strip the trailing upload-hash segment from an image filename
///
/// Removes everything after the last underscore of the stem, keeping the
/// extension. Filenames without an underscore are returned unchanged.
pub fn normalize_filename(filename: &str) -> String {
    let (stem, extension) = match filename.rfind('.') {
        Some(dot) => filename.split_at(dot),
        None => (filename, ""),
    };
    match stem.rfind('_') {
        Some(underscore) => format!("{}{}", &stem[..underscore], extension),
        None => filename.to_owned(),
    }
}

/// Normalize the filename component of an `image_url`
///
/// The dataset mixes forward and backward slashes; the original slash style
/// is preserved in the result.
pub fn normalize_image_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let forward = path.replace('\\', "/");
    let (dir, filename) = match forward.rfind('/') {
        Some(slash) => (&forward[..=slash], &forward[slash + 1..]),
        None => ("", forward.as_str()),
    };
    let normalized = format!("{dir}{}", normalize_filename(filename));
    if path.contains('\\') {
        normalized.replace('/', "\\")
    } else {
        normalized
    }
}

/// Filename component of an entry's `image_url`, if it has one
pub fn image_filename(entry: &Value) -> Option<&str> {
    let image_url = entry.get("image_url")?.as_str()?;
    let filename = image_url
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(image_url);
    (!filename.is_empty()).then_some(filename)
}

/// One pending file rename, tied back to the catalog entry it came from
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenameOp {
    /// Current location of the image file
    pub from: PathBuf,

    /// Location after hash stripping
    pub to: PathBuf,

    /// Position of the owning entry in the catalog array
    pub entry_index: usize,
}

/// Why an entry was left out of a rename plan
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum SkipReason {
    /// The referenced file is not in the image folder
    #[error("referenced file not found in the image folder")]
    SourceMissing,

    /// Another file already carries the normalized name
    #[error("normalized filename already exists")]
    TargetExists,
}

/// Reviewed-before-applied set of filename normalizations
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RenamePlan {
    /// Renames that can proceed
    pub ops: Vec<RenameOp>,

    /// Filenames that need normalization but cannot be renamed safely
    pub skipped: Vec<(String, SkipReason)>,
}

/// Plan the filename normalizations for a catalog and its image folder
///
/// Entries whose filename is already normalized are not part of the plan.
/// Entries whose source file is missing, or whose normalized name collides
/// with an existing file, are recorded as skipped so the curators can sort
/// them out by hand.
pub fn plan_renames(entries: &[Value], image_dir: &Path) -> RenamePlan {
    let mut plan = RenamePlan::default();
    for (entry_index, entry) in entries.iter().enumerate() {
        let Some(filename) = image_filename(entry) else {
            continue;
        };
        let normalized = normalize_filename(filename);
        if normalized == filename {
            continue;
        }
        let from = image_dir.join(filename);
        let to = image_dir.join(&normalized);
        if !from.exists() {
            log::warn!("File not found, skipping rename: {}", from.display());
            plan.skipped.push((filename.to_owned(), SkipReason::SourceMissing));
            continue;
        }
        if to.exists() {
            log::warn!("Target already exists, skipping rename: {}", to.display());
            plan.skipped.push((filename.to_owned(), SkipReason::TargetExists));
            continue;
        }
        plan.ops.push(RenameOp {
            from,
            to,
            entry_index,
        });
    }
    plan
}

/// Apply a rename plan, updating the affected entries' `image_url`
///
/// Renames that fail are logged and skipped so one bad file does not strand
/// the rest of the batch; the entry is only rewritten when its file was
/// actually renamed. Returns the number of successful renames. The caller is
/// responsible for persisting the updated entries (see
/// [`write_entries_with_backup`]).
pub fn apply_renames(plan: &RenamePlan, entries: &mut [Value]) -> usize {
    let mut renamed = 0;
    for op in &plan.ops {
        if let Err(error) = fs::rename(&op.from, &op.to) {
            log::error!("Failed to rename {}: {error}", op.from.display());
            continue;
        }
        let entry = &mut entries[op.entry_index];
        if let Some(image_url) = entry.get("image_url").and_then(Value::as_str) {
            let normalized = normalize_image_path(image_url);
            entry["image_url"] = Value::String(normalized);
        }
        renamed += 1;
    }
    renamed
}

/// Read the raw catalog entries for a maintenance pass
pub fn read_entries(path: &Path) -> Result<Vec<Value>, CatalogError> {
    Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
}

/// Persist updated catalog entries, keeping a backup of the previous file
///
/// The previous content is copied to `<path>.backup` before the rewrite, as
/// the catalog is hand-curated and has no other undo mechanism.
pub fn write_entries_with_backup(path: &Path, entries: &[Value]) -> Result<(), CatalogError> {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".backup");
    fs::copy(path, &backup)?;
    log::info!("Backed up catalog to {}", Path::new(&backup).display());
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, entries)?;
    Ok(())
}

/// Image filenames referenced by the catalog entries
pub fn referenced_images(entries: &[Value]) -> BTreeSet<String> {
    entries
        .iter()
        .filter_map(image_filename)
        .map(str::to_owned)
        .collect()
}

/// Image files present in the image folder
pub fn images_in_dir(image_dir: &Path) -> std::io::Result<BTreeSet<String>> {
    let mut images = BTreeSet::new();
    for dir_entry in fs::read_dir(image_dir)? {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_file() {
            continue;
        }
        let name = dir_entry.file_name();
        let Some(name) = name.to_str() else {
            log::warn!("Ignoring non-UTF-8 filename in image folder");
            continue;
        };
        let is_image = name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if is_image {
            images.insert(name.to_owned());
        }
    }
    Ok(images)
}

/// Image files on disk that no catalog entry references, in sorted order
pub fn unreferenced_images(
    entries: &[Value],
    image_dir: &Path,
) -> std::io::Result<Vec<String>> {
    let referenced = referenced_images(entries);
    Ok(images_in_dir(image_dir)?
        .into_iter()
        .filter(|name| !referenced.contains(name))
        .collect())
}

/// Delete the given image files, returning how many were removed
///
/// Deletions that fail are logged and skipped, like failed renames.
pub fn delete_images(image_dir: &Path, names: &[String]) -> usize {
    let mut deleted = 0;
    for name in names {
        let path = image_dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Deleted unreferenced image {name}");
                deleted += 1;
            }
            Err(error) => log::error!("Failed to delete {}: {error}", path.display()),
        }
    }
    deleted
}
