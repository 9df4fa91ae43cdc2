//! Persisting a new outline back to disk.
//!
//! The preferred path appends an incremental update to the original file.
//! Encrypted documents and permission failures fall back to writing the
//! whole document to `<file>.tmp` and renaming it over the original. If the
//! temporary file cannot be written or renamed, the caller is asked for
//! another destination.

use crate::bookmark_file::BookmarkEntry;
use crate::interact::Interaction;
use crate::pdf::document::{page_ids, restore_encryption};
use crate::pdf::outline::{set_outline, write_outline, OutlineError};
use lopdf::{Document, IncrementalDocument, Object};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Document is encrypted; it cannot be updated incrementally")]
    Encrypted,
    #[error("Failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Outline(#[from] OutlineError),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error(
        "Save cancelled: {} could not be replaced and no other destination was chosen",
        original.display()
    )]
    Cancelled { original: PathBuf },
    #[error("Failed to move the saved file to {}: {source}", path.display())]
    Relocate { path: PathBuf, source: io::Error },
}

impl SaveError {
    /// Whether a failed in-place update may be retried as a full rewrite.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SaveError::Encrypted => true,
            SaveError::Write { source, .. } => source.kind() == io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Incremental update appended to the original file.
    InPlace,
    /// Rewritten through a temporary file that replaced the original.
    Replaced,
    /// The original could not be replaced; the result lives elsewhere.
    Relocated(PathBuf),
}

/// Write `entries` as the outline of the PDF at `path`, falling back as
/// described in the module docs.
pub fn save_bookmarks(
    path: &Path,
    entries: &[BookmarkEntry],
    interaction: &mut dyn Interaction,
) -> Result<SaveOutcome, SaveError> {
    persist(
        path,
        |target| save_incremental(target, entries),
        |temp| save_rewrite(path, temp, entries),
        interaction,
    )
}

/// Run the save fallback chain with the given writers.
///
/// `incremental` updates the file in place; `rewrite` writes a complete
/// document to the path it is handed, first the temporary file and, when
/// that could not be written, the chosen destination.
pub fn persist<I, R>(
    path: &Path,
    incremental: I,
    mut rewrite: R,
    interaction: &mut dyn Interaction,
) -> Result<SaveOutcome, SaveError>
where
    I: FnOnce(&Path) -> Result<(), SaveError>,
    R: FnMut(&Path) -> Result<(), SaveError>,
{
    match incremental(path) {
        Ok(()) => {
            info!(path = %path.display(), "saved incremental update");
            return Ok(SaveOutcome::InPlace);
        }
        Err(e) if e.is_recoverable() => {
            warn!(error = %e, "incremental update failed, rewriting through a temporary file");
        }
        Err(e) => return Err(e),
    }

    let temp = temp_path(path);
    let staged = match rewrite(&temp) {
        Ok(()) => match fs::rename(&temp, path) {
            Ok(()) => {
                info!(path = %path.display(), "replaced original with rewritten document");
                return Ok(SaveOutcome::Replaced);
            }
            Err(e) => {
                warn!(error = %e, "could not replace original, asking for another destination");
                true
            }
        },
        Err(e) if e.is_recoverable() => {
            remove_temp(&temp);
            warn!(error = %e, "could not write temporary file, asking for another destination");
            false
        }
        Err(e) => {
            remove_temp(&temp);
            return Err(e);
        }
    };

    let suggested = suggested_destination(path);
    let Some(destination) = interaction.choose_destination(path, &suggested) else {
        remove_temp(&temp);
        return Err(SaveError::Cancelled {
            original: path.to_path_buf(),
        });
    };

    if staged {
        if let Err(source) = fs::rename(&temp, &destination) {
            remove_temp(&temp);
            return Err(SaveError::Relocate {
                path: destination,
                source,
            });
        }
    } else {
        rewrite(&destination)?;
    }
    info!(path = %destination.display(), "saved to alternate destination");
    Ok(SaveOutcome::Relocated(destination))
}

/// Append an update section with the new outline to the file at `path`.
pub fn save_incremental(path: &Path, entries: &[BookmarkEntry]) -> Result<(), SaveError> {
    let bytes = fs::read(path).map_err(|source| SaveError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let original_len = bytes.len();
    let prev = Document::load_mem(&bytes)?;
    if prev.is_encrypted() {
        return Err(SaveError::Encrypted);
    }
    let root_id = prev.trailer.get(b"Root").and_then(Object::as_reference)?;
    let pages = page_ids(&prev);

    let mut incremental = IncrementalDocument::create_from(bytes, prev);
    incremental.opt_clone_object_to_new_document(root_id)?;
    write_outline(&mut incremental.new_document, root_id, &pages, entries)?;

    let mut buf = Vec::new();
    incremental.save_to(&mut buf).map_err(lopdf::Error::from)?;
    // The writer repeats the previous revision before the update section
    let update = buf.get(original_len..).unwrap_or_default();
    append_file(path, original_len as u64, update)?;
    debug!(bytes = update.len(), "appended update section");
    Ok(())
}

/// Load `source`, replace its outline and write the whole document to `target`.
pub fn save_rewrite(source: &Path, target: &Path, entries: &[BookmarkEntry]) -> Result<(), SaveError> {
    let bytes = fs::read(source).map_err(|e| SaveError::Read {
        path: source.to_path_buf(),
        source: e,
    })?;
    let mut doc = Document::load_mem(&bytes)?;
    set_outline(&mut doc, entries)?;
    restore_encryption(&mut doc)?;

    let mut buf = Vec::new();
    doc.save_to(&mut buf).map_err(lopdf::Error::from)?;
    write_file(target, &buf)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), SaveError> {
    fs::write(path, contents).map_err(|source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Append `update` to the file at `path`, which is `original_len` bytes
/// long. A failed write is cut back off so the original stays intact.
fn append_file(path: &Path, original_len: u64, update: &[u8]) -> Result<(), SaveError> {
    let write_err = |source: io::Error| SaveError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new().append(true).open(path).map_err(write_err)?;
    if let Err(e) = file.write_all(update).and_then(|()| file.sync_all()) {
        if let Err(trunc) = file.set_len(original_len) {
            warn!(path = %path.display(), error = %trunc, "failed to roll back partial update");
        }
        return Err(write_err(e));
    }
    Ok(())
}

fn remove_temp(temp: &Path) {
    if let Err(e) = fs::remove_file(temp) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %temp.display(), error = %e, "failed to remove temporary file");
        }
    }
}

/// `<file>.tmp` next to the original.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// `<stem>_with_bookmarks.pdf` next to the original.
pub fn suggested_destination(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!("{}_with_bookmarks.pdf", stem))
}
