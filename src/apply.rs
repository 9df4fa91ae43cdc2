use crate::bookmark_file::BookmarkEntry;
use crate::interact::Interaction;
use crate::pdf::outline::{validate_hierarchy, OutlineError};
use crate::pdf::save::{save_bookmarks, SaveError, SaveOutcome};
use lopdf::Document;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Shift added to every bookmark page before it is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageOffset(pub i64);

impl PageOffset {
    /// The offset field holds the document page on which bookmark page 1
    /// lands, so entering 1 means no shift.
    pub fn from_entered(value: i64) -> Self {
        PageOffset(value - 1)
    }

    pub fn shift(self, page: u32) -> i64 {
        i64::from(page) + self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfRange {
    /// 1-based position among the parsed bookmarks
    pub row: usize,
    pub title: String,
    /// Page after the offset was applied
    pub page: i64,
}

#[derive(Debug, Default)]
pub struct Partition {
    /// Entries with their pages already shifted.
    pub valid: Vec<BookmarkEntry>,
    pub invalid: Vec<OutOfRange>,
}

pub fn partition(entries: &[BookmarkEntry], offset: PageOffset, page_count: u32) -> Partition {
    let mut result = Partition::default();
    for (idx, entry) in entries.iter().enumerate() {
        let adjusted = offset.shift(entry.page);
        match u32::try_from(adjusted) {
            Ok(page) if (1..=page_count).contains(&page) => result.valid.push(BookmarkEntry {
                page,
                ..entry.clone()
            }),
            _ => result.invalid.push(OutOfRange {
                row: idx + 1,
                title: entry.title.clone(),
                page: adjusted,
            }),
        }
    }
    result
}

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub offset: PageOffset,
}

#[derive(Debug)]
pub struct ApplyReport {
    pub applied: usize,
    pub skipped: Vec<OutOfRange>,
    pub outcome: SaveOutcome,
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("The bookmark file is empty or contains no bookmarks")]
    NoBookmarks,
    #[error("None of the {0} bookmark(s) point inside the document")]
    NothingInRange(usize),
    #[error("{0} bookmark(s) point outside the document; nothing was changed")]
    Declined(usize),
    #[error("Failed to open PDF {}: {source}", path.display())]
    Open { path: PathBuf, source: lopdf::Error },
    #[error(transparent)]
    Outline(#[from] OutlineError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Apply `entries` as the outline of the PDF at `path`.
///
/// Bookmarks that land outside the document after the offset is applied are
/// only dropped if `interaction` agrees; otherwise the file is untouched.
pub fn apply_bookmarks(
    path: &Path,
    entries: &[BookmarkEntry],
    options: &ApplyOptions,
    interaction: &mut dyn Interaction,
) -> Result<ApplyReport, ApplyError> {
    if entries.is_empty() {
        return Err(ApplyError::NoBookmarks);
    }

    let page_count = {
        let doc = Document::load(path).map_err(|source| ApplyError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        doc.get_pages().len() as u32
    };

    let Partition { valid, invalid } = partition(entries, options.offset, page_count);
    if !invalid.is_empty() {
        warn!(
            invalid = invalid.len(),
            page_count, "bookmarks point outside the document"
        );
        if !interaction.confirm_partial(&invalid, valid.len()) {
            return Err(ApplyError::Declined(invalid.len()));
        }
    }
    if valid.is_empty() {
        return Err(ApplyError::NothingInRange(entries.len()));
    }

    validate_hierarchy(&valid)?;
    let outcome = save_bookmarks(path, &valid, interaction)?;
    info!(applied = valid.len(), skipped = invalid.len(), ?outcome, "applied bookmarks");

    Ok(ApplyReport {
        applied: valid.len(),
        skipped: invalid,
        outcome,
    })
}
