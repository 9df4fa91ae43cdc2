use crate::page_range::parse_page_range;
use crate::pdf::PdfDocument;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ExtractReport {
    pub output: PathBuf,
    /// 1-based pages written, ascending
    pub pages: Vec<u32>,
}

/// Copy the pages selected by `range` into a new PDF.
///
/// Pages beyond the end of the document are skipped. Without `output`, the
/// file is written next to the source as `<stem>_<descriptor>.pdf`.
pub fn extract_pages(path: &Path, range: &str, output: Option<&Path>) -> Result<ExtractReport> {
    let indices = parse_page_range(range)?;
    if indices.is_empty() {
        anyhow::bail!("No pages selected by '{}'", range);
    }

    let doc = PdfDocument::open(path)?;
    let total = doc.page_count();
    let pages: Vec<u32> = indices
        .into_iter()
        .filter(|&idx| idx < total)
        .map(|idx| idx + 1)
        .collect();
    if pages.is_empty() {
        anyhow::bail!("None of the pages in '{}' exist (document has {} pages)", range, total);
    }
    debug!(selected = pages.len(), total, "extracting pages");

    let output = match output {
        Some(p) => p.to_path_buf(),
        None => default_output_path(path, &pages),
    };

    let mut new_doc = doc
        .extract_pages(&pages)
        .with_context(|| format!("Failed to extract pages from {}", path.display()))?;
    PdfDocument::save(&mut new_doc, &output)?;

    Ok(ExtractReport { output, pages })
}

/// Human-readable summary of 1-based pages for use in a file name.
pub fn page_descriptor(pages: &[u32]) -> String {
    match pages {
        [page] => format!("page {}", page),
        [first, .., last] if pages.len() > 5 => {
            format!("pages {}-{} ({} pages)", first, last, pages.len())
        }
        _ => {
            let list: Vec<String> = pages.iter().map(u32::to_string).collect();
            format!("pages {}", list.join(","))
        }
    }
}

pub fn default_output_path(path: &Path, pages: &[u32]) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!("{}_{}.pdf", stem, page_descriptor(pages)))
}
