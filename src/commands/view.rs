use crate::bookmark_file::{BookmarkEntry, LineFormat};
use crate::pdf::outline::{read_outline, OutlineListing};
use crate::pdf::PdfDocument;
use anyhow::{Context, Result};
use std::path::Path;

/// Print the outline. Returns `false` when the document has none.
pub fn run<P: AsRef<Path>>(path: P, export: Option<&Path>) -> Result<bool> {
    let doc = PdfDocument::open(&path)?;

    let listing = read_outline(&doc.doc);
    if listing == OutlineListing::Missing {
        println!("This PDF has no bookmarks.");
        return Ok(false);
    }
    let entries = listing.entries();

    println!("Bookmarks:\n");
    for (i, entry) in entries.iter().enumerate() {
        let indent = "  ".repeat(entry.level.saturating_sub(1) as usize);
        let page_str = entry
            .page
            .map(|p| format!(" (p. {})", p))
            .unwrap_or_default();
        println!("{:2}. {}{}{}", i + 1, indent, entry.title, page_str);
    }
    println!("\nTotal: {} bookmark(s)", entries.len());

    if let Some(export) = export {
        // Unresolved destinations are written as page 1
        let text: String = entries
            .iter()
            .map(|e| {
                let entry = BookmarkEntry::new(e.level, e.title.as_str(), e.page.unwrap_or(1));
                entry.to_line(LineFormat::Delimited) + "\n"
            })
            .collect();
        std::fs::write(export, text)
            .with_context(|| format!("Failed to write {}", export.display()))?;
        println!("Wrote bookmark file {}", export.display());
    }

    Ok(true)
}
