use crate::apply::{apply_bookmarks, ApplyOptions};
use crate::bookmark_file::parse_bookmark_file;
use crate::interact::Interaction;
use crate::pdf::save::SaveOutcome;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run(
    pdf: &Path,
    bookmarks: &Path,
    options: &ApplyOptions,
    interaction: &mut dyn Interaction,
) -> Result<()> {
    let entries = parse_bookmark_file(bookmarks)
        .with_context(|| format!("Invalid bookmark file {}", bookmarks.display()))?;
    println!("Parsed {} bookmark(s), applying to {}", entries.len(), pdf.display());

    let report = apply_bookmarks(pdf, &entries, options, interaction)
        .with_context(|| format!("Failed to apply bookmarks to {}", pdf.display()))?;

    if !report.skipped.is_empty() {
        println!("Skipped {} bookmark(s) outside the document", report.skipped.len());
    }
    match report.outcome {
        SaveOutcome::InPlace => {
            println!("Applied {} bookmark(s) to {}", report.applied, pdf.display());
        }
        SaveOutcome::Replaced => println!(
            "Applied {} bookmark(s) to {} (rewrote the file for an encrypted or read-only document)",
            report.applied,
            pdf.display()
        ),
        SaveOutcome::Relocated(dest) => println!(
            "The original file is locked; saved {} bookmark(s) to {}",
            report.applied,
            dest.display()
        ),
    }

    Ok(())
}
