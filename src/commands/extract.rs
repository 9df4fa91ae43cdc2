use crate::extract::extract_pages;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(input: P, pages: &str, output: Option<&Path>) -> Result<()> {
    let report = extract_pages(input.as_ref(), pages, output)?;

    println!(
        "Extracted {} page(s) to {}",
        report.pages.len(),
        report.output.display()
    );

    Ok(())
}
