use crate::templates::BOOKMARK_TEMPLATE;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run(output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, BOOKMARK_TEMPLATE)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote bookmark template to {}", path.display());
        }
        None => print!("{}", BOOKMARK_TEMPLATE),
    }
    Ok(())
}
