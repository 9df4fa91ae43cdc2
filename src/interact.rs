//! Decisions an operation hands back to whoever is driving it.

use crate::apply::OutOfRange;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

pub trait Interaction {
    /// Some bookmarks point outside the document. Return `true` to apply the
    /// remaining `valid_count` bookmarks anyway.
    fn confirm_partial(&mut self, invalid: &[OutOfRange], valid_count: usize) -> bool;

    /// `original` could not be replaced. Return where to put the result
    /// instead, or `None` to give up.
    fn choose_destination(&mut self, original: &Path, suggested: &Path) -> Option<PathBuf>;
}

/// Fixed answers, for non-interactive callers.
#[derive(Debug, Clone, Default)]
pub struct Preset {
    pub allow_partial: bool,
    pub destination: Option<PathBuf>,
}

impl Interaction for Preset {
    fn confirm_partial(&mut self, _invalid: &[OutOfRange], _valid_count: usize) -> bool {
        self.allow_partial
    }

    fn choose_destination(&mut self, _original: &Path, _suggested: &Path) -> Option<PathBuf> {
        self.destination.clone()
    }
}

/// Asks on the terminal when stdin is one, otherwise falls back to the
/// preset answers.
#[derive(Debug, Clone, Default)]
pub struct Terminal {
    pub preset: Preset,
}

impl Terminal {
    fn ask(&self, question: &str) -> Option<String> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return None;
        }
        eprint!("{}", question);
        io::stderr().flush().ok()?;
        let mut answer = String::new();
        stdin.lock().read_line(&mut answer).ok()?;
        Some(answer.trim().to_string())
    }
}

impl Interaction for Terminal {
    fn confirm_partial(&mut self, invalid: &[OutOfRange], valid_count: usize) -> bool {
        eprintln!("{} bookmark(s) point outside the document:", invalid.len());
        for item in invalid {
            eprintln!("  row {}: '{}' (page {})", item.row, item.title, item.page);
        }
        if self.preset.allow_partial {
            return true;
        }
        match self.ask(&format!("Apply the other {} bookmark(s)? [y/N] ", valid_count)) {
            Some(answer) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
            None => false,
        }
    }

    fn choose_destination(&mut self, original: &Path, suggested: &Path) -> Option<PathBuf> {
        if let Some(destination) = &self.preset.destination {
            return Some(destination.clone());
        }
        let answer = self.ask(&format!(
            "{} is locked. Save to [{}] (enter a path, '-' to cancel): ",
            original.display(),
            suggested.display()
        ))?;
        match answer.as_str() {
            "" => Some(suggested.to_path_buf()),
            "-" => None,
            path => Some(PathBuf::from(path)),
        }
    }
}
