//! Parsing of the line-oriented bookmark text format.
//!
//! Each non-blank line is one bookmark, written in one of three formats:
//!
//! ```text
//! 2|2.1 Basic concepts|5      delimited: level|title|page
//! Chapter 1 Introduction (1)  parenthetical: title (page), always level 1
//!     3.1.1 Details           indentation: two spaces per level, page 1
//! ```
//!
//! Lines starting with `#` are comments.

use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkEntry {
    pub level: u32,
    pub title: String,
    pub page: u32,
}

impl BookmarkEntry {
    pub fn new(level: u32, title: impl Into<String>, page: u32) -> Self {
        BookmarkEntry {
            level,
            title: title.into(),
            page,
        }
    }

    /// Render this entry as a line in the given format.
    ///
    /// Parenthetical lines cannot carry a level and indented lines cannot
    /// carry a page, so those parts are lost in the respective formats. A
    /// `|` in the title would split the delimited line, so it is written as
    /// `/` there.
    pub fn to_line(&self, format: LineFormat) -> String {
        match format {
            LineFormat::Delimited => format!(
                "{}|{}|{}",
                self.level,
                self.title.replace('|', "/"),
                self.page
            ),
            LineFormat::Parenthetical => format!("{} ({})", self.title, self.page),
            LineFormat::Indented => {
                let indent = "  ".repeat(self.level.saturating_sub(1) as usize);
                format!("{}{}", indent, self.title)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    Delimited,
    Parenthetical,
    Indented,
}

#[derive(Debug, Error)]
pub enum BookmarkFileError {
    #[error("Failed to read bookmark file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Line {line}: {message}")]
    Line { line: usize, message: String },
}

/// Parse a bookmark file. One malformed line rejects the whole file.
pub fn parse_bookmark_file<P: AsRef<Path>>(path: P) -> Result<Vec<BookmarkEntry>, BookmarkFileError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| BookmarkFileError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_bookmarks(&text)
}

pub fn parse_bookmarks(text: &str) -> Result<Vec<BookmarkEntry>, BookmarkFileError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut entries = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let parsed = parse_line(line).map_err(|message| BookmarkFileError::Line {
            line: idx + 1,
            message,
        })?;
        if let Some((entry, _)) = parsed {
            entries.push(entry);
        }
    }

    debug!(count = entries.len(), "parsed bookmark entries");
    Ok(entries)
}

/// Parse one line, returning the entry and the format it was written in.
///
/// `Ok(None)` means the line holds no bookmark: blank, a comment, too few
/// delimited fields, or an empty title.
pub fn parse_line(line: &str) -> Result<Option<(BookmarkEntry, LineFormat)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let parsed = if trimmed.contains('|') {
        parse_delimited(trimmed)?
    } else if let Some(entry) = parse_parenthetical(trimmed)? {
        Some((entry, LineFormat::Parenthetical))
    } else {
        Some((parse_indented(line), LineFormat::Indented))
    };

    Ok(parsed.filter(|(entry, _)| !entry.title.is_empty()))
}

fn parse_delimited(line: &str) -> Result<Option<(BookmarkEntry, LineFormat)>, String> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < 3 {
        return Ok(None);
    }

    let level = parse_number(fields[0], "level")?;
    let title = fields[1].trim().to_string();
    let page = parse_number(fields[2], "page")?;

    Ok(Some((
        BookmarkEntry { level, title, page },
        LineFormat::Delimited,
    )))
}

/// `None` when the line lacks a `(` that precedes a `)`.
fn parse_parenthetical(line: &str) -> Result<Option<BookmarkEntry>, String> {
    let (Some(open), Some(close)) = (line.rfind('('), line.rfind(')')) else {
        return Ok(None);
    };
    if open >= close {
        return Ok(None);
    }

    let title = line[..open].trim().to_string();
    let page = parse_number(&line[open + 1..close], "page")?;

    Ok(Some(BookmarkEntry {
        level: 1,
        title,
        page,
    }))
}

fn parse_indented(line: &str) -> BookmarkEntry {
    let mut units = 0u32;
    for c in line.chars() {
        match c {
            ' ' => units += 1,
            '\t' => units += 4,
            _ => break,
        }
    }

    // A trailing "(page)" never reaches here; the parenthetical format
    // claims every line with a "(" before its last ")".
    BookmarkEntry {
        level: units / 2 + 1,
        title: line.trim().to_string(),
        page: 1,
    }
}

fn parse_number(field: &str, what: &str) -> Result<u32, String> {
    let field = field.trim();
    field
        .parse::<u32>()
        .map_err(|_| format!("invalid {} '{}'", what, field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(level: u32, title: &str, page: u32) -> BookmarkEntry {
        BookmarkEntry::new(level, title, page)
    }

    #[test]
    fn test_delimited() {
        let (parsed, format) = parse_line("2|Intro|5").unwrap().unwrap();
        assert_eq!(parsed, entry(2, "Intro", 5));
        assert_eq!(format, LineFormat::Delimited);
    }

    #[test]
    fn test_delimited_trims_and_ignores_extra_fields() {
        let (parsed, _) = parse_line(" 1 |  Chapter One  | 12 | extra").unwrap().unwrap();
        assert_eq!(parsed, entry(1, "Chapter One", 12));
    }

    #[test]
    fn test_delimited_too_few_fields_is_skipped() {
        assert_eq!(parse_line("1|Only two").unwrap(), None);
    }

    #[test]
    fn test_parenthetical_uses_last_pair() {
        let (parsed, format) = parse_line("Appendix (A) notes (42)").unwrap().unwrap();
        assert_eq!(parsed, entry(1, "Appendix (A) notes", 42));
        assert_eq!(format, LineFormat::Parenthetical);
    }

    #[test]
    fn test_parenthetical_ignores_indentation() {
        let (parsed, _) = parse_line("    2.1 Basics (5)").unwrap().unwrap();
        assert_eq!(parsed, entry(1, "2.1 Basics", 5));
    }

    #[test]
    fn test_indentation_levels() {
        let (parsed, format) = parse_line("Preface").unwrap().unwrap();
        assert_eq!(parsed, entry(1, "Preface", 1));
        assert_eq!(format, LineFormat::Indented);

        assert_eq!(parse_line("  Section").unwrap().unwrap().0.level, 2);
        assert_eq!(parse_line("    Subsection").unwrap().unwrap().0.level, 3);
        assert_eq!(parse_line("\tTabbed").unwrap().unwrap().0.level, 3);
        assert_eq!(parse_line("   Odd").unwrap().unwrap().0.level, 2);
    }

    #[test]
    fn test_parentheses_out_of_order_fall_back_to_indentation() {
        let (parsed, format) = parse_line("  Notes) see (").unwrap().unwrap();
        assert_eq!(parsed, entry(2, "Notes) see (", 1));
        assert_eq!(format, LineFormat::Indented);
    }

    #[test]
    fn test_empty_titles_dropped() {
        assert_eq!(parse_line("1||3").unwrap(), None);
        assert_eq!(parse_line("(3)").unwrap(), None);
    }

    #[test]
    fn test_round_trip_each_format() {
        let cases = [
            (entry(2, "Intro", 5), LineFormat::Delimited),
            (entry(1, "Chapter 2 Basics", 17), LineFormat::Parenthetical),
            (entry(3, "3.1.1 Details", 1), LineFormat::Indented),
        ];
        for (original, format) in cases {
            let line = original.to_line(format);
            let (parsed, detected) = parse_line(&line).unwrap().unwrap();
            assert_eq!(parsed, original, "line {line:?}");
            assert_eq!(detected, format);
        }
    }

    #[test]
    fn test_delimited_line_survives_pipe_in_title() {
        let line = entry(1, "Input | Output", 3).to_line(LineFormat::Delimited);
        assert_eq!(line, "1|Input / Output|3");
        let (parsed, _) = parse_line(&line).unwrap().unwrap();
        assert_eq!(parsed, entry(1, "Input / Output", 3));
    }

    #[test]
    fn test_mixed_file() {
        let text = "\u{feff}1|第一章 引言|1\n\n# a comment\nChapter 2 (5)\n  2.1 Scope\n";
        let entries = parse_bookmarks(text).unwrap();
        assert_eq!(
            entries,
            vec![
                entry(1, "第一章 引言", 1),
                entry(1, "Chapter 2", 5),
                entry(2, "2.1 Scope", 1),
            ]
        );
    }

    #[test]
    fn test_one_bad_line_rejects_file() {
        let text = "1|Good|1\n1|Bad|x\n1|Also good|3\n";
        match parse_bookmarks(text) {
            Err(BookmarkFileError::Line { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("page"));
            }
            other => panic!("expected line error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_parenthetical_rejects_file() {
        assert!(parse_bookmarks("Chapter 1 (Introduction)\n").is_err());
    }

    #[test]
    fn test_template_parses_without_comment_noise() {
        let entries = parse_bookmarks(crate::templates::BOOKMARK_TEMPLATE).unwrap();
        assert_eq!(entries.len(), 9);
        assert!(entries.iter().all(|e| !e.title.starts_with('#')));
    }

    #[test]
    fn test_parse_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookmarks.txt");
        std::fs::write(&path, "1|One|1\n2|Two|2\n").unwrap();
        assert_eq!(
            parse_bookmark_file(&path).unwrap(),
            vec![entry(1, "One", 1), entry(2, "Two", 2)]
        );

        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            parse_bookmark_file(&missing),
            Err(BookmarkFileError::Io { .. })
        ));
    }
}
