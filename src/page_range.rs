use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageRangeError {
    #[error("Empty page range")]
    Empty,
    #[error("Invalid page range '{token}': use a format like 1-5,8,10-12")]
    Malformed { token: String },
}

/// One comma-separated token of a range expression, 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl PageRange {
    /// Parse a single token like "5" or "1-5"
    pub fn parse(s: &str) -> Result<Self, PageRangeError> {
        let s = s.trim();
        let malformed = || PageRangeError::Malformed {
            token: s.to_string(),
        };

        if let Some((start_str, end_str)) = s.split_once('-') {
            // "-5" and "1-2-3" both end up here and fail to parse
            let start = parse_page_number(start_str).ok_or_else(malformed)?;
            let end = parse_page_number(end_str).ok_or_else(malformed)?;
            Ok(PageRange {
                start,
                end: Some(end),
            })
        } else {
            let page = parse_page_number(s).ok_or_else(malformed)?;
            Ok(PageRange {
                start: page,
                end: None,
            })
        }
    }

    /// Zero-based indices covered by this token.
    ///
    /// A reversed span such as "5-2" covers nothing, and page 0 has no index.
    pub fn indices(&self) -> impl Iterator<Item = u32> {
        let end = self.end.unwrap_or(self.start);
        (self.start..=end).filter_map(|page| page.checked_sub(1))
    }
}

fn parse_page_number(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok()
}

/// Parse a comma-separated list of page ranges like "1-5,8,10-12"
pub fn parse_page_ranges(s: &str) -> Result<Vec<PageRange>, PageRangeError> {
    if s.trim().is_empty() {
        return Err(PageRangeError::Empty);
    }
    s.split(',').map(PageRange::parse).collect()
}

/// Expand a range expression into sorted, deduplicated zero-based page indices
pub fn parse_page_range(s: &str) -> Result<Vec<u32>, PageRangeError> {
    let ranges = parse_page_ranges(s)?;
    let pages: BTreeSet<u32> = ranges.iter().flat_map(PageRange::indices).collect();
    Ok(pages.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page() {
        let range = PageRange::parse("5").unwrap();
        assert_eq!(range.start, 5);
        assert_eq!(range.end, None);
        assert_eq!(range.indices().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_page_range() {
        let range = PageRange::parse("1-5").unwrap();
        assert_eq!(range.indices().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_reverse_range_is_empty() {
        let range = PageRange::parse("5-2").unwrap();
        assert_eq!(range.indices().count(), 0);
        assert_eq!(parse_page_range("5-2").unwrap(), Vec::<u32>::new());
        assert_eq!(parse_page_range("5-2,7").unwrap(), vec![6]);
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        assert_eq!(parse_page_range("1-3,2,5").unwrap(), vec![0, 1, 2, 4]);
        assert_eq!(parse_page_range("10,1-2,2").unwrap(), vec![0, 1, 9]);
    }

    #[test]
    fn test_whitespace_tolerant() {
        assert_eq!(parse_page_range(" 1 - 3 , 8 ").unwrap(), vec![0, 1, 2, 7]);
    }

    #[test]
    fn test_page_zero_has_no_index() {
        assert_eq!(parse_page_range("0").unwrap(), Vec::<u32>::new());
        assert_eq!(parse_page_range("0-2").unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_malformed() {
        for input in ["abc", "1,,2", "1,", "-5", "1-2-3", "3-x", "1.5"] {
            assert!(
                matches!(
                    parse_page_range(input),
                    Err(PageRangeError::Malformed { .. })
                ),
                "{input} should be malformed"
            );
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_page_range("  "), Err(PageRangeError::Empty));
    }
}
