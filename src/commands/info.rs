use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let info = doc.get_info();

    println!("File: {}", path.as_ref().display());
    println!("Pages: {}", info.page_count);
    println!("PDF version: {}", info.version);

    let fields = [
        ("Title", &info.title),
        ("Author", &info.author),
        ("Creator", &info.creator),
        ("Producer", &info.producer),
        ("Subject", &info.subject),
        ("Keywords", &info.keywords),
    ];
    for (label, value) in fields {
        println!("{}: {}", label, value.as_deref().unwrap_or("unknown"));
    }
    println!(
        "Created: {}",
        info.creation_date
            .as_deref()
            .map_or_else(|| "unknown".to_string(), format_pdf_date)
    );
    println!(
        "Modified: {}",
        info.mod_date
            .as_deref()
            .map_or_else(|| "unknown".to_string(), format_pdf_date)
    );
    if info.encrypted {
        println!("Encrypted: yes");
    }

    Ok(())
}

/// Render `D:YYYYMMDDHHmmSS...` as `YYYY-MM-DD HH:mm:SS`; anything else is
/// returned unchanged.
fn format_pdf_date(date: &str) -> String {
    let Some(d) = date.strip_prefix("D:") else {
        return date.to_string();
    };
    if d.len() < 8 || !d.is_char_boundary(8) || !d[..8].bytes().all(|b| b.is_ascii_digit()) {
        return date.to_string();
    }

    let (year, month, day) = (&d[0..4], &d[4..6], &d[6..8]);
    let time = match d.get(8..14) {
        Some(t) if t.bytes().all(|b| b.is_ascii_digit()) => {
            format!(" {}:{}:{}", &t[0..2], &t[2..4], &t[4..6])
        }
        _ => String::new(),
    };
    format!("{}-{}-{}{}", year, month, day, time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pdf_date() {
        assert_eq!(format_pdf_date("D:20240102030405Z"), "2024-01-02 03:04:05");
        assert_eq!(format_pdf_date("D:20240102"), "2024-01-02");
        assert_eq!(format_pdf_date("yesterday"), "yesterday");
        assert_eq!(format_pdf_date("D:2024"), "D:2024");
    }
}
