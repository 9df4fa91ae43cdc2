use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use std::path::Path;

pub struct PdfDocument {
    pub doc: Document,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path)
            .with_context(|| format!("Failed to open PDF: {}", path.display()))?;
        Ok(PdfDocument { doc })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get 1-indexed page object IDs
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        page_ids(&self.doc)
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        let dict = match self.doc.trailer.get(b"Info") {
            Ok(Object::Reference(info_ref)) => self.doc.get_dictionary(*info_ref).ok(),
            Ok(Object::Dictionary(dict)) => Some(dict),
            _ => None,
        };

        if let Some(dict) = dict {
            info.title = get_string_from_dict(dict, b"Title");
            info.author = get_string_from_dict(dict, b"Author");
            info.creator = get_string_from_dict(dict, b"Creator");
            info.producer = get_string_from_dict(dict, b"Producer");
            info.creation_date = get_string_from_dict(dict, b"CreationDate");
            info.mod_date = get_string_from_dict(dict, b"ModDate");
            info.subject = get_string_from_dict(dict, b"Subject");
            info.keywords = get_string_from_dict(dict, b"Keywords");
        }

        info.page_count = self.page_count();
        info.version = self.doc.version.clone();
        info.encrypted = self.doc.is_encrypted();
        info
    }

    /// Build a new document holding only the given 1-based pages, in
    /// document order. The source outline is dropped since it points at
    /// pages that may no longer exist.
    pub fn extract_pages(&self, pages: &[u32]) -> Result<Document> {
        let mut new_doc = self.doc.clone();
        let all_pages = self.page_ids();
        let total = all_pages.len() as u32;

        for &page in pages {
            if page == 0 || page > total {
                anyhow::bail!("Page {} is out of range (1-{})", page, total);
            }
        }

        let pages_to_delete: Vec<u32> = all_pages
            .iter()
            .filter(|(num, _)| !pages.contains(num))
            .map(|(num, _)| *num)
            .collect();

        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
        }

        let root_id = catalog_id(&new_doc)?;
        new_doc
            .get_dictionary_mut(root_id)
            .context("Failed to get document catalog")?
            .remove(b"Outlines");
        new_doc.prune_objects();
        restore_encryption(&mut new_doc).context("Failed to re-encrypt extracted pages")?;

        Ok(new_doc)
    }

    /// Save to a file
    pub fn save<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<()> {
        doc.save(&path)
            .with_context(|| format!("Failed to save PDF: {}", path.as_ref().display()))?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub page_count: u32,
    pub version: String,
    pub encrypted: bool,
}

pub(crate) fn page_ids(doc: &Document) -> Vec<(u32, ObjectId)> {
    // get_pages() is a BTreeMap keyed by page number, so this is already sorted
    doc.get_pages().into_iter().collect()
}

/// Encrypt the objects of a loaded document again before it is written.
///
/// Loading decrypts every object but leaves the old `/Encrypt` entry in the
/// trailer, and the writer does not encrypt on its own. The entry is replaced
/// with one encoded from the key found at load time.
pub(crate) fn restore_encryption(doc: &mut Document) -> lopdf::Result<()> {
    let Some(state) = doc.encryption_state.take() else {
        return Ok(());
    };
    if let Some(Ok(encrypt_id)) = doc.trailer.remove(b"Encrypt").map(|o| o.as_reference()) {
        doc.objects.remove(&encrypt_id);
    }
    doc.encrypt(&state)
}

/// Object id of the document catalog (`/Root` in the trailer).
pub(crate) fn catalog_id(doc: &Document) -> Result<ObjectId> {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .context("Document has no catalog")
}

fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    })
}

/// Decode a PDF text string: UTF-16BE when it carries a byte-order mark,
/// otherwise PDFDocEncoding (treated as Latin-1).
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16_lossy(&u16_chars)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Encode a PDF text string. Printable ASCII stays a literal; anything else
/// is written as UTF-16BE with a byte-order mark.
pub(crate) fn encode_text_string(text: &str) -> Object {
    if text.chars().all(|c| c == ' ' || c.is_ascii_graphic()) {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
pub(crate) mod testing {
    use lopdf::{
        dictionary, Document, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions,
        StringFormat,
    };
    use std::path::Path;

    /// Build an in-memory document with `page_count` empty pages.
    pub fn blank_document(page_count: usize) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();

        let mut page_ids: Vec<Object> = Vec::new();
        for _ in 0..page_count {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            page_ids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids,
                "Count" => page_count as i64,
            }),
        );

        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal("Sample Title"),
            "Author" => Object::string_literal("Jane Doe"),
            "CreationDate" => Object::string_literal("D:20240102030405Z"),
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc
    }

    /// Write a blank document to `path`.
    pub fn write_blank_pdf(path: &Path, page_count: usize) {
        let mut doc = blank_document(page_count);
        doc.save(path).expect("failed to save test PDF");
    }

    /// Write a blank document encrypted with empty passwords, which opens
    /// without prompting.
    pub fn write_encrypted_pdf(path: &Path, page_count: usize) {
        let mut doc = blank_document(page_count);
        doc.trailer.set(
            "ID",
            vec![
                Object::String(b"pdfmarks-test-id".to_vec(), StringFormat::Literal),
                Object::String(b"pdfmarks-test-id".to_vec(), StringFormat::Literal),
            ],
        );
        let state = EncryptionState::try_from(EncryptionVersion::V2 {
            document: &doc,
            owner_password: "",
            user_password: "",
            key_length: 128,
            permissions: Permissions::all(),
        })
        .expect("failed to derive encryption key");
        doc.encrypt(&state).expect("failed to encrypt test PDF");
        doc.save(path).expect("failed to save encrypted test PDF");
    }
}
