pub mod document;
pub mod outline;
pub mod save;

pub use document::{PdfDocument, PdfInfo};
