mod pdf;

pub use pdf::{extract_pages, PdfLoader};
