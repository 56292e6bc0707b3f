use std::path::Path;

use async_trait::async_trait;
use lopdf::Document;

use crate::domain::{ports::DocumentLoader, DomainError, Page};

/// Extracts per-page text from PDF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load_pages(&self, path: &Path) -> Result<Vec<Page>, DomainError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(DomainError::not_found(format!(
                "PDF file not found: {}",
                path.display()
            )));
        }

        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || extract_pages(&path))
            .await
            .map_err(|e| DomainError::internal(format!("PDF extraction task failed: {e}")))?
    }
}

/// Reads every page of the PDF at `path`, numbered from 1.
///
/// A page whose text cannot be decoded is logged and returned empty so one
/// odd font does not abort the whole document; an unreadable file fails.
pub fn extract_pages(path: &Path) -> Result<Vec<Page>, DomainError> {
    let doc = Document::load(path)
        .map_err(|e| DomainError::external(format!("Error reading PDF: {e}")))?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());

    for number in page_numbers {
        let text = match doc.extract_text(&[number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(page = number, error = %e, "could not extract page text");
                String::new()
            }
        };
        pages.push(Page::new(number, text));
    }

    tracing::debug!(path = %path.display(), pages = pages.len(), "extracted PDF text");
    Ok(pages)
}
