use lopdf::Document;
use std::path::Path;
use tracing::debug;

use super::ExtractionError;

/// Text pulled from every page of a PDF, plus the page count.
pub(crate) fn extract_pdf(path: &Path) -> Result<(String, usize), ExtractionError> {
    let doc = Document::load(path)
        .map_err(|e| ExtractionError::ExtractionFailure(format!("Error processing PDF: {}", e)))?;

    let pages = doc.get_pages();
    let page_count = pages.len();
    let mut text = String::new();

    for page_num in pages.keys() {
        // Pages without decodable text operators contribute nothing.
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) if !page_text.trim().is_empty() => {
                text.push_str(&page_text);
                text.push_str("\n\n");
            }
            Ok(_) => debug!(page = page_num, "no extractable text on page"),
            Err(e) => debug!(page = page_num, error = %e, "could not decode page text"),
        }
    }

    Ok((text, page_count))
}
