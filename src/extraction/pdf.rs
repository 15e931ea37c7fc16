//! PDF text extraction.

use pdf_extract::OutputError;

/// Extract the text of every page, in page order.
pub fn extract_pages(content: &[u8]) -> Result<Vec<String>, OutputError> {
    pdf_extract::extract_text_from_mem_by_pages(content)
}

/// Extract the text of a whole document, joining pages with a single space.
pub fn extract_text(content: &[u8]) -> Result<String, OutputError> {
    let pages = extract_pages(content)?;
    tracing::debug!(pages = pages.len(), "Extracted PDF pages");
    Ok(pages.join(" "))
}
