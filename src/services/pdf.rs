//! PDF text extraction.

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("File is empty")]
    Empty,
    #[error("Not a PDF document")]
    NotPdf,
    #[error("PDF extraction error: {0}")]
    Extraction(String),
}

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Returns the text of every page, concatenated in page order.
pub fn extract_text(bytes: &[u8]) -> Result<String, PdfError> {
    if bytes.is_empty() {
        return Err(PdfError::Empty);
    }

    // The header may be preceded by a little junk; readers accept it within the first KiB.
    let head = &bytes[..bytes.len().min(1024)];
    if !head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
        return Err(PdfError::NotPdf);
    }

    // pdf-extract panics on some malformed documents instead of returning an error.
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(result) => result.map_err(|e| PdfError::Extraction(e.to_string())),
        Err(_) => Err(PdfError::Extraction(
            "document structure could not be parsed".to_string(),
        )),
    }
}
