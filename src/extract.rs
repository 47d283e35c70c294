//! PDF text extraction.
//!
//! Pulls the embedded text out of an uploaded PDF, pages concatenated in
//! order. Scanned PDFs without embedded text yield an empty string — the
//! pipeline treats that as a hard input failure, not an extraction error;
//! there is no OCR fallback.

/// Extraction failure. The caller reports it and skips the run.
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract plain text from PDF bytes.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn error_message_mentions_pdf() {
        let err = extract_text(b"garbage").unwrap_err();
        assert!(err.to_string().contains("PDF extraction failed"));
    }
}
