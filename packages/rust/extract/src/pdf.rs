//! PDF text extraction via the `pdf-extract` crate.

use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::{ExtractFailure, TextExtractor};

/// Magic bytes at the start of every PDF file.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extractor for `.pdf` files (or anything starting with `%PDF-`).
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn detect(&self, ext: &str, head: &[u8]) -> bool {
        ext == "pdf" || head.starts_with(PDF_MAGIC)
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractFailure> {
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(ExtractFailure::new("missing %PDF- header"));
        }

        // pdf-extract panics on some malformed inputs instead of returning Err.
        let text = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }))
        .map_err(|_| ExtractFailure::new("pdf-extract panicked on malformed PDF"))?
        .map_err(|e| ExtractFailure::new(format!("pdf-extract: {e}")))?;

        debug!(chars = text.len(), "extracted PDF text");

        if text.trim().is_empty() {
            return Err(ExtractFailure::new("PDF has no text layer (scanned image?)"));
        }

        Ok(text)
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension_or_magic() {
        assert!(PdfExtractor.detect("pdf", b""));
        assert!(PdfExtractor.detect("bin", b"%PDF-1.7\n"));
        assert!(!PdfExtractor.detect("rtf", b"{\\rtf1"));
    }

    #[test]
    fn rejects_bytes_without_header() {
        let err = PdfExtractor.extract(b"<html>Not Found</html>").unwrap_err();
        assert!(err.to_string().contains("%PDF-"));
    }

    #[test]
    fn extracts_text_layer() {
        let bytes = std::fs::read("../../../fixtures/pdf/summary.pdf").unwrap();
        let text = PdfExtractor.extract(&bytes).unwrap();
        assert!(text.contains("MEDIA SUMMARY"));
        assert!(text.contains("The Court held"));
    }

    #[test]
    fn page_without_text_is_an_error() {
        let bytes = std::fs::read("../../../fixtures/pdf/no-text.pdf").unwrap();
        let err = PdfExtractor.extract(&bytes).unwrap_err();
        assert!(err.to_string().contains("no text layer"));
    }

    #[test]
    fn truncated_pdf_is_an_error() {
        let result = PdfExtractor.extract(b"%PDF-1.4\n1 0 obj\n<<");
        assert!(result.is_err());
    }
}
