//! Text extraction for downloaded court documents.
//!
//! This crate provides:
//! - [`TextExtractor`]: format-specific extractors (PDF, RTF, plain text)
//! - [`ExtractorRegistry`]: picks the extractor for a file by extension and magic bytes
//! - [`decode_text`]: encoding detection shared with the HTML harvester

mod cleanup;
mod encoding;
mod pdf;
mod rtf;

use std::path::Path;

use tracing::{debug, instrument};

use cosuju_shared::{CosujuError, Result};

pub use cleanup::normalize_whitespace;
pub use encoding::{DecodedText, decode_text, decode_with_label};
pub use pdf::PdfExtractor;
pub use rtf::{RtfExtractor, rtf_to_text};

/// Bytes inspected for magic-number detection.
const SNIFF_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Why an extractor could not produce text. The registry attaches the file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractFailure(String);

impl ExtractFailure {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl std::fmt::Display for ExtractFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for format-specific text extraction.
///
/// Extractors are tried in priority order; the registry falls back to
/// [`PlainTextExtractor`] when none matches.
pub trait TextExtractor: Send + Sync {
    /// Whether this extractor handles a file with lowercase extension `ext`
    /// whose first bytes are `head`.
    fn detect(&self, ext: &str, head: &[u8]) -> bool;

    /// Extract raw text from the whole file.
    fn extract(&self, bytes: &[u8]) -> std::result::Result<String, ExtractFailure>;

    /// Human-readable extractor name for tracing.
    fn name(&self) -> &str;
}

/// Fallback extractor: decode the bytes as text with encoding detection.
///
/// Held by the registry outside the detection list, so it never claims a file by magic bytes.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn detect(&self, _ext: &str, _head: &[u8]) -> bool {
        true
    }

    fn extract(&self, bytes: &[u8]) -> std::result::Result<String, ExtractFailure> {
        Ok(decode_text(bytes).text)
    }

    fn name(&self) -> &str {
        "text"
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Extracted, whitespace-normalized document text.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    /// Name of the extractor that produced it.
    pub extractor: String,
}

/// Holds format-specific extractors in priority order, plus the plain-text fallback.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn TextExtractor>>,
    fallback: Box<dyn TextExtractor>,
}

impl ExtractorRegistry {
    /// Create a registry with all built-in extractors.
    pub fn new() -> Self {
        Self {
            extractors: vec![Box::new(PdfExtractor), Box::new(RtfExtractor)],
            fallback: Box::new(PlainTextExtractor),
        }
    }

    /// Pick the extractor for a file. Always returns one.
    pub fn detect(&self, filename: &str, head: &[u8]) -> &dyn TextExtractor {
        let ext = extension(filename);
        let head = &head[..head.len().min(SNIFF_LEN)];

        // Magic bytes beat the extension.
        self.extractors
            .iter()
            .find(|x| x.detect("", head))
            .or_else(|| self.extractors.iter().find(|x| x.detect(&ext, head)))
            .unwrap_or(&self.fallback)
            .as_ref()
    }

    /// Extract text from in-memory bytes named `filename`.
    pub fn extract_bytes(&self, filename: &str, bytes: &[u8]) -> Result<ExtractedText> {
        let extractor = self.detect(filename, bytes);
        debug!(filename, extractor = extractor.name(), bytes = bytes.len(), "extracting text");

        let raw = extractor
            .extract(bytes)
            .map_err(|e| CosujuError::extraction(filename, e.to_string()))?;

        Ok(ExtractedText {
            text: normalize_whitespace(&raw),
            extractor: extractor.name().to_string(),
        })
    }

    /// Read a file from disk and extract its text.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn extract_file(&self, path: &Path) -> Result<ExtractedText> {
        let bytes = std::fs::read(path).map_err(|e| CosujuError::io(path, e))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.extract_bytes(&filename, &bytes).map_err(|e| match e {
            CosujuError::Extraction { message, .. } => CosujuError::extraction(path, message),
            other => other,
        })
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase extension of `filename`, or empty.
fn extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RTF: &[u8] =
        br"{\rtf1\ansi{\fonttbl{\f0 Arial;}}\f0 MEDIA SUMMARY\par\par\par\par The Court held\par}";

    #[test]
    fn detect_by_extension() {
        let registry = ExtractorRegistry::new();
        assert_eq!(registry.detect("3media.rtf", b"").name(), "rtf");
        assert_eq!(registry.detect("3.PDF", b"").name(), "pdf");
        assert_eq!(registry.detect("notes.txt", b"hello").name(), "text");
        assert_eq!(registry.detect("README", b"hello").name(), "text");
    }

    #[test]
    fn magic_bytes_override_extension() {
        let registry = ExtractorRegistry::new();
        assert_eq!(registry.detect("3.pdf", SAMPLE_RTF).name(), "rtf");
        assert_eq!(registry.detect("3.rtf", b"%PDF-1.3\n").name(), "pdf");
    }

    #[test]
    fn extract_bytes_normalizes_rtf() {
        let registry = ExtractorRegistry::new();
        let out = registry.extract_bytes("3media.rtf", SAMPLE_RTF).unwrap();
        assert_eq!(out.extractor, "rtf");
        assert_eq!(out.text, "MEDIA SUMMARY\n\nThe Court held");
    }

    #[test]
    fn unknown_bytes_fall_back_to_text() {
        let registry = ExtractorRegistry::new();
        assert_eq!(registry.detect("", b"").name(), "text");
        assert_eq!(registry.detect("3.html", b"<html>").name(), "text");
    }

    #[test]
    fn extract_file_reads_pdf_fixture() {
        let registry = ExtractorRegistry::new();
        let out = registry
            .extract_file(Path::new("../../../fixtures/pdf/summary.pdf"))
            .unwrap();
        assert_eq!(out.extractor, "pdf");
        assert!(out.text.starts_with("MEDIA SUMMARY"));
    }

    #[test]
    fn extraction_failure_carries_filename() {
        let registry = ExtractorRegistry::new();
        let err = registry.extract_bytes("3.pdf", b"not really a pdf").unwrap_err();
        assert!(matches!(err, CosujuError::Extraction { .. }));
        assert!(err.to_string().contains("3.pdf"));
    }

    #[test]
    fn extract_file_reads_from_disk() {
        let dir = std::env::temp_dir().join(format!("cosuju-extract-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("4media.rtf");
        std::fs::write(&path, SAMPLE_RTF).unwrap();

        let registry = ExtractorRegistry::new();
        let out = registry.extract_file(&path).unwrap();
        assert!(out.text.starts_with("MEDIA SUMMARY"));

        let missing = registry.extract_file(&dir.join("absent.rtf")).unwrap_err();
        assert!(matches!(missing, CosujuError::Io { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
