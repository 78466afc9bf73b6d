//! Character-set detection for downloaded bytes.
//!
//! Order: byte-order mark, then the declared label (HTTP `charset`),
//! then strict UTF-8, then Windows-1252, which every byte sequence decodes under.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

/// Text decoded from raw bytes, with the encoding that was used.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    /// Some input bytes were replaced with U+FFFD.
    pub had_errors: bool,
}

impl DecodedText {
    /// WHATWG name of the encoding (e.g. `UTF-8`, `windows-1252`).
    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }
}

/// Decode bytes of unknown encoding.
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    decode_with_label(bytes, None)
}

/// Decode bytes, trusting `label` (e.g. from a `Content-Type` header) when it names a known encoding.
pub fn decode_with_label(bytes: &[u8], label: Option<&str>) -> DecodedText {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_as(encoding, &bytes[bom_len..]);
    }

    if let Some(encoding) = label.and_then(|l| Encoding::for_label(l.trim().as_bytes())) {
        return decode_as(encoding, bytes);
    }

    if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        return DecodedText {
            text: text.into_owned(),
            encoding: UTF_8,
            had_errors: false,
        };
    }

    decode_as(WINDOWS_1252, bytes)
}

/// Decode a single Windows-1252 byte (RTF `\'hh` escapes and 8-bit literals).
pub(crate) fn cp1252_char(byte: u8) -> char {
    let buf = [byte];
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(&buf);
    text.chars().next().unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn decode_as(encoding: &'static Encoding, bytes: &[u8]) -> DecodedText {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding,
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_is_detected() {
        let decoded = decode_text("Constitutional Court — Justice Mahomed".as_bytes());
        assert_eq!(decoded.encoding_name(), "UTF-8");
        assert!(decoded.text.contains('—'));
        assert!(!decoded.had_errors);
    }

    #[test]
    fn cp1252_fallback_for_invalid_utf8() {
        // 0x93/0x94 are curly quotes in Windows-1252, invalid as UTF-8 starts.
        let decoded = decode_text(b"\x93Ubuntu\x94 and r\xe9sum\xe9");
        assert_eq!(decoded.encoding_name(), "windows-1252");
        assert_eq!(decoded.text, "\u{201c}Ubuntu\u{201d} and résumé");
    }

    #[test]
    fn bom_wins_over_label() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("Sachs J".as_bytes());
        let decoded = decode_with_label(&bytes, Some("windows-1252"));
        assert_eq!(decoded.encoding_name(), "UTF-8");
        assert_eq!(decoded.text, "Sachs J");
    }

    #[test]
    fn label_is_honoured() {
        let decoded = decode_with_label(b"caf\xe9", Some(" ISO-8859-1 "));
        assert_eq!(decoded.text, "café");
    }

    #[test]
    fn unknown_label_falls_through() {
        let decoded = decode_with_label(b"plain", Some("x-not-a-charset"));
        assert_eq!(decoded.encoding_name(), "UTF-8");
    }

    #[test]
    fn cp1252_single_bytes() {
        assert_eq!(cp1252_char(0x92), '\u{2019}');
        assert_eq!(cp1252_char(0x96), '\u{2013}');
        assert_eq!(cp1252_char(0xe9), '\u{e9}');
        assert_eq!(cp1252_char(b'A'), 'A');
    }

    #[test]
    fn wrong_label_reports_errors() {
        let decoded = decode_with_label(b"r\xe9sum\xe9", Some("utf-8"));
        assert!(decoded.had_errors);
        assert!(decoded.text.contains(char::REPLACEMENT_CHARACTER));
    }
}
