//! Plain-text reader for RTF judgements and media summaries.
//!
//! Handles the subset of RTF that word processors emit for court documents:
//! groups, paragraph/tab control words, `\'hh` and `\uN` escapes, and
//! ignorable destinations (font tables, stylesheets, pictures, ...).

use crate::encoding::cp1252_char;
use crate::{ExtractFailure, TextExtractor};

/// Destinations whose content is never document text.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "fonttbl",
    "colortbl",
    "stylesheet",
    "info",
    "pict",
    "object",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "fldinst",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "generator",
    "xmlnstbl",
    "themedata",
    "colorschememapping",
    "datastore",
    "latentstyles",
    "filetbl",
    "revtbl",
    "bkmkstart",
    "bkmkend",
];

/// Extractor for `.rtf` files (or anything starting with `{\rtf`).
pub struct RtfExtractor;

impl TextExtractor for RtfExtractor {
    fn detect(&self, ext: &str, head: &[u8]) -> bool {
        ext == "rtf" || head.starts_with(b"{\\rtf")
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractFailure> {
        rtf_to_text(bytes)
    }

    fn name(&self) -> &str {
        "rtf"
    }
}

#[derive(Debug, Clone, Copy)]
struct GroupState {
    /// Inside an ignorable destination.
    skip: bool,
    /// Fallback characters that follow each `\uN` (set by `\ucN`).
    uc: usize,
}

impl Default for GroupState {
    fn default() -> Self {
        Self { skip: false, uc: 1 }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    state: GroupState,
    stack: Vec<GroupState>,
    /// Fallback characters still to drop after a `\uN`.
    pending_skip: usize,
    out: String,
}

/// Convert an RTF document to plain text.
pub fn rtf_to_text(bytes: &[u8]) -> Result<String, ExtractFailure> {
    if !bytes.starts_with(b"{\\rtf") {
        return Err(ExtractFailure::new("missing {\\rtf header"));
    }

    let mut reader = Reader {
        bytes,
        pos: 0,
        state: GroupState::default(),
        stack: Vec::new(),
        pending_skip: 0,
        out: String::with_capacity(bytes.len() / 2),
    };
    reader.run();
    Ok(reader.out)
}

impl Reader<'_> {
    fn run(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            self.pos += 1;
            match b {
                b'{' => self.stack.push(self.state),
                b'}' => {
                    if let Some(prev) = self.stack.pop() {
                        self.state = prev;
                    }
                    self.pending_skip = 0;
                }
                b'\\' => self.control(),
                b'\r' | b'\n' => {}
                _ => self.emit(cp1252_char(b)),
            }
        }
    }

    fn control(&mut self) {
        let Some(&c) = self.bytes.get(self.pos) else {
            return;
        };

        if c.is_ascii_alphabetic() {
            self.control_word();
            return;
        }

        self.pos += 1;
        match c {
            b'\'' => {
                if let Some(byte) = self.hex_byte() {
                    self.emit(cp1252_char(byte));
                }
            }
            b'*' => self.state.skip = true,
            b'\\' | b'{' | b'}' => self.emit(c as char),
            b'~' => self.emit(' '),
            b'_' => self.emit('-'),
            b'\r' | b'\n' => self.emit_raw('\n'),
            _ => {}
        }
    }

    fn control_word(&mut self) {
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_alphabetic) {
            self.pos += 1;
        }
        let word = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();

        let param = self.numeric_param();

        // A single space delimits the control word and is not text.
        if self.bytes.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }

        match word.as_str() {
            "par" | "line" | "sect" | "page" | "row" => self.emit_raw('\n'),
            "tab" | "cell" => self.emit_raw('\t'),
            "emdash" => self.emit('\u{2014}'),
            "endash" => self.emit('\u{2013}'),
            "lquote" => self.emit('\u{2018}'),
            "rquote" => self.emit('\u{2019}'),
            "ldblquote" => self.emit('\u{201c}'),
            "rdblquote" => self.emit('\u{201d}'),
            "bullet" => self.emit('\u{2022}'),
            "uc" => self.state.uc = param.map_or(1, |n| n.max(0) as usize),
            "u" => {
                if let Some(n) = param {
                    let code = if n < 0 { n + 65536 } else { n };
                    let ch = u32::try_from(code)
                        .ok()
                        .and_then(char::from_u32)
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    self.emit(ch);
                    self.pending_skip = self.state.uc;
                }
            }
            w if SKIPPED_DESTINATIONS.contains(&w) => self.state.skip = true,
            _ => {}
        }
    }

    fn numeric_param(&mut self) -> Option<i32> {
        let start = self.pos;
        if self.bytes.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        std::str::from_utf8(&self.bytes[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
    }

    fn hex_byte(&mut self) -> Option<u8> {
        let digits = self.bytes.get(self.pos..self.pos + 2)?;
        self.pos += 2;
        std::str::from_utf8(digits)
            .ok()
            .and_then(|s| u8::from_str_radix(s, 16).ok())
    }

    /// Emit a text character, honouring `\uN` fallback skipping.
    fn emit(&mut self, ch: char) {
        if self.state.skip {
            return;
        }
        if self.pending_skip > 0 {
            self.pending_skip -= 1;
            return;
        }
        self.out.push(ch);
    }

    /// Emit structural whitespace; never consumed as a `\uN` fallback.
    fn emit_raw(&mut self, ch: char) {
        if !self.state.skip {
            self.out.push(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paragraphs() {
        let rtf = br"{\rtf1\ansi\deff0 {\fonttbl {\f0 Times New Roman;}}\f0\fs24 CONSTITUTIONAL COURT\par JUDGMENT\par}";
        let text = rtf_to_text(rtf).unwrap();
        assert_eq!(text, "CONSTITUTIONAL COURT\nJUDGMENT\n");
    }

    #[test]
    fn skips_destinations_and_starred_groups() {
        let rtf = br"{\rtf1{\colortbl;\red0\green0\blue0;}{\*\generator Msftedit;}{\info{\title Case}}Text{\*\bkmkstart x} here\par}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "Text here\n");
    }

    #[test]
    fn hex_escapes_are_cp1252() {
        let rtf = br"{\rtf1 \'93Ubuntu\'94 r\'e9sum\'e9}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "\u{201c}Ubuntu\u{201d} r\u{e9}sum\u{e9}");
    }

    #[test]
    fn unicode_escape_drops_fallback() {
        let rtf = br"{\rtf1 \u8212?dash \uc2\u8220\'93\'93quoted}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "\u{2014}dash \u{201c}quoted");
    }

    #[test]
    fn negative_unicode_values_wrap() {
        // \u-3913 is U+F0B7 (a Symbol-font bullet).
        let rtf = br"{\rtf1 \u-3913?x}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "\u{f0b7}x");
    }

    #[test]
    fn escaped_braces_and_tabs() {
        let rtf = br"{\rtf1 a\{b\}c\\d\tab e}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "a{b}c\\d\te");
    }

    #[test]
    fn uc_is_scoped_to_group() {
        let rtf = br"{\rtf1 {\uc0\u8212}\u8212?x}";
        assert_eq!(rtf_to_text(rtf).unwrap(), "\u{2014}\u{2014}x");
    }

    #[test]
    fn rejects_non_rtf() {
        assert!(rtf_to_text(b"%PDF-1.4").is_err());
    }

    #[test]
    fn detects_by_extension_or_magic() {
        assert!(RtfExtractor.detect("rtf", b""));
        assert!(RtfExtractor.detect("doc", b"{\\rtf1\\ansi"));
        assert!(!RtfExtractor.detect("pdf", b"%PDF-1.4"));
    }
}
