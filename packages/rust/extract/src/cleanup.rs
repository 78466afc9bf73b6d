//! Whitespace normalization applied to every extracted document.

use std::sync::LazyLock;

use regex::Regex;

/// Normalize line endings and blank-line runs, then trim.
pub fn normalize_whitespace(text: &str) -> String {
    static TRAILING_WS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)[ \t\u{a0}]+$").expect("valid regex"));
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

    let unified = text.replace("\r\n", "\n").replace('\r', "\n").replace('\u{c}', "\n");
    let stripped = TRAILING_WS_RE.replace_all(&unified, "");
    let collapsed = MULTI_BLANK_RE.replace_all(&stripped, "\n\n");

    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_blank_runs() {
        let text = "CASE CCT 3/94\n\n\n\n\nJUDGMENT\n";
        assert_eq!(normalize_whitespace(text), "CASE CCT 3/94\n\nJUDGMENT");
    }

    #[test]
    fn unifies_line_endings_and_form_feeds() {
        let text = "page one  \r\n\u{c}page two\rend";
        assert_eq!(normalize_whitespace(text), "page one\n\npage two\nend");
    }

    #[test]
    fn keeps_leading_indentation() {
        let text = "  [1] Chaskalson P:\n    The issue";
        assert_eq!(normalize_whitespace(text), "[1] Chaskalson P:\n    The issue");
    }
}
