//! Text normalization for extracted text.
//!
//! Strips the control bytes that PDF and Office extraction leave behind and
//! flattens whitespace. This is not HTML or SQL escaping.

use once_cell::sync::Lazy;
use regex::Regex;

static CONTROL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Cc}").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize text; an absent input stays absent.
pub fn sanitize(text: Option<&str>) -> Option<String> {
    text.map(sanitize_str)
}

/// Normalize text in four ordered steps: drop NULs, turn other control
/// characters into spaces, collapse whitespace runs, trim.
pub fn sanitize_str(text: &str) -> String {
    let without_nul = text.replace('\0', "");
    let spaced = CONTROL.replace_all(&without_nul, " ");
    let collapsed = WHITESPACE.replace_all(&spaced, " ");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nul_is_removed_not_spaced() {
        assert_eq!(sanitize_str("a\u{0000}b\tc\n\nd"), "ab c d");
        assert_eq!(sanitize_str("a \u{0000}b\tc\n\nd"), "a b c d");
    }

    #[test]
    fn test_trims() {
        assert_eq!(sanitize(Some("  x  ")).as_deref(), Some("x"));
    }

    #[test]
    fn test_absent_stays_absent() {
        assert_eq!(sanitize(None), None);
    }

    #[test]
    fn test_control_bytes_become_spaces() {
        assert_eq!(sanitize_str("page\u{000C}break\u{0007}bell"), "page break bell");
        assert_eq!(sanitize_str("one\r\ntwo"), "one two");
    }

    #[test]
    fn test_unicode_whitespace_collapses() {
        assert_eq!(sanitize_str("a\u{00A0}\u{2003} b"), "a b");
    }

    #[test]
    fn test_idempotent() {
        let once = sanitize_str(" \u{0001}messy \t text\u{0000}  ");
        assert_eq!(sanitize_str(&once), once);
        assert_eq!(once, "messy text");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(sanitize_str(""), "");
        assert_eq!(sanitize_str("\u{0000}\n\t "), "");
    }
}
