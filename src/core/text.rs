//! Whitespace normalisation shared by every text acquisition path.

use regex::Regex;
use std::sync::OnceLock;

static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();

fn whitespace_run() -> &'static Regex {
    WHITESPACE_RUN.get_or_init(|| Regex::new(r"\s+").expect("static whitespace pattern"))
}

/// Collapse every whitespace run (spaces, tabs, newlines) to a single space
/// and trim both ends.
pub fn normalize(text: &str) -> String {
    whitespace_run().replace_all(text, " ").trim().to_string()
}

/// `normalize`, with an all-whitespace input reported as absent.
pub fn normalize_non_empty(text: &str) -> Option<String> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clipboard_sample() {
        assert_eq!(normalize("Hello\n\tworld  !"), "Hello world !");
    }

    #[test]
    fn test_trims_ends() {
        assert_eq!(normalize("  \n padded \t"), "padded");
    }

    #[test]
    fn test_crlf_and_tabs() {
        assert_eq!(normalize("one\r\ntwo\tthree"), "one two three");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
        assert_eq!(normalize_non_empty(" \t\n "), None);
        assert_eq!(normalize_non_empty(" a "), Some("a".to_string()));
    }

    #[test]
    fn test_idempotent_and_clean() {
        let samples = [
            "",
            "plain",
            "  lead",
            "trail  ",
            "a\tb",
            "a\n\nb",
            "mixed \t\n  runs\r\n of   space",
            "\u{00a0}non-breaking\u{00a0} space",
            "Привет,\n\tмир  !",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
            assert!(!once.contains('\t'), "tab left in {:?}", once);
            assert!(!once.contains('\n'), "newline left in {:?}", once);
            assert!(!once.contains("  "), "double space left in {:?}", once);
            assert_eq!(once.trim(), once);
        }
    }
}
