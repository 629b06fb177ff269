/// Output normalization for answer comparison
///
/// Line endings are unified to `\n` and surrounding whitespace is trimmed.
/// Interior whitespace is significant.
pub fn normalize_output(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// Exact equality after normalizing both sides
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize_output(actual) == normalize_output(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_newline_is_ignored() {
        assert!(outputs_match("8\n", "8"));
        assert!(outputs_match("  8  \n\n", "8"));
    }

    #[test]
    fn test_line_endings_are_unified() {
        assert!(outputs_match("1\r\n2\r\n", "1\n2"));
        assert!(outputs_match("1\r2", "1\n2"));
        assert_eq!(normalize_output("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for sample in ["", "8\n", " a b \r\n", "\r\r\n x\r\n\r\n", "line1\nline2\n\n"] {
            let once = normalize_output(sample);
            assert_eq!(normalize_output(&once), once);
        }
    }

    #[test]
    fn test_interior_whitespace_matters() {
        assert!(!outputs_match("1 2", "1  2"));
        assert!(!outputs_match("1\n\n2", "1\n2"));
        assert!(!outputs_match("8", "9"));
    }
}
