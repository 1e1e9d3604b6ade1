//! String utility functions for safe UTF-8 text truncation
//!
//! Counting characters rather than slicing bytes avoids panics when a cut
//! point falls inside a multi-byte UTF-8 character.

/// Marker appended to tool results cut at the configured length.
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// Truncate a string to at most `max_chars` UTF-8 characters.
///
/// Returns the input unchanged when it is short enough. No marker is added;
/// this is used for inbound messages where the wire contract is an exact
/// character cap.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

/// Truncate a string to at most `max_chars` characters, appending
/// [`TRUNCATION_MARKER`] when anything was cut.
pub fn truncate_with_marker(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut truncated: String = s.chars().take(max_chars).collect();
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_input() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_chars_exact_length() {
        let long = "x".repeat(600);
        let truncated = truncate_chars(&long, 500);
        assert_eq!(truncated.chars().count(), 500);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        // 3 bytes per character; must not panic on a byte boundary
        let text = "こんにちは世界";
        assert_eq!(truncate_chars(text, 3), "こんに");
    }

    #[test]
    fn test_truncate_with_marker_short_input() {
        assert_eq!(truncate_with_marker("result", 1000), "result");
    }

    #[test]
    fn test_truncate_with_marker_suffix() {
        let long = "r".repeat(1200);
        let truncated = truncate_with_marker(&long, 1000);
        assert!(truncated.ends_with("... (truncated)"));
        assert_eq!(truncated.chars().count(), 1000 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn test_truncate_with_marker_boundary() {
        let exact = "r".repeat(1000);
        assert_eq!(truncate_with_marker(&exact, 1000), exact);
    }
}
