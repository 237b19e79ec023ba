//! Shared utility functions.

/// Truncate a string to at most `max_bytes` without splitting a UTF-8
/// character.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Single-line preview for log fields: newlines flattened, long text cut
/// with a trailing `…`.
pub fn preview(s: &str, max_bytes: usize) -> String {
    let flat = s.replace(['\n', '\r'], " ");
    let cut = truncate_str(&flat, max_bytes);
    if cut.len() < flat.len() {
        format!("{}…", cut)
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_ascii() {
        assert_eq!(truncate_str("bitcoin price", 7), "bitcoin");
        assert_eq!(truncate_str("eth", 10), "eth");
        assert_eq!(truncate_str("", 10), "");
    }

    #[test]
    fn truncate_backs_up_to_char_boundary() {
        // '€' is 3 bytes
        let s = "€€";
        assert_eq!(truncate_str(s, 4), "€");
        assert_eq!(truncate_str(s, 6), "€€");
    }

    #[test]
    fn preview_flattens_and_marks_cut() {
        assert_eq!(preview("line one\nline two", 100), "line one line two");
        assert_eq!(preview("{\"price\":67000}", 8), "{\"price\"…");
    }
}
