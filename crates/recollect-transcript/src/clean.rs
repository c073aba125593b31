use regex::Regex;
use std::sync::LazyLock;

const BOM: char = '\u{feff}';

/// Leading `<digits>→` line-number prefix left behind by some viewers.
/// The second alternative is the same arrow read back through cp1252.
static LINE_NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+(?:→|â†’)").unwrap());

/// Normalize a buffered turn into message content.
///
/// Collapses whitespace runs to single spaces, strips a leading byte-order
/// mark and line-number prefix, and trims. An empty result means the turn
/// carries no text and must not be emitted.
pub fn clean_message(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let without_bom = collapsed.trim_start_matches(BOM);
    let without_prefix = LINE_NUMBER_PREFIX.replace(without_bom, "");
    without_prefix.trim().to_string()
}

/// Return the largest byte index `<= i` that is a valid char boundary.
fn floor_char_boundary(s: &str, i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    let mut pos = i;
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Shorten `text` to at most `max_bytes` for console previews.
pub fn preview(text: &str, max_bytes: usize) -> String {
    if text.len() > max_bytes {
        let end = floor_char_boundary(text, max_bytes);
        format!("{}...", &text[..end])
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(clean_message("a  b\n\n  c\td"), "a b c d");
    }

    #[test]
    fn strips_leading_bom() {
        assert_eq!(clean_message("\u{feff}Hello there"), "Hello there");
    }

    #[test]
    fn strips_line_number_prefix() {
        assert_eq!(clean_message("  12→That is a fine point"), "That is a fine point");
        assert_eq!(clean_message("7â†’ continued"), "continued");
    }

    #[test]
    fn keeps_digits_without_arrow() {
        assert_eq!(clean_message("42 is the answer"), "42 is the answer");
    }

    #[test]
    fn prefix_only_at_start() {
        assert_eq!(clean_message("see 3→4"), "see 3→4");
    }

    #[test]
    fn whitespace_only_cleans_to_empty() {
        assert_eq!(clean_message(" \n\t \n"), "");
        assert_eq!(clean_message("\u{feff}"), "");
    }

    #[test]
    fn preview_respects_char_boundary() {
        let s = "ab後cd";
        assert_eq!(preview(s, 3), "ab...");
        assert_eq!(preview(s, 100), s);
    }

    #[test]
    fn floor_char_boundary_basic() {
        assert_eq!(floor_char_boundary("hello", 3), 3);
        assert_eq!(floor_char_boundary("hello", 100), 5);
        let s = "ab後cd";
        assert_eq!(floor_char_boundary(s, 4), 2);
        assert_eq!(floor_char_boundary(s, 5), 5);
    }
}
