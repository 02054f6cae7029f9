//! Utility functions and helpers.

pub mod http;
pub mod time;

use unicode_segmentation::UnicodeSegmentation;

/// Truncate text to at most `max` graphemes, ending in `…` when cut.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = graphemes[..max - 1].concat();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_graphemes("SISMO", 10), "SISMO");
        assert_eq!(truncate_graphemes("SISMO", 5), "SISMO");
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate_graphemes("SISMO grande", 7), "SISMO…");
        assert_eq!(truncate_graphemes("abcdef", 4), "abc…");
    }

    #[test]
    fn test_truncate_keeps_graphemes_whole() {
        let text = "Mérida Mérida";
        let cut = truncate_graphemes(text, 4);
        assert_eq!(cut, "Mér…");
        assert_eq!(cut.graphemes(true).count(), 4);
    }

    #[test]
    fn test_truncate_zero() {
        assert_eq!(truncate_graphemes("abc", 0), "");
    }
}
