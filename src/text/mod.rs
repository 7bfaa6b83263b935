//! # Text Segmentation and Measurement
//!
//! Whitespace collapsing, UAX #14 break opportunities, and width
//! measurement against the resolved style's font. The line builder works on
//! the segments produced here: each segment is a word plus the whitespace
//! that follows it, and a line may only wrap between segments.

use crate::font::{Face, FontContext};
use crate::style::ResolvedStyle;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Collapse every run of whitespace (spaces, tabs, newlines) into a single
/// space. Leading and trailing whitespace is kept as one space so adjacent
/// inline nodes still separate correctly.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() && ch != '\u{00A0}' {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Split text into segments that end at a break opportunity.
///
/// `"Sits on the line"` becomes `["Sits ", "on ", "the ", "line"]`.
pub fn segments(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (offset, opportunity) in linebreaks(text) {
        // The final entry is always the mandatory break at end of text.
        if offset == start {
            continue;
        }
        if offset < text.len() || matches!(opportunity, BreakOpportunity::Mandatory) {
            out.push(&text[start..offset]);
            start = offset;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Split a segment into its visible part and trailing whitespace.
pub fn split_trailing_whitespace(segment: &str) -> (&str, &str) {
    let trimmed = segment.trim_end_matches(|c: char| c.is_whitespace() && c != '\u{00A0}');
    segment.split_at(trimmed.len())
}

/// Width of `text` in the style's font.
pub fn measure(fonts: &FontContext, text: &str, style: &ResolvedStyle) -> f64 {
    face(fonts, style).measure(text, style.font_size)
}

/// The face a style measures with.
pub fn face<'a>(fonts: &'a FontContext, style: &ResolvedStyle) -> Face<'a> {
    fonts.face(&style.font_family, style.font_weight, style.is_italic())
}

/// The longest prefix of `word` that fits in `available`, as a byte index.
/// Always takes at least one character so layout makes progress.
pub fn fit_prefix(fonts: &FontContext, word: &str, style: &ResolvedStyle, available: f64) -> usize {
    let face = face(fonts, style);
    let mut width = 0.0;
    let mut end = 0;
    for (idx, ch) in word.char_indices() {
        let w = face.advance(ch, style.font_size);
        if end > 0 && width + w > available {
            break;
        }
        width += w;
        end = idx + ch.len_utf8();
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(collapse_whitespace("a  b\n\t c"), "a b c");
        assert_eq!(collapse_whitespace("  lead"), " lead");
        assert_eq!(collapse_whitespace("trail \r\n"), "trail ");
    }

    #[test]
    fn segments_end_after_spaces() {
        assert_eq!(
            segments("Sits on the first line"),
            vec!["Sits ", "on ", "the ", "first ", "line"]
        );
    }

    #[test]
    fn segments_keep_trailing_space() {
        assert_eq!(segments("before "), vec!["before "]);
        assert_eq!(segments(""), Vec::<&str>::new());
    }

    #[test]
    fn segments_break_after_hyphens() {
        assert_eq!(segments("well-known"), vec!["well-", "known"]);
    }

    #[test]
    fn splits_trailing_whitespace() {
        assert_eq!(split_trailing_whitespace("word  "), ("word", "  "));
        assert_eq!(split_trailing_whitespace("word"), ("word", ""));
    }

    #[test]
    fn measures_with_style_font() {
        let fonts = FontContext::new();
        let style = ResolvedStyle::default();
        // 'a' is 556/1000 at 12pt
        assert!((measure(&fonts, "a", &style) - 6.672).abs() < 1e-9);
    }

    #[test]
    fn fit_prefix_takes_at_least_one_char() {
        let fonts = FontContext::new();
        let style = ResolvedStyle::default();
        assert_eq!(fit_prefix(&fonts, "abc", &style, 0.0), 1);
        assert_eq!(fit_prefix(&fonts, "abc", &style, 14.0), 2);
        assert_eq!(fit_prefix(&fonts, "abc", &style, 100.0), 3);
    }
}
