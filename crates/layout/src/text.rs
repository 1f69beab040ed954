//! Text node layout (`spec.md` §4.7): whitespace trimming, the optional
//! `::first-letter` split, and line breaking against the space left by
//! the current line and by subsequent lines. The inline formatter
//! (`inline.rs`) calls into this for every `TEXT` item it constructs.

use crate::{float_ctx::FloatContext, oracle::MeasureTextOracle, pixels::CSSPixels, style::Clear};

/// Collapse runs of ASCII/Unicode whitespace into a single space, the
/// way `white-space: normal` text is rendered. Callers decide whether to
/// also trim the leading/trailing edge.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

/// `spec.md` §4.7: "Trim leading/trailing whitespace when the text node
/// is the first/last content child of a block-level parent; inline
/// parents preserve surrounding whitespace."
#[must_use]
pub fn trim_for_position(text: &str, is_first_child: bool, is_last_child: bool, parent_is_block: bool) -> String {
    let collapsed = collapse_whitespace(text);
    if !parent_is_block {
        return collapsed;
    }
    let mut s = collapsed.as_str();
    if is_first_child {
        s = s.trim_start_matches(' ');
    }
    if is_last_child {
        s = s.trim_end_matches(' ');
    }
    s.to_string()
}

/// Split off the first grapheme-ish unit of `text` for `::first-letter`.
/// Leading whitespace is skipped (CSS 2.1 says the first letter ignores
/// preceding punctuation/whitespace, simplified here to whitespace only,
/// which covers the overwhelming majority of real documents).
#[must_use]
pub fn split_first_letter(text: &str) -> Option<(&str, &str)> {
    let trimmed_start = text.len() - text.trim_start().len();
    let rest = &text[trimmed_start..];
    let mut chars = rest.char_indices();
    let (_, first_char) = chars.next()?;
    let next_boundary = chars.next().map_or(rest.len(), |(i, _)| i);
    Some((&rest[..next_boundary], &rest[next_boundary..]))
}

/// One line of broken text, ready for the inline formatter to turn into
/// a box.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub width: CSSPixels,
}

/// Break `text` across however many lines are needed, given the space
/// left on the current line (`first_line_max`) and the full available
/// width on every line after it (`subsequent_max`). If the text (or even
/// its first word) does not fit beside active floats at all, CSS 2.1
/// §9.5 says to clear before breaking — callers pass a [`FloatContext`]
/// and the current Y so that rule can be applied here rather than
/// duplicated at every call site.
pub fn break_text_with_clearing(
    text: &str,
    font_size: CSSPixels,
    bold: bool,
    first_line_max: CSSPixels,
    subsequent_max: CSSPixels,
    oracle: &dyn MeasureTextOracle,
    floats: &FloatContext,
    current_y: CSSPixels,
) -> (Vec<TextLine>, CSSPixels) {
    let first_word = oracle.first_word(text);
    let (first_word_width, _) = oracle.measure_text(first_word, font_size, bold);

    let (effective_first_max, effective_y) = if first_word_width > first_line_max && first_line_max < subsequent_max
    {
        let cleared_y = floats.clear_y(Clear::Both, current_y);
        (subsequent_max, cleared_y)
    } else {
        (first_line_max, current_y)
    };

    let lines = oracle
        .break_text(text, font_size, bold, effective_first_max, subsequent_max)
        .into_iter()
        .map(|line| {
            let (width, _) = oracle.measure_text(&line, font_size, bold);
            TextLine { text: line, width }
        })
        .collect();

    (lines, effective_y)
}
