//! Wrapping and boundary helpers for the text area. All offsets are byte
//! offsets into the buffer and always land on a char boundary.

use std::ops::Range;

/// Border plus one column of slack on each side.
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top and bottom border.
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Distance from the area edge to the first text cell.
pub(super) const BORDER_OFFSET: u16 = 1;

fn wrap_options(inner_width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(inner_width as usize)
        .break_words(true)
        .wrap_algorithm(textwrap::WrapAlgorithm::FirstFit)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

/// Text columns left inside an area `content_width` wide (0 if too narrow).
pub(super) fn inner_width(content_width: u16) -> u16 {
    content_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Byte range of every wrapped row of `text`, in order. Ranges exclude the
/// newline and any whitespace textwrap trims at a row break. An empty logical
/// line is an empty range at its position.
pub(super) fn wrapped_rows(text: &str, width: u16) -> Vec<Range<usize>> {
    let mut rows = Vec::new();
    let mut line_start = 0;

    for line in text.split('\n') {
        let mut search_from = 0;
        for segment in textwrap::wrap(line, wrap_options(width.max(1))) {
            let offset = line[search_from..]
                .find(segment.as_ref())
                .map_or(search_from, |i| search_from + i);
            let end = (offset + segment.len()).min(line.len());
            rows.push(line_start + offset..line_start + end);
            search_from = end;
        }
        if rows.last().is_none_or(|r| r.start < line_start) {
            rows.push(line_start..line_start);
        }
        line_start += line.len() + 1;
    }

    rows
}

pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos].char_indices().last().map_or(0, |(i, _)| i)
}

pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len(), |c| pos + c.len_utf8())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// readline `backward-word`: skip separators, then the word before them.
pub(super) fn prev_word_boundary(text: &str, pos: usize) -> usize {
    let before = &text[..pos];
    let word_end = before.trim_end_matches(|c| !is_word_char(c)).len();
    before[..word_end].trim_end_matches(is_word_char).len()
}

/// readline `forward-word`: skip separators, then the word after them.
pub(super) fn next_word_boundary(text: &str, pos: usize) -> usize {
    let after = &text[pos..];
    let word_start = after.trim_start_matches(|c| !is_word_char(c));
    let rest = word_start.trim_start_matches(is_word_char);
    text.len() - rest.len()
}
