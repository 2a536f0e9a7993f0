//! Text utilities: padding, field adjustment, column accounting.

use unicode_segmentation::UnicodeSegmentation;

use crate::chardata::{decode_bytes, CharData};
use crate::parse::Adjust;

/// Repeat `c` `n` times.
pub fn chars(c: char, n: usize) -> String {
    std::iter::repeat_n(c, n).collect()
}

/// Concatenate payload and padding in field order: payload first when
/// left-adjusted, padding first when right-adjusted.
pub fn adjust(payload: CharData, padding: String, adj: Adjust) -> CharData {
    if padding.is_empty() {
        return payload;
    }
    match adj {
        Adjust::Left => CharData::List(vec![payload, CharData::Str(padding)]),
        Adjust::Right => CharData::List(vec![CharData::Str(padding), payload]),
    }
}

/// Advance a column counter through `text`.
///
/// `\n` resets the column to 0, `\t` advances to the next multiple of 8,
/// any other grapheme advances by one.
pub fn indent_column(text: &str, start: usize) -> usize {
    let mut col = start;
    for g in text.graphemes(true) {
        // CRLF is a single grapheme cluster; any cluster carrying a
        // newline resets the column.
        if g.contains('\n') {
            col = 0;
        } else if g == "\t" {
            col = next_tab_stop(col);
        } else {
            col += 1;
        }
    }
    col
}

/// Column walk over a rope without flattening it first.
pub(crate) fn indent_through(data: &CharData, start: usize) -> usize {
    match data {
        CharData::Char('\n') => 0,
        CharData::Char('\t') => next_tab_stop(start),
        CharData::Char(_) => start + 1,
        CharData::Str(s) => indent_column(s, start),
        CharData::Bytes(b) => indent_column(&decode_bytes(b), start),
        CharData::List(items) => items.iter().fold(start, |col, item| indent_through(item, col)),
    }
}

fn next_tab_stop(col: usize) -> usize {
    ((col + 8) / 8) * 8
}

/// Bound `s` to `limit` code points, appending `...` when truncated.
/// A remainder of up to three code points is emitted verbatim instead.
pub fn ellipsise(s: &str, limit: usize) -> String {
    let len = s.chars().count();
    let keep = limit.saturating_sub(3);
    if len <= keep + 3 {
        return s.to_string();
    }
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Base-conversion digits come out uppercase; fold for the lowercase
/// control characters.
pub fn cond_lowercase(s: String, lower: bool) -> String {
    if lower {
        s.to_lowercase()
    } else {
        s
    }
}
