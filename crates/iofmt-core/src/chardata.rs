//! Deep character data: the rope the renderer emits and `~s` consumes.
//!
//! Rendered output is a sequence mixing scalar code points, string
//! chunks, encoded byte chunks, and nested sequences. Keeping the rope
//! shape defers flattening until a length or truncation query forces it,
//! so plain concatenation stays allocation-free.
//!
//! Byte chunks are decoded as UTF-8 where valid; a chunk that is not
//! valid UTF-8 degrades to a latin1 interpretation of its bytes. This
//! recovery is observable behaviour and must be preserved.

use unicode_segmentation::UnicodeSegmentation;

use crate::error::ErrorKind;
use crate::term::Term;

/// Character encoding governing string-like rendering and truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Code points are bytes; lengths are code-point counts.
    #[default]
    Latin1,
    /// UTF-8 byte chunks; lengths are grapheme-cluster counts.
    Unicode,
}

/// A possibly-deep character sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum CharData {
    Char(char),
    Str(String),
    /// Encoded bytes, decoded lazily (UTF-8 with latin1 fallback).
    Bytes(Vec<u8>),
    List(Vec<CharData>),
}

impl CharData {
    pub fn empty() -> CharData {
        CharData::Str(String::new())
    }

    /// Shape-directed length: 1 per scalar code point, code-point count
    /// for string chunks, grapheme-cluster count for byte chunks.
    pub fn char_count(&self) -> usize {
        match self {
            CharData::Char(_) => 1,
            CharData::Str(s) => s.chars().count(),
            CharData::Bytes(b) => decode_bytes(b).graphemes(true).count(),
            CharData::List(items) => items.iter().map(CharData::char_count).sum(),
        }
    }

    /// Flatten to a contiguous string.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.push_to(&mut out);
        out
    }

    pub fn push_to(&self, out: &mut String) {
        match self {
            CharData::Char(c) => out.push(*c),
            CharData::Str(s) => out.push_str(s),
            CharData::Bytes(b) => out.push_str(&decode_bytes(b)),
            CharData::List(items) => {
                for item in items {
                    item.push_to(out);
                }
            }
        }
    }
}

/// Decode a byte chunk: UTF-8 when valid, otherwise every byte becomes a
/// latin1 code point.
pub(crate) fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Interpret a term as deep character data for `~s`.
///
/// Accepts atoms, strings, binaries, and lists nesting those (ints inside
/// lists are code points). Under latin1, code points above 255 are a type
/// error and binaries are read byte-per-code-point; under unicode,
/// binaries are kept as byte chunks for grapheme-aware accounting.
pub fn from_term(term: &Term, enc: Encoding) -> Result<CharData, ErrorKind> {
    match term {
        Term::Atom(a) => text_chunk(a, enc),
        Term::Str(s) => text_chunk(s, enc),
        Term::Binary(b) => match enc {
            Encoding::Latin1 => Ok(CharData::Str(b.iter().map(|&x| x as char).collect())),
            Encoding::Unicode => Ok(CharData::Bytes(b.clone())),
        },
        Term::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(match item {
                    Term::Int(cp) => CharData::Char(codepoint(*cp, enc)?),
                    other => from_term(other, enc)?,
                });
            }
            Ok(CharData::List(out))
        }
        other => Err(ErrorKind::BadArgType {
            expected: "string data",
            got: other.type_name(),
        }),
    }
}

fn text_chunk(s: &str, enc: Encoding) -> Result<CharData, ErrorKind> {
    if enc == Encoding::Latin1 && s.chars().any(|c| c as u32 > 255) {
        return Err(ErrorKind::BadArgType {
            expected: "latin1 string data",
            got: "string",
        });
    }
    Ok(CharData::Str(s.to_string()))
}

fn codepoint(cp: i128, enc: Encoding) -> Result<char, ErrorKind> {
    let limit = match enc {
        Encoding::Latin1 => 255,
        Encoding::Unicode => 0x10FFFF,
    };
    u32::try_from(cp)
        .ok()
        .filter(|&c| i128::from(c) <= limit)
        .and_then(char::from_u32)
        .ok_or(ErrorKind::BadArgType {
            expected: "code point",
            got: "integer",
        })
}

/// Keep the first `n` characters: code points under latin1, grapheme
/// clusters under unicode. The result is a flat chunk.
pub fn truncate(data: &CharData, n: usize, enc: Encoding) -> CharData {
    let flat = data.flatten();
    let kept: String = match enc {
        Encoding::Latin1 => flat.chars().take(n).collect(),
        Encoding::Unicode => flat.graphemes(true).take(n).flat_map(str::chars).collect(),
    };
    CharData::Str(kept)
}

/// Bound `data` to `limit` characters, marking truncation with `...`.
///
/// A remainder of up to three characters is emitted verbatim instead:
/// the ellipsis would not make the output any shorter.
pub fn ellipsise(data: CharData, limit: usize, enc: Encoding) -> CharData {
    let len = data.char_count();
    let keep = limit.saturating_sub(3);
    if len <= keep + 3 {
        return data;
    }
    CharData::List(vec![
        truncate(&data, keep, enc),
        CharData::Str("...".to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_one_per_scalar() {
        assert_eq!(CharData::Char('x').char_count(), 1);
    }

    #[test]
    fn count_strings_by_code_point() {
        // A combining acute: two code points, one grapheme.
        assert_eq!(CharData::Str("e\u{301}".to_string()).char_count(), 2);
    }

    #[test]
    fn count_bytes_by_grapheme() {
        assert_eq!(CharData::Bytes("e\u{301}".as_bytes().to_vec()).char_count(), 1);
        assert_eq!(CharData::Bytes("café".as_bytes().to_vec()).char_count(), 4);
    }

    #[test]
    fn invalid_utf8_degrades_to_latin1() {
        let data = CharData::Bytes(vec![0xFF, b'a']);
        assert_eq!(data.flatten(), "\u{FF}a");
        assert_eq!(data.char_count(), 2);
    }

    #[test]
    fn nested_lists_flatten_in_order() {
        let data = CharData::List(vec![
            CharData::Str("ab".to_string()),
            CharData::List(vec![CharData::Char('c'), CharData::Bytes(vec![b'd'])]),
        ]);
        assert_eq!(data.flatten(), "abcd");
        assert_eq!(data.char_count(), 4);
    }

    #[test]
    fn from_term_accepts_atoms_and_deep_lists() {
        let term = Term::List(vec![
            Term::Int(104),
            Term::str("i"),
            Term::Binary(vec![b'!']),
        ]);
        let data = from_term(&term, Encoding::Latin1).unwrap();
        assert_eq!(data.flatten(), "hi!");
    }

    #[test]
    fn latin1_rejects_wide_code_points() {
        let err = from_term(&Term::str("€"), Encoding::Latin1).unwrap_err();
        assert!(matches!(err, ErrorKind::BadArgType { .. }));
        assert!(from_term(&Term::str("€"), Encoding::Unicode).is_ok());
    }

    #[test]
    fn truncate_unicode_slices_graphemes() {
        let data = CharData::Str("e\u{301}xy".to_string());
        assert_eq!(truncate(&data, 2, Encoding::Unicode).flatten(), "e\u{301}x");
        assert_eq!(truncate(&data, 2, Encoding::Latin1).flatten(), "e\u{301}");
    }

    #[test]
    fn ellipsise_marks_long_output() {
        let data = CharData::Str("abcdefghijk".to_string());
        let out = ellipsise(data, 10, Encoding::Latin1);
        assert_eq!(out.flatten(), "abcdefg...");
        assert_eq!(out.char_count(), 10);
    }

    #[test]
    fn ellipsise_near_fit_is_verbatim() {
        // Remainder of three or fewer characters: no ellipsis.
        let data = CharData::Str("ok".to_string());
        assert_eq!(ellipsise(data, 2, Encoding::Latin1).flatten(), "ok");
        let data = CharData::Str("abcdefghij".to_string());
        assert_eq!(ellipsise(data, 10, Encoding::Latin1).flatten(), "abcdefghij");
    }
}
