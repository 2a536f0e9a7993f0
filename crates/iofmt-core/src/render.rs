//! Two-pass rendering of a parsed directive sequence.
//!
//! The first pass renders every small (bounded-output) directive in
//! place and tallies the big ones; the second pass renders each big
//! directive under a per-directive character budget carved out of the
//! caller's chars limit, tracking the indentation column for the pretty
//! printer as it goes.
//!
//! The budget is recomputed before every big directive rather than fixed
//! up front: an earlier directive that under-uses its share leaves the
//! surplus to the ones after it.

use log::trace;

use crate::chardata::{self, CharData, Encoding};
use crate::error::{ErrorKind, FormatError};
use crate::number;
use crate::parse::{Adjust, Directive, Spanned, Token};
use crate::text::{self, adjust, chars};
use crate::writer::{PrettyOptions, PrettyPrinter, TermWriter, WriteOptions};

/// Big-directive counts and cumulative small-output length from the
/// first pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// Number of `~p`/`~P` directives.
    pub p: usize,
    /// Reserved: `~s` currently counts into `w`, never here.
    pub s: usize,
    /// Number of `~w`/`~W`/`~s` directives.
    pub w: usize,
    /// Character length of all literal and small-directive output.
    pub other: usize,
}

enum Piece {
    Text(CharData),
    Big { pos: usize, dir: Directive },
}

/// Render a scanned token sequence to character data.
pub(crate) fn build(
    tokens: Vec<Spanned>,
    chars_limit: i64,
    writer: &dyn TermWriter,
    pretty: &dyn PrettyPrinter,
) -> Result<CharData, FormatError> {
    let (pieces, counts) = build_small(tokens)?;
    trace!(
        "first pass: {} pretty + {} write directives, {} fixed chars",
        counts.p,
        counts.w,
        counts.other
    );
    build_limited(pieces, counts, chars_limit, writer, pretty)
}

/// First pass: resolve small directives, count big ones.
fn build_small(tokens: Vec<Spanned>) -> Result<(Vec<Piece>, Counts), FormatError> {
    let mut counts = Counts::default();
    let mut pieces = Vec::with_capacity(tokens.len());
    for Spanned { pos, token } in tokens {
        match token {
            Token::Literal(s) => {
                counts.other += s.chars().count();
                pieces.push(Piece::Text(CharData::Str(s)));
            }
            Token::Directive(dir) => match dir.ctl {
                's' | 'w' | 'W' => {
                    counts.w += 1;
                    pieces.push(Piece::Big { pos, dir });
                }
                'p' | 'P' => {
                    counts.p += 1;
                    pieces.push(Piece::Big { pos, dir });
                }
                _ => {
                    let rendered =
                        control_small(&dir).map_err(|kind| FormatError::new(kind, pos))?;
                    counts.other += rendered.char_count();
                    pieces.push(Piece::Text(rendered));
                }
            },
        }
    }
    Ok((pieces, counts))
}

/// Second pass: render big directives under the shared budget.
///
/// `remaining / count` is each directive's share of what is left; the
/// share is unlimited (-1) when no chars limit is in force. Small output
/// passes through untouched — it was already charged against the limit
/// by the first pass.
fn build_limited(
    pieces: Vec<Piece>,
    counts: Counts,
    chars_limit: i64,
    writer: &dyn TermWriter,
    pretty: &dyn PrettyPrinter,
) -> Result<CharData, FormatError> {
    let mut remaining: i64 = if chars_limit < 0 {
        -1
    } else {
        (chars_limit - counts.other as i64).max(0)
    };
    let mut count = counts.p + counts.w;
    let mut pretty_left = counts.p;
    let mut column = 0usize;
    let mut out = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let rendered = match piece {
            Piece::Text(t) => t,
            Piece::Big { pos, dir } => {
                let budget = if remaining < 0 {
                    -1
                } else {
                    remaining / count as i64
                };
                trace!("budget {budget} for ~{} ({count} big left)", dir.ctl);
                let s = control_limited(&dir, budget, column, writer, pretty)
                    .map_err(|kind| FormatError::new(kind, pos))?;
                if matches!(dir.ctl, 'p' | 'P') {
                    pretty_left -= 1;
                }
                count -= 1;
                if remaining >= 0 {
                    remaining = (remaining - s.char_count() as i64).max(0);
                }
                s
            }
        };
        // The column only matters while a pretty directive remains to
        // consume it.
        if pretty_left > 0 {
            column = text::indent_through(&rendered, column);
        }
        out.push(rendered);
    }
    Ok(CharData::List(out))
}

// ---------------------------------------------------------------------------
// Small directives
// ---------------------------------------------------------------------------

fn control_small(d: &Directive) -> Result<CharData, ErrorKind> {
    match d.ctl {
        'c' => {
            let cp = int_arg(d, 0)?;
            let c = match d.encoding {
                // Latin1 masks to 8 bits.
                Encoding::Latin1 => ((cp & 0xFF) as u8) as char,
                Encoding::Unicode => u32::try_from(cp)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(ErrorKind::BadArgType {
                        expected: "code point",
                        got: "integer",
                    })?,
            };
            char_field(c, d)
        }
        '~' => char_field('~', d),
        'n' => newline(d),
        'i' => Ok(CharData::empty()),
        'b' => unprefixed_integer(d, true),
        'B' => unprefixed_integer(d, false),
        'x' => prefixed_integer(d, true),
        'X' => prefixed_integer(d, false),
        '+' => base_prefixed_integer(d, true),
        '#' => base_prefixed_integer(d, false),
        'e' => float_style(d, FloatStyle::E),
        'f' => float_style(d, FloatStyle::F),
        'g' => float_style(d, FloatStyle::G),
        _ => Err(ErrorKind::BadFormat),
    }
}

/// Replicate `c` precision times (default once), then pad to the field.
fn char_field(c: char, d: &Directive) -> Result<CharData, ErrorKind> {
    match (d.width, d.precision) {
        (None, None) => Ok(CharData::Char(c)),
        (Some(f), None) => Ok(CharData::Str(chars(c, f))),
        (None, Some(p)) => Ok(CharData::Str(chars(c, p))),
        (Some(f), Some(p)) if f >= p => Ok(adjust(
            CharData::Str(chars(c, p)),
            chars(d.pad, f - p),
            d.adjust,
        )),
        _ => Err(ErrorKind::BadFormat),
    }
}

/// `~n`: one newline, or width many; left adjustment is meaningless.
fn newline(d: &Directive) -> Result<CharData, ErrorKind> {
    match d.width {
        None => Ok(CharData::Char('\n')),
        Some(f) if d.adjust == Adjust::Right => Ok(CharData::Str(chars('\n', f))),
        Some(_) => Err(ErrorKind::BadFormat),
    }
}

/// For the integer conversions the precision slot holds the base.
fn base_of(d: &Directive) -> Result<u32, ErrorKind> {
    let base = d.precision.unwrap_or(10);
    if !(2..=36).contains(&base) {
        return Err(ErrorKind::BadBase);
    }
    Ok(base as u32)
}

fn unprefixed_integer(d: &Directive, lowercase: bool) -> Result<CharData, ErrorKind> {
    let value = int_arg(d, 0)?;
    let base = base_of(d)?;
    let body = signed_digits(value, base, "", lowercase);
    Ok(term_field(body, d.width, d.adjust, None, d.pad))
}

/// `~x`/`~X`: explicit prefix between the sign and the digits.
fn prefixed_integer(d: &Directive, lowercase: bool) -> Result<CharData, ErrorKind> {
    let value = int_arg(d, 0)?;
    let base = base_of(d)?;
    let prefix_term = d.args.get(1).ok_or(ErrorKind::MissingArg)?;
    let prefix = chardata::from_term(prefix_term, d.encoding)?.flatten();
    let body = signed_digits(value, base, &prefix, lowercase);
    Ok(term_field(body, d.width, d.adjust, None, d.pad))
}

/// `~+`/`~#`: `BASE#digits`.
fn base_prefixed_integer(d: &Directive, lowercase: bool) -> Result<CharData, ErrorKind> {
    let value = int_arg(d, 0)?;
    let base = base_of(d)?;
    let prefix = format!("{base}#");
    let body = signed_digits(value, base, &prefix, lowercase);
    Ok(term_field(body, d.width, d.adjust, None, d.pad))
}

fn signed_digits(value: i128, base: u32, prefix: &str, lowercase: bool) -> String {
    let digits = text::cond_lowercase(number::integer_to_base(value.unsigned_abs(), base), lowercase);
    if value < 0 {
        format!("-{prefix}{digits}")
    } else {
        format!("{prefix}{digits}")
    }
}

#[derive(Clone, Copy)]
enum FloatStyle {
    E,
    F,
    G,
}

fn float_style(d: &Directive, style: FloatStyle) -> Result<CharData, ErrorKind> {
    let arg = d.args.first().ok_or(ErrorKind::MissingArg)?;
    let value = arg.as_float().ok_or(ErrorKind::BadArgType {
        expected: "float",
        got: arg.type_name(),
    })?;
    if !value.is_finite() {
        return Err(ErrorKind::BadArgType {
            expected: "finite float",
            got: "float",
        });
    }
    let p = d.precision.unwrap_or(6);
    let minimum = match style {
        FloatStyle::E => 2,
        FloatStyle::F | FloatStyle::G => 1,
    };
    if p < minimum {
        return Err(ErrorKind::BadPrecision);
    }
    let body = match style {
        FloatStyle::E => number::fwrite_e(value, p),
        FloatStyle::F => number::fwrite_f(value, p),
        FloatStyle::G => number::fwrite_g(value, p),
    };
    // The field width doubles as the precision bound: a float that does
    // not fit its field star-truncates like any other term.
    Ok(match d.width {
        None => CharData::Str(body),
        Some(f) => term_field(body, Some(f), d.adjust, Some(f), d.pad),
    })
}

// ---------------------------------------------------------------------------
// Big directives
// ---------------------------------------------------------------------------

fn control_limited(
    d: &Directive,
    budget: i64,
    column: usize,
    writer: &dyn TermWriter,
    pretty: &dyn PrettyPrinter,
) -> Result<CharData, ErrorKind> {
    let arg = d.args.first().ok_or(ErrorKind::MissingArg)?;
    match d.ctl {
        's' => {
            let data = chardata::from_term(arg, d.encoding)?;
            // Without a field the budget bounds the payload directly;
            // with one, the field itself bounds the output.
            let data = if d.width.is_none() && budget >= 0 {
                chardata::ellipsise(data, budget as usize, d.encoding)
            } else {
                data
            };
            string_field(data, d)
        }
        'w' | 'W' => {
            let depth = if d.ctl == 'W' { int_arg(d, 1)? as i64 } else { -1 };
            let body = writer.write(
                arg,
                &WriteOptions {
                    depth,
                    encoding: d.encoding,
                    maps_order: d.maps_order.clone(),
                    chars_limit: budget,
                },
            );
            Ok(term_field(body, d.width, d.adjust, d.precision, d.pad))
        }
        'p' | 'P' => {
            let depth = if d.ctl == 'P' { int_arg(d, 1)? as i64 } else { -1 };
            let body = pretty.pretty(
                arg,
                &PrettyOptions {
                    chars_limit: budget,
                    column: column + 1,
                    line_length: d.width.unwrap_or(80),
                    depth,
                    encoding: d.encoding,
                    strings: d.strings,
                    maps_order: d.maps_order.clone(),
                },
            );
            Ok(CharData::Str(body))
        }
        _ => Err(ErrorKind::BadFormat),
    }
}

// ---------------------------------------------------------------------------
// Field adjustment
// ---------------------------------------------------------------------------

/// Apply width and precision to a rendered term.
///
/// The payload is first normalised to the precision (star-truncated when
/// longer), then padded out to the field.
fn term_field(
    body: String,
    width: Option<usize>,
    adj: Adjust,
    precision: Option<usize>,
    pad: char,
) -> CharData {
    let Some(f) = width else {
        return match precision {
            None => CharData::Str(body),
            Some(p) => term_field(body, Some(p), adj, Some(p), pad),
        };
    };
    let l = body.chars().count();
    let p = l.min(precision.unwrap_or(f).min(f));
    if l > p {
        adjust(CharData::Str(chars('*', p)), chars(pad, f - p), adj)
    } else {
        adjust(CharData::Str(body), chars(pad, f - l), adj)
    }
}

/// Apply width and precision to string data: strings slice instead of
/// star-truncating, grapheme-aware under unicode.
fn string_field(data: CharData, d: &Directive) -> Result<CharData, ErrorKind> {
    let enc = d.encoding;
    match (d.width, d.precision) {
        (None, None) => Ok(data),
        (Some(f), None) => Ok(fixed_field(data, f, d.adjust, d.pad, enc)),
        (None, Some(p)) => Ok(fixed_field(data, p, Adjust::Left, d.pad, enc)),
        (Some(f), Some(p)) if f >= p => {
            if f == p {
                return Ok(fixed_field(data, f, d.adjust, d.pad, enc));
            }
            let n = data.char_count();
            let body = if n > p {
                chardata::truncate(&data, p, enc)
            } else if n < p {
                CharData::List(vec![data, CharData::Str(chars(d.pad, p - n))])
            } else {
                data
            };
            Ok(adjust(body, chars(d.pad, f - p), d.adjust))
        }
        _ => Err(ErrorKind::BadFormat),
    }
}

/// Truncate or pad to exactly `f` characters.
fn fixed_field(data: CharData, f: usize, adj: Adjust, pad: char, enc: Encoding) -> CharData {
    let n = data.char_count();
    if n > f {
        chardata::truncate(&data, f, enc)
    } else if n < f {
        adjust(data, chars(pad, f - n), adj)
    } else {
        data
    }
}

fn int_arg(d: &Directive, idx: usize) -> Result<i128, ErrorKind> {
    let arg = d.args.get(idx).ok_or(ErrorKind::MissingArg)?;
    arg.as_int().ok_or(ErrorKind::BadArgType {
        expected: "integer",
        got: arg.type_name(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{Directive, MapsOrder};
    use crate::term::Term;

    fn directive(ctl: char, args: Vec<Term>) -> Directive {
        Directive {
            ctl,
            width: None,
            adjust: Adjust::Right,
            precision: None,
            pad: ' ',
            encoding: Encoding::Latin1,
            strings: true,
            maps_order: MapsOrder::Undefined,
            args,
        }
    }

    #[test]
    fn char_replication() {
        let mut d = directive('c', vec![Term::Int(65)]);
        assert_eq!(control_small(&d).unwrap().flatten(), "A");
        d.precision = Some(3);
        assert_eq!(control_small(&d).unwrap().flatten(), "AAA");
        d.width = Some(5);
        assert_eq!(control_small(&d).unwrap().flatten(), "  AAA");
    }

    #[test]
    fn latin1_char_masks_to_eight_bits() {
        let d = directive('c', vec![Term::Int(0x141)]);
        assert_eq!(control_small(&d).unwrap().flatten(), "\u{41}");
    }

    #[test]
    fn newline_width_repeats() {
        let mut d = directive('n', vec![]);
        assert_eq!(control_small(&d).unwrap().flatten(), "\n");
        d.width = Some(2);
        assert_eq!(control_small(&d).unwrap().flatten(), "\n\n");
        d.adjust = Adjust::Left;
        assert_eq!(control_small(&d), Err(ErrorKind::BadFormat));
    }

    #[test]
    fn ignored_argument_emits_nothing() {
        let d = directive('i', vec![Term::atom("dropped")]);
        assert_eq!(control_small(&d).unwrap().flatten(), "");
    }

    #[test]
    fn integer_base_and_case() {
        let mut d = directive('b', vec![Term::Int(255)]);
        d.precision = Some(16);
        assert_eq!(control_small(&d).unwrap().flatten(), "ff");
        d.ctl = 'B';
        assert_eq!(control_small(&d).unwrap().flatten(), "FF");
    }

    #[test]
    fn integer_base_out_of_range() {
        let mut d = directive('b', vec![Term::Int(1)]);
        d.precision = Some(37);
        assert_eq!(control_small(&d), Err(ErrorKind::BadBase));
        d.precision = Some(1);
        assert_eq!(control_small(&d), Err(ErrorKind::BadBase));
    }

    #[test]
    fn explicit_and_base_prefixes() {
        let mut d = directive('x', vec![Term::Int(-31), Term::str("0x")]);
        d.precision = Some(16);
        assert_eq!(control_small(&d).unwrap().flatten(), "-0x1f");
        let mut d = directive('#', vec![Term::Int(31)]);
        d.precision = Some(16);
        assert_eq!(control_small(&d).unwrap().flatten(), "16#1F");
        let d = directive('+', vec![Term::Int(31)]);
        assert_eq!(control_small(&d).unwrap().flatten(), "10#31");
    }

    #[test]
    fn zero_padded_integer_field() {
        let mut d = directive('b', vec![Term::Int(3)]);
        d.width = Some(6);
        d.precision = Some(2);
        d.pad = '0';
        assert_eq!(control_small(&d).unwrap().flatten(), "000011");
    }

    #[test]
    fn float_precision_bounds() {
        let mut d = directive('e', vec![Term::Float(1.0)]);
        d.precision = Some(1);
        assert_eq!(control_small(&d), Err(ErrorKind::BadPrecision));
        let mut d = directive('f', vec![Term::Float(1.0)]);
        d.precision = Some(0);
        assert_eq!(control_small(&d), Err(ErrorKind::BadPrecision));
    }

    #[test]
    fn non_finite_float_is_rejected() {
        let d = directive('f', vec![Term::Float(f64::NAN)]);
        assert_eq!(
            control_small(&d),
            Err(ErrorKind::BadArgType {
                expected: "finite float",
                got: "float",
            })
        );
    }

    #[test]
    fn float_star_truncates_in_narrow_field() {
        let mut d = directive('f', vec![Term::Float(123456.0)]);
        d.width = Some(4);
        assert_eq!(control_small(&d).unwrap().flatten(), "****");
    }

    #[test]
    fn term_field_star_truncation() {
        let out = term_field("123456789".to_string(), Some(6), Adjust::Right, Some(2), ' ');
        assert_eq!(out.flatten(), "    **");
    }

    #[test]
    fn term_field_precision_widens_then_pads() {
        let out = term_field("11".to_string(), Some(6), Adjust::Right, None, '0');
        assert_eq!(out.flatten(), "000011");
    }
}
