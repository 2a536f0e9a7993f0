//! Format-string parsing and unparsing.
//!
//! A format string is scanned left to right into literal runs and
//! directive records. A `~` introduces a directive; its sub-elements are
//! parsed in fixed order (field width, precision, pad char, modifier
//! flags, control char), with `*` fields consuming inline arguments from
//! the argument list. The unparser reverses the scan, reconstructing a
//! format string and argument list from a directive sequence.

use log::trace;

use crate::chardata::Encoding;
use crate::error::{ErrorKind, FormatError};
use crate::term::Term;

/// Field adjustment direction, from the sign of the width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Adjust {
    Left,
    #[default]
    Right,
}

/// Map-ordering request carried to the term writer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MapsOrder {
    #[default]
    Undefined,
    Ordered,
    Reversed,
    /// An opaque comparator token consumed from the argument list (`K`).
    Cmp(Term),
}

/// A parsed `~...` control sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub ctl: char,
    /// Field minimum; output is padded or star-truncated to it.
    pub width: Option<usize>,
    pub adjust: Adjust,
    pub precision: Option<usize>,
    pub pad: char,
    pub encoding: Encoding,
    /// Whether the pretty printer may render string-like lists as text.
    pub strings: bool,
    pub maps_order: MapsOrder,
    /// The values this directive consumes (0, 1, or 2 entries).
    pub args: Vec<Term>,
}

impl Directive {
    fn new(ctl: char) -> Directive {
        Directive {
            ctl,
            width: None,
            adjust: Adjust::Right,
            precision: None,
            pad: ' ',
            encoding: Encoding::Latin1,
            strings: true,
            maps_order: MapsOrder::Undefined,
            args: Vec::new(),
        }
    }
}

/// One element of a parsed format: a literal run or a directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Literal(String),
    Directive(Directive),
}

/// A token plus the char index where it starts in the format string,
/// kept internally so render-time failures still report a position.
#[derive(Debug, Clone)]
pub(crate) struct Spanned {
    pub pos: usize,
    pub token: Token,
}

/// Argument cursor with positioned errors.
struct ArgCursor<'a> {
    args: &'a [Term],
    next: usize,
}

impl<'a> ArgCursor<'a> {
    fn new(args: &'a [Term]) -> ArgCursor<'a> {
        ArgCursor { args, next: 0 }
    }

    fn take(&mut self, pos: usize) -> Result<&'a Term, FormatError> {
        let arg = self
            .args
            .get(self.next)
            .ok_or_else(|| FormatError::new(ErrorKind::MissingArg, pos))?;
        self.next += 1;
        Ok(arg)
    }

    fn take_int(&mut self, pos: usize) -> Result<i128, FormatError> {
        let arg = self.take(pos)?;
        arg.as_int().ok_or_else(|| {
            FormatError::new(
                ErrorKind::BadArgType {
                    expected: "integer",
                    got: arg.type_name(),
                },
                pos,
            )
        })
    }

    fn exhausted(&self) -> bool {
        self.next >= self.args.len()
    }
}

/// Scan a format string against its argument list.
pub(crate) fn scan(fmt: &str, args: &[Term]) -> Result<Vec<Spanned>, FormatError> {
    let chars: Vec<char> = fmt.chars().collect();
    let mut cursor = ArgCursor::new(args);
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let start = pos;
        while pos < chars.len() && chars[pos] != '~' {
            pos += 1;
        }
        if pos > start {
            out.push(Spanned {
                pos: start,
                token: Token::Literal(chars[start..pos].iter().collect()),
            });
        }
        if pos >= chars.len() {
            break;
        }
        let dstart = pos;
        pos += 1;
        let directive = collect(&chars, &mut pos, &mut cursor, dstart)?;
        out.push(Spanned {
            pos: dstart,
            token: Token::Directive(directive),
        });
    }
    if !cursor.exhausted() {
        // Arguments left over once the format string ends.
        return Err(FormatError::new(ErrorKind::BadFormat, chars.len()));
    }
    trace!("scanned {} tokens from {} chars", out.len(), chars.len());
    Ok(out)
}

/// Parse one directive; `pos` sits just past the `~`.
fn collect(
    chars: &[char],
    pos: &mut usize,
    cursor: &mut ArgCursor<'_>,
    dstart: usize,
) -> Result<Directive, FormatError> {
    let mut d = Directive::new('\0');

    // Field width, with optional leading '-' for left adjustment.
    let minus = chars.get(*pos) == Some(&'-');
    if minus {
        *pos += 1;
    }
    match field_value(chars, pos, cursor, dstart)? {
        Some(w) if minus && w < 0 => return Err(FormatError::new(ErrorKind::BadFormat, dstart)),
        Some(w) => {
            // A negative inline width also means left adjustment.
            d.adjust = if minus || w < 0 { Adjust::Left } else { Adjust::Right };
            d.width = Some(usize::try_from(w.unsigned_abs()).unwrap_or(usize::MAX));
        }
        None if minus => return Err(FormatError::new(ErrorKind::BadFormat, dstart)),
        None => {}
    }

    // Precision, introduced by '.'.
    if chars.get(*pos) == Some(&'.') {
        *pos += 1;
        match field_value(chars, pos, cursor, dstart)? {
            Some(p) if p < 0 => return Err(FormatError::new(ErrorKind::BadPrecision, dstart)),
            Some(p) => d.precision = Some(usize::try_from(p).unwrap_or(usize::MAX)),
            None => {}
        }
        // Pad char, introduced by a second '.'.
        if chars.get(*pos) == Some(&'.') {
            *pos += 1;
            match chars.get(*pos).copied() {
                Some('*') => {
                    *pos += 1;
                    let cp = cursor.take_int(dstart)?;
                    d.pad = u32::try_from(cp).ok().and_then(char::from_u32).ok_or_else(|| {
                        FormatError::new(
                            ErrorKind::BadArgType {
                                expected: "pad code point",
                                got: "integer",
                            },
                            dstart,
                        )
                    })?;
                }
                Some(c) => {
                    *pos += 1;
                    d.pad = c;
                }
                None => return Err(FormatError::new(ErrorKind::BadFormat, dstart)),
            }
        }
    }

    // Modifier flags, any order.
    loop {
        match chars.get(*pos).copied() {
            Some('t') => d.encoding = Encoding::Unicode,
            Some('l') => d.strings = false,
            Some('k') => d.maps_order = MapsOrder::Ordered,
            Some('K') => {
                d.maps_order = match cursor.take(dstart)? {
                    Term::Atom(a) if a.as_str() == "undefined" => MapsOrder::Undefined,
                    Term::Atom(a) if a.as_str() == "ordered" => MapsOrder::Ordered,
                    Term::Atom(a) if a.as_str() == "reversed" => MapsOrder::Reversed,
                    other => MapsOrder::Cmp(other.clone()),
                };
            }
            _ => break,
        }
        *pos += 1;
    }

    // Control char decides how many arguments to pull.
    let ctl = *chars
        .get(*pos)
        .ok_or_else(|| FormatError::new(ErrorKind::BadFormat, dstart))?;
    *pos += 1;
    d.ctl = ctl;
    match ctl {
        'c' | 'i' | 'b' | 'B' | '+' | '#' | 'e' | 'f' | 'g' | 's' | 'w' | 'p' => {
            d.args.push(cursor.take(dstart)?.clone());
        }
        'x' | 'X' => {
            d.args.push(cursor.take(dstart)?.clone());
            d.args.push(cursor.take(dstart)?.clone());
        }
        'W' | 'P' => {
            d.args.push(cursor.take(dstart)?.clone());
            let depth = cursor.take(dstart)?;
            if depth.as_int().is_none() {
                return Err(FormatError::new(
                    ErrorKind::BadArgType {
                        expected: "integer",
                        got: depth.type_name(),
                    },
                    dstart,
                ));
            }
            d.args.push(depth.clone());
        }
        '~' | 'n' => {}
        _ => return Err(FormatError::new(ErrorKind::BadFormat, dstart)),
    }
    Ok(d)
}

/// A run of digits, or `*` consuming one integer argument, or nothing.
fn field_value(
    chars: &[char],
    pos: &mut usize,
    cursor: &mut ArgCursor<'_>,
    dstart: usize,
) -> Result<Option<i128>, FormatError> {
    match chars.get(*pos).copied() {
        Some('*') => {
            *pos += 1;
            Ok(Some(cursor.take_int(dstart)?))
        }
        Some(c) if c.is_ascii_digit() => {
            let mut value: i128 = 0;
            while let Some(c) = chars.get(*pos).copied().filter(char::is_ascii_digit) {
                value = value.saturating_mul(10).saturating_add((c as u8 - b'0') as i128);
                *pos += 1;
            }
            Ok(Some(value))
        }
        _ => Ok(None),
    }
}

/// Reconstruct a format string and argument list from a directive
/// sequence. Inline `*` parameters come back as literal digits, so the
/// round trip is structural rather than byte-identical.
pub fn unparse(tokens: &[Token]) -> (String, Vec<Term>) {
    let mut fmt = String::new();
    let mut args = Vec::new();
    for token in tokens {
        match token {
            Token::Literal(s) => fmt.push_str(s),
            Token::Directive(d) => {
                fmt.push('~');
                if let Some(w) = d.width {
                    if d.adjust == Adjust::Left {
                        fmt.push('-');
                    }
                    fmt.push_str(&w.to_string());
                }
                match d.precision {
                    Some(p) => {
                        fmt.push('.');
                        fmt.push_str(&p.to_string());
                    }
                    // The pad section is the third dot-field; an empty
                    // precision still needs its dot.
                    None if d.pad != ' ' => fmt.push('.'),
                    None => {}
                }
                if d.pad != ' ' {
                    fmt.push('.');
                    fmt.push(d.pad);
                    // A literal `*` pad would reparse as an inline
                    // parameter; re-supply it as the consumed argument.
                    if d.pad == '*' {
                        args.push(Term::Int('*' as i128));
                    }
                }
                if d.encoding == Encoding::Unicode {
                    fmt.push('t');
                }
                if !d.strings {
                    fmt.push('l');
                }
                match &d.maps_order {
                    MapsOrder::Undefined => {}
                    MapsOrder::Ordered => fmt.push('k'),
                    MapsOrder::Reversed => {
                        fmt.push('K');
                        args.push(Term::atom("reversed"));
                    }
                    MapsOrder::Cmp(t) => {
                        fmt.push('K');
                        args.push(t.clone());
                    }
                }
                fmt.push(d.ctl);
                args.extend(d.args.iter().cloned());
            }
        }
    }
    (fmt, args)
}
