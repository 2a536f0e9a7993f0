//! Collaborator interfaces for generic-term rendering.
//!
//! `~w`/`~W` delegate to a term writer and `~p`/`~P` to a pretty
//! printer; the engine owns only these interfaces and the option records
//! it hands across them. [`PlainWriter`] is the reference implementation
//! wired in by the top-level API: single-line output with depth and
//! chars-limit elision. Real multi-line pretty-printing is an external
//! concern.

use crate::chardata::Encoding;
use crate::parse::MapsOrder;
use crate::term::{term_cmp, Term};
use crate::text;

/// Options handed to a term writer by `~w`/`~W`.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Nesting/element budget; -1 is unlimited.
    pub depth: i64,
    pub encoding: Encoding,
    pub maps_order: MapsOrder,
    /// Output character bound; -1 is unlimited.
    pub chars_limit: i64,
}

pub trait TermWriter {
    fn write(&self, term: &Term, opts: &WriteOptions) -> String;
}

/// Options handed to a pretty printer by `~p`/`~P`.
#[derive(Debug, Clone)]
pub struct PrettyOptions {
    /// Output character bound; -1 is unlimited.
    pub chars_limit: i64,
    /// 1-based column the output starts at.
    pub column: usize,
    /// Wrap target; the field width of the directive, default 80.
    pub line_length: usize,
    /// Nesting/element budget; -1 is unlimited.
    pub depth: i64,
    pub encoding: Encoding,
    /// Render string-like lists and binaries as quoted text.
    pub strings: bool,
    pub maps_order: MapsOrder,
}

pub trait PrettyPrinter {
    fn pretty(&self, term: &Term, opts: &PrettyOptions) -> String;
}

/// Reference collaborator implementing both interfaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainWriter;

impl TermWriter for PlainWriter {
    fn write(&self, term: &Term, opts: &WriteOptions) -> String {
        let mut out = String::new();
        write_term(&mut out, term, opts.depth, false, &opts.maps_order);
        bound(out, opts.chars_limit)
    }
}

impl PrettyPrinter for PlainWriter {
    fn pretty(&self, term: &Term, opts: &PrettyOptions) -> String {
        let mut out = String::new();
        write_term(&mut out, term, opts.depth, opts.strings, &opts.maps_order);
        bound(out, opts.chars_limit)
    }
}

fn bound(out: String, chars_limit: i64) -> String {
    if chars_limit >= 0 {
        text::ellipsise(&out, chars_limit as usize)
    } else {
        out
    }
}

fn write_term(out: &mut String, term: &Term, depth: i64, strings: bool, ord: &MapsOrder) {
    if depth == 0 {
        out.push_str("...");
        return;
    }
    match term {
        Term::Int(i) => out.push_str(&i.to_string()),
        Term::Float(f) => out.push_str(&format!("{f:?}")),
        Term::Atom(a) => write_atom(out, a),
        Term::Str(s) => {
            if strings && !s.is_empty() && s.chars().all(printable) {
                out.push('"');
                out.push_str(s);
                out.push('"');
            } else {
                let elems: Vec<Term> = s.chars().map(|c| Term::Int(c as i128)).collect();
                write_list(out, &elems, depth, strings, ord);
            }
        }
        Term::Binary(b) => write_binary(out, b, strings),
        Term::List(items) => write_list(out, items, depth, strings, ord),
        Term::Tuple(items) => {
            out.push('{');
            write_elems(out, items, depth, strings, ord);
            out.push('}');
        }
        Term::Map(pairs) => {
            out.push_str("#{");
            let ordered = order_pairs(pairs, ord);
            let mut d = depth;
            for (i, (k, v)) in ordered.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if d > 0 {
                    d -= 1;
                    if d == 0 {
                        out.push_str("...");
                        break;
                    }
                }
                write_term(out, k, d, strings, ord);
                out.push_str(" => ");
                write_term(out, v, d, strings, ord);
            }
            out.push('}');
        }
    }
}

fn write_list(out: &mut String, items: &[Term], depth: i64, strings: bool, ord: &MapsOrder) {
    out.push('[');
    let mut d = depth;
    for (i, item) in items.iter().enumerate() {
        if d > 0 {
            d -= 1;
            if d == 0 {
                // Elided tail prints improper-style.
                if i > 0 {
                    out.push('|');
                }
                out.push_str("...");
                break;
            }
        }
        if i > 0 {
            out.push(',');
        }
        write_term(out, item, d, strings, ord);
    }
    out.push(']');
}

fn write_elems(out: &mut String, items: &[Term], depth: i64, strings: bool, ord: &MapsOrder) {
    let mut d = depth;
    for (i, item) in items.iter().enumerate() {
        if d > 0 {
            d -= 1;
            if d == 0 {
                if i > 0 {
                    out.push(',');
                }
                out.push_str("...");
                break;
            }
        }
        if i > 0 {
            out.push(',');
        }
        write_term(out, item, d, strings, ord);
    }
}

fn write_binary(out: &mut String, bytes: &[u8], strings: bool) {
    out.push_str("<<");
    let text = std::str::from_utf8(bytes).ok().filter(|s| {
        strings && !s.is_empty() && s.chars().all(printable)
    });
    match text {
        Some(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        None => {
            for (i, b) in bytes.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&b.to_string());
            }
        }
    }
    out.push_str(">>");
}

fn write_atom(out: &mut String, name: &str) {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase())
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '@');
    if plain {
        out.push_str(name);
    } else {
        out.push('\'');
        for c in name.chars() {
            if c == '\'' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('\'');
    }
}

fn printable(c: char) -> bool {
    !c.is_control()
}

fn order_pairs<'a>(pairs: &'a [(Term, Term)], ord: &MapsOrder) -> Vec<&'a (Term, Term)> {
    let mut out: Vec<&(Term, Term)> = pairs.iter().collect();
    match ord {
        MapsOrder::Ordered => out.sort_by(|a, b| term_cmp(&a.0, &b.0)),
        MapsOrder::Reversed => out.sort_by(|a, b| term_cmp(&b.0, &a.0)),
        // A comparator token is not callable here; keep insertion order.
        MapsOrder::Undefined | MapsOrder::Cmp(_) => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(term: &Term, depth: i64) -> String {
        PlainWriter.write(
            term,
            &WriteOptions {
                depth,
                encoding: Encoding::Latin1,
                maps_order: MapsOrder::Undefined,
                chars_limit: -1,
            },
        )
    }

    #[test]
    fn scalars() {
        assert_eq!(write(&Term::Int(-42), -1), "-42");
        assert_eq!(write(&Term::Float(1.5), -1), "1.5");
        assert_eq!(write(&Term::atom("ok"), -1), "ok");
        assert_eq!(write(&Term::atom("Not Plain"), -1), "'Not Plain'");
    }

    #[test]
    fn writer_never_uses_string_heuristics() {
        assert_eq!(write(&Term::str("hi"), -1), "[104,105]");
        assert_eq!(write(&Term::Binary(b"hi".to_vec()), -1), "<<104,105>>");
    }

    #[test]
    fn pretty_quotes_printable_text() {
        let opts = PrettyOptions {
            chars_limit: -1,
            column: 1,
            line_length: 80,
            depth: -1,
            encoding: Encoding::Unicode,
            strings: true,
            maps_order: MapsOrder::Undefined,
        };
        assert_eq!(PlainWriter.pretty(&Term::str("hi"), &opts), "\"hi\"");
        assert_eq!(
            PlainWriter.pretty(&Term::Binary(b"hi".to_vec()), &opts),
            "<<\"hi\">>"
        );
    }

    #[test]
    fn containers_nest() {
        let term = Term::Tuple(vec![
            Term::atom("pair"),
            Term::List(vec![Term::Int(1), Term::Int(2)]),
        ]);
        assert_eq!(write(&term, -1), "{pair,[1,2]}");
    }

    #[test]
    fn depth_elides_tails() {
        let tuple = Term::Tuple(vec![Term::Int(1), Term::Int(2), Term::Int(3)]);
        assert_eq!(write(&tuple, 1), "{...}");
        assert_eq!(write(&tuple, 2), "{1,...}");
        let list = Term::List(vec![Term::Int(1), Term::Int(2), Term::Int(3)]);
        assert_eq!(write(&list, 2), "[1|...]");
    }

    #[test]
    fn chars_limit_elides_output() {
        let list = Term::List((0..50).map(Term::Int).collect());
        let out = PlainWriter.write(
            &list,
            &WriteOptions {
                depth: -1,
                encoding: Encoding::Latin1,
                maps_order: MapsOrder::Undefined,
                chars_limit: 12,
            },
        );
        assert_eq!(out.chars().count(), 12);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn map_ordering() {
        let map = Term::Map(vec![
            (Term::atom("b"), Term::Int(2)),
            (Term::atom("a"), Term::Int(1)),
        ]);
        let write_with = |ord: MapsOrder| {
            PlainWriter.write(
                &map,
                &WriteOptions {
                    depth: -1,
                    encoding: Encoding::Latin1,
                    maps_order: ord,
                    chars_limit: -1,
                },
            )
        };
        assert_eq!(write_with(MapsOrder::Undefined), "#{b => 2,a => 1}");
        assert_eq!(write_with(MapsOrder::Ordered), "#{a => 1,b => 2}");
        assert_eq!(write_with(MapsOrder::Reversed), "#{b => 2,a => 1}");
    }
}
