//! Typed argument values consumed by format directives.
//!
//! Directives are typed: the numeric conversions require `Int`/`Float`,
//! `~s` requires string-like data, and the generic conversions
//! (`~w`/`~W`/`~p`/`~P`) accept any term. The engine never interprets a
//! term beyond these type checks; generic rendering is delegated to the
//! collaborators in [`crate::writer`].

use std::cmp::Ordering;

/// A value from the argument list.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Int(i128),
    Float(f64),
    Atom(String),
    /// Text as a sequence of code points (the char-list spelling).
    Str(String),
    /// A chunk of encoded bytes.
    Binary(Vec<u8>),
    List(Vec<Term>),
    Tuple(Vec<Term>),
    /// Key/value pairs in insertion order.
    Map(Vec<(Term, Term)>),
}

impl Term {
    pub fn atom(name: &str) -> Term {
        Term::Atom(name.to_string())
    }

    pub fn str(text: &str) -> Term {
        Term::Str(text.to_string())
    }

    /// Variant name for error reporting.
    pub fn type_name(&self) -> &'static str {
        match self {
            Term::Int(_) => "integer",
            Term::Float(_) => "float",
            Term::Atom(_) => "atom",
            Term::Str(_) => "string",
            Term::Binary(_) => "binary",
            Term::List(_) => "list",
            Term::Tuple(_) => "tuple",
            Term::Map(_) => "map",
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Term::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Term::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Term {
        Term::Int(value as i128)
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Term {
        Term::Float(value)
    }
}

/// Total order over terms, used for ordered map output.
///
/// Ranks: numbers < atoms < tuples < maps < strings/lists < binaries.
/// Numbers compare by value across `Int`/`Float`.
pub fn term_cmp(a: &Term, b: &Term) -> Ordering {
    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => same_rank_cmp(a, b),
        unequal => unequal,
    }
}

fn rank(t: &Term) -> u8 {
    match t {
        Term::Int(_) | Term::Float(_) => 0,
        Term::Atom(_) => 1,
        Term::Tuple(_) => 2,
        Term::Map(_) => 3,
        Term::Str(_) | Term::List(_) => 4,
        Term::Binary(_) => 5,
    }
}

fn same_rank_cmp(a: &Term, b: &Term) -> Ordering {
    match (a, b) {
        (Term::Int(x), Term::Int(y)) => x.cmp(y),
        (Term::Int(x), Term::Float(y)) => (*x as f64).total_cmp(y),
        (Term::Float(x), Term::Int(y)) => x.total_cmp(&(*y as f64)),
        (Term::Float(x), Term::Float(y)) => x.total_cmp(y),
        (Term::Atom(x), Term::Atom(y)) => x.cmp(y),
        (Term::Binary(x), Term::Binary(y)) => x.cmp(y),
        (Term::Tuple(x), Term::Tuple(y)) => seq_cmp(x, y),
        (Term::Map(x), Term::Map(y)) => match x.len().cmp(&y.len()) {
            Ordering::Equal => x
                .iter()
                .zip(y.iter())
                .map(|((ka, va), (kb, vb))| match term_cmp(ka, kb) {
                    Ordering::Equal => term_cmp(va, vb),
                    unequal => unequal,
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal),
            unequal => unequal,
        },
        (Term::Str(x), Term::Str(y)) => x.cmp(y),
        // Strings are lists of code points; compare elementwise.
        (x, y) => seq_cmp(&as_list(x), &as_list(y)),
    }
}

fn seq_cmp(a: &[Term], b: &[Term]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match term_cmp(x, y) {
            Ordering::Equal => continue,
            unequal => return unequal,
        }
    }
    a.len().cmp(&b.len())
}

fn as_list(t: &Term) -> Vec<Term> {
    match t {
        Term::List(items) => items.clone(),
        Term::Str(s) => s.chars().map(|c| Term::Int(c as i128)).collect(),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_before_atoms() {
        assert_eq!(
            term_cmp(&Term::Int(999), &Term::atom("a")),
            Ordering::Less
        );
    }

    #[test]
    fn mixed_numeric_comparison_is_by_value() {
        assert_eq!(
            term_cmp(&Term::Int(2), &Term::Float(1.5)),
            Ordering::Greater
        );
        assert_eq!(term_cmp(&Term::Int(2), &Term::Float(2.0)), Ordering::Equal);
    }

    #[test]
    fn string_and_list_compare_elementwise() {
        let s = Term::str("ab");
        let l = Term::List(vec![Term::Int(97), Term::Int(98)]);
        assert_eq!(term_cmp(&s, &l), Ordering::Equal);
    }

    #[test]
    fn shorter_tuple_sorts_first() {
        let a = Term::Tuple(vec![Term::Int(1)]);
        let b = Term::Tuple(vec![Term::Int(1), Term::Int(0)]);
        assert_eq!(term_cmp(&a, &b), Ordering::Less);
    }
}
