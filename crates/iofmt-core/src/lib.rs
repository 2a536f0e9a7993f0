//! # iofmt-core
//!
//! Format-directed text rendering engine: the implementation behind a
//! `printf`-style API. Given a format string of literal characters and
//! typed `~` directives plus a positional argument list, it produces
//! either deep character data or a contiguous UTF-8 binary.
//!
//! Architecture:
//! - `parse` — directive parser and unparser
//! - `render` — two-pass renderer (small directives first, then big
//!   directives under a shared character budget)
//! - `number` — `e`/`f`/`g` float rendering with carry propagation,
//!   integer base conversion
//! - `chardata` / `text` — deep character data, column and grapheme
//!   accounting, padding, truncation
//! - `writer` — collaborator interfaces for generic-term rendering,
//!   plus the reference implementation
//! - `term` / `error` — argument model and failure types
//!
//! Data flow: `(fmt, args)` → parser → directive list → first pass
//! (small output + counts) → second pass (budgeted big directives) →
//! character data or bytes.
//!
//! The engine is purely functional: a render call holds no shared
//! state, performs no I/O, and keeps no caches.

pub mod chardata;
pub mod error;
pub mod number;
pub mod parse;
pub mod render;
pub mod term;
pub mod text;
pub mod writer;

pub use chardata::{CharData, Encoding};
pub use error::{ErrorKind, FormatError};
pub use parse::{unparse, Adjust, Directive, MapsOrder, Token};
pub use render::Counts;
pub use term::Term;
pub use writer::{PlainWriter, PrettyOptions, PrettyPrinter, TermWriter, WriteOptions};

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Bound on the user-visible character count of the output;
    /// -1 means unlimited. Truncation is marked with `...` and is not
    /// an error.
    pub chars_limit: i64,
}

impl Default for Options {
    fn default() -> Options {
        Options { chars_limit: -1 }
    }
}

/// Render a format string to deep character data.
pub fn render_chars(fmt: &str, args: &[Term]) -> Result<CharData, FormatError> {
    render_chars_with(fmt, args, &Options::default())
}

/// Render a format string to deep character data under `opts`.
pub fn render_chars_with(
    fmt: &str,
    args: &[Term],
    opts: &Options,
) -> Result<CharData, FormatError> {
    let tokens = parse::scan(fmt, args)?;
    render::build(tokens, opts.chars_limit, &PlainWriter, &PlainWriter)
}

/// Render with caller-supplied collaborators for the generic-term
/// directives (`~w`/`~W` use `writer`, `~p`/`~P` use `pretty`).
pub fn render_chars_using(
    fmt: &str,
    args: &[Term],
    opts: &Options,
    writer: &dyn TermWriter,
    pretty: &dyn PrettyPrinter,
) -> Result<CharData, FormatError> {
    let tokens = parse::scan(fmt, args)?;
    render::build(tokens, opts.chars_limit, writer, pretty)
}

/// Render a format string to a contiguous UTF-8 binary.
pub fn render_bytes(fmt: &str, args: &[Term]) -> Result<Vec<u8>, FormatError> {
    render_bytes_with(fmt, args, &Options::default())
}

/// Render a format string to a contiguous UTF-8 binary under `opts`.
pub fn render_bytes_with(
    fmt: &str,
    args: &[Term],
    opts: &Options,
) -> Result<Vec<u8>, FormatError> {
    Ok(render_chars_with(fmt, args, opts)?.flatten().into_bytes())
}

/// Parse a format string against its argument list into a directive
/// sequence.
pub fn parse(fmt: &str, args: &[Term]) -> Result<Vec<Token>, FormatError> {
    Ok(parse::scan(fmt, args)?
        .into_iter()
        .map(|spanned| spanned.token)
        .collect())
}

/// Advance a column counter through `text` from `start`, with tab stops
/// every 8 columns.
pub fn indent_column(text: &str, start: usize) -> usize {
    text::indent_column(text, start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chars_and_bytes_agree() {
        let fmt = "~w and ~ts";
        let args = [Term::Int(7), Term::Binary("café".as_bytes().to_vec())];
        let chars = render_chars(fmt, &args).unwrap().flatten();
        let bytes = render_bytes(fmt, &args).unwrap();
        assert_eq!(chars.as_bytes(), bytes.as_slice());
    }

    #[test]
    fn default_options_are_unlimited() {
        assert_eq!(Options::default().chars_limit, -1);
    }
}
