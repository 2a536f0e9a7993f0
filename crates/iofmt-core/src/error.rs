//! Formatting failure types.
//!
//! Parse failures are fatal: the whole render operation fails and no
//! partial output is produced. Every error carries the char index of the
//! offending directive's `~` in the format string.

use thiserror::Error;

/// Classification of a formatting failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Malformed directive: unknown control character or invalid syntax.
    #[error("malformed directive")]
    BadFormat,
    /// The argument list was exhausted before the directive was satisfied.
    #[error("argument list exhausted")]
    MissingArg,
    /// An argument had the wrong type for the position that consumed it.
    #[error("expected {expected} argument, got {got}")]
    BadArgType {
        expected: &'static str,
        got: &'static str,
    },
    /// Float precision outside the accepted range (`~e` needs >= 2,
    /// `~f`/`~g` need >= 1).
    #[error("invalid precision")]
    BadPrecision,
    /// Integer base outside 2..=36.
    #[error("invalid base")]
    BadBase,
}

/// A formatting failure, positioned in the format string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("format error at column {position}: {kind}")]
pub struct FormatError {
    pub kind: ErrorKind,
    /// Char index of the directive that failed (or of the format string
    /// end for trailing-argument errors).
    pub position: usize,
}

impl FormatError {
    pub(crate) fn new(kind: ErrorKind, position: usize) -> Self {
        FormatError { kind, position }
    }
}
