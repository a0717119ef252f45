//! Parse error types.

use crate::directive::Origin;

/// A malformed `#pragma uccm` directive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{origin}: {kind}")]
pub struct ParseError {
    /// Where the directive starts.
    pub origin: Origin,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(origin: Origin, kind: ParseErrorKind) -> Self {
        Self { origin, kind }
    }
}

/// The specific reason a directive was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unknown uccm directive '{0}'")]
    UnknownDirective(String),

    #[error("expected identifier, found '{0}'")]
    ExpectedIdentifier(String),

    #[error("expected '{expected}', found '{found}'")]
    Expected { expected: char, found: String },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unknown escape sequence '\\{0}'")]
    UnknownEscape(char),

    #[error("unbalanced parentheses in parameter list")]
    UnbalancedParens,

    #[error("empty parameter in parameter list")]
    EmptyParameter,

    #[error("unexpected text after directive: '{0}'")]
    TrailingText(String),
}

/// Result type for directive parsing.
pub type Result<T> = std::result::Result<T, ParseError>;
