//! Structural view of requirement parameters.
//!
//! The parser keeps parameters as opaque strings. Consumers that need their
//! structure (`HAL_DRIVER(gpio)`, `leg(LED1, digital-output)`) read them as
//! [`Term`]s: an atom, or a head applied to a list of terms.

use std::fmt;

use crate::error::ParseErrorKind;
use crate::parse::split_params;

/// An atom (`gpio`) or call-like term (`leg(LED1, digital-output)`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Term {
    pub head: String,
    pub args: Vec<Term>,
}

/// Errors reading a parameter as a term.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TermError {
    #[error("empty term")]
    Empty,

    #[error("missing name before '(' in '{0}'")]
    MissingHead(String),

    #[error("unexpected text after ')': '{0}'")]
    Trailing(String),

    #[error("invalid argument list: {0}")]
    Args(ParseErrorKind),
}

impl Term {
    pub fn atom(head: impl Into<String>) -> Self {
        Self {
            head: head.into(),
            args: Vec::new(),
        }
    }

    pub fn call(head: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            head: head.into(),
            args,
        }
    }

    /// Parse a single parameter string.
    pub fn parse(text: &str) -> Result<Self, TermError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TermError::Empty);
        }

        let Some(open) = text.find('(') else {
            return Ok(Term::atom(text));
        };

        let head = text[..open].trim();
        if head.is_empty() {
            return Err(TermError::MissingHead(text.to_string()));
        }

        let close = matching_close(text, open)
            .ok_or(TermError::Args(ParseErrorKind::UnbalancedParens))?;
        let trailing = text[close + 1..].trim();
        if !trailing.is_empty() {
            return Err(TermError::Trailing(trailing.to_string()));
        }

        let args = split_params(&text[open + 1..close])
            .map_err(TermError::Args)?
            .iter()
            .map(|a| Term::parse(a))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Term::call(head, args))
    }

    pub fn is_atom(&self) -> bool {
        self.args.is_empty()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.head)?;
        if !self.args.is_empty() {
            write!(f, "(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{arg}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

fn matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_str = false;
    let mut escaped = false;

    for (i, c) in text[open..].char_indices() {
        if in_str {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_str = false;
            }
            continue;
        }
        match c {
            '"' => in_str = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}
