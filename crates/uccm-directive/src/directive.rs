//! Typed directive values.

use std::fmt;

/// Source location of a directive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Origin {
    /// Header identifier (usually a path relative to the driver root).
    pub file: String,
    /// 1-based line where the directive starts.
    pub line: usize,
}

impl Origin {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// The payload of a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `require(NAME)` or `require(NAME(ARGS...))`.
    Require {
        /// Bare capability identifier.
        capability: String,
        /// Top-level comma-separated parameters, whitespace-normalised.
        params: Vec<String>,
    },
    /// `append(TARGET) = "TEXT"`.
    Append {
        /// Output target identifier.
        target: String,
        /// Literal text with escapes decoded.
        text: String,
    },
}

/// A parsed directive. Immutable once produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub origin: Origin,
}

impl Directive {
    /// Construct a `require` directive.
    pub fn require(
        capability: impl Into<String>,
        params: Vec<String>,
        origin: Origin,
    ) -> Self {
        Self {
            kind: DirectiveKind::Require {
                capability: capability.into(),
                params,
            },
            origin,
        }
    }

    /// Construct an `append` directive.
    pub fn append(target: impl Into<String>, text: impl Into<String>, origin: Origin) -> Self {
        Self {
            kind: DirectiveKind::Append {
                target: target.into(),
                text: text.into(),
            },
            origin,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DirectiveKind::Require { capability, params } if params.is_empty() => {
                write!(f, "require({capability})")
            }
            DirectiveKind::Require { capability, params } => {
                write!(f, "require({capability}({}))", params.join(", "))
            }
            DirectiveKind::Append { target, text } => {
                write!(f, "append({target}) = {text:?}")
            }
        }
    }
}
