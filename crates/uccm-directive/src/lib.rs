//! Directive parsing for uccm driver headers.
//!
//! A driver header carries its build metadata as line-oriented pragmas:
//!
//! ```text
//! #pragma uccm require(HAL_DRIVER(gpio))
//! #pragma uccm append(HAL_CONFIG) = "#define HAL_GPIO_MODULE_ENABLED\n"
//! ```
//!
//! This crate turns header text into typed [`Directive`] values. It never
//! interprets requirement parameters beyond splitting them; the resolver and
//! the binder read them structurally through [`Term`].

pub mod directive;
pub mod error;
pub mod parse;
pub mod term;

pub use directive::{Directive, DirectiveKind, Origin};
pub use error::{ParseError, ParseErrorKind};
pub use parse::{parse_header, split_params};
pub use term::{Term, TermError};
