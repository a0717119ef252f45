//! Resolution error types.

use uccm_directive::{Origin, TermError};

/// A single resolution failure. The resolver reports all of them at once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("{origin}: unresolved capability '{capability}' (requested by {requested_by})")]
    UnresolvedCapability {
        capability: String,
        requested_by: String,
        origin: Origin,
    },

    #[error(
        "ambiguous provider for '{capability}'{}: {}",
        .requested_by.as_ref().map(|r| format!(" (requested by {r})")).unwrap_or_default(),
        .providers.join(", ")
    )]
    AmbiguousProvider {
        capability: String,
        providers: Vec<String>,
        requested_by: Option<String>,
    },

    #[error("cyclic dependency: {}", .path.join(" -> "))]
    CyclicDependency {
        /// Header ids along the cycle, first id repeated at the end.
        path: Vec<String>,
    },

    #[error("{origin}: malformed capability parameter '{param}': {reason}")]
    MalformedParameter {
        param: String,
        origin: Origin,
        reason: TermError,
    },

    #[error("root header '{header}' is not an active driver for family '{family}'")]
    UnknownRoot { header: String, family: String },
}

impl ResolveError {
    /// Short kind name, used when summarising diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::UnresolvedCapability { .. } => "UnresolvedCapability",
            ResolveError::AmbiguousProvider { .. } => "AmbiguousProvider",
            ResolveError::CyclicDependency { .. } => "CyclicDependency",
            ResolveError::MalformedParameter { .. } => "MalformedParameter",
            ResolveError::UnknownRoot { .. } => "UnknownRoot",
        }
    }
}
