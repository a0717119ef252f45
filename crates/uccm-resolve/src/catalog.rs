//! Driver headers and the provider facts they contribute.

use std::fmt;

use uccm_directive::{Directive, DirectiveKind, Origin, Term, TermError};

use crate::error::ResolveError;

/// Head of a requirement parameter that records a leg usage rather than
/// identifying the capability: `leg(LED1, digital-output)`.
pub const LEG_USAGE: &str = "leg";

/// Family wildcard: a header listing it is active for every family.
pub const ANY_FAMILY: &str = "*";

/// A capability name plus its structural identity parameters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CapabilityKey {
    pub name: String,
    pub params: Vec<Term>,
}

impl CapabilityKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(name: impl Into<String>, params: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Parse `gpio` or `HAL_DRIVER(gpio)`.
    pub fn parse(text: &str) -> Result<Self, TermError> {
        let term = Term::parse(text)?;
        Ok(Self {
            name: term.head,
            params: term.args,
        })
    }

    /// Whether a requirement for `self` is satisfied by a provider of `provided`.
    ///
    /// A requirement without parameters accepts any provider of the same
    /// name. A parameterised requirement accepts generic providers (no
    /// parameters) and providers with exactly the same parameters.
    pub fn is_satisfied_by(&self, provided: &CapabilityKey) -> bool {
        self.name == provided.name
            && (self.params.is_empty()
                || provided.params.is_empty()
                || self.params == provided.params)
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Term::call(self.name.clone(), self.params.clone()))
    }
}

/// An explicit `(capability, provider)` registration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProviderFact {
    pub capability: CapabilityKey,
    pub provider: String,
}

/// A `require` directive read structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub key: CapabilityKey,
    /// `leg(...)` parameters, in directive order.
    pub usages: Vec<Term>,
    pub origin: Origin,
}

/// One driver header in a build: its identity, the families it is enabled
/// for, what it provides, and its parsed directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverHeader {
    /// Header identifier, usually its path relative to the driver root.
    pub id: String,
    /// MCU families this header is enabled for; empty means every family.
    pub families: Vec<String>,
    /// Capabilities this header provides.
    pub provides: Vec<CapabilityKey>,
    pub directives: Vec<Directive>,
}

impl DriverHeader {
    pub fn new(id: impl Into<String>, directives: Vec<Directive>) -> Self {
        Self {
            id: id.into(),
            families: Vec::new(),
            provides: Vec::new(),
            directives,
        }
    }

    pub fn for_family(mut self, family: impl Into<String>) -> Self {
        self.families.push(family.into());
        self
    }

    pub fn providing(mut self, key: CapabilityKey) -> Self {
        self.provides.push(key);
        self
    }

    pub fn is_active_for(&self, family: &str) -> bool {
        self.families.is_empty() || self.families.iter().any(|f| f == family || f == ANY_FAMILY)
    }

    /// Provider facts this header registers.
    pub fn provider_facts(&self) -> impl Iterator<Item = ProviderFact> + '_ {
        self.provides.iter().map(|key| ProviderFact {
            capability: key.clone(),
            provider: self.id.clone(),
        })
    }

    /// Key used to break ties in the resolved order: the smallest provided
    /// capability name, falling back to the header id.
    pub fn sort_key(&self) -> String {
        self.provides
            .iter()
            .map(|k| k.to_string())
            .min()
            .unwrap_or_else(|| self.id.clone())
    }

    /// Whether the header itself provides something satisfying `key`.
    pub fn satisfies(&self, key: &CapabilityKey) -> bool {
        self.provides.iter().any(|p| key.is_satisfied_by(p))
    }

    /// Read every `require` directive structurally, in file order.
    pub fn requirements(&self) -> Vec<Result<Requirement, ResolveError>> {
        self.directives
            .iter()
            .filter_map(|d| match &d.kind {
                DirectiveKind::Require { capability, params } => {
                    Some(read_requirement(capability, params, &d.origin))
                }
                DirectiveKind::Append { .. } => None,
            })
            .collect()
    }

    /// `(target, text, origin)` for every `append` directive, in file order.
    pub fn appends(&self) -> impl Iterator<Item = (&str, &str, &Origin)> {
        self.directives.iter().filter_map(|d| match &d.kind {
            DirectiveKind::Append { target, text } => {
                Some((target.as_str(), text.as_str(), &d.origin))
            }
            DirectiveKind::Require { .. } => None,
        })
    }
}

fn read_requirement(
    capability: &str,
    params: &[String],
    origin: &Origin,
) -> Result<Requirement, ResolveError> {
    let mut identity = Vec::new();
    let mut usages = Vec::new();
    for param in params {
        let term = Term::parse(param).map_err(|reason| ResolveError::MalformedParameter {
            param: param.clone(),
            origin: origin.clone(),
            reason,
        })?;
        if term.head == LEG_USAGE {
            usages.push(term);
        } else {
            identity.push(term);
        }
    }
    Ok(Requirement {
        key: CapabilityKey::with_params(capability, identity),
        usages,
        origin: origin.clone(),
    })
}
