//! Capability requirement resolution for uccm builds.
//!
//! Every active driver header contributes explicit provider facts (the
//! capabilities it declares) and `require` directives. The resolver matches
//! each requirement to exactly one provider, rejects missing, ambiguous and
//! cyclic requirements, and produces one deterministic dependency-first order
//! of headers that every later stage follows.

pub mod catalog;
pub mod error;
pub mod resolver;
pub mod tree;

pub use catalog::{CapabilityKey, DriverHeader, ProviderFact, Requirement, ANY_FAMILY, LEG_USAGE};
pub use error::ResolveError;
pub use resolver::{resolve, Resolution, ResolvedRequirement};
pub use tree::{format_order, format_tree};
