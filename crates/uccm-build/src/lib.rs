//! The uccm build pipeline.
//!
//! parse (parallel) → resolve → aggregate ∥ bind → stage → commit.
//!
//! Every stage reports all of its errors at once and the next stage only runs
//! when the previous one produced none. Artifacts are written to a staging
//! directory and swapped into the output directory in one step, so a failed
//! build never leaves partial output behind.

pub mod catalog;
pub mod error;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod stage;

pub use catalog::{CatalogError, DriverEntry, HeaderSource, SymbolKeyKind};
pub use error::{ArtifactCollision, BuildError, Result};
pub use parse::parse_headers;
pub use pipeline::{build, generate, resolve_request, BuildRequest, Generated};
pub use report::{ArtifactSummary, BuildReport};
pub use stage::{commit, Artifact};
