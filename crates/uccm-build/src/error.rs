//! Build pipeline errors.

use std::path::PathBuf;

use thiserror::Error;
use uccm_aggregate::AggregateError;
use uccm_bind::BindError;
use uccm_directive::ParseError;
use uccm_resolve::ResolveError;

use crate::catalog::CatalogError;

/// A failed build. Stage variants carry every diagnostic of that stage.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} directive parse error(s)", .0.len())]
    Parse(Vec<ParseError>),

    #[error("{} driver catalog error(s)", .0.len())]
    Catalog(Vec<CatalogError>),

    #[error("{} resolution error(s)", .0.len())]
    Resolve(Vec<ResolveError>),

    /// Aggregation and binding run side by side; both batches are kept.
    #[error(
        "{} aggregation error(s), {} binding error(s)",
        aggregate.len(),
        bind.len()
    )]
    Generate {
        aggregate: Vec<AggregateError>,
        bind: Vec<BindError>,
    },

    #[error("{} artifact name collision(s)", .0.len())]
    Collision(Vec<ArtifactCollision>),

    #[error("failed to serialize binding table: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to commit artifacts to {}: {source}", out_dir.display())]
    Commit {
        out_dir: PathBuf,
        source: std::io::Error,
    },
}

/// Two outputs of one build mapped to the same file name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("artifact {file} is produced by both {first} and {second}")]
pub struct ArtifactCollision {
    pub file: String,
    pub first: String,
    pub second: String,
}

impl BuildError {
    /// Every user-visible diagnostic line.
    pub fn diagnostics(&self) -> Vec<String> {
        fn lines<E: ToString>(errs: &[E]) -> Vec<String> {
            errs.iter().map(ToString::to_string).collect()
        }
        match self {
            BuildError::Parse(errs) => lines(errs),
            BuildError::Catalog(errs) => lines(errs),
            BuildError::Resolve(errs) => lines(errs),
            BuildError::Collision(errs) => lines(errs),
            BuildError::Generate { aggregate, bind } => {
                let mut out = lines(aggregate);
                out.extend(lines(bind));
                out
            }
            other => vec![other.to_string()],
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            BuildError::Read { .. } | BuildError::Parse(_) | BuildError::Catalog(_) => "parse",
            BuildError::Resolve(_) => "resolve",
            BuildError::Generate { .. } | BuildError::Collision(_) | BuildError::Serialize(_) => {
                "generate"
            }
            BuildError::Commit { .. } => "commit",
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildError>;
