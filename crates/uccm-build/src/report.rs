//! Build report.

use std::fmt;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::stage::Artifact;

/// Size and digest of one committed artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSummary {
    pub name: String,
    pub bytes: usize,
    /// Lowercase hex SHA-256 of the contents.
    pub sha256: String,
}

impl ArtifactSummary {
    pub fn of(artifact: &Artifact) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&artifact.contents);
        let digest = hasher.finalize();
        Self {
            name: artifact.name.clone(),
            bytes: artifact.contents.len(),
            sha256: digest.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }
}

/// Summary of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub board: String,
    pub family: String,
    /// Header ids in resolved order.
    pub order: Vec<String>,
    pub requirements: usize,
    pub bound_legs: usize,
    pub artifacts: Vec<ArtifactSummary>,
    pub out_dir: PathBuf,
    pub duration_ms: u64,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== uccm build ===")?;
        writeln!(f, "Board: {} ({})", self.board, self.family)?;
        writeln!(f, "Duration: {} ms", self.duration_ms)?;
        writeln!(f)?;

        writeln!(
            f,
            "--- Resolved order ({} headers, {} requirements) ---",
            self.order.len(),
            self.requirements
        )?;
        for (i, id) in self.order.iter().enumerate() {
            writeln!(f, "  {:>2}. {id}", i + 1)?;
        }

        writeln!(f)?;
        writeln!(f, "--- Bindings ---")?;
        writeln!(f, "  Legs bound: {}", self.bound_legs)?;

        writeln!(f)?;
        writeln!(f, "--- Artifacts -> {} ---", self.out_dir.display())?;
        for artifact in &self.artifacts {
            writeln!(
                f,
                "  {:<20} {:>6} bytes  sha256:{}",
                artifact.name,
                artifact.bytes,
                &artifact.sha256[..12]
            )?;
        }
        Ok(())
    }
}
