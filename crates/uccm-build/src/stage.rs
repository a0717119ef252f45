//! Artifact staging and all-or-nothing commit.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::error::BuildError;

/// A generated file, held in memory until commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name inside the output directory.
    pub name: String,
    pub contents: Vec<u8>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Replace `out_dir` with exactly `artifacts`.
///
/// Files are written into a staging directory next to `out_dir`, then the
/// staging directory is renamed into place. A previous `out_dir` is moved
/// aside first and restored if the swap fails. On any error `out_dir` keeps
/// its previous contents.
pub fn commit(out_dir: &Path, artifacts: &[Artifact]) -> Result<(), BuildError> {
    let wrap = |source: io::Error| BuildError::Commit {
        out_dir: out_dir.to_path_buf(),
        source,
    };

    let parent = match out_dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(wrap)?;

    let staging = tempfile::Builder::new()
        .prefix(".uccm-staging-")
        .tempdir_in(parent)
        .map_err(wrap)?;
    for artifact in artifacts {
        fs::write(staging.path().join(&artifact.name), &artifact.contents).map_err(wrap)?;
        debug!(artifact = %artifact.name, bytes = artifact.contents.len(), "staged artifact");
    }

    let retired = tempfile::Builder::new()
        .prefix(".uccm-previous-")
        .tempdir_in(parent)
        .map_err(wrap)?;
    let previous = retired.path().join("out");
    let had_previous = out_dir.exists();
    if had_previous {
        fs::rename(out_dir, &previous).map_err(wrap)?;
    }

    if let Err(e) = fs::rename(staging.path(), out_dir) {
        if had_previous {
            // Restore the previous output before reporting.
            let _ = fs::rename(&previous, out_dir);
        }
        return Err(wrap(e));
    }

    // `staging` now points at a moved directory; its cleanup is a no-op.
    drop(staging);
    drop(retired);
    info!(out_dir = %out_dir.display(), artifacts = artifacts.len(), "committed artifacts");
    Ok(())
}
