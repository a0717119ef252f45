//! `uccm resolve`: print the resolved order and dependency tree.

use std::path::Path;

use anyhow::{bail, Result};
use uccm_build::resolve_request;
use uccm_resolve::{format_order, format_tree};

use crate::commands::{build_request, report_failure, Overrides};
use crate::manifest::UccmManifest;

pub fn run(project_dir: &Path, manifest: &UccmManifest, overrides: Overrides<'_>) -> Result<()> {
    let request = build_request(project_dir, manifest, overrides)?;
    match resolve_request(&request) {
        Ok(resolution) => {
            println!(
                "{} v{} on {} ({})",
                manifest.project.name,
                manifest.project.version,
                request.board.name,
                request.family()
            );
            println!();
            print!("{}", format_order(&resolution));
            println!();
            print!("{}", format_tree(&resolution));
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            bail!("resolution failed: {err}")
        }
    }
}
