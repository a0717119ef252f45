//! CLI command implementations.

pub mod board;
pub mod build;
pub mod resolve;

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::warn;
use uccm_board::{find_board, validate_board, Board, Severity};
use uccm_build::{BuildRequest, HeaderSource};

use crate::manifest::UccmManifest;

/// Selections given on the command line; each overrides the manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides<'a> {
    pub board: Option<&'a str>,
    pub family: Option<&'a str>,
    pub out_dir: Option<&'a str>,
}

/// Load the selected board and refuse to build on structural errors.
pub fn load_board(project_dir: &Path, name: &str) -> Result<Board> {
    let board = find_board(name, Some(project_dir))
        .with_context(|| format!("loading board '{name}'"))?;
    if let Err(issues) = validate_board(&board) {
        let mut errors = 0;
        for issue in &issues {
            match issue.severity {
                Severity::Error => {
                    errors += 1;
                    eprintln!("error: board {}: {}", board.name, issue.message);
                }
                Severity::Warning => warn!(board = %board.name, "{}", issue.message),
            }
        }
        if errors > 0 {
            bail!("board '{name}' has {errors} error(s); run `uccm board validate {name}`");
        }
    }
    Ok(board)
}

/// Assemble a build request from the manifest and overrides.
pub fn build_request(
    project_dir: &Path,
    manifest: &UccmManifest,
    overrides: Overrides<'_>,
) -> Result<BuildRequest> {
    let board_name = match overrides.board.or(manifest.build.board.as_deref()) {
        Some(name) => name,
        None => bail!("no board selected: pass --board or set [build] board in uccm.toml"),
    };
    let board = load_board(project_dir, board_name)?;
    let out_dir = project_dir.join(overrides.out_dir.unwrap_or(manifest.out_dir()));

    let mut request = BuildRequest::new(board, out_dir);
    request.family = overrides
        .family
        .map(str::to_string)
        .or_else(|| manifest.build.family.clone());
    request.roots = manifest.build.roots.clone();
    request.symbol_key = manifest.build.symbol_key;
    for entry in &manifest.drivers {
        request.headers.push(HeaderSource::load(project_dir, entry)?);
    }
    Ok(request)
}

/// Print every diagnostic of a failed build.
pub fn report_failure(err: &uccm_build::BuildError) {
    for line in err.diagnostics() {
        eprintln!("error: {line}");
    }
}
