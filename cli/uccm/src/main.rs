//! uccm: build tool for uccm driver headers.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use commands::Overrides;
use manifest::UccmManifest;

#[derive(Parser)]
#[command(name = "uccm", version, about = "Resolve, aggregate and bind uccm driver headers")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve, aggregate and bind, then write all artifacts
    Build {
        /// Board name (built-in or boards/<name>.board.toml)
        #[arg(long)]
        board: Option<String>,
        /// MCU family override
        #[arg(long)]
        family: Option<String>,
        /// Output directory (default: build/uccm)
        #[arg(long)]
        out_dir: Option<String>,
    },
    /// Print the resolved header order and dependency tree
    Resolve {
        /// Board name
        #[arg(long)]
        board: Option<String>,
        /// MCU family override
        #[arg(long)]
        family: Option<String>,
    },
    /// Manage board definitions
    Board {
        #[command(subcommand)]
        action: BoardAction,
    },
}

#[derive(Subcommand)]
enum BoardAction {
    /// List available boards
    List,
    /// Show the leg table of a board
    Describe {
        /// Board name
        name: String,
        /// Output format (default: human-readable, "toml" for TOML)
        #[arg(long)]
        format: Option<String>,
    },
    /// Validate a board definition
    Validate {
        /// Board name
        name: String,
    },
    /// Create boards/<name>.board.toml from a template
    New {
        /// Board name
        name: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Build {
            board,
            family,
            out_dir,
        } => {
            let (manifest, project_dir) = load_manifest_required(&cwd)?;
            let overrides = Overrides {
                board: board.as_deref(),
                family: family.as_deref(),
                out_dir: out_dir.as_deref(),
            };
            commands::build::run(&project_dir, &manifest, overrides)
        }

        Commands::Resolve { board, family } => {
            let (manifest, project_dir) = load_manifest_required(&cwd)?;
            let overrides = Overrides {
                board: board.as_deref(),
                family: family.as_deref(),
                out_dir: None,
            };
            commands::resolve::run(&project_dir, &manifest, overrides)
        }

        Commands::Board { action } => {
            let project_dir = load_manifest_optional(&cwd)?.unwrap_or_else(|| cwd.clone());
            match action {
                BoardAction::List => commands::board::list(Some(&project_dir)),
                BoardAction::Describe { name, format } => {
                    commands::board::describe(&name, Some(&project_dir), format.as_deref())
                }
                BoardAction::Validate { name } => {
                    commands::board::validate(&name, Some(&project_dir))
                }
                BoardAction::New { name } => commands::board::new(&name, &project_dir),
            }
        }
    }
}

/// Load the manifest, returning an error if none is found.
fn load_manifest_required(cwd: &Path) -> anyhow::Result<(UccmManifest, PathBuf)> {
    match UccmManifest::find_and_load(cwd)? {
        Some(found) => Ok(found),
        None => anyhow::bail!("no {} found in this directory or any parent", manifest::MANIFEST_FILE),
    }
}

/// Project directory of the nearest manifest, if any.
fn load_manifest_optional(cwd: &Path) -> anyhow::Result<Option<PathBuf>> {
    Ok(UccmManifest::find_and_load(cwd)?.map(|(_, dir)| dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::parse_from(["uccm", "-vv", "board", "list"]);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Board { action: BoardAction::List }));
    }

    #[test]
    fn build_flags() {
        let cli = Cli::parse_from(["uccm", "build", "--board", "nucleo-f303re", "--out-dir", "gen"]);
        match cli.command {
            Commands::Build { board, family, out_dir } => {
                assert_eq!(board.as_deref(), Some("nucleo-f303re"));
                assert!(family.is_none());
                assert_eq!(out_dir.as_deref(), Some("gen"));
            }
            _ => panic!("expected build"),
        }
    }
}
