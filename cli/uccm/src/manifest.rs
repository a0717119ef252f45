//! `uccm.toml` manifest parsing and project configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use uccm_build::{DriverEntry, SymbolKeyKind};

pub const MANIFEST_FILE: &str = "uccm.toml";

/// The top-level manifest of a uccm project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UccmManifest {
    pub project: ProjectConfig,
    #[serde(default)]
    pub build: BuildConfig,
    /// Driver catalog, one `[[driver]]` table per header.
    #[serde(default, rename = "driver")]
    pub drivers: Vec<DriverEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// `[build]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Board name, built-in or `boards/<name>.board.toml`.
    #[serde(default)]
    pub board: Option<String>,
    /// MCU family override.
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub out_dir: Option<String>,
    /// Root header paths; all active headers when absent.
    #[serde(default)]
    pub roots: Option<Vec<String>>,
    #[serde(default)]
    pub symbol_key: SymbolKeyKind,
}

impl UccmManifest {
    /// Search upward from `start_dir` for `uccm.toml`, returning it with the
    /// directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: UccmManifest = content
                    .parse()
                    .with_context(|| format!("in {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Output directory, relative to the project directory.
    pub fn out_dir(&self) -> &str {
        self.build.out_dir.as_deref().unwrap_or("build/uccm")
    }
}

impl FromStr for UccmManifest {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing uccm.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_manifest() {
        let manifest = UccmManifest::from_str(
            r#"
[project]
name = "blinky"
version = "1.2.0"

[build]
board = "stm32f3-discovery"
out-dir = "gen"
roots = ["app/blinky.h"]
symbol-key = "none"

[[driver]]
path = "app/blinky.h"
families = ["*"]

[[driver]]
path = "stm32f3/ll_gpio.h"
provides = ["gpio"]
"#,
        )
        .unwrap();
        assert_eq!(manifest.project.version, "1.2.0");
        assert_eq!(manifest.build.board.as_deref(), Some("stm32f3-discovery"));
        assert_eq!(manifest.out_dir(), "gen");
        assert_eq!(manifest.build.symbol_key, SymbolKeyKind::None);
        assert_eq!(manifest.drivers.len(), 2);
        assert_eq!(manifest.drivers[1].families(), vec!["stm32f3".to_string()]);
    }

    #[test]
    fn parse_minimal_manifest() {
        let manifest = UccmManifest::from_str("[project]\nname = \"minimal\"\n").unwrap();
        assert_eq!(manifest.project.version, "0.1.0");
        assert_eq!(manifest.out_dir(), "build/uccm");
        assert_eq!(manifest.build.symbol_key, SymbolKeyKind::Define);
        assert!(manifest.drivers.is_empty());
    }

    #[test]
    fn reject_unknown_symbol_key() {
        let bad = "[project]\nname = \"x\"\n[build]\nsymbol-key = \"fuzzy\"\n";
        assert!(bad.parse::<UccmManifest>().is_err());
    }

    #[test]
    fn find_and_load_names_the_broken_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[project\n").unwrap();
        let err = UccmManifest::find_and_load(dir.path()).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains(MANIFEST_FILE));
        assert!(chain.contains("parsing uccm.toml"));
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "[project]\nname = \"parent\"\n").unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (manifest, found) = UccmManifest::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(manifest.project.name, "parent");
        assert_eq!(found, dir.path());
    }
}
