//! Driver catalog: which headers take part in a build and what they provide.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uccm_aggregate::{DefineKey, NoKey, SymbolKey};
use uccm_directive::TermError;

use crate::error::BuildError;

/// One `[[driver]]` entry of a project manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DriverEntry {
    /// Header path relative to the project directory.
    pub path: String,
    /// Capabilities the header provides, e.g. `gpio` or `HAL_DRIVER(gpio)`.
    #[serde(default)]
    pub provides: Vec<String>,
    /// Families the header is enabled for. Defaults to the name of the
    /// header's parent directory; `"*"` enables it everywhere.
    #[serde(default)]
    pub families: Option<Vec<String>>,
}

impl DriverEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            provides: Vec::new(),
            families: None,
        }
    }

    pub fn providing(mut self, key: impl Into<String>) -> Self {
        self.provides.push(key.into());
        self
    }

    pub fn for_families(mut self, families: &[&str]) -> Self {
        self.families = Some(families.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Families this entry is enabled for.
    pub fn families(&self) -> Vec<String> {
        match &self.families {
            Some(list) => list.clone(),
            None => Path::new(&self.path)
                .parent()
                .and_then(|p| p.file_name())
                .map(|name| vec![name.to_string_lossy().into_owned()])
                .unwrap_or_default(),
        }
    }
}

/// A header's source text together with its catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSource {
    pub entry: DriverEntry,
    pub text: String,
}

impl HeaderSource {
    pub fn new(entry: DriverEntry, text: impl Into<String>) -> Self {
        Self {
            entry,
            text: text.into(),
        }
    }

    /// Read the header named by `entry` relative to `root`.
    pub fn load(root: &Path, entry: &DriverEntry) -> Result<Self, BuildError> {
        let path = root.join(&entry.path);
        let text = fs::read_to_string(&path).map_err(|source| BuildError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(Self::new(entry.clone(), text))
    }

    pub fn id(&self) -> &str {
        &self.entry.path
    }
}

/// A `provides` entry that is not a valid capability key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{header}: invalid provided capability '{key}': {reason}")]
pub struct CatalogError {
    pub header: String,
    pub key: String,
    pub reason: TermError,
}

/// Symbol key used to detect conflicting fragments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKeyKind {
    /// `#define NAME` lines.
    #[default]
    Define,
    /// Exact-duplicate folding only.
    None,
}

impl SymbolKeyKind {
    pub fn extractor(self) -> Box<dyn SymbolKey> {
        match self {
            SymbolKeyKind::Define => Box::new(DefineKey),
            SymbolKeyKind::None => Box::new(NoKey),
        }
    }
}
