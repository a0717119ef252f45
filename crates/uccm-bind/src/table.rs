//! The binding table artifact.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uccm_board::{CapabilityClass, Leg, PhysicalPin};

/// File name of the serialized table.
pub const BINDINGS_FILE: &str = "bindings.json";

/// A requirement that claimed a leg.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Claimant {
    /// Header whose directive carried the usage.
    pub header: String,
    /// Capability the usage was attached to.
    pub capability: String,
    /// `file:line` of the directive.
    pub origin: String,
}

/// One bound leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BindingEntry {
    pub port: String,
    pub pin: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<u8>,
    pub class: CapabilityClass,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub claimants: Vec<Claimant>,
}

impl BindingEntry {
    pub fn physical(&self) -> PhysicalPin {
        PhysicalPin {
            port: self.port.clone(),
            pin: self.pin,
        }
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

/// Leg → physical resource → bound capability class, for one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingTable {
    pub board: String,
    pub family: String,
    pub legs: BTreeMap<Leg, BindingEntry>,
}

impl BindingTable {
    pub fn new(board: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            board: board.into(),
            family: family.into(),
            legs: BTreeMap::new(),
        }
    }

    pub fn get(&self, leg: &str) -> Option<&BindingEntry> {
        self.legs.get(&Leg::new(leg))
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
