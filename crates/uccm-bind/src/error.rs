//! Binding validation errors.

use thiserror::Error;
use uccm_board::{CapabilityClass, PhysicalPin};
use uccm_directive::Origin;

/// A binding validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("{origin}: unknown leg '{leg}' on board {board} (requested by {claimant})")]
    UnknownLeg {
        leg: String,
        board: String,
        claimant: String,
        origin: Origin,
    },

    #[error("{origin}: leg '{leg}' ({pin}) does not support {class} (requested by {claimant})")]
    UnsupportedCapability {
        leg: String,
        pin: PhysicalPin,
        class: CapabilityClass,
        claimant: String,
        origin: Origin,
    },

    /// Two incompatible claims on the same physical pin.
    #[error(
        "leg conflict on {pin}: {first_leg} as {first_role} by {first_claimant} ({first_origin}), \
         {second_leg} as {second_role} by {second_claimant} ({second_origin})"
    )]
    LegConflict {
        pin: PhysicalPin,
        first_leg: String,
        first_role: String,
        first_claimant: String,
        first_origin: Origin,
        second_leg: String,
        second_role: String,
        second_claimant: String,
        second_origin: Origin,
    },

    #[error("{origin}: invalid leg usage '{usage}': {reason}")]
    InvalidLegUsage {
        usage: String,
        reason: String,
        origin: Origin,
    },
}

impl BindError {
    pub fn kind(&self) -> &'static str {
        match self {
            BindError::UnknownLeg { .. } => "UnknownLeg",
            BindError::UnsupportedCapability { .. } => "UnsupportedCapability",
            BindError::LegConflict { .. } => "LegConflict",
            BindError::InvalidLegUsage { .. } => "InvalidLegUsage",
        }
    }
}
