//! Validation of leg usages against a board.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::{debug, info};
use uccm_board::{Board, CapabilityClass, Leg, PhysicalPin};
use uccm_directive::Origin;
use uccm_resolve::Resolution;

use crate::error::BindError;
use crate::table::{BindingEntry, BindingTable, Claimant};
use crate::usage::LegUsage;

struct Claim {
    usage: LegUsage,
    alternate: Option<u8>,
    claimants: Vec<Claimant>,
    first_claimant: String,
    first_origin: Origin,
}

/// Check every leg usage of the resolved build against `board`.
///
/// Each physical pin may be claimed in exactly one role. Repeating the same
/// leg with the same class and options folds into one binding with several
/// claimants; anything else on an already claimed pin is a `LegConflict`,
/// including a second leg that aliases the same pin.
pub fn validate_bindings(
    resolution: &Resolution,
    board: &Board,
) -> Result<BindingTable, Vec<BindError>> {
    let mut errors = Vec::new();
    let mut claims: BTreeMap<PhysicalPin, Claim> = BTreeMap::new();

    for requirement in &resolution.requirements {
        for term in &requirement.usages {
            let usage = match LegUsage::from_term(term) {
                Ok(u) => u,
                Err(reason) => {
                    errors.push(BindError::InvalidLegUsage {
                        usage: term.to_string(),
                        reason,
                        origin: requirement.origin.clone(),
                    });
                    continue;
                }
            };

            let Some(binding) = board.binding(&usage.leg) else {
                errors.push(BindError::UnknownLeg {
                    leg: usage.leg,
                    board: board.name.clone(),
                    claimant: requirement.consumer.clone(),
                    origin: requirement.origin.clone(),
                });
                continue;
            };

            // An alternate leg without a selector has no peripheral to route to.
            let unroutable =
                usage.class == CapabilityClass::Alternate && binding.alternate.is_none();
            if !binding.supports(usage.class) || unroutable {
                errors.push(BindError::UnsupportedCapability {
                    leg: usage.leg,
                    pin: binding.physical(),
                    class: usage.class,
                    claimant: requirement.consumer.clone(),
                    origin: requirement.origin.clone(),
                });
                continue;
            }

            let claimant = Claimant {
                header: requirement.consumer.clone(),
                capability: requirement.key.to_string(),
                origin: requirement.origin.to_string(),
            };

            match claims.entry(binding.physical()) {
                Entry::Vacant(slot) => {
                    debug!(leg = %usage.leg, pin = %slot.key(), role = %usage.role(), "bound leg");
                    let alternate = if usage.class == CapabilityClass::Alternate {
                        binding.alternate
                    } else {
                        None
                    };
                    slot.insert(Claim {
                        usage,
                        alternate,
                        claimants: vec![claimant],
                        first_claimant: requirement.consumer.clone(),
                        first_origin: requirement.origin.clone(),
                    });
                }
                Entry::Occupied(slot) => {
                    let pin = slot.key().clone();
                    let claim = slot.into_mut();
                    if claim.usage.leg == usage.leg && claim.usage.same_role(&usage) {
                        if !claim.claimants.contains(&claimant) {
                            debug!(leg = %usage.leg, claimant = %claimant.header, "folded repeated binding");
                            claim.claimants.push(claimant);
                        }
                    } else {
                        errors.push(BindError::LegConflict {
                            pin,
                            first_leg: claim.usage.leg.clone(),
                            first_role: claim.usage.role(),
                            first_claimant: claim.first_claimant.clone(),
                            first_origin: claim.first_origin.clone(),
                            second_leg: usage.leg.clone(),
                            second_role: usage.role(),
                            second_claimant: requirement.consumer.clone(),
                            second_origin: requirement.origin.clone(),
                        });
                    }
                }
            }
        }
    }

    if !errors.is_empty() {
        debug!(board = %board.name, errors = errors.len(), "binding validation failed");
        return Err(errors);
    }

    let mut table = BindingTable::new(board.name.clone(), resolution.family.clone());
    for (pin, claim) in claims {
        table.legs.insert(
            Leg::new(claim.usage.leg),
            BindingEntry {
                port: pin.port,
                pin: pin.pin,
                alternate: claim.alternate,
                class: claim.usage.class,
                options: claim.usage.options,
                claimants: claim.claimants,
            },
        );
    }
    info!(board = %board.name, legs = table.len(), "validated leg bindings");
    Ok(table)
}
