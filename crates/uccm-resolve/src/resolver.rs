//! Capability resolution: provider matching, cycle detection and ordering.
//!
//! Resolution walks requirements from the root headers, so only edges that
//! are actually activated for the family take part in cycle detection and
//! ordering. All errors found in the pass are returned together.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, info};
use uccm_directive::{Origin, Term};

use crate::catalog::{CapabilityKey, DriverHeader};
use crate::error::ResolveError;

/// A requirement bound to its unique provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequirement {
    /// Header that declared the `require`.
    pub consumer: String,
    pub key: CapabilityKey,
    /// Header providing the capability; equals `consumer` when the header
    /// satisfies its own requirement.
    pub provider: String,
    /// `leg(...)` usages carried by the requirement.
    pub usages: Vec<Term>,
    pub origin: Origin,
}

/// Output of a successful resolver pass.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// MCU family the pass resolved for.
    pub family: String,
    /// Activated headers, dependencies before dependents.
    pub headers: Vec<DriverHeader>,
    /// Resolved requirements, grouped by consumer in header order and in
    /// file order within a consumer.
    pub requirements: Vec<ResolvedRequirement>,
}

impl Resolution {
    /// Header ids in resolved order.
    pub fn order(&self) -> Vec<&str> {
        self.headers.iter().map(|h| h.id.as_str()).collect()
    }

    /// Headers `id` directly depends on, excluding itself.
    pub fn dependencies(&self, id: &str) -> BTreeSet<&str> {
        self.requirements
            .iter()
            .filter(|r| r.consumer == id && r.provider != id)
            .map(|r| r.provider.as_str())
            .collect()
    }

    pub fn requirements_of<'a>(
        &'a self,
        id: &'a str,
    ) -> impl Iterator<Item = &'a ResolvedRequirement> + 'a {
        self.requirements.iter().filter(move |r| r.consumer == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    Visiting,
    Resolved,
}

/// Resolve every requirement of the headers active for `family`.
///
/// `roots` limits activation to headers reachable from the named headers.
/// Without roots, every header active for the family is a root.
pub fn resolve(
    headers: &[DriverHeader],
    family: &str,
    roots: Option<&[String]>,
) -> Result<Resolution, Vec<ResolveError>> {
    let active: BTreeMap<&str, &DriverHeader> = headers
        .iter()
        .filter(|h| h.is_active_for(family))
        .map(|h| (h.id.as_str(), h))
        .collect();
    debug!(family, active = active.len(), "collected active headers");

    let mut errors = Vec::new();

    let root_ids: Vec<&str> = match roots {
        Some(list) => list
            .iter()
            .filter_map(|root| match active.get_key_value(root.as_str()) {
                Some((id, _)) => Some(*id),
                None => {
                    errors.push(ResolveError::UnknownRoot {
                        header: root.clone(),
                        family: family.to_string(),
                    });
                    None
                }
            })
            .collect(),
        None => active.keys().copied().collect(),
    };

    let mut edges: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut resolved: BTreeMap<&str, Vec<ResolvedRequirement>> = BTreeMap::new();
    let mut activated: BTreeSet<&str> = BTreeSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for id in root_ids {
        if activated.insert(id) {
            queue.push_back(id);
        }
    }

    while let Some(id) = queue.pop_front() {
        let header = active[id];
        edges.entry(id).or_default();

        for requirement in header.requirements() {
            let requirement = match requirement {
                Ok(r) => r,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            let provider = if header.satisfies(&requirement.key) {
                id
            } else {
                let candidates: BTreeSet<&str> = active
                    .values()
                    .filter(|h| h.id != id && h.satisfies(&requirement.key))
                    .map(|h| h.id.as_str())
                    .collect();
                match candidates.len() {
                    1 => candidates.into_iter().next().unwrap_or(id),
                    0 => {
                        errors.push(ResolveError::UnresolvedCapability {
                            capability: requirement.key.to_string(),
                            requested_by: id.to_string(),
                            origin: requirement.origin,
                        });
                        continue;
                    }
                    _ => {
                        errors.push(ResolveError::AmbiguousProvider {
                            capability: requirement.key.to_string(),
                            providers: candidates.iter().map(|c| c.to_string()).collect(),
                            requested_by: Some(id.to_string()),
                        });
                        continue;
                    }
                }
            };

            debug!(consumer = id, provider, capability = %requirement.key, "resolved requirement");
            if provider != id {
                edges.entry(id).or_default().insert(provider);
                if activated.insert(provider) {
                    queue.push_back(provider);
                }
            }
            resolved.entry(id).or_default().push(ResolvedRequirement {
                consumer: id.to_string(),
                key: requirement.key,
                provider: provider.to_string(),
                usages: requirement.usages,
                origin: requirement.origin,
            });
        }
    }

    check_duplicate_providers(&active, &activated, &mut errors);

    for path in find_cycles(&edges) {
        errors.push(ResolveError::CyclicDependency { path });
    }

    if !errors.is_empty() {
        debug!(family, errors = errors.len(), "resolution failed");
        return Err(errors);
    }

    let order = topological_order(&edges, &active);
    let mut requirements = Vec::new();
    for id in &order {
        requirements.extend(resolved.remove(id).unwrap_or_default());
    }
    let headers: Vec<DriverHeader> = order.iter().map(|id| active[id].clone()).collect();

    info!(
        family,
        headers = headers.len(),
        requirements = requirements.len(),
        "resolved capabilities"
    );

    Ok(Resolution {
        family: family.to_string(),
        headers,
        requirements,
    })
}

/// Two activated headers declaring the same capability key is ambiguous even
/// if nothing requires it yet.
fn check_duplicate_providers(
    active: &BTreeMap<&str, &DriverHeader>,
    activated: &BTreeSet<&str>,
    errors: &mut Vec<ResolveError>,
) {
    let mut declared: BTreeMap<&CapabilityKey, BTreeSet<&str>> = BTreeMap::new();
    for id in activated {
        for key in &active[id].provides {
            declared.entry(key).or_default().insert(*id);
        }
    }

    for (key, ids) in declared {
        if ids.len() < 2 {
            continue;
        }
        let providers: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        let already_reported = errors.iter().any(|e| {
            matches!(e, ResolveError::AmbiguousProvider { providers: p, .. } if *p == providers)
        });
        if !already_reported {
            errors.push(ResolveError::AmbiguousProvider {
                capability: key.to_string(),
                providers,
                requested_by: None,
            });
        }
    }
}

/// Depth-first search with per-node state. Reaching a `Visiting` node closes
/// a cycle; each distinct cycle is reported once, rotated to start at its
/// smallest id.
fn find_cycles(edges: &BTreeMap<&str, BTreeSet<&str>>) -> Vec<Vec<String>> {
    fn visit<'a>(
        node: &'a str,
        edges: &BTreeMap<&'a str, BTreeSet<&'a str>>,
        state: &mut BTreeMap<&'a str, VisitState>,
        stack: &mut Vec<&'a str>,
        seen: &mut BTreeSet<Vec<String>>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        state.insert(node, VisitState::Visiting);
        stack.push(node);

        if let Some(deps) = edges.get(node) {
            for &dep in deps {
                match state.get(dep).copied().unwrap_or(VisitState::Unvisited) {
                    VisitState::Unvisited => visit(dep, edges, state, stack, seen, cycles),
                    VisitState::Visiting => {
                        let start = stack.iter().position(|n| *n == dep).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            stack[start..].iter().map(|s| s.to_string()).collect();
                        let min = cycle
                            .iter()
                            .enumerate()
                            .min_by(|a, b| a.1.cmp(b.1))
                            .map(|(i, _)| i)
                            .unwrap_or(0);
                        cycle.rotate_left(min);
                        if seen.insert(cycle.clone()) {
                            let mut path = cycle;
                            path.push(path[0].clone());
                            cycles.push(path);
                        }
                    }
                    VisitState::Resolved => {}
                }
            }
        }

        stack.pop();
        state.insert(node, VisitState::Resolved);
    }

    let mut state: BTreeMap<&str, VisitState> = edges
        .keys()
        .map(|k| (*k, VisitState::Unvisited))
        .collect();
    let mut stack = Vec::new();
    let mut seen = BTreeSet::new();
    let mut cycles = Vec::new();

    for &node in edges.keys() {
        if state.get(node) == Some(&VisitState::Unvisited) {
            visit(node, edges, &mut state, &mut stack, &mut seen, &mut cycles);
        }
    }
    cycles
}

/// Kahn's algorithm, dependencies first. Among ready headers the smallest
/// `(sort_key, id)` goes next.
fn topological_order<'a>(
    edges: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    active: &BTreeMap<&'a str, &DriverHeader>,
) -> Vec<&'a str> {
    let mut remaining: BTreeMap<&str, usize> =
        edges.iter().map(|(n, deps)| (*n, deps.len())).collect();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (node, deps) in edges {
        for dep in deps {
            dependents.entry(*dep).or_default().push(*node);
        }
    }

    let mut ready: BTreeSet<(String, &str)> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| (active[node].sort_key(), *node))
        .collect();

    let mut order = Vec::with_capacity(edges.len());
    while let Some((_, node)) = ready.pop_first() {
        order.push(node);
        for dependent in dependents.get(node).into_iter().flatten() {
            if let Some(count) = remaining.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    ready.insert((active[dependent].sort_key(), *dependent));
                }
            }
        }
    }
    order
}
