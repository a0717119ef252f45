//! Append-only aggregation context.
//!
//! The context accumulates fragments per target, folds exact duplicates, and
//! records symbol conflicts. It is finalized once; nothing is emitted unless
//! every target is conflict-free.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};
use uccm_directive::Origin;
use uccm_resolve::Resolution;

use crate::error::AggregateError;
use crate::key::SymbolKey;

/// One `append` fragment accepted into a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub target: String,
    pub text: String,
    /// Header that contributed the fragment.
    pub provider: String,
    pub origin: Origin,
}

/// Aggregated output of a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutput {
    pub name: String,
    pub fragments: Vec<Fragment>,
    /// Number of appends folded into an earlier identical fragment.
    pub duplicates: usize,
    /// Final artifact text.
    pub text: String,
}

impl TargetOutput {
    /// File name of the generated artifact: `<target>.h` unless the target
    /// already carries an extension.
    pub fn file_name(&self) -> String {
        if self.name.contains('.') {
            self.name.clone()
        } else {
            format!("{}.h", self.name)
        }
    }
}

/// Every aggregated target, keyed and ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregated {
    pub targets: BTreeMap<String, TargetOutput>,
}

#[derive(Debug, Default)]
struct Accumulator {
    fragments: Vec<Fragment>,
    /// Fragment text → index into `fragments`.
    texts: HashMap<String, usize>,
    /// Symbol → index of the fragment that defined it.
    symbols: HashMap<String, usize>,
    duplicates: usize,
}

/// Threaded through aggregation and finalized once.
pub struct AggregationContext<'k> {
    key: &'k dyn SymbolKey,
    targets: BTreeMap<String, Accumulator>,
    errors: Vec<AggregateError>,
}

impl<'k> AggregationContext<'k> {
    pub fn new(key: &'k dyn SymbolKey) -> Self {
        Self {
            key,
            targets: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    /// Append a fragment to `target`.
    pub fn append(&mut self, provider: &str, target: &str, text: &str, origin: &Origin) {
        if text.trim().is_empty() {
            return;
        }
        let acc = self.targets.entry(target.to_string()).or_default();

        if let Some(&existing) = acc.texts.get(text) {
            acc.duplicates += 1;
            debug!(
                name = target,
                origin = %origin,
                first = %acc.fragments[existing].origin,
                "folded duplicate fragment"
            );
            return;
        }

        let keys = self.key.keys(text);
        let mut conflicted = false;
        for symbol in &keys {
            if let Some(&owner) = acc.symbols.get(symbol) {
                let first = &acc.fragments[owner];
                self.errors.push(AggregateError::ConflictingFragment {
                    target: target.to_string(),
                    symbol: symbol.clone(),
                    first: first.origin.clone(),
                    first_provider: first.provider.clone(),
                    second: origin.clone(),
                    second_provider: provider.to_string(),
                });
                conflicted = true;
            }
        }
        if conflicted {
            return;
        }

        let index = acc.fragments.len();
        for symbol in keys {
            acc.symbols.insert(symbol, index);
        }
        acc.texts.insert(text.to_string(), index);
        acc.fragments.push(Fragment {
            target: target.to_string(),
            text: text.to_string(),
            provider: provider.to_string(),
            origin: origin.clone(),
        });
    }

    /// Render every target, or return every conflict recorded.
    pub fn finalize(self) -> Result<Aggregated, Vec<AggregateError>> {
        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        let targets: BTreeMap<String, TargetOutput> = self
            .targets
            .into_iter()
            .map(|(name, acc)| {
                let text = render(&acc.fragments);
                let output = TargetOutput {
                    name: name.clone(),
                    fragments: acc.fragments,
                    duplicates: acc.duplicates,
                    text,
                };
                (name, output)
            })
            .collect();

        info!(targets = targets.len(), "aggregated configuration fragments");
        Ok(Aggregated { targets })
    }
}

fn render(fragments: &[Fragment]) -> String {
    let mut out = String::new();
    for fragment in fragments {
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&fragment.text);
    }
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Aggregate the `append` directives of every resolved header, in resolved
/// order and file order within a header.
pub fn aggregate(
    resolution: &Resolution,
    key: &dyn SymbolKey,
) -> Result<Aggregated, Vec<AggregateError>> {
    let mut ctx = AggregationContext::new(key);
    for header in &resolution.headers {
        for (target, text, origin) in header.appends() {
            ctx.append(&header.id, target, text, origin);
        }
    }
    ctx.finalize()
}
