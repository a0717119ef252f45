//! `leg(NAME, CLASS[, OPTION...])` usage parameters.

use std::fmt;

use uccm_board::CapabilityClass;
use uccm_directive::Term;
use uccm_resolve::LEG_USAGE;

const INPUT_OPTIONS: &[&str] = &["pull-up", "pull-down", "floating"];
const OUTPUT_OPTIONS: &[&str] = &["push-pull", "open-drain"];

/// Options that exclude each other on one pin.
const EXCLUSIVE: &[&[&str]] = &[INPUT_OPTIONS, OUTPUT_OPTIONS];

/// One leg claimed by a requirement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LegUsage {
    pub leg: String,
    pub class: CapabilityClass,
    /// Normalised options, sorted and deduplicated.
    pub options: Vec<String>,
}

impl LegUsage {
    /// Read a usage from its structural term.
    pub fn from_term(term: &Term) -> Result<Self, String> {
        if term.head != LEG_USAGE {
            return Err(format!("expected '{LEG_USAGE}(...)'"));
        }
        let (name, rest) = match term.args.as_slice() {
            [name, class, rest @ ..] => (name, (class, rest)),
            _ => return Err("expected a leg name and a capability class".to_string()),
        };
        if !name.is_atom() {
            return Err(format!("leg name '{name}' must be a plain identifier"));
        }
        let (class_term, option_terms) = rest;
        if !class_term.is_atom() {
            return Err(format!("capability class '{class_term}' must be a plain identifier"));
        }
        let class: CapabilityClass = class_term
            .head
            .parse()
            .map_err(|_| format!("unknown capability class '{}'", class_term.head))?;

        let allowed = allowed_options(class);
        let mut options = Vec::new();
        for opt in option_terms {
            if !opt.is_atom() {
                return Err(format!("option '{opt}' must be a plain identifier"));
            }
            let normalized = opt.head.replace('_', "-").to_ascii_lowercase();
            if !allowed.contains(&normalized.as_str()) {
                return Err(format!("option '{}' is not valid for {class}", opt.head));
            }
            options.push(normalized);
        }
        options.sort();
        options.dedup();

        for group in EXCLUSIVE {
            let picked: Vec<&str> = options
                .iter()
                .map(String::as_str)
                .filter(|o| group.contains(o))
                .collect();
            if picked.len() > 1 {
                return Err(format!("options {} exclude each other", picked.join(" and ")));
            }
        }

        Ok(Self {
            leg: name.head.clone(),
            class,
            options,
        })
    }

    /// Whether two usages configure the pin identically.
    pub fn same_role(&self, other: &LegUsage) -> bool {
        self.class == other.class && self.options == other.options
    }

    pub fn role(&self) -> String {
        if self.options.is_empty() {
            self.class.to_string()
        } else {
            format!("{}[{}]", self.class, self.options.join(", "))
        }
    }
}

impl fmt::Display for LegUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.leg, self.role())
    }
}

fn allowed_options(class: CapabilityClass) -> &'static [&'static str] {
    match class {
        CapabilityClass::DigitalInput => INPUT_OPTIONS,
        CapabilityClass::DigitalOutput | CapabilityClass::Alternate => OUTPUT_OPTIONS,
        CapabilityClass::AnalogInput | CapabilityClass::AnalogOutput => &[],
    }
}
