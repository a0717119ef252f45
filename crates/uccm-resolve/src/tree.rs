//! Dependency tree display.
//!
//! Formats a resolution as an ASCII tree rooted at the headers nothing else
//! depends on:
//! ```text
//! app/blink.h
//! └── stm32f3/ll_gpio.h [gpio]
//!     └── stm32f3/hal_gpio.h [HAL_DRIVER(gpio)]
//! ```

use std::collections::BTreeSet;

use crate::resolver::Resolution;

/// Format the resolved dependency tree as a human-readable string.
pub fn format_tree(resolution: &Resolution) -> String {
    let depended_on: BTreeSet<&str> = resolution
        .requirements
        .iter()
        .filter(|r| r.provider != r.consumer)
        .map(|r| r.provider.as_str())
        .collect();

    let mut out = String::new();
    let mut expanded = BTreeSet::new();
    // Dependents come last in resolved order; list top-level headers that way too.
    for id in resolution.order().into_iter().rev() {
        if depended_on.contains(id) {
            continue;
        }
        out.push_str(id);
        out.push('\n');
        expanded.insert(id.to_string());
        format_children(&mut out, resolution, id, "", &mut expanded);
    }

    out.push_str(&format!(
        "\n{} headers, {} requirements\n",
        resolution.headers.len(),
        resolution.requirements.len()
    ));
    out
}

fn format_children(
    out: &mut String,
    resolution: &Resolution,
    id: &str,
    prefix: &str,
    expanded: &mut BTreeSet<String>,
) {
    let children: Vec<_> = resolution
        .requirements_of(id)
        .filter(|r| r.provider != r.consumer)
        .collect();

    let count = children.len();
    for (i, req) in children.into_iter().enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { "└── " } else { "├── " };
        let first_visit = expanded.insert(req.provider.clone());
        let shared_marker = if first_visit { "" } else { " (shared)" };

        out.push_str(&format!(
            "{prefix}{connector}{} [{}]{shared_marker}\n",
            req.provider, req.key
        ));

        if first_visit {
            let child_prefix = if is_last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}│   ")
            };
            format_children(out, resolution, &req.provider, &child_prefix, expanded);
        }
    }
}

/// Format the resolved order as a numbered list.
pub fn format_order(resolution: &Resolution) -> String {
    let mut out = String::new();
    for (i, header) in resolution.headers.iter().enumerate() {
        let provides: Vec<String> = header.provides.iter().map(|k| k.to_string()).collect();
        if provides.is_empty() {
            out.push_str(&format!("{:>3}. {}\n", i + 1, header.id));
        } else {
            out.push_str(&format!(
                "{:>3}. {} (provides {})\n",
                i + 1,
                header.id,
                provides.join(", ")
            ));
        }
    }
    out
}
