//! Symbol key extraction.
//!
//! A key extractor names the logical symbols a fragment defines. Two distinct
//! fragments sharing a symbol in one target conflict.

/// Extracts the logical symbols defined by a fragment.
pub trait SymbolKey: Send + Sync {
    fn keys(&self, text: &str) -> Vec<String>;
}

impl<F> SymbolKey for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn keys(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// Keys every `#define NAME` line by `NAME`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefineKey;

impl SymbolKey for DefineKey {
    fn keys(&self, text: &str) -> Vec<String> {
        text.lines().filter_map(define_name).map(str::to_string).collect()
    }
}

/// No symbols: fragments are only deduplicated, never in conflict.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKey;

impl SymbolKey for NoKey {
    fn keys(&self, _text: &str) -> Vec<String> {
        Vec::new()
    }
}

fn define_name(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('#')?.trim_start();
    let rest = rest.strip_prefix("define")?;
    if !rest.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if end == 0 {
        None
    } else {
        Some(&rest[..end])
    }
}
