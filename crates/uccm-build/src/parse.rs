//! Parallel directive parsing.

use std::thread;

use tracing::{debug, info};
use uccm_directive::{parse_header, ParseError};
use uccm_resolve::{CapabilityKey, DriverHeader};

use crate::catalog::{CatalogError, HeaderSource};
use crate::error::BuildError;

/// Parse every header into a [`DriverHeader`].
///
/// Headers are split across up to `workers` scoped threads. Results keep the
/// input order and parse errors are sorted by origin, so the outcome does not
/// depend on scheduling.
pub fn parse_headers(sources: &[HeaderSource], workers: usize) -> Result<Vec<DriverHeader>, BuildError> {
    let workers = workers.clamp(1, sources.len().max(1));
    let chunk = sources.len().div_ceil(workers).max(1);

    let parsed: Vec<Result<DriverHeader, HeaderErrors>> = thread::scope(|s| {
        let handles: Vec<_> = sources
            .chunks(chunk)
            .map(|batch| s.spawn(move || batch.iter().map(parse_one).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    let mut headers = Vec::with_capacity(parsed.len());
    let mut parse_errors = Vec::new();
    let mut catalog_errors = Vec::new();
    for result in parsed {
        match result {
            Ok(header) => headers.push(header),
            Err(HeaderErrors::Parse(errs)) => parse_errors.extend(errs),
            Err(HeaderErrors::Catalog(errs)) => catalog_errors.extend(errs),
        }
    }

    if !parse_errors.is_empty() {
        parse_errors.sort_by(|a, b| a.origin.cmp(&b.origin));
        return Err(BuildError::Parse(parse_errors));
    }
    if !catalog_errors.is_empty() {
        return Err(BuildError::Catalog(catalog_errors));
    }

    info!(
        headers = headers.len(),
        directives = headers.iter().map(|h| h.directives.len()).sum::<usize>(),
        "parsed driver headers"
    );
    Ok(headers)
}

enum HeaderErrors {
    Parse(Vec<ParseError>),
    Catalog(Vec<CatalogError>),
}

fn parse_one(source: &HeaderSource) -> Result<DriverHeader, HeaderErrors> {
    let id = source.id();
    let directives = parse_header(id, &source.text).map_err(HeaderErrors::Parse)?;
    debug!(header = id, directives = directives.len(), "parsed header");

    let mut header = DriverHeader::new(id, directives);
    let mut errors = Vec::new();
    for key in &source.entry.provides {
        match CapabilityKey::parse(key) {
            Ok(parsed) => header = header.providing(parsed),
            Err(reason) => errors.push(CatalogError {
                header: id.to_string(),
                key: key.clone(),
                reason,
            }),
        }
    }
    if !errors.is_empty() {
        return Err(HeaderErrors::Catalog(errors));
    }
    header.families = source.entry.families();
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DriverEntry;

    fn source(path: &str, provides: &[&str], text: &str) -> HeaderSource {
        let mut entry = DriverEntry::new(path);
        for p in provides {
            entry = entry.providing(*p);
        }
        HeaderSource::new(entry, text)
    }

    #[test]
    fn parses_in_input_order_across_workers() {
        let sources: Vec<HeaderSource> = (0..9)
            .map(|i| source(&format!("stm32f3/h{i}.h"), &[], "#pragma uccm require(gpio)"))
            .collect();
        let headers = parse_headers(&sources, 4).unwrap();
        let ids: Vec<&str> = headers.iter().map(|h| h.id.as_str()).collect();
        let expected: Vec<String> = (0..9).map(|i| format!("stm32f3/h{i}.h")).collect();
        assert_eq!(ids, expected);
        assert_eq!(headers[0].families, vec!["stm32f3".to_string()]);
    }

    #[test]
    fn parse_errors_from_all_headers_are_reported() {
        let sources = vec![
            source("b.h", &[], "#pragma uccm frobnicate(x)"),
            source("a.h", &[], "\n#pragma uccm require("),
            source("ok.h", &[], "#pragma uccm require(gpio)"),
        ];
        let err = parse_headers(&sources, 3).unwrap_err();
        match err {
            BuildError::Parse(errs) => {
                assert_eq!(errs.len(), 2);
                assert_eq!(errs[0].origin.file, "a.h");
                assert_eq!(errs[1].origin.file, "b.h");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_provides_is_a_catalog_error() {
        let sources = vec![source("x.h", &["gpio("], "")];
        assert!(matches!(parse_headers(&sources, 1), Err(BuildError::Catalog(_))));
    }

    #[test]
    fn empty_input() {
        assert!(parse_headers(&[], 8).unwrap().is_empty());
    }
}
