//! Aggregation error types.

use uccm_directive::Origin;

/// An aggregation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error(
        "conflicting fragments for symbol '{symbol}' in target {target}: \
         {first} ({first_provider}) and {second} ({second_provider})"
    )]
    ConflictingFragment {
        target: String,
        symbol: String,
        first: Origin,
        first_provider: String,
        second: Origin,
        second_provider: String,
    },
}
